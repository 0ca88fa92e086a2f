//! File-backed credential storage.
//!
//! The value lives in [`CREDENTIAL_FILENAME`] inside one directory opened
//! through `cap_std`. Writes go to a staging file that is renamed over the
//! target, so readers never observe a partial document.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use uuid::Uuid;

use crate::domain::ports::{CredentialStorage, CredentialStorageError};

/// File name of the stored credential document.
pub const CREDENTIAL_FILENAME: &str = "tiktok-credential.json";

/// Stores the credential as a file in a capability-scoped directory.
#[derive(Debug)]
pub struct FileCredentialStorage {
    dir: Dir,
    path: PathBuf,
}

impl FileCredentialStorage {
    /// Open (creating when missing) `directory` for credential storage.
    ///
    /// # Examples
    /// ```
    /// use pixel_onboarding::domain::ports::CredentialStorage;
    /// use pixel_onboarding::outbound::credential_storage::FileCredentialStorage;
    ///
    /// let tmp = tempfile::tempdir().unwrap();
    /// let storage = FileCredentialStorage::open(tmp.path()).unwrap();
    /// storage.write("{}").unwrap();
    /// assert_eq!(storage.read().unwrap().as_deref(), Some("{}"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStorageError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, CredentialStorageError> {
        let directory = directory.as_ref();
        Dir::create_ambient_dir_all(directory, ambient_authority())
            .map_err(|error| io_error(directory, &error))?;
        let dir = Dir::open_ambient_dir(directory, ambient_authority())
            .map_err(|error| io_error(directory, &error))?;
        Ok(Self {
            dir,
            path: directory.join(CREDENTIAL_FILENAME),
        })
    }

    /// Full path of the credential document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStorage for FileCredentialStorage {
    fn read(&self) -> Result<Option<String>, CredentialStorageError> {
        match self.dir.read_to_string(CREDENTIAL_FILENAME) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(io_error(&self.path, &error)),
        }
    }

    fn write(&self, value: &str) -> Result<(), CredentialStorageError> {
        let staging = format!(".{CREDENTIAL_FILENAME}.{}", Uuid::new_v4().simple());
        let staged = self
            .dir
            .write(&staging, value.as_bytes())
            .and_then(|()| self.dir.rename(&staging, &self.dir, CREDENTIAL_FILENAME));
        if let Err(error) = staged {
            let _cleanup = self.dir.remove_file(&staging);
            return Err(io_error(&self.path, &error));
        }
        Ok(())
    }

    fn remove(&self) -> Result<(), CredentialStorageError> {
        match self.dir.remove_file(CREDENTIAL_FILENAME) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&self.path, &error)),
        }
    }
}

fn io_error(path: &Path, error: &io::Error) -> CredentialStorageError {
    CredentialStorageError::io(format!("{}: {error}", path.display()))
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn tmp() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    #[rstest]
    fn missing_file_reads_as_absent(tmp: TempDir) {
        let storage = FileCredentialStorage::open(tmp.path()).expect("open");
        assert_eq!(storage.read(), Ok(None));
    }

    #[rstest]
    fn written_value_survives_reopening(tmp: TempDir) {
        FileCredentialStorage::open(tmp.path())
            .expect("open")
            .write(r#"{"token":"tok_1","expiresAt":1}"#)
            .expect("write");

        let reopened = FileCredentialStorage::open(tmp.path()).expect("reopen");
        assert_eq!(
            reopened.read().expect("read").as_deref(),
            Some(r#"{"token":"tok_1","expiresAt":1}"#)
        );
        assert!(reopened.path().ends_with(CREDENTIAL_FILENAME));
    }

    #[rstest]
    fn overwrite_leaves_no_staging_files(tmp: TempDir) {
        let storage = FileCredentialStorage::open(tmp.path()).expect("open");
        storage.write("one").expect("first write");
        storage.write("two").expect("second write");

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .expect("list")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![CREDENTIAL_FILENAME.to_owned()]);
        assert_eq!(storage.read(), Ok(Some("two".to_owned())));
    }

    #[rstest]
    fn remove_is_idempotent(tmp: TempDir) {
        let storage = FileCredentialStorage::open(tmp.path()).expect("open");
        storage.write("value").expect("write");
        storage.remove().expect("remove");
        storage.remove().expect("remove again");
        assert_eq!(storage.read(), Ok(None));
    }

    #[rstest]
    fn nested_directories_are_created(tmp: TempDir) {
        let nested = tmp.path().join("state").join("tiktok");
        let storage = FileCredentialStorage::open(&nested).expect("open nested");
        storage.write("value").expect("write");
        assert!(nested.join(CREDENTIAL_FILENAME).exists());
    }
}
