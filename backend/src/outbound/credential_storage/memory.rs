//! Process-local credential storage.

use std::sync::{Mutex, MutexGuard};

use crate::domain::ports::{CredentialStorage, CredentialStorageError};

/// Holds the credential value in memory; lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStorage {
    value: Mutex<Option<String>>,
}

impl InMemoryCredentialStorage {
    /// Start with `value` already stored.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }

    fn slot(&self) -> Result<MutexGuard<'_, Option<String>>, CredentialStorageError> {
        self.value
            .lock()
            .map_err(|_| CredentialStorageError::unavailable("credential slot poisoned"))
    }
}

impl CredentialStorage for InMemoryCredentialStorage {
    fn read(&self) -> Result<Option<String>, CredentialStorageError> {
        Ok(self.slot()?.clone())
    }

    fn write(&self, value: &str) -> Result<(), CredentialStorageError> {
        *self.slot()? = Some(value.to_owned());
        Ok(())
    }

    fn remove(&self) -> Result<(), CredentialStorageError> {
        self.slot()?.take();
        Ok(())
    }
}
