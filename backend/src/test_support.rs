//! Shared test doubles for unit tests and integration tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use tempfile::TempDir;

use crate::outbound::credential_storage::FileCredentialStorage;

/// Clock whose current instant is set by the test.
///
/// # Examples
/// ```
/// use mockable::Clock;
/// use pixel_onboarding::test_support::MutableClock;
///
/// let clock = MutableClock::at_epoch_secs(1_700_000_000);
/// clock.advance_seconds(10);
/// assert_eq!(clock.utc().timestamp(), 1_700_000_010);
/// ```
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Start the clock at a Unix timestamp.
    ///
    /// # Panics
    /// Panics when `seconds` is outside chrono's representable range.
    pub fn at_epoch_secs(seconds: i64) -> Self {
        match Utc.timestamp_opt(seconds, 0).single() {
            Some(now) => Self::new(now),
            None => panic!("timestamp {seconds} out of range"),
        }
    }

    /// Move the clock forward.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// File-backed credential storage inside a fresh temporary directory.
///
/// The directory is removed when the returned [`TempDir`] is dropped.
///
/// # Panics
/// Panics when the directory cannot be created or opened.
pub fn temp_credential_storage() -> (TempDir, FileCredentialStorage) {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("temp dir: {error}"),
    };
    match FileCredentialStorage::open(dir.path()) {
        Ok(storage) => (dir, storage),
        Err(error) => panic!("credential storage: {error}"),
    }
}
