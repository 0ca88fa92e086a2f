//! Expiry, corruption and persistence behaviour of the credential store.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockCredentialStorage;
use crate::outbound::credential_storage::InMemoryCredentialStorage;
use crate::test_support::MutableClock;

const NOW: i64 = 1_700_000_000;

struct Harness {
    storage: Arc<InMemoryCredentialStorage>,
    clock: Arc<MutableClock>,
    store: CredentialStore,
}

#[fixture]
fn harness() -> Harness {
    let storage = Arc::new(InMemoryCredentialStorage::default());
    let clock = Arc::new(MutableClock::at_epoch_secs(NOW));
    let store = CredentialStore::new(storage.clone(), clock.clone());
    Harness {
        storage,
        clock,
        store,
    }
}

fn token(raw: &str) -> AccessToken {
    AccessToken::new(raw).expect("valid token")
}

#[rstest]
fn save_persists_token_and_epoch_millis(harness: Harness) {
    harness
        .store
        .save(token("act.abc"), Some(3600))
        .expect("save succeeds");

    let raw = harness
        .storage
        .read()
        .expect("read succeeds")
        .expect("value stored");
    let stored: serde_json::Value = serde_json::from_str(&raw).expect("stored value is JSON");
    assert_eq!(stored["token"], "act.abc");
    assert_eq!(stored["expiresAt"], (NOW + 3600) * 1000);
}

#[rstest]
#[case(3599, true)]
#[case(3600, false)]
#[case(3601, false)]
fn load_honours_expiry_boundary(harness: Harness, #[case] elapsed: i64, #[case] present: bool) {
    harness
        .store
        .save(token("act.abc"), Some(3600))
        .expect("save succeeds");
    harness.clock.advance_seconds(elapsed);

    assert_eq!(harness.store.load().is_some(), present);
    let still_stored = harness.storage.read().expect("read succeeds").is_some();
    assert_eq!(still_stored, present);
}

#[rstest]
fn missing_lifetime_defaults_to_one_day(harness: Harness) {
    let credential = harness
        .store
        .save(token("act.abc"), None)
        .expect("save succeeds");

    let lifetime = credential.expires_at() - harness.clock.utc();
    assert_eq!(lifetime.num_seconds(), 86_400);
}

#[rstest]
fn expired_credential_deletion_is_idempotent(harness: Harness) {
    harness
        .store
        .save(token("act.abc"), Some(10))
        .expect("save succeeds");
    harness.clock.advance_seconds(60);

    assert!(harness.store.load().is_none());
    assert!(harness.store.load().is_none());
    assert!(harness.storage.read().expect("read succeeds").is_none());
}

#[rstest]
#[case("not json")]
#[case(r#"{"token":"act.abc"}"#)]
#[case(r#"{"token":"   ","expiresAt":9999999999999}"#)]
fn corrupt_values_are_deleted(harness: Harness, #[case] raw: &str) {
    harness.storage.write(raw).expect("write succeeds");

    assert!(harness.store.load().is_none());
    assert!(harness.storage.read().expect("read succeeds").is_none());
}

#[rstest]
fn clear_removes_the_credential(harness: Harness) {
    harness
        .store
        .save(token("act.abc"), Some(3600))
        .expect("save succeeds");
    harness.store.clear().expect("clear succeeds");
    assert!(harness.store.load().is_none());
}

#[rstest]
fn read_failures_are_treated_as_absence() {
    let mut storage = MockCredentialStorage::new();
    storage
        .expect_read()
        .times(1)
        .returning(|| Err(CredentialStorageError::io("disk gone")));
    storage.expect_remove().never();
    let store = CredentialStore::new(
        Arc::new(storage),
        Arc::new(MutableClock::at_epoch_secs(NOW)),
    );

    assert!(store.load().is_none());
}

#[rstest]
fn write_failures_surface_as_errors() {
    let mut storage = MockCredentialStorage::new();
    let expected = format!(r#"{{"token":"act.abc","expiresAt":{}}}"#, (NOW + 5) * 1000);
    storage
        .expect_write()
        .withf(move |value: &str| value == expected)
        .times(1)
        .returning(|_| Err(CredentialStorageError::io("read-only")));
    let store = CredentialStore::new(
        Arc::new(storage),
        Arc::new(MutableClock::at_epoch_secs(NOW)),
    );

    let result = store.save(token("act.abc"), Some(5));
    assert!(matches!(result, Err(CredentialStoreError::Storage(_))));
}

#[rstest]
fn oversized_lifetime_is_rejected(harness: Harness) {
    let result = harness.store.save(token("act.abc"), Some(u64::MAX));
    assert_eq!(
        result,
        Err(CredentialStoreError::LifetimeOutOfRange { seconds: u64::MAX })
    );
}

#[rstest]
fn token_debug_output_is_redacted() {
    let rendered = format!("{:?}", token("act.super-secret"));
    assert!(!rendered.contains("super-secret"));
    assert_eq!(token("act.super-secret").fingerprint().len(), 12);
}

#[rstest]
fn blank_tokens_are_rejected() {
    assert_eq!(
        AccessToken::new("  "),
        Err(AccessTokenValidationError::Empty)
    );
}
