//! Driven ports at the edge of the hexagon.
//!
//! Each trait exposes a typed error enum so adapters map their failures into
//! predictable variants. Fixture implementations sit next to each port.

mod macros;
pub(crate) use macros::define_port_error;

mod access_gate;
mod ads_api;
mod credential_storage;

#[cfg(test)]
pub use access_gate::MockAccessGate;
pub use access_gate::{AccessGate, AccessGateError, FixtureAccessGate};
#[cfg(test)]
pub use ads_api::MockAdsApi;
pub use ads_api::{AdsApi, AdsApiError, FixtureAdsApi, TokenGrant};
#[cfg(test)]
pub use credential_storage::MockCredentialStorage;
pub use credential_storage::{CredentialStorage, CredentialStorageError};
