//! Credential storage adapters.
//!
//! - **file**: one JSON document inside a capability-scoped directory.
//! - **memory**: process memory, used when no directory is configured.

mod file;
mod memory;

pub use file::{CREDENTIAL_FILENAME, FileCredentialStorage};
pub use memory::InMemoryCredentialStorage;
