//! Access gate adapters.

mod allowlist;

pub use allowlist::{AllowlistAccessGate, AllowlistEntryError};
