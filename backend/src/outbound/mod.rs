//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **tiktok**: reqwest client for the TikTok Business API
//! - **credential_storage**: file and in-memory credential storage
//! - **access_gate**: configured email allowlist
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod access_gate;
pub mod credential_storage;
pub mod tiktok;
