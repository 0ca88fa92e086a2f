//! Shared helper utilities for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! the fake ads platform lives here instead of being copied per file.

pub mod fake_tiktok;
