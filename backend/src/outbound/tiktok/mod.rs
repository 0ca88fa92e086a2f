//! TikTok Business API outbound adapter.
//!
//! This module provides a thin HTTP implementation of the `AdsApi` port.

mod dto;
mod http_api;

pub use http_api::TikTokHttpApi;
