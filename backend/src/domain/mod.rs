//! Domain primitives, services and the onboarding workflow.
//!
//! Purpose: Define strongly typed values and the services built on the
//! driven ports. Nothing here performs I/O directly; adapters in
//! `outbound` implement the ports.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - AdsGateway: validated front for the ads platform port.
//! - CredentialStore: persisted access token with expiry.
//! - workflow::OnboardingWorkflow: the staged onboarding orchestrator.

pub mod access;
pub mod advertiser;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod pixel;
pub mod ports;
pub mod trace_id;
pub mod tracking;
pub mod workflow;

pub use self::access::{AccessDecision, EmailAddress, EmailValidationError};
pub use self::advertiser::Advertiser;
pub use self::credential::{
    AccessToken, AccessTokenValidationError, Credential, CredentialStore, CredentialStoreError,
    DEFAULT_TOKEN_LIFETIME_SECS,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::gateway::{ActionOutcome, AdsGateway, GatewayError, TrackEventInput, ValidationKind};
pub use self::pixel::{Pixel, PixelName, merge_pixel};
pub use self::trace_id::TraceId;
pub use self::tracking::{
    ContactDetails, Currency, ExternalId, PhoneNumber, ProductDetails, TEST_EVENT_NAME,
    TrackEventReceipt, TrackEventRequest, TrackingValueError,
};
