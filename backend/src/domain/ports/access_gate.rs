//! Driven port deciding whether an email address may start onboarding.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{AccessDecision, EmailAddress};

define_port_error! {
    /// Errors raised while evaluating the gate.
    pub enum AccessGateError {
        /// The gate's backing source could not be consulted.
        Unavailable { message: String } =>
            "access gate unavailable: {message}",
    }
}

/// Pass/fail check on an email address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// Decide whether `email` is granted access.
    async fn verify(&self, email: &EmailAddress) -> Result<AccessDecision, AccessGateError>;
}

/// Fixture granting every address.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureAccessGate;

#[async_trait]
impl AccessGate for FixtureAccessGate {
    async fn verify(&self, _email: &EmailAddress) -> Result<AccessDecision, AccessGateError> {
        Ok(AccessDecision::Granted)
    }
}
