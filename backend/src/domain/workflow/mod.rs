//! Onboarding workflow: stages, transitions and the orchestrator.
//!
//! [`transition`] is the pure state machine. [`OnboardingWorkflow`] drives it
//! with one gateway call per forward step, guards each action with an
//! in-flight flag and discards responses that arrive after a reset.

mod options;
mod service;
mod stage;
mod view;

pub use options::{UnknownProfile, WorkflowOptions, WorkflowProfile};
pub use service::{AuthorizationCallback, OnboardingWorkflow, TestEventInput, WorkflowPorts};
pub use stage::{Event, PixelContext, Selection, Stage, StageName, TransitionError, transition};
pub use view::{Action, CheckoutHint, Controls, InFlight, Notice, NoticeLevel, WorkflowView};

use thiserror::Error;

use super::ports::AccessGateError;
use super::{CredentialStoreError, EmailValidationError, GatewayError};

/// Failures of orchestrator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The action is not valid in the current stage.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// Another invocation of the same action is running.
    #[error("{action} is already in progress")]
    ActionInFlight {
        /// The running action.
        action: Action,
    },
    /// The workflow was reset while the action was running; its result was
    /// discarded.
    #[error("the onboarding session was reset while this action was running")]
    Stale,
    /// The gateway rejected or failed the call.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The supplied email address is malformed.
    #[error(transparent)]
    InvalidEmail(#[from] EmailValidationError),
    /// The access gate denied the address.
    #[error("access denied: {reason}")]
    AccessDenied {
        /// Gate explanation.
        reason: String,
    },
    /// The profile requires a verified email before login.
    #[error("verify your email address before connecting TikTok")]
    AccessGateRequired,
    /// The action needs a credential and none exists.
    #[error("connect your TikTok account first")]
    NotAuthenticated,
    /// The credential expired; the workflow was reset.
    #[error("your TikTok session expired; please log in again")]
    SessionExpired,
    /// The OAuth `state` does not belong to this session.
    #[error("the authorisation response does not belong to this onboarding session")]
    StateMismatch,
    /// The action is disabled by the active profile.
    #[error("{action} is not part of this onboarding profile")]
    NotInProfile {
        /// The disabled action.
        action: &'static str,
    },
    /// The access gate failed.
    #[error(transparent)]
    AccessGate(#[from] AccessGateError),
    /// The credential could not be persisted.
    #[error(transparent)]
    Credential(#[from] CredentialStoreError),
    /// The workflow state lock was poisoned.
    #[error("workflow state lock poisoned")]
    Poisoned,
}
