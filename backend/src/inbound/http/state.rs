//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::AdsGateway;
use crate::domain::ports::AccessGate;
use crate::domain::workflow::OnboardingWorkflow;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Process-wide onboarding workflow driven by `/api/onboarding`.
    pub workflow: Arc<OnboardingWorkflow>,
    /// Gateway used by the stateless `/api/track-event` endpoint.
    pub gateway: AdsGateway,
    /// Gate used by the stateless `/api/verify-email` endpoint.
    pub access_gate: Arc<dyn AccessGate>,
    /// Where `/oauth/callback` redirects once the code is processed.
    pub post_login_path: String,
}

impl HttpState {
    /// Bundle the handler dependencies.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use pixel_onboarding::domain::AdsGateway;
    /// use pixel_onboarding::domain::ports::{FixtureAccessGate, FixtureAdsApi};
    /// use pixel_onboarding::domain::workflow::{OnboardingWorkflow, WorkflowOptions, WorkflowPorts};
    /// use pixel_onboarding::inbound::http::state::HttpState;
    /// use pixel_onboarding::outbound::credential_storage::InMemoryCredentialStorage;
    ///
    /// let ports = WorkflowPorts {
    ///     ads_api: Arc::new(FixtureAdsApi),
    ///     credential_storage: Arc::new(InMemoryCredentialStorage::default()),
    ///     access_gate: Arc::new(FixtureAccessGate),
    /// };
    /// let gateway = AdsGateway::new(ports.ads_api.clone(), Arc::new(DefaultClock));
    /// let gate = ports.access_gate.clone();
    /// let workflow = OnboardingWorkflow::new(ports, Arc::new(DefaultClock), WorkflowOptions::default());
    /// let state = HttpState::new(Arc::new(workflow), gateway, gate, "/");
    /// assert_eq!(state.post_login_path, "/");
    /// ```
    pub fn new(
        workflow: Arc<OnboardingWorkflow>,
        gateway: AdsGateway,
        access_gate: Arc<dyn AccessGate>,
        post_login_path: impl Into<String>,
    ) -> Self {
        Self {
            workflow,
            gateway,
            access_gate,
            post_login_path: post_login_path.into(),
        }
    }
}
