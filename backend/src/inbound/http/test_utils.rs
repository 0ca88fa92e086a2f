//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::AdsGateway;
use crate::domain::ports::{AccessGate, AdsApi, FixtureAdsApi};
use crate::domain::workflow::{OnboardingWorkflow, WorkflowOptions, WorkflowPorts};
use crate::inbound::http::state::HttpState;
use crate::outbound::credential_storage::InMemoryCredentialStorage;
use crate::test_support::MutableClock;

/// Post-login redirect target used by handler tests.
pub const POST_LOGIN_PATH: &str = "/onboarding";

/// Build handler state over `api` and `gate` with in-memory credentials.
pub fn http_state(
    api: Arc<dyn AdsApi>,
    gate: Arc<dyn AccessGate>,
    options: WorkflowOptions,
) -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(MutableClock::at_epoch_secs(1_700_000_000));
    let ports = WorkflowPorts {
        ads_api: api.clone(),
        credential_storage: Arc::new(InMemoryCredentialStorage::default()),
        access_gate: gate.clone(),
    };
    let workflow = OnboardingWorkflow::new(ports, clock.clone(), options);
    HttpState::new(
        Arc::new(workflow),
        AdsGateway::new(api, clock),
        gate,
        POST_LOGIN_PATH,
    )
}

/// Handler state for endpoints that only consult the access gate.
pub fn http_state_with_gate(gate: Arc<dyn AccessGate>) -> HttpState {
    http_state(Arc::new(FixtureAdsApi), gate, WorkflowOptions::default())
}
