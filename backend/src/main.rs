//! Service entry-point: loads configuration, wires adapters and serves the
//! onboarding API.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use pixel_onboarding::domain::AdsGateway;
use pixel_onboarding::domain::ports::{AccessGate, AdsApi, CredentialStorage};
use pixel_onboarding::domain::workflow::{OnboardingWorkflow, WorkflowPorts};
use pixel_onboarding::inbound::http::health::HealthState;
use pixel_onboarding::inbound::http::state::HttpState;
use pixel_onboarding::outbound::access_gate::AllowlistAccessGate;
use pixel_onboarding::outbound::credential_storage::{
    FileCredentialStorage, InMemoryCredentialStorage,
};
use pixel_onboarding::outbound::tiktok::TikTokHttpApi;
use pixel_onboarding::settings::{OnboardingConfig, OnboardingSettings, TikTokSettings};

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let tiktok = TikTokSettings::load_from_env()
        .and_then(TikTokSettings::into_config)
        .map_err(io::Error::other)?;
    let onboarding = OnboardingSettings::load_from_env()
        .and_then(OnboardingSettings::into_config)
        .map_err(io::Error::other)?;

    let ads_api: Arc<dyn AdsApi> = Arc::new(TikTokHttpApi::new(&tiktok).map_err(io::Error::other)?);
    let credential_storage = build_credential_storage(&onboarding)?;
    let allowlist =
        AllowlistAccessGate::new(&onboarding.access_allowlist).map_err(io::Error::other)?;
    if allowlist.is_open() && onboarding.profile.options().require_access_gate {
        warn!("ONBOARDING_ACCESS_ALLOWLIST is empty; every address will be granted");
    }
    let access_gate: Arc<dyn AccessGate> = Arc::new(allowlist);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let workflow = Arc::new(OnboardingWorkflow::new(
        WorkflowPorts {
            ads_api: ads_api.clone(),
            credential_storage,
            access_gate: access_gate.clone(),
        },
        clock.clone(),
        onboarding.profile.options(),
    ));
    match workflow.initialize().await {
        Ok(view) => info!(profile = %onboarding.profile, stage = %view.stage, "workflow ready"),
        Err(error) => warn!(%error, "resuming the stored credential failed"),
    }

    let http_state = HttpState::new(
        workflow,
        AdsGateway::new(ads_api, clock),
        access_gate,
        onboarding.post_login_path.clone(),
    );
    let health_state = web::Data::new(HealthState::new());
    info!(bind_addr = %onboarding.bind_addr, "starting HTTP server");
    let server = create_server(
        health_state,
        ServerConfig::new(onboarding.bind_addr, http_state),
    )?;
    server.await
}

fn build_credential_storage(config: &OnboardingConfig) -> io::Result<Arc<dyn CredentialStorage>> {
    match &config.credential_dir {
        Some(dir) => {
            let storage = FileCredentialStorage::open(dir).map_err(io::Error::other)?;
            info!(path = %storage.path().display(), "using file credential storage");
            Ok(Arc::new(storage))
        }
        None => {
            warn!("ONBOARDING_CREDENTIAL_DIR is unset; credentials last until restart");
            Ok(Arc::new(InMemoryCredentialStorage::default()))
        }
    }
}
