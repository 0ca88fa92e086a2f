//! The onboarding orchestrator.
//!
//! State lives behind a `std::sync::Mutex` that is locked only for short
//! synchronous sections and never across an `.await`. Each call captures the
//! session generation before awaiting; a completion for an older generation
//! is discarded.

use std::sync::{Arc, Mutex, MutexGuard};

use mockable::Clock;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use super::stage::{Event, Stage, TransitionError, transition};
use super::view::{Action, InFlight, Notice, WorkflowView};
use super::{WorkflowError, WorkflowOptions};
use crate::domain::ports::{AccessGate, AdsApi, CredentialStorage};
use crate::domain::{
    AccessDecision, AccessToken, AdsGateway, CredentialStore, EmailAddress, ExternalId,
    GatewayError, PixelName, TrackEventInput,
};

const NO_ADVERTISERS: &str =
    "No advertiser accounts were found for this TikTok login. Create one in TikTok Ads Manager, then reload.";
const SESSION_EXPIRED: &str = "Your TikTok session expired. Please log in again.";
const ACCESS_CONFIRMED: &str = "Access confirmed. You can now connect your TikTok account.";
const EVENT_ACCEPTED: &str =
    "Test event sent. Look for the CompletePayment event in TikTok Events Manager.";

/// Driven ports the workflow depends on.
#[derive(Clone)]
pub struct WorkflowPorts {
    /// Ads platform API.
    pub ads_api: Arc<dyn AdsApi>,
    /// Raw credential storage.
    pub credential_storage: Arc<dyn CredentialStorage>,
    /// Email access gate.
    pub access_gate: Arc<dyn AccessGate>,
}

/// Query parameters of the OAuth redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationCallback {
    /// One-time code to exchange.
    pub auth_code: Option<String>,
    /// Click id for attributing events.
    pub ttclid: Option<String>,
    /// Error reported by the platform instead of a code.
    pub error: Option<String>,
    /// Human-readable detail accompanying `error`.
    pub error_description: Option<String>,
    /// Anti-forgery value echoed from the authorisation URL.
    pub state: Option<String>,
}

/// User-supplied fields of the test event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestEventInput {
    /// Optional buyer email.
    pub email: Option<String>,
    /// Optional buyer phone.
    pub phone: Option<String>,
    /// Product display name.
    pub product_name: Option<String>,
    /// Optional product description.
    pub product_description: Option<String>,
    /// Unit price.
    pub product_price: Option<f64>,
    /// ISO 4217 code.
    pub currency: Option<String>,
    /// Page the event is reported from.
    pub page_url: Option<String>,
}

pub(super) struct Session {
    pub(super) stage: Stage,
    pub(super) generation: u64,
    pub(super) external_id: ExternalId,
    pub(super) pixel_name: PixelName,
    pub(super) verified_email: Option<EmailAddress>,
    pub(super) ttclid: Option<String>,
    pub(super) oauth_state: String,
    pub(super) notice: Option<Notice>,
    pub(super) in_flight: InFlight,
}

impl Session {
    fn fresh(generation: u64) -> Self {
        Self {
            stage: Stage::initial(),
            generation,
            external_id: ExternalId::generate(),
            pixel_name: PixelName::generate(),
            verified_email: None,
            ttclid: None,
            oauth_state: Uuid::new_v4().simple().to_string(),
            notice: None,
            in_flight: InFlight::default(),
        }
    }
}

/// Clears an action's in-flight flag when dropped, unless the session was
/// reset in the meantime.
struct InFlightGuard<'a> {
    workflow: &'a OnboardingWorkflow,
    action: Action,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut session) = self.workflow.session.lock()
            && session.generation == self.generation
        {
            session.in_flight.set(self.action, false);
        }
    }
}

/// Single-user onboarding orchestrator.
pub struct OnboardingWorkflow {
    gateway: AdsGateway,
    credentials: CredentialStore,
    access_gate: Arc<dyn AccessGate>,
    options: WorkflowOptions,
    session: Mutex<Session>,
}

impl OnboardingWorkflow {
    /// Build a workflow in its initial stage.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use pixel_onboarding::domain::ports::{FixtureAccessGate, FixtureAdsApi};
    /// use pixel_onboarding::domain::workflow::{
    ///     OnboardingWorkflow, StageName, WorkflowOptions, WorkflowPorts,
    /// };
    /// use pixel_onboarding::outbound::credential_storage::InMemoryCredentialStorage;
    ///
    /// let workflow = OnboardingWorkflow::new(
    ///     WorkflowPorts {
    ///         ads_api: Arc::new(FixtureAdsApi),
    ///         credential_storage: Arc::new(InMemoryCredentialStorage::default()),
    ///         access_gate: Arc::new(FixtureAccessGate),
    ///     },
    ///     Arc::new(DefaultClock),
    ///     WorkflowOptions::pixel_generator(),
    /// );
    /// assert_eq!(workflow.view().unwrap().stage, StageName::Unauthenticated);
    /// ```
    pub fn new(ports: WorkflowPorts, clock: Arc<dyn Clock>, options: WorkflowOptions) -> Self {
        let WorkflowPorts {
            ads_api,
            credential_storage,
            access_gate,
        } = ports;
        Self {
            gateway: AdsGateway::new(ads_api, clock.clone()),
            credentials: CredentialStore::new(credential_storage, clock),
            access_gate,
            options,
            session: Mutex::new(Session::fresh(0)),
        }
    }

    /// Active profile options.
    pub fn options(&self) -> WorkflowOptions {
        self.options
    }

    /// Current snapshot.
    pub fn view(&self) -> Result<WorkflowView, WorkflowError> {
        let session = self.lock()?;
        Ok(WorkflowView::snapshot(&session, self.options))
    }

    /// Resume from a stored credential, listing advertisers once.
    ///
    /// A session already selecting a pixel with no advertisers lists them
    /// again.
    pub async fn initialize(&self) -> Result<WorkflowView, WorkflowError> {
        let list = {
            let mut session = self.lock()?;
            let relist = matches!(
                &session.stage,
                Stage::SelectingPixel(selection) if selection.advertisers.is_empty()
            );
            if relist {
                true
            } else if session.stage.is_authenticated() || self.credentials.load().is_none() {
                false
            } else {
                session.stage = transition(&session.stage, Event::Authorized)?;
                info!("stored credential found; resuming onboarding");
                true
            }
        };
        if list {
            self.load_advertisers().await?;
        }
        self.view()
    }

    /// List the credential's advertisers again.
    pub async fn reload_advertisers(&self) -> Result<WorkflowView, WorkflowError> {
        self.load_advertisers().await?;
        self.view()
    }

    /// Check `email` against the access gate.
    pub async fn verify_access(&self, email: &str) -> Result<WorkflowView, WorkflowError> {
        let email = EmailAddress::parse(email)?;
        let guard = self.start(Action::VerifyingAccess, |session| {
            check(&session.stage, Event::AccessGranted(email.clone()))
        })?;

        match self.access_gate.verify(&email).await {
            Ok(AccessDecision::Granted) => {
                self.finish(&guard, |session| {
                    session.stage = transition(&session.stage, Event::AccessGranted(email.clone()))?;
                    session.verified_email = Some(email.clone());
                    session.notice = Some(Notice::info(ACCESS_CONFIRMED));
                    Ok(())
                })?;
                info!(domain = email.domain(), "access granted");
            }
            Ok(AccessDecision::Denied { reason }) => {
                info!(domain = email.domain(), "access denied");
                self.finish(&guard, |session| {
                    session.notice = Some(Notice::warning(reason.clone()));
                    Ok(())
                })?;
                return Err(WorkflowError::AccessDenied { reason });
            }
            Err(gate_error) => {
                error!(error = %gate_error, "access gate failed");
                self.finish(&guard, |session| {
                    session.notice = Some(Notice::error(
                        "We could not verify your email right now. Please try again.",
                    ));
                    Ok(())
                })?;
                return Err(WorkflowError::AccessGate(gate_error));
            }
        }
        self.view()
    }

    /// Platform login URL for this session.
    pub fn authorization_url(&self) -> Result<Url, WorkflowError> {
        let state = {
            let session = self.lock()?;
            check(&session.stage, Event::Authorized)?;
            self.ensure_gate_passed(&session)?;
            if session.in_flight.exchanging_code {
                return Err(WorkflowError::ActionInFlight {
                    action: Action::ExchangingCode,
                });
            }
            session.oauth_state.clone()
        };
        Ok(self.gateway.authorization_url(&state)?)
    }

    /// Process the OAuth redirect.
    ///
    /// A platform-reported error only records a notice. A rejected redirect
    /// also leaves an error notice, since the browser lands on the wizard
    /// rather than on the response.
    pub async fn complete_authorization(
        &self,
        callback: AuthorizationCallback,
    ) -> Result<WorkflowView, WorkflowError> {
        let result = self.exchange_callback(callback).await;
        if let Err(err) = &result
            && !matches!(err, WorkflowError::Gateway(_) | WorkflowError::Stale)
            && let Ok(mut session) = self.session.lock()
        {
            session.notice = Some(Notice::error(err.to_string()));
        }
        result
    }

    async fn exchange_callback(
        &self,
        callback: AuthorizationCallback,
    ) -> Result<WorkflowView, WorkflowError> {
        if let Some(reported) = non_blank(callback.error.as_deref()) {
            let detail = non_blank(callback.error_description.as_deref()).unwrap_or(reported);
            warn!(error = reported, "authorisation was not completed");
            let mut session = self.lock()?;
            session.notice = Some(Notice::error(format!(
                "TikTok authorisation was not completed: {detail}"
            )));
            return Ok(WorkflowView::snapshot(&session, self.options));
        }

        let guard = self.start(Action::ExchangingCode, |session| {
            check(&session.stage, Event::Authorized)?;
            if let Some(state) = non_blank(callback.state.as_deref())
                && state != session.oauth_state
            {
                return Err(WorkflowError::StateMismatch);
            }
            self.ensure_gate_passed(session)
        })?;

        let auth_code = callback.auth_code.as_deref().unwrap_or_default();
        let grant = match self.gateway.exchange_auth_code(auth_code).await {
            Ok(grant) => grant,
            Err(gateway_error) => return Err(self.fail(&guard, gateway_error)),
        };

        self.finish(&guard, |session| {
            self.credentials
                .save(grant.access_token, grant.expires_in)?;
            session.stage = transition(&session.stage, Event::Authorized)?;
            session.ttclid = non_blank(callback.ttclid.as_deref()).map(str::to_owned);
            session.notice = None;
            Ok(())
        })?;
        drop(guard);
        info!("authorisation completed");

        self.load_advertisers().await?;
        self.view()
    }

    /// Choose an advertiser; lists its pixels when the profile does.
    pub async fn select_advertiser(
        &self,
        advertiser_id: &str,
    ) -> Result<WorkflowView, WorkflowError> {
        let advertiser_id = advertiser_id.trim().to_owned();
        let select = |session: &mut Session| -> Result<(), WorkflowError> {
            session.stage =
                transition(&session.stage, Event::AdvertiserSelected(advertiser_id.clone()))?;
            Ok(())
        };

        if !self.options.list_existing_pixels {
            let mut session = self.lock()?;
            select(&mut *session)?;
            info!(%advertiser_id, "advertiser selected");
            return Ok(WorkflowView::snapshot(&session, self.options));
        }

        let guard = self.start(Action::LoadingPixels, select)?;
        info!(%advertiser_id, "advertiser selected");
        self.refresh_pixels(&guard, &advertiser_id, true).await?;
        drop(guard);
        self.view()
    }

    /// Create a pixel under the selected advertiser.
    ///
    /// `pixel_name` defaults to the session's generated name.
    pub async fn create_pixel(
        &self,
        pixel_name: Option<&str>,
    ) -> Result<WorkflowView, WorkflowError> {
        let requested_name = non_blank(pixel_name);
        let (guard, advertiser_id, name) = {
            let mut captured = None;
            let guard = self.start(Action::CreatingPixel, |session| {
                let Stage::SelectingPixel(selection) = &session.stage else {
                    return Err(invalid(&session.stage, "pixel_created"));
                };
                let name = requested_name
                    .map_or_else(|| session.pixel_name.to_string(), str::to_owned);
                captured = Some((selection.selected_advertiser.clone(), name));
                Ok(())
            })?;
            let (advertiser_id, name) = captured.unwrap_or_default();
            (guard, advertiser_id, name)
        };

        let token = self.current_token()?;
        let pixel = match self
            .gateway
            .create_pixel(token.expose(), advertiser_id.as_deref(), &name)
            .await
        {
            Ok(pixel) => pixel,
            Err(gateway_error) => return Err(self.fail(&guard, gateway_error)),
        };
        let advertiser_id = advertiser_id.unwrap_or_default();

        let pixel_code = pixel.pixel_code.clone();
        self.finish(&guard, |session| {
            session.stage = transition(
                &session.stage,
                Event::PixelCreated {
                    advertiser_id: advertiser_id.clone(),
                    pixel,
                },
            )?;
            session.notice = Some(Notice::info(format!("Pixel {name} created.")));
            Ok(())
        })?;
        drop(guard);

        if self.options.list_existing_pixels {
            let refreshed = match self.start(Action::LoadingPixels, |_| Ok(())) {
                Ok(guard) => self.refresh_pixels(&guard, &advertiser_id, false).await,
                Err(start_error) => Err(start_error),
            };
            if let Err(refresh_error) = refreshed {
                warn!(
                    error = %refresh_error,
                    %pixel_code,
                    "pixel list refresh after creation failed"
                );
            }
        }
        self.view()
    }

    /// Choose an existing pixel by code.
    pub fn select_pixel(&self, pixel_code: &str) -> Result<WorkflowView, WorkflowError> {
        if !self.options.list_existing_pixels {
            return Err(WorkflowError::NotInProfile {
                action: "select_pixel",
            });
        }
        let mut session = self.lock()?;
        if session.in_flight.creating_pixel {
            return Err(WorkflowError::ActionInFlight {
                action: Action::CreatingPixel,
            });
        }
        let pixel_code = pixel_code.trim().to_owned();
        session.stage = transition(&session.stage, Event::PixelSelected(pixel_code.clone()))?;
        info!(%pixel_code, "existing pixel selected");
        Ok(WorkflowView::snapshot(&session, self.options))
    }

    /// Send the test conversion event for the ready pixel.
    pub async fn send_test_event(
        &self,
        input: TestEventInput,
    ) -> Result<WorkflowView, WorkflowError> {
        let mut captured = None;
        let guard = self.start(Action::SendingEvent, |session| {
            let Stage::PixelReady(context) = &session.stage else {
                return Err(invalid(&session.stage, Event::EventSent.name()));
            };
            captured = Some((
                context.pixel.pixel_code.clone(),
                session.external_id.to_string(),
                session.ttclid.clone(),
            ));
            Ok(())
        })?;
        let (pixel_code, external_id, ttclid) = captured.unwrap_or_default();

        let token = self.current_token()?;
        let request = TrackEventInput {
            access_token: Some(token.expose().to_owned()),
            pixel_code: Some(pixel_code),
            external_id: Some(external_id),
            email: input.email,
            phone: input.phone,
            product_name: input.product_name,
            product_description: input.product_description,
            product_price: input.product_price,
            currency: input.currency,
            ttclid,
            page_url: input.page_url,
        };
        if let Err(gateway_error) = self.gateway.send_track_event(request).await {
            return Err(self.fail(&guard, gateway_error));
        }

        self.finish(&guard, |session| {
            session.stage = transition(&session.stage, Event::EventSent)?;
            session.notice = Some(Notice::info(EVENT_ACCEPTED));
            Ok(())
        })?;
        drop(guard);
        self.view()
    }

    /// Confirm the pixel was configured in the checkout platform.
    pub fn acknowledge_external_configuration(&self) -> Result<WorkflowView, WorkflowError> {
        if !self.options.external_checkout_step {
            return Err(WorkflowError::NotInProfile {
                action: "acknowledge_external_configuration",
            });
        }
        let mut session = self.lock()?;
        session.stage = transition(&session.stage, Event::ExternalConfigAcknowledged)?;
        session.notice = Some(Notice::info("Checkout configuration confirmed."));
        info!("checkout configuration acknowledged");
        Ok(WorkflowView::snapshot(&session, self.options))
    }

    /// Log out and start over with fresh identifiers.
    ///
    /// The session is reset even when the stored credential cannot be
    /// removed; that failure is returned and left as an error notice.
    pub fn reset(&self) -> Result<WorkflowView, WorkflowError> {
        let cleared = self.credentials.clear();
        let mut session = self.lock()?;
        let generation = session.generation.wrapping_add(1);
        *session = Session::fresh(generation);
        if let Err(clear_error) = cleared {
            error!(error = %clear_error, generation, "failed to clear stored credential during reset");
            session.notice = Some(Notice::error(
                "Your TikTok login could not be removed. Please reset again.",
            ));
            return Err(clear_error.into());
        }
        info!(generation, "onboarding reset");
        Ok(WorkflowView::snapshot(&session, self.options))
    }

    /// Clear the current notice.
    pub fn dismiss_notice(&self) -> Result<WorkflowView, WorkflowError> {
        let mut session = self.lock()?;
        session.notice = None;
        Ok(WorkflowView::snapshot(&session, self.options))
    }

    async fn load_advertisers(&self) -> Result<(), WorkflowError> {
        let guard = self.start(Action::LoadingAdvertisers, |session| {
            check(&session.stage, Event::AdvertisersLoaded(Vec::new()))
        })?;
        let token = self.current_token()?;
        let advertisers = match self.gateway.list_advertisers(token.expose()).await {
            Ok(advertisers) => advertisers,
            Err(gateway_error) => return Err(self.fail(&guard, gateway_error)),
        };
        self.finish(&guard, |session| {
            let empty = advertisers.is_empty();
            session.stage = transition(&session.stage, Event::AdvertisersLoaded(advertisers))?;
            session.notice = empty.then(|| Notice::warning(NO_ADVERTISERS));
            Ok(())
        })
    }

    /// List pixels for `advertiser_id`; `notify` records failures as a notice.
    async fn refresh_pixels(
        &self,
        guard: &InFlightGuard<'_>,
        advertiser_id: &str,
        notify: bool,
    ) -> Result<(), WorkflowError> {
        let token = self.current_token()?;
        let pixels = match self.gateway.list_pixels(token.expose(), advertiser_id).await {
            Ok(pixels) => pixels,
            Err(gateway_error) if notify => return Err(self.fail(guard, gateway_error)),
            Err(gateway_error) => return Err(gateway_error.into()),
        };
        self.finish(guard, |session| {
            let event = Event::PixelsLoaded {
                advertiser_id: advertiser_id.to_owned(),
                pixels,
            };
            match transition(&session.stage, event) {
                Ok(stage) => {
                    session.stage = stage;
                    Ok(())
                }
                Err(TransitionError::StaleAdvertiser { advertiser_id }) => {
                    debug!(%advertiser_id, "discarding pixel list for a deselected advertiser");
                    Err(WorkflowError::Stale)
                }
                Err(other) => Err(other.into()),
            }
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>, WorkflowError> {
        self.session.lock().map_err(|_| WorkflowError::Poisoned)
    }

    /// Check preconditions and raise `action`'s in-flight flag atomically.
    fn start(
        &self,
        action: Action,
        prepare: impl FnOnce(&mut Session) -> Result<(), WorkflowError>,
    ) -> Result<InFlightGuard<'_>, WorkflowError> {
        let mut session = self.lock()?;
        if session.in_flight.is_set(action) {
            return Err(WorkflowError::ActionInFlight { action });
        }
        prepare(&mut session)?;
        session.in_flight.set(action, true);
        let generation = session.generation;
        drop(session);
        Ok(InFlightGuard {
            workflow: self,
            action,
            generation,
        })
    }

    /// Apply a completion, unless the session moved on since `guard` began.
    fn finish<T>(
        &self,
        guard: &InFlightGuard<'_>,
        apply: impl FnOnce(&mut Session) -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let mut session = self.lock()?;
        if session.generation != guard.generation {
            debug!(action = %guard.action, "discarding response from a previous session");
            return Err(WorkflowError::Stale);
        }
        session.in_flight.set(guard.action, false);
        apply(&mut session)
    }

    fn fail(&self, guard: &InFlightGuard<'_>, gateway_error: GatewayError) -> WorkflowError {
        let message = gateway_error.user_message();
        match self.finish(guard, |session| {
            session.notice = Some(Notice::error(message));
            Ok(())
        }) {
            Ok(()) => WorkflowError::Gateway(gateway_error),
            Err(other) => other,
        }
    }

    /// Re-read the credential; resets the session when it has expired.
    fn current_token(&self) -> Result<AccessToken, WorkflowError> {
        if let Some(credential) = self.credentials.load() {
            return Ok(credential.token().clone());
        }
        let mut session = self.lock()?;
        if !session.stage.is_authenticated() {
            return Err(WorkflowError::NotAuthenticated);
        }
        let generation = session.generation.wrapping_add(1);
        *session = Session::fresh(generation);
        session.notice = Some(Notice::warning(SESSION_EXPIRED));
        warn!(generation, "credential missing or expired; onboarding reset");
        Err(WorkflowError::SessionExpired)
    }

    fn ensure_gate_passed(&self, session: &Session) -> Result<(), WorkflowError> {
        if self.options.require_access_gate && session.verified_email.is_none() {
            return Err(WorkflowError::AccessGateRequired);
        }
        Ok(())
    }
}

fn check(stage: &Stage, event: Event) -> Result<(), WorkflowError> {
    transition(stage, event)?;
    Ok(())
}

fn invalid(stage: &Stage, event: &'static str) -> WorkflowError {
    WorkflowError::Transition(TransitionError::Invalid {
        stage: stage.name(),
        event,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}
