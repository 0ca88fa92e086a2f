//! Serialisable snapshot of the workflow for presentation shells.

use serde::Serialize;

use super::service::Session;
use super::stage::{Stage, StageName};
use super::WorkflowOptions;
use crate::domain::{Advertiser, Pixel};

const CHECKOUT_INSTRUCTIONS: &str = "In Hotmart, open Tools > Tracking pixels, choose TikTok, \
     paste this pixel code and save. Then publish your Google Tag Manager container.";

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Progress information.
    Info,
    /// Non-fatal condition the user should look at.
    Warning,
    /// A failed action.
    Error,
}

/// Message shown to the user until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text.
    pub message: String,
}

impl Notice {
    /// Informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// Error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Actions that may be running against the ads platform or the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Access gate check.
    VerifyingAccess,
    /// OAuth code exchange.
    ExchangingCode,
    /// Advertiser listing.
    LoadingAdvertisers,
    /// Pixel listing.
    LoadingPixels,
    /// Pixel creation.
    CreatingPixel,
    /// Test event dispatch.
    SendingEvent,
}

impl Action {
    /// Snake-case identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VerifyingAccess => "verifying_access",
            Self::ExchangingCode => "exchanging_code",
            Self::LoadingAdvertisers => "loading_advertisers",
            Self::LoadingPixels => "loading_pixels",
            Self::CreatingPixel => "creating_pixel",
            Self::SendingEvent => "sending_event",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-flight flag per [`Action`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InFlight {
    /// See [`Action::VerifyingAccess`].
    pub verifying_access: bool,
    /// See [`Action::ExchangingCode`].
    pub exchanging_code: bool,
    /// See [`Action::LoadingAdvertisers`].
    pub loading_advertisers: bool,
    /// See [`Action::LoadingPixels`].
    pub loading_pixels: bool,
    /// See [`Action::CreatingPixel`].
    pub creating_pixel: bool,
    /// See [`Action::SendingEvent`].
    pub sending_event: bool,
}

impl InFlight {
    /// Whether `action` is running.
    pub const fn is_set(&self, action: Action) -> bool {
        match action {
            Action::VerifyingAccess => self.verifying_access,
            Action::ExchangingCode => self.exchanging_code,
            Action::LoadingAdvertisers => self.loading_advertisers,
            Action::LoadingPixels => self.loading_pixels,
            Action::CreatingPixel => self.creating_pixel,
            Action::SendingEvent => self.sending_event,
        }
    }

    pub(super) fn set(&mut self, action: Action, running: bool) {
        let flag = match action {
            Action::VerifyingAccess => &mut self.verifying_access,
            Action::ExchangingCode => &mut self.exchanging_code,
            Action::LoadingAdvertisers => &mut self.loading_advertisers,
            Action::LoadingPixels => &mut self.loading_pixels,
            Action::CreatingPixel => &mut self.creating_pixel,
            Action::SendingEvent => &mut self.sending_event,
        };
        *flag = running;
    }
}

/// Which controls the presentation shell should enable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    /// Login link may be followed.
    pub can_login: bool,
    /// Pixel creation may be requested.
    pub can_create_pixel: bool,
    /// An existing pixel may be chosen.
    pub can_select_pixel: bool,
    /// The test event may be sent.
    pub can_send_event: bool,
    /// The checkout configuration may be acknowledged.
    pub can_acknowledge: bool,
}

/// What to paste into the checkout platform once a pixel exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutHint {
    /// Pixel code to paste.
    pub pixel_code: String,
    /// Setup instructions.
    pub instructions: String,
}

/// Snapshot of the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowView {
    /// One-based step number.
    pub step: u8,
    /// Stage name.
    pub stage: StageName,
    /// Advertisers available for selection.
    pub advertisers: Vec<Advertiser>,
    /// Chosen advertiser id.
    pub selected_advertiser_id: Option<String>,
    /// Known pixels for the chosen advertiser.
    pub pixels: Vec<Pixel>,
    /// Created or selected pixel.
    pub pixel: Option<Pixel>,
    /// Generated pixel name used when none is supplied.
    pub suggested_pixel_name: String,
    /// External id sent with the test event.
    pub external_id: String,
    /// Address that passed the access gate.
    pub verified_email: Option<String>,
    /// Whether the test event was accepted.
    pub event_sent: bool,
    /// Running actions.
    pub in_flight: InFlight,
    /// Enabled controls.
    pub controls: Controls,
    /// Current notice.
    pub notice: Option<Notice>,
    /// Checkout setup hint, present once a pixel is ready.
    pub checkout_hint: Option<CheckoutHint>,
}

impl WorkflowView {
    pub(super) fn snapshot(session: &Session, options: WorkflowOptions) -> Self {
        let stage = &session.stage;
        let name = stage.name();
        let in_flight = session.in_flight;

        let (advertisers, selected_advertiser_id, pixels) = match stage {
            Stage::Unauthenticated { .. } => (Vec::new(), None, Vec::new()),
            Stage::SelectingPixel(selection) => (
                selection.advertisers.clone(),
                selection.selected_advertiser.clone(),
                selection.pixels.clone(),
            ),
            Stage::PixelReady(context)
            | Stage::EventSent(context)
            | Stage::ExternalConfigAcknowledged(context) => (
                context.advertisers.clone(),
                Some(context.advertiser_id.clone()),
                context.pixels.clone(),
            ),
        };
        let pixel = stage.pixel_context().map(|context| context.pixel.clone());
        let gate_passed = !options.require_access_gate || session.verified_email.is_some();

        let controls = Controls {
            can_login: name == StageName::Unauthenticated
                && gate_passed
                && !in_flight.exchanging_code,
            can_create_pixel: name == StageName::SelectingPixel && !in_flight.creating_pixel,
            can_select_pixel: options.list_existing_pixels
                && name == StageName::SelectingPixel
                && selected_advertiser_id.is_some()
                && !pixels.is_empty()
                && !in_flight.creating_pixel,
            can_send_event: name == StageName::PixelReady && !in_flight.sending_event,
            can_acknowledge: options.external_checkout_step && name == StageName::EventSent,
        };

        let checkout_hint = pixel
            .as_ref()
            .filter(|_| options.external_checkout_step)
            .map(|pixel| CheckoutHint {
                pixel_code: pixel.pixel_code.clone(),
                instructions: CHECKOUT_INSTRUCTIONS.to_owned(),
            });

        Self {
            step: name.step(),
            stage: name,
            advertisers,
            selected_advertiser_id,
            pixels,
            pixel,
            suggested_pixel_name: session.pixel_name.to_string(),
            external_id: session.external_id.to_string(),
            verified_email: session
                .verified_email
                .as_ref()
                .map(|email| email.as_str().to_owned()),
            event_sent: matches!(
                name,
                StageName::EventSent | StageName::ExternalConfigAcknowledged
            ),
            in_flight,
            controls,
            notice: session.notice.clone(),
            checkout_hint,
        }
    }
}
