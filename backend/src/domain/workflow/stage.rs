//! Onboarding stages and the pure transition function.
//!
//! Forward transitions are monotonic. `Reset` is accepted everywhere and
//! yields the initial stage; any other pair not listed in [`transition`] is
//! rejected.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Advertiser, EmailAddress, Pixel, merge_pixel};

/// Advertiser and pixel choices made while in [`Stage::SelectingPixel`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Advertisers reachable with the credential.
    pub advertisers: Vec<Advertiser>,
    /// Chosen advertiser, always a member of `advertisers`.
    pub selected_advertiser: Option<String>,
    /// Pixels known for the chosen advertiser.
    pub pixels: Vec<Pixel>,
}

impl Selection {
    fn with_advertisers(&self, advertisers: Vec<Advertiser>) -> Self {
        let still_listed = self.selected_advertiser.as_ref().filter(|id| {
            advertisers
                .iter()
                .any(|advertiser| &advertiser.advertiser_id == *id)
        });
        match still_listed {
            Some(id) => Self {
                selected_advertiser: Some(id.clone()),
                pixels: self.pixels.clone(),
                advertisers,
            },
            None => Self {
                advertisers,
                selected_advertiser: None,
                pixels: Vec::new(),
            },
        }
    }

    fn select(&self, advertiser_id: String) -> Result<Self, TransitionError> {
        if !self
            .advertisers
            .iter()
            .any(|advertiser| advertiser.advertiser_id == advertiser_id)
        {
            return Err(TransitionError::UnknownAdvertiser { advertiser_id });
        }
        let pixels = if self.selected_advertiser.as_deref() == Some(advertiser_id.as_str()) {
            self.pixels.clone()
        } else {
            Vec::new()
        };
        Ok(Self {
            advertisers: self.advertisers.clone(),
            selected_advertiser: Some(advertiser_id),
            pixels,
        })
    }

    fn ensure_selected(&self, advertiser_id: &str) -> Result<(), TransitionError> {
        if self.selected_advertiser.as_deref() == Some(advertiser_id) {
            Ok(())
        } else {
            Err(TransitionError::StaleAdvertiser {
                advertiser_id: advertiser_id.to_owned(),
            })
        }
    }

    fn with_pixels(&self, advertiser_id: &str, pixels: Vec<Pixel>) -> Result<Self, TransitionError> {
        self.ensure_selected(advertiser_id)?;
        Ok(Self {
            pixels,
            ..self.clone()
        })
    }

    fn created(&self, advertiser_id: String, pixel: Pixel) -> Result<PixelContext, TransitionError> {
        self.ensure_selected(&advertiser_id)?;
        Ok(PixelContext {
            advertisers: self.advertisers.clone(),
            pixels: merge_pixel(self.pixels.clone(), pixel.clone()),
            advertiser_id,
            pixel,
        })
    }

    fn chosen(&self, pixel_code: String) -> Result<PixelContext, TransitionError> {
        let (Some(advertiser_id), Some(pixel)) = (
            self.selected_advertiser.as_ref(),
            self.pixels.iter().find(|pixel| pixel.pixel_code == pixel_code),
        ) else {
            return Err(TransitionError::UnknownPixel { pixel_code });
        };
        Ok(PixelContext {
            advertisers: self.advertisers.clone(),
            advertiser_id: advertiser_id.clone(),
            pixels: self.pixels.clone(),
            pixel: pixel.clone(),
        })
    }
}

/// The pixel outcome fixed for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelContext {
    /// Advertisers listed before the pixel was fixed.
    pub advertisers: Vec<Advertiser>,
    /// Advertiser owning the pixel.
    pub advertiser_id: String,
    /// Known pixels, always including `pixel`.
    pub pixels: Vec<Pixel>,
    /// The created or selected pixel.
    pub pixel: Pixel,
}

impl PixelContext {
    fn refreshed(&self, advertiser_id: &str, pixels: Vec<Pixel>) -> Result<Self, TransitionError> {
        if advertiser_id != self.advertiser_id {
            return Err(TransitionError::StaleAdvertiser {
                advertiser_id: advertiser_id.to_owned(),
            });
        }
        Ok(Self {
            pixels: merge_pixel(pixels, self.pixel.clone()),
            ..self.clone()
        })
    }
}

/// Position in the linear onboarding sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// No credential. Login may require a verified email.
    Unauthenticated {
        /// Address that passed the access gate, if any.
        access_verified_for: Option<EmailAddress>,
    },
    /// Credential held; choosing an advertiser and a pixel.
    SelectingPixel(Selection),
    /// A pixel has been created or selected.
    PixelReady(PixelContext),
    /// The test event was accepted.
    EventSent(PixelContext),
    /// The user confirmed the pixel is configured in the checkout platform.
    ExternalConfigAcknowledged(PixelContext),
}

impl Default for Stage {
    fn default() -> Self {
        Self::initial()
    }
}

impl Stage {
    /// The stage every session starts in.
    pub const fn initial() -> Self {
        Self::Unauthenticated {
            access_verified_for: None,
        }
    }

    /// Stable name of the stage.
    pub const fn name(&self) -> StageName {
        match self {
            Self::Unauthenticated { .. } => StageName::Unauthenticated,
            Self::SelectingPixel(_) => StageName::SelectingPixel,
            Self::PixelReady(_) => StageName::PixelReady,
            Self::EventSent(_) => StageName::EventSent,
            Self::ExternalConfigAcknowledged(_) => StageName::ExternalConfigAcknowledged,
        }
    }

    /// Whether a credential has been established.
    pub const fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Unauthenticated { .. })
    }

    /// The fixed pixel outcome, once one exists.
    pub const fn pixel_context(&self) -> Option<&PixelContext> {
        match self {
            Self::PixelReady(context)
            | Self::EventSent(context)
            | Self::ExternalConfigAcknowledged(context) => Some(context),
            Self::Unauthenticated { .. } | Self::SelectingPixel(_) => None,
        }
    }
}

/// Serialisable stage identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// See [`Stage::Unauthenticated`].
    Unauthenticated,
    /// See [`Stage::SelectingPixel`].
    SelectingPixel,
    /// See [`Stage::PixelReady`].
    PixelReady,
    /// See [`Stage::EventSent`].
    EventSent,
    /// See [`Stage::ExternalConfigAcknowledged`].
    ExternalConfigAcknowledged,
}

impl StageName {
    /// One-based step number shown to the user.
    pub const fn step(self) -> u8 {
        match self {
            Self::Unauthenticated => 1,
            Self::SelectingPixel => 2,
            Self::PixelReady => 3,
            Self::EventSent => 4,
            Self::ExternalConfigAcknowledged => 5,
        }
    }

    /// Snake-case identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::SelectingPixel => "selecting_pixel",
            Self::PixelReady => "pixel_ready",
            Self::EventSent => "event_sent",
            Self::ExternalConfigAcknowledged => "external_config_acknowledged",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The access gate granted `EmailAddress`.
    AccessGranted(EmailAddress),
    /// A credential became available.
    Authorized,
    /// The advertiser list was (re)loaded.
    AdvertisersLoaded(Vec<Advertiser>),
    /// The user chose an advertiser id.
    AdvertiserSelected(String),
    /// The pixel list for an advertiser was loaded.
    PixelsLoaded {
        /// Advertiser the list belongs to.
        advertiser_id: String,
        /// Pixels returned by the platform.
        pixels: Vec<Pixel>,
    },
    /// A pixel was created under an advertiser.
    PixelCreated {
        /// Advertiser the pixel was created under.
        advertiser_id: String,
        /// The new pixel.
        pixel: Pixel,
    },
    /// The user chose an existing pixel by code.
    PixelSelected(String),
    /// The test event was accepted.
    EventSent,
    /// The user confirmed the checkout configuration.
    ExternalConfigAcknowledged,
    /// Start over.
    Reset,
}

impl Event {
    /// Snake-case identifier used in errors and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AccessGranted(_) => "access_granted",
            Self::Authorized => "authorized",
            Self::AdvertisersLoaded(_) => "advertisers_loaded",
            Self::AdvertiserSelected(_) => "advertiser_selected",
            Self::PixelsLoaded { .. } => "pixels_loaded",
            Self::PixelCreated { .. } => "pixel_created",
            Self::PixelSelected(_) => "pixel_selected",
            Self::EventSent => "event_sent",
            Self::ExternalConfigAcknowledged => "external_config_acknowledged",
            Self::Reset => "reset",
        }
    }
}

/// Reasons [`transition`] rejects an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event is not accepted in the current stage.
    #[error("{event} is not allowed while {stage}")]
    Invalid {
        /// Current stage.
        stage: StageName,
        /// Rejected event.
        event: &'static str,
    },
    /// The advertiser id is not in the advertiser list.
    #[error("advertiser {advertiser_id} is not available")]
    UnknownAdvertiser {
        /// Requested id.
        advertiser_id: String,
    },
    /// The pixel code is not among the loaded pixels.
    #[error("pixel {pixel_code} is not available")]
    UnknownPixel {
        /// Requested code.
        pixel_code: String,
    },
    /// The result belongs to an advertiser that is no longer selected.
    #[error("result for advertiser {advertiser_id} is stale")]
    StaleAdvertiser {
        /// Advertiser the stale result belongs to.
        advertiser_id: String,
    },
}

/// Apply `event` to `stage`, returning the next stage.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::workflow::{Event, Stage, StageName, transition};
///
/// let next = transition(&Stage::initial(), Event::Authorized).unwrap();
/// assert_eq!(next.name(), StageName::SelectingPixel);
/// assert!(transition(&next, Event::EventSent).is_err());
/// ```
pub fn transition(stage: &Stage, event: Event) -> Result<Stage, TransitionError> {
    match (stage, event) {
        (_, Event::Reset) => Ok(Stage::initial()),
        (Stage::Unauthenticated { .. }, Event::AccessGranted(email)) => {
            Ok(Stage::Unauthenticated {
                access_verified_for: Some(email),
            })
        }
        (Stage::Unauthenticated { .. }, Event::Authorized) => {
            Ok(Stage::SelectingPixel(Selection::default()))
        }
        (Stage::SelectingPixel(selection), Event::AdvertisersLoaded(advertisers)) => {
            Ok(Stage::SelectingPixel(selection.with_advertisers(advertisers)))
        }
        (Stage::SelectingPixel(selection), Event::AdvertiserSelected(advertiser_id)) => {
            selection.select(advertiser_id).map(Stage::SelectingPixel)
        }
        (
            Stage::SelectingPixel(selection),
            Event::PixelsLoaded {
                advertiser_id,
                pixels,
            },
        ) => selection
            .with_pixels(&advertiser_id, pixels)
            .map(Stage::SelectingPixel),
        (
            Stage::SelectingPixel(selection),
            Event::PixelCreated {
                advertiser_id,
                pixel,
            },
        ) => selection.created(advertiser_id, pixel).map(Stage::PixelReady),
        (Stage::SelectingPixel(selection), Event::PixelSelected(pixel_code)) => {
            selection.chosen(pixel_code).map(Stage::PixelReady)
        }
        (
            Stage::PixelReady(context),
            Event::PixelsLoaded {
                advertiser_id,
                pixels,
            },
        ) => context
            .refreshed(&advertiser_id, pixels)
            .map(Stage::PixelReady),
        (Stage::PixelReady(context), Event::EventSent) => Ok(Stage::EventSent(context.clone())),
        (Stage::EventSent(context), Event::ExternalConfigAcknowledged) => {
            Ok(Stage::ExternalConfigAcknowledged(context.clone()))
        }
        (stage, event) => Err(TransitionError::Invalid {
            stage: stage.name(),
            event: event.name(),
        }),
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
