//! Workflow profiles.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Feature switches distinguishing the two onboarding variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Login requires an email that passed the access gate.
    pub require_access_gate: bool,
    /// Existing pixels are listed and selectable.
    pub list_existing_pixels: bool,
    /// The flow ends with the checkout configuration acknowledgement.
    pub external_checkout_step: bool,
}

impl WorkflowOptions {
    /// The simpler flow: log in, create a pixel, send an event.
    pub const fn pixel_generator() -> Self {
        Self {
            require_access_gate: false,
            list_existing_pixels: false,
            external_checkout_step: false,
        }
    }

    /// The email-gated Hotmart checkout flow.
    pub const fn checkout_integration() -> Self {
        Self {
            require_access_gate: true,
            list_existing_pixels: true,
            external_checkout_step: true,
        }
    }
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::checkout_integration()
    }
}

/// Named preset of [`WorkflowOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkflowProfile {
    /// See [`WorkflowOptions::pixel_generator`].
    PixelGenerator,
    /// See [`WorkflowOptions::checkout_integration`].
    #[default]
    CheckoutIntegration,
}

impl WorkflowProfile {
    /// Options for this preset.
    pub const fn options(self) -> WorkflowOptions {
        match self {
            Self::PixelGenerator => WorkflowOptions::pixel_generator(),
            Self::CheckoutIntegration => WorkflowOptions::checkout_integration(),
        }
    }

    /// Kebab-case configuration name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PixelGenerator => "pixel-generator",
            Self::CheckoutIntegration => "checkout-integration",
        }
    }
}

impl fmt::Display for WorkflowProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised profile name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown onboarding profile `{0}`; expected pixel-generator or checkout-integration")]
pub struct UnknownProfile(pub String);

impl FromStr for WorkflowProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pixel-generator" | "pixel_generator" => Ok(Self::PixelGenerator),
            "checkout-integration" | "checkout_integration" => Ok(Self::CheckoutIntegration),
            other => Err(UnknownProfile(other.to_owned())),
        }
    }
}
