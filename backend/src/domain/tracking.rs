//! Conversion event payloads sent to the ads platform.
//!
//! [`TrackEventRequest`] is assembled by [`crate::domain::AdsGateway`] after
//! validation and is never mutated afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::EmailAddress;

/// Event name reported for the onboarding test purchase.
pub const TEST_EVENT_NAME: &str = "CompletePayment";

const MAX_PHONE_DIGITS: usize = 15;

/// Client-generated opaque identifier sent with every event.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::ExternalId;
///
/// let id = ExternalId::generate();
/// assert_eq!(id.as_str().len(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalId(String);

impl ExternalId {
    /// Generate a random UUID v4 identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a caller-supplied identifier, rejecting blank values.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for tracking value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingValueError {
    /// Currency is not three ASCII letters.
    #[error("currency must be a three-letter ISO 4217 code")]
    Currency,
    /// Phone number has no digits or too many.
    #[error("phone number must contain between 1 and 15 digits")]
    Phone,
}

/// ISO 4217 currency code, stored uppercase.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::Currency;
///
/// assert_eq!(Currency::parse(" brl ").map(|c| c.to_string()), Ok("BRL".to_owned()));
/// assert!(Currency::parse("REAL").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency(String);

impl Currency {
    /// Validate and normalise a currency code.
    pub fn parse(raw: &str) -> Result<Self, TrackingValueError> {
        let code = raw.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TrackingValueError::Currency);
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Borrow the code.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phone number normalised to `+` followed by its digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Strip formatting characters and validate the digit count.
    ///
    /// # Examples
    /// ```
    /// use pixel_onboarding::domain::PhoneNumber;
    ///
    /// let phone = PhoneNumber::parse("+55 (11) 91234-5678").expect("valid phone");
    /// assert_eq!(phone.as_str(), "+5511912345678");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, TrackingValueError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() || digits.len() > MAX_PHONE_DIGITS {
            return Err(TrackingValueError::Phone);
        }
        Ok(Self(format!("+{digits}")))
    }

    /// Borrow the normalised number.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Optional contact fields attached to the event user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    /// Buyer email, normalised.
    pub email: Option<EmailAddress>,
    /// Buyer phone, normalised.
    pub phone: Option<PhoneNumber>,
}

/// The single product reported in the test purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    /// Product display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Unit price; finite and non-negative.
    pub price: f64,
}

/// Validated conversion event ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEventRequest {
    /// Pixel code used as the event source id.
    pub pixel_code: String,
    /// Event name, always [`TEST_EVENT_NAME`] for onboarding.
    pub event: &'static str,
    /// Unique id for deduplication.
    pub event_id: Uuid,
    /// Instant the event happened.
    pub event_time: DateTime<Utc>,
    /// Client-generated user identifier.
    pub external_id: ExternalId,
    /// Optional buyer contact fields.
    pub contact: ContactDetails,
    /// Purchased product.
    pub product: ProductDetails,
    /// Purchase currency.
    pub currency: Currency,
    /// Click id captured from the OAuth redirect.
    pub ttclid: Option<String>,
    /// Page the event originated from.
    pub page_url: Option<String>,
}

/// Acknowledgement returned by the ads platform for a tracked event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventReceipt {
    /// Upstream request identifier, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Event id sent with the request.
    pub event_id: Uuid,
}
