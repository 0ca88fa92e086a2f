//! Remote API gateway: required-field validation in front of the ads port.
//!
//! Each operation validates its raw inputs, then performs exactly one port
//! call and normalises the outcome into [`GatewayError`]. Validation
//! failures never reach the port. There are no retries.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

use super::ports::{AdsApi, AdsApiError, TokenGrant};
use super::{
    AccessToken, Advertiser, ContactDetails, Currency, EmailAddress, ExternalId, PhoneNumber,
    Pixel, ProductDetails, TEST_EVENT_NAME, TrackEventReceipt, TrackEventRequest,
};

const UPSTREAM_FALLBACK_MESSAGE: &str = "The ads platform rejected the request.";
const REQUIRED: &str = "is required";

/// What is wrong with a validated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// The field is absent or blank.
    Missing,
    /// The field is present but malformed.
    Invalid,
}

/// Normalised failure of a gateway operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Local input error. No network call was made.
    #[error("{field}: {message}")]
    Validation {
        /// Name of the offending input field.
        field: &'static str,
        /// Whether the field is missing or malformed.
        kind: ValidationKind,
        /// What is wrong with it.
        message: String,
    },
    /// The platform answered with a non-zero `code`.
    #[error("{message}")]
    Upstream {
        /// Platform error code.
        code: i64,
        /// Platform message, or a generic fallback.
        message: String,
    },
    /// Transport, status or decoding failure.
    #[error("{message}")]
    Unexpected {
        /// Internal description; not for end users.
        message: String,
    },
}

impl GatewayError {
    /// `field` is absent or blank.
    pub fn missing(field: &'static str) -> Self {
        Self::Validation {
            field,
            kind: ValidationKind::Missing,
            message: REQUIRED.to_owned(),
        }
    }

    /// `field` is present but malformed.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            kind: ValidationKind::Invalid,
            message: message.into(),
        }
    }

    /// Message suitable for end users; unexpected failures are redacted.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { .. } | Self::Upstream { .. } => self.to_string(),
            Self::Unexpected { .. } => {
                "Something went wrong talking to the ads platform. Please try again.".to_owned()
            }
        }
    }

    fn from_port(operation: &'static str, port_error: AdsApiError) -> Self {
        match port_error {
            AdsApiError::Rejected { code, message } => {
                warn!(operation, code, %message, "ads platform rejected request");
                let message = if message.trim().is_empty() {
                    UPSTREAM_FALLBACK_MESSAGE.to_owned()
                } else {
                    message
                };
                Self::Upstream { code, message }
            }
            other => {
                error!(operation, error = %other, "ads platform call failed");
                Self::Unexpected {
                    message: other.to_string(),
                }
            }
        }
    }
}

/// Uniform `{success, data | error}` result of a gateway action.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::{ActionOutcome, GatewayError};
///
/// let outcome: ActionOutcome<u8> = Err(GatewayError::missing("currency")).into();
/// let json = serde_json::to_value(&outcome).unwrap();
/// assert_eq!(json["success"], false);
/// assert_eq!(json["error"], "currency: is required");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ActionOutcome<T> {
    /// Successful outcome carrying `data`.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed outcome carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Whether the action succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T> From<Result<T, GatewayError>> for ActionOutcome<T> {
    fn from(result: Result<T, GatewayError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(error.user_message()),
        }
    }
}

/// Raw input for [`AdsGateway::send_track_event`].
///
/// Blank strings count as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackEventInput {
    /// Bearer token.
    pub access_token: Option<String>,
    /// Pixel receiving the event.
    pub pixel_code: Option<String>,
    /// Client-generated user id.
    pub external_id: Option<String>,
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
    /// OAuth click id, when known.
    pub ttclid: Option<String>,
    /// Originating page, when known.
    pub page_url: Option<String>,
}

/// Domain service fronting the [`AdsApi`] port.
#[derive(Clone)]
pub struct AdsGateway {
    api: Arc<dyn AdsApi>,
    clock: Arc<dyn Clock>,
}

impl AdsGateway {
    /// Wrap `api`, stamping events with time from `clock`.
    pub fn new(api: Arc<dyn AdsApi>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    /// Platform login URL carrying the anti-forgery `state`.
    pub fn authorization_url(&self, state: &str) -> Result<Url, GatewayError> {
        let state = required("state", Some(state))?;
        self.api
            .authorization_url(state)
            .map_err(|port_error| GatewayError::from_port("authorization_url", port_error))
    }

    /// Exchange a one-time OAuth code for a token.
    pub async fn exchange_auth_code(&self, auth_code: &str) -> Result<TokenGrant, GatewayError> {
        let auth_code = required("authCode", Some(auth_code))?;
        let grant = self
            .api
            .exchange_auth_code(auth_code)
            .await
            .map_err(|port_error| GatewayError::from_port("exchange_auth_code", port_error))?;
        info!(
            fingerprint = %grant.access_token.fingerprint(),
            expires_in = ?grant.expires_in,
            "authorisation code exchanged"
        );
        Ok(grant)
    }

    /// List advertisers reachable with `access_token`.
    pub async fn list_advertisers(&self, access_token: &str) -> Result<Vec<Advertiser>, GatewayError> {
        let token = access_token_field(Some(access_token))?;
        let advertisers = self
            .api
            .list_advertisers(&token)
            .await
            .map_err(|port_error| GatewayError::from_port("list_advertisers", port_error))?;
        info!(count = advertisers.len(), "advertisers listed");
        Ok(advertisers)
    }

    /// Create a pixel named `pixel_name` under the selected advertiser.
    ///
    /// `advertiser_id` is `None` when no advertiser has been selected.
    pub async fn create_pixel(
        &self,
        access_token: &str,
        advertiser_id: Option<&str>,
        pixel_name: &str,
    ) -> Result<Pixel, GatewayError> {
        let token = access_token_field(Some(access_token))?;
        let advertiser_id = required("advertiserId", advertiser_id)?;
        let pixel_name = required("pixelName", Some(pixel_name))?;
        let pixel = self
            .api
            .create_pixel(&token, advertiser_id, pixel_name)
            .await
            .map_err(|port_error| GatewayError::from_port("create_pixel", port_error))?;
        info!(advertiser_id, pixel_code = %pixel.pixel_code, "pixel created");
        Ok(pixel)
    }

    /// List pixels owned by `advertiser_id`.
    pub async fn list_pixels(
        &self,
        access_token: &str,
        advertiser_id: &str,
    ) -> Result<Vec<Pixel>, GatewayError> {
        let token = access_token_field(Some(access_token))?;
        let advertiser_id = required("advertiserId", Some(advertiser_id))?;
        let pixels = self
            .api
            .list_pixels(&token, advertiser_id)
            .await
            .map_err(|port_error| GatewayError::from_port("list_pixels", port_error))?;
        info!(advertiser_id, count = pixels.len(), "pixels listed");
        Ok(pixels)
    }

    /// Validate `input`, assemble the event and send it once.
    pub async fn send_track_event(
        &self,
        input: TrackEventInput,
    ) -> Result<TrackEventReceipt, GatewayError> {
        let (token, request) = self.build_track_event(input)?;
        let receipt = self
            .api
            .track_event(&token, &request)
            .await
            .map_err(|port_error| GatewayError::from_port("send_track_event", port_error))?;
        info!(
            pixel_code = %request.pixel_code,
            event_id = %request.event_id,
            "test event sent"
        );
        Ok(receipt)
    }

    fn build_track_event(
        &self,
        input: TrackEventInput,
    ) -> Result<(AccessToken, TrackEventRequest), GatewayError> {
        let token = access_token_field(input.access_token.as_deref())?;
        let pixel_code = required("pixelCode", input.pixel_code.as_deref())?.to_owned();
        let external_id = input
            .external_id
            .as_deref()
            .and_then(ExternalId::parse)
            .ok_or_else(|| GatewayError::missing("externalId"))?;
        let product_name = required("productName", input.product_name.as_deref())?.to_owned();
        let price = match input.product_price {
            None => return Err(GatewayError::missing("productPrice")),
            Some(price) if !price.is_finite() || price < 0.0 => {
                return Err(GatewayError::invalid(
                    "productPrice",
                    "must be a finite, non-negative number",
                ));
            }
            Some(price) => price,
        };
        let currency = Currency::parse(required("currency", input.currency.as_deref())?)
            .map_err(|err| GatewayError::invalid("currency", err.to_string()))?;
        let email = optional(input.email.as_deref())
            .map(EmailAddress::parse)
            .transpose()
            .map_err(|err| GatewayError::invalid("email", err.to_string()))?;
        let phone = optional(input.phone.as_deref())
            .map(PhoneNumber::parse)
            .transpose()
            .map_err(|err| GatewayError::invalid("phone", err.to_string()))?;

        let request = TrackEventRequest {
            pixel_code,
            event: TEST_EVENT_NAME,
            event_id: Uuid::new_v4(),
            event_time: self.clock.utc(),
            external_id,
            contact: ContactDetails { email, phone },
            product: ProductDetails {
                name: product_name,
                description: optional(input.product_description.as_deref()).map(str::to_owned),
                price,
            },
            currency,
            ttclid: optional(input.ttclid.as_deref()).map(str::to_owned),
            page_url: optional(input.page_url.as_deref()).map(str::to_owned),
        };
        Ok((token, request))
    }
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, GatewayError> {
    optional(value).ok_or_else(|| GatewayError::missing(field))
}

fn access_token_field(value: Option<&str>) -> Result<AccessToken, GatewayError> {
    let raw = required("accessToken", value)?;
    AccessToken::new(raw).map_err(|err| GatewayError::invalid("accessToken", err.to_string()))
}
