//! Driven port for the ads platform's business API.
//!
//! Adapters return [`AdsApiError::Rejected`] when the platform answers with a
//! non-zero envelope `code`; every other variant describes a transport or
//! decoding failure.

use async_trait::async_trait;
use url::Url;

use super::define_port_error;
use crate::domain::{AccessToken, Advertiser, Pixel, TrackEventReceipt, TrackEventRequest};

/// Result of exchanging an OAuth authorisation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Bearer token for subsequent calls.
    pub access_token: AccessToken,
    /// Token lifetime in seconds, when the platform reports one.
    pub expires_in: Option<u64>,
}

define_port_error! {
    /// Errors surfaced by ads platform adapters.
    pub enum AdsApiError {
        /// The platform processed the call and rejected it.
        Rejected { code: i64, message: String } =>
            "ads api rejected request ({code}): {message}",
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "ads api transport failed: {message}",
        /// The request exceeded the client timeout.
        Timeout { message: String } =>
            "ads api timeout: {message}",
        /// The platform answered with a non-success HTTP status.
        Status { status: u16, message: String } =>
            "ads api returned status {status}: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "ads api response decode failed: {message}",
        /// The adapter could not build the request.
        InvalidRequest { message: String } =>
            "ads api request invalid: {message}",
    }
}

/// Port covering the five platform operations plus the login URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdsApi: Send + Sync {
    /// Build the platform authorisation portal URL carrying `state`.
    fn authorization_url(&self, state: &str) -> Result<Url, AdsApiError>;

    /// Exchange a one-time authorisation code for a token.
    async fn exchange_auth_code(&self, auth_code: &str) -> Result<TokenGrant, AdsApiError>;

    /// List advertiser accounts the token can manage.
    async fn list_advertisers(&self, token: &AccessToken) -> Result<Vec<Advertiser>, AdsApiError>;

    /// Create a web pixel under `advertiser_id`.
    async fn create_pixel(
        &self,
        token: &AccessToken,
        advertiser_id: &str,
        pixel_name: &str,
    ) -> Result<Pixel, AdsApiError>;

    /// List pixels owned by `advertiser_id`.
    async fn list_pixels(
        &self,
        token: &AccessToken,
        advertiser_id: &str,
    ) -> Result<Vec<Pixel>, AdsApiError>;

    /// Report one conversion event.
    async fn track_event(
        &self,
        token: &AccessToken,
        request: &TrackEventRequest,
    ) -> Result<TrackEventReceipt, AdsApiError>;
}

/// Fixture returning one advertiser, echoing created pixels and accepting
/// every event.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::ports::{AdsApi, FixtureAdsApi};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let grant = FixtureAdsApi.exchange_auth_code("abc123").await.unwrap();
/// assert!(grant.expires_in.is_some());
/// # });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureAdsApi;

#[async_trait]
impl AdsApi for FixtureAdsApi {
    fn authorization_url(&self, state: &str) -> Result<Url, AdsApiError> {
        let mut url = Url::parse("https://ads.example.test/portal/auth")
            .map_err(|error| AdsApiError::invalid_request(error.to_string()))?;
        url.query_pairs_mut().append_pair("state", state);
        Ok(url)
    }

    async fn exchange_auth_code(&self, auth_code: &str) -> Result<TokenGrant, AdsApiError> {
        let access_token = AccessToken::new(format!("fixture-token-{auth_code}"))
            .map_err(|error| AdsApiError::decode(error.to_string()))?;
        Ok(TokenGrant {
            access_token,
            expires_in: Some(86_400),
        })
    }

    async fn list_advertisers(&self, _token: &AccessToken) -> Result<Vec<Advertiser>, AdsApiError> {
        Ok(vec![Advertiser::new("fixture-advertiser", "Fixture Store")])
    }

    async fn create_pixel(
        &self,
        _token: &AccessToken,
        _advertiser_id: &str,
        pixel_name: &str,
    ) -> Result<Pixel, AdsApiError> {
        Ok(Pixel::new("1", format!("CODE-{pixel_name}"), pixel_name))
    }

    async fn list_pixels(
        &self,
        _token: &AccessToken,
        _advertiser_id: &str,
    ) -> Result<Vec<Pixel>, AdsApiError> {
        Ok(Vec::new())
    }

    async fn track_event(
        &self,
        _token: &AccessToken,
        request: &TrackEventRequest,
    ) -> Result<TrackEventReceipt, AdsApiError> {
        Ok(TrackEventReceipt {
            request_id: None,
            event_id: request.event_id,
        })
    }
}
