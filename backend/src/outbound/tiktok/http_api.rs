//! Reqwest-backed TikTok Business API adapter.
//!
//! This adapter owns transport details only: endpoint construction, the
//! `Access-Token` header, timeout and HTTP error mapping, envelope decoding
//! and identifier hashing.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use super::dto::{
    AccessTokenDataDto, AccessTokenRequestDto, AdvertiserListDto, EnvelopeDto, PixelCreateRequestDto,
    PixelDto, PixelListDto, TrackAdDto, TrackContentDto, TrackEventDto, TrackPageDto,
    TrackPropertiesDto, TrackRequestDto, TrackUserDto,
};
use crate::domain::ports::{AdsApi, AdsApiError, TokenGrant};
use crate::domain::{AccessToken, Advertiser, Pixel, TrackEventReceipt, TrackEventRequest};
use crate::settings::TikTokConfig;

const API_VERSION_PATH: &str = "open_api/v1.3";
const ACCESS_TOKEN_HEADER: &str = "Access-Token";
const PIXEL_CATEGORY: &str = "ONLINE_STORE";
const EVENT_SOURCE: &str = "web";
const CONTENT_TYPE: &str = "product";

/// TikTok Business API client implementing [`AdsApi`].
pub struct TikTokHttpApi {
    client: Client,
    app_id: String,
    secret: Zeroizing<String>,
    redirect_uri: Url,
    api_base_url: Url,
    auth_base_url: Url,
    test_event_code: Option<String>,
}

impl TikTokHttpApi {
    /// Build an adapter using a reqwest client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &TikTokConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            app_id: config.app_id.clone(),
            secret: config.secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            api_base_url: config.api_base_url.clone(),
            auth_base_url: config.auth_base_url.clone(),
            test_event_code: config.test_event_code.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AdsApiError> {
        join_path(&self.api_base_url, &format!("{API_VERSION_PATH}/{path}"))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(T, Option<String>), AdsApiError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(operation, status = status.as_u16(), "ads api responded");
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        decode_envelope(body.as_ref())
    }
}

#[async_trait]
impl AdsApi for TikTokHttpApi {
    fn authorization_url(&self, state: &str) -> Result<Url, AdsApiError> {
        let mut url = join_path(&self.auth_base_url, "portal/auth")?;
        url.query_pairs_mut()
            .append_pair("app_id", &self.app_id)
            .append_pair("state", state)
            .append_pair("redirect_uri", self.redirect_uri.as_str());
        Ok(url)
    }

    async fn exchange_auth_code(&self, auth_code: &str) -> Result<TokenGrant, AdsApiError> {
        let body = AccessTokenRequestDto {
            app_id: &self.app_id,
            secret: self.secret.as_str(),
            auth_code,
        };
        let request = self
            .client
            .post(self.endpoint("oauth2/access_token/")?)
            .json(&body);
        let (data, _): (AccessTokenDataDto, _) = self.call("exchange_auth_code", request).await?;
        let access_token = AccessToken::new(data.access_token)
            .map_err(|error| AdsApiError::decode(format!("access token: {error}")))?;
        Ok(TokenGrant {
            access_token,
            expires_in: data.expires_in,
        })
    }

    async fn list_advertisers(&self, token: &AccessToken) -> Result<Vec<Advertiser>, AdsApiError> {
        let request = self
            .client
            .get(self.endpoint("oauth2/advertiser/get/")?)
            .query(&[("app_id", self.app_id.as_str()), ("secret", self.secret.as_str())])
            .header(ACCESS_TOKEN_HEADER, token.expose());
        let (data, _): (AdvertiserListDto, _) = self.call("list_advertisers", request).await?;
        Ok(data.list.into_iter().map(Advertiser::from).collect())
    }

    async fn create_pixel(
        &self,
        token: &AccessToken,
        advertiser_id: &str,
        pixel_name: &str,
    ) -> Result<Pixel, AdsApiError> {
        let body = PixelCreateRequestDto {
            advertiser_id,
            pixel_name,
            pixel_category: PIXEL_CATEGORY,
        };
        let request = self
            .client
            .post(self.endpoint("pixel/create/")?)
            .header(ACCESS_TOKEN_HEADER, token.expose())
            .json(&body);
        let (data, _): (PixelDto, _) = self.call("create_pixel", request).await?;
        Ok(data.into_pixel(pixel_name))
    }

    async fn list_pixels(
        &self,
        token: &AccessToken,
        advertiser_id: &str,
    ) -> Result<Vec<Pixel>, AdsApiError> {
        let request = self
            .client
            .get(self.endpoint("pixel/list/")?)
            .query(&[("advertiser_id", advertiser_id)])
            .header(ACCESS_TOKEN_HEADER, token.expose());
        let (data, _): (PixelListDto, _) = self.call("list_pixels", request).await?;
        Ok(data
            .pixels
            .into_iter()
            .map(|pixel| {
                let fallback = pixel.pixel_code.clone();
                pixel.into_pixel(&fallback)
            })
            .collect())
    }

    async fn track_event(
        &self,
        token: &AccessToken,
        request: &TrackEventRequest,
    ) -> Result<TrackEventReceipt, AdsApiError> {
        let body = track_body(request, self.test_event_code.as_deref());
        let http_request = self
            .client
            .post(self.endpoint("event/track/")?)
            .header(ACCESS_TOKEN_HEADER, token.expose())
            .json(&body);
        let (_, request_id): (serde_json::Value, _) =
            self.call("track_event", http_request).await?;
        Ok(TrackEventReceipt {
            request_id,
            event_id: request.event_id,
        })
    }
}

fn track_body<'a>(
    request: &'a TrackEventRequest,
    test_event_code: Option<&'a str>,
) -> TrackRequestDto<'a> {
    let product = &request.product;
    TrackRequestDto {
        event_source: EVENT_SOURCE,
        event_source_id: &request.pixel_code,
        test_event_code,
        data: vec![TrackEventDto {
            event: request.event,
            event_time: request.event_time.timestamp(),
            event_id: request.event_id.to_string(),
            user: TrackUserDto {
                external_id: sha256_hex(request.external_id.as_str()),
                email: request
                    .contact
                    .email
                    .as_ref()
                    .map(|email| sha256_hex(email.as_str())),
                phone: request
                    .contact
                    .phone
                    .as_ref()
                    .map(|phone| sha256_hex(phone.as_str())),
            },
            properties: TrackPropertiesDto {
                currency: request.currency.as_str(),
                value: product.price,
                content_type: CONTENT_TYPE,
                contents: vec![TrackContentDto {
                    content_name: &product.name,
                    description: product.description.as_deref(),
                    price: product.price,
                    quantity: 1,
                }],
            },
            page: request.page_url.as_deref().map(|url| TrackPageDto { url }),
            ad: request
                .ttclid
                .as_deref()
                .map(|callback| TrackAdDto { callback }),
        }],
    }
}

fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

fn join_path(base: &Url, path: &str) -> Result<Url, AdsApiError> {
    let joined = format!("{}/{path}", base.as_str().trim_end_matches('/'));
    Url::parse(&joined)
        .map_err(|error| AdsApiError::invalid_request(format!("invalid url {joined}: {error}")))
}

fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<(T, Option<String>), AdsApiError> {
    let envelope: EnvelopeDto = serde_json::from_slice(body).map_err(|error| {
        AdsApiError::decode(format!("invalid TikTok JSON payload: {error}"))
    })?;
    if envelope.code != 0 {
        return Err(AdsApiError::rejected(
            envelope.code,
            envelope.message.unwrap_or_default(),
        ));
    }
    // A success without `data` reads as an empty object, so list payloads
    // decode to empty lists.
    let data = envelope
        .data
        .filter(|data| !data.is_null())
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
    let decoded = serde_json::from_value(data)
        .map_err(|error| AdsApiError::decode(format!("unexpected TikTok data: {error}")))?;
    Ok((decoded, envelope.request_id))
}

fn map_transport_error(error: reqwest::Error) -> AdsApiError {
    if error.is_timeout() {
        AdsApiError::timeout(error.to_string())
    } else {
        AdsApiError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AdsApiError {
    let preview = body_preview(body);
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AdsApiError::timeout(format!("status {}", status.as_u16()))
        }
        _ => AdsApiError::status(status.as_u16(), preview),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
