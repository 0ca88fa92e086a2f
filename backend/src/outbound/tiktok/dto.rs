//! Wire types for the TikTok Business API v1.3.
//!
//! Responses decode into these DTOs first, then map into domain types.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::domain::{Advertiser, Pixel};

/// Envelope wrapping every response.
///
/// `data` stays undecoded until `code` has been checked; error responses
/// often carry an empty object there.
#[derive(Debug, Deserialize)]
pub(super) struct EnvelopeDto {
    pub(super) code: i64,
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default)]
    pub(super) request_id: Option<String>,
    #[serde(default)]
    pub(super) data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct AccessTokenRequestDto<'a> {
    pub(super) app_id: &'a str,
    pub(super) secret: &'a str,
    pub(super) auth_code: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct AccessTokenDataDto {
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AdvertiserListDto {
    #[serde(default)]
    pub(super) list: Vec<AdvertiserDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AdvertiserDto {
    #[serde(deserialize_with = "string_or_number")]
    pub(super) advertiser_id: String,
    #[serde(default)]
    pub(super) advertiser_name: String,
}

impl From<AdvertiserDto> for Advertiser {
    fn from(dto: AdvertiserDto) -> Self {
        Self::new(dto.advertiser_id, dto.advertiser_name)
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PixelCreateRequestDto<'a> {
    pub(super) advertiser_id: &'a str,
    pub(super) pixel_name: &'a str,
    pub(super) pixel_category: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct PixelDto {
    #[serde(deserialize_with = "string_or_number")]
    pub(super) pixel_id: String,
    pub(super) pixel_code: String,
    #[serde(default)]
    pub(super) pixel_name: Option<String>,
}

impl PixelDto {
    /// Map to a domain pixel, naming it `fallback_name` when the platform omits the name.
    pub(super) fn into_pixel(self, fallback_name: &str) -> Pixel {
        let name = self
            .pixel_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| fallback_name.to_owned());
        Pixel::new(self.pixel_id, self.pixel_code, name)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PixelListDto {
    #[serde(default)]
    pub(super) pixels: Vec<PixelDto>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackRequestDto<'a> {
    pub(super) event_source: &'static str,
    pub(super) event_source_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) test_event_code: Option<&'a str>,
    pub(super) data: Vec<TrackEventDto<'a>>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackEventDto<'a> {
    pub(super) event: &'a str,
    pub(super) event_time: i64,
    pub(super) event_id: String,
    pub(super) user: TrackUserDto,
    pub(super) properties: TrackPropertiesDto<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) page: Option<TrackPageDto<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) ad: Option<TrackAdDto<'a>>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackUserDto {
    pub(super) external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackPropertiesDto<'a> {
    pub(super) currency: &'a str,
    pub(super) value: f64,
    pub(super) content_type: &'static str,
    pub(super) contents: Vec<TrackContentDto<'a>>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackContentDto<'a> {
    pub(super) content_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) description: Option<&'a str>,
    pub(super) price: f64,
    pub(super) quantity: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackPageDto<'a> {
    pub(super) url: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackAdDto<'a> {
    pub(super) callback: &'a str,
}

/// Accept ids encoded either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Number(value) => Ok(value.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}
