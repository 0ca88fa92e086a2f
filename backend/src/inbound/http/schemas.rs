//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror the serialised shape of their domain counterparts and
//! exist only for documentation.

#![expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The TikTok session is missing or expired.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The access gate has not been passed or denied the address.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The action is not part of the active profile.
    #[schema(rename = "not_found")]
    NotFound,
    /// The action conflicts with the workflow stage or a running action.
    #[schema(rename = "conflict")]
    Conflict,
    /// The ads platform rejected the call.
    #[schema(rename = "upstream_failure")]
    UpstreamFailure,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// Failure envelope rendered for every [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = ErrorEnvelope)]
#[schema(rename_all = "camelCase")]
pub struct ErrorEnvelopeSchema {
    /// Always `false`.
    #[schema(example = false)]
    success: bool,
    /// Human-readable message.
    #[schema(example = "currency: is required")]
    error: String,
    /// Stable machine-readable error code.
    code: ErrorCodeSchema,
    /// Supplementary details such as the offending field.
    details: Option<serde_json::Value>,
    /// Correlation identifier, also sent as the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
}

/// `{"success": true}` without data.
#[derive(ToSchema)]
#[schema(as = Acknowledgement)]
pub struct AcknowledgementSchema {
    /// Always `true`.
    #[schema(example = true)]
    success: bool,
}

/// OpenAPI schema for [`crate::domain::Advertiser`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Advertiser)]
#[schema(rename_all = "camelCase")]
pub struct AdvertiserSchema {
    #[schema(example = "7001")]
    advertiser_id: String,
    #[schema(example = "Acme Store")]
    advertiser_name: String,
}

/// OpenAPI schema for [`crate::domain::Pixel`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Pixel)]
#[schema(rename_all = "camelCase")]
pub struct PixelSchema {
    #[schema(example = "7339000000000000001")]
    pixel_id: String,
    #[schema(example = "C1ABCDEF2GHIJ3KLMNOP")]
    pixel_code: String,
    #[schema(example = "PX-AB12CD34")]
    pixel_name: String,
}

/// OpenAPI schema for [`crate::domain::workflow::StageName`].
#[derive(ToSchema)]
#[schema(as = crate::domain::workflow::StageName)]
pub enum StageNameSchema {
    #[schema(rename = "unauthenticated")]
    Unauthenticated,
    #[schema(rename = "selecting_pixel")]
    SelectingPixel,
    #[schema(rename = "pixel_ready")]
    PixelReady,
    #[schema(rename = "event_sent")]
    EventSent,
    #[schema(rename = "external_config_acknowledged")]
    ExternalConfigAcknowledged,
}

/// OpenAPI schema for [`crate::domain::workflow::NoticeLevel`].
#[derive(ToSchema)]
#[schema(as = crate::domain::workflow::NoticeLevel)]
pub enum NoticeLevelSchema {
    #[schema(rename = "info")]
    Info,
    #[schema(rename = "warning")]
    Warning,
    #[schema(rename = "error")]
    Error,
}

/// OpenAPI schema for [`crate::domain::workflow::Notice`].
#[derive(ToSchema)]
#[schema(as = crate::domain::workflow::Notice)]
pub struct NoticeSchema {
    level: NoticeLevelSchema,
    message: String,
}

/// OpenAPI schema for [`crate::domain::workflow::InFlight`].
#[derive(ToSchema)]
#[schema(as = crate::domain::workflow::InFlight)]
#[schema(rename_all = "camelCase")]
pub struct InFlightSchema {
    verifying_access: bool,
    exchanging_code: bool,
    loading_advertisers: bool,
    loading_pixels: bool,
    creating_pixel: bool,
    sending_event: bool,
}

/// OpenAPI schema for [`crate::domain::workflow::Controls`].
#[derive(ToSchema)]
#[schema(as = crate::domain::workflow::Controls)]
#[schema(rename_all = "camelCase")]
pub struct ControlsSchema {
    can_login: bool,
    can_create_pixel: bool,
    can_select_pixel: bool,
    can_send_event: bool,
    can_acknowledge: bool,
}

/// OpenAPI schema for [`crate::domain::workflow::CheckoutHint`].
#[derive(ToSchema)]
#[schema(as = crate::domain::workflow::CheckoutHint)]
#[schema(rename_all = "camelCase")]
pub struct CheckoutHintSchema {
    pixel_code: String,
    instructions: String,
}

/// OpenAPI schema for [`crate::domain::workflow::WorkflowView`].
#[derive(ToSchema)]
#[schema(as = crate::domain::workflow::WorkflowView)]
#[schema(rename_all = "camelCase")]
pub struct WorkflowViewSchema {
    /// One-based step number.
    #[schema(minimum = 1, maximum = 5, example = 2)]
    step: u8,
    stage: StageNameSchema,
    advertisers: Vec<AdvertiserSchema>,
    selected_advertiser_id: Option<String>,
    pixels: Vec<PixelSchema>,
    pixel: Option<PixelSchema>,
    #[schema(example = "PX-AB12CD34")]
    suggested_pixel_name: String,
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    external_id: String,
    verified_email: Option<String>,
    event_sent: bool,
    in_flight: InFlightSchema,
    controls: ControlsSchema,
    notice: Option<NoticeSchema>,
    checkout_hint: Option<CheckoutHintSchema>,
}

/// `{"success": true, "data": WorkflowView}`.
#[derive(ToSchema)]
#[schema(as = WorkflowEnvelope)]
pub struct WorkflowEnvelopeSchema {
    #[schema(example = true)]
    success: bool,
    data: WorkflowViewSchema,
}

/// OpenAPI schema for [`crate::domain::TrackEventReceipt`].
#[derive(ToSchema)]
#[schema(as = crate::domain::TrackEventReceipt)]
#[schema(rename_all = "camelCase")]
pub struct TrackEventReceiptSchema {
    /// Upstream request identifier, when supplied.
    request_id: Option<String>,
    /// Event id sent with the request.
    #[schema(value_type = String, format = Uuid)]
    event_id: String,
}

/// `{"success": true, "data": TrackEventReceipt}`.
#[derive(ToSchema)]
#[schema(as = TrackEventEnvelope)]
pub struct TrackEventEnvelopeSchema {
    #[schema(example = true)]
    success: bool,
    data: TrackEventReceiptSchema,
}
