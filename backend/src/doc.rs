//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every inbound endpoint and the schema wrappers from
//! [`crate::inbound::http::schemas`], which describe domain types without
//! coupling them to utoipa.
//!
//! The generated document is served by Swagger UI in debug builds and
//! exported via `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::inbound::http::onboarding::{
    AccessRequest, AdvertiserRequest, AuthorizationUrlResponse, CreatePixelRequest,
    SelectPixelRequest, TestEventRequest,
};
use crate::inbound::http::schemas::{
    AcknowledgementSchema, AdvertiserSchema, CheckoutHintSchema, ControlsSchema, ErrorCodeSchema,
    ErrorEnvelopeSchema, InFlightSchema, NoticeLevelSchema, NoticeSchema, PixelSchema,
    StageNameSchema, TrackEventEnvelopeSchema, TrackEventReceiptSchema, WorkflowEnvelopeSchema,
    WorkflowViewSchema,
};
use crate::inbound::http::track_event::TrackEventBody;
use crate::inbound::http::verify_email::VerifyEmailRequest;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pixel onboarding API",
        description = "Connect a TikTok Ads account, create a pixel and send a test conversion event."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::verify_email::verify_email,
        crate::inbound::http::track_event::track_event,
        crate::inbound::http::onboarding::get_onboarding,
        crate::inbound::http::onboarding::verify_access,
        crate::inbound::http::onboarding::authorize,
        crate::inbound::http::onboarding::reload_advertisers,
        crate::inbound::http::onboarding::select_advertiser,
        crate::inbound::http::onboarding::create_pixel,
        crate::inbound::http::onboarding::select_pixel,
        crate::inbound::http::onboarding::send_test_event,
        crate::inbound::http::onboarding::acknowledge,
        crate::inbound::http::onboarding::reset,
        crate::inbound::http::onboarding::dismiss_notice,
        crate::inbound::http::oauth_callback::oauth_callback,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorCodeSchema,
        ErrorEnvelopeSchema,
        AcknowledgementSchema,
        AdvertiserSchema,
        PixelSchema,
        StageNameSchema,
        NoticeLevelSchema,
        NoticeSchema,
        InFlightSchema,
        ControlsSchema,
        CheckoutHintSchema,
        WorkflowViewSchema,
        WorkflowEnvelopeSchema,
        TrackEventReceiptSchema,
        TrackEventEnvelopeSchema,
        VerifyEmailRequest,
        TrackEventBody,
        AccessRequest,
        AdvertiserRequest,
        CreatePixelRequest,
        SelectPixelRequest,
        TestEventRequest,
        AuthorizationUrlResponse,
    )),
    tags(
        (name = "access", description = "Email allowlist checks"),
        (name = "tracking", description = "Stateless event relay"),
        (name = "onboarding", description = "The staged onboarding wizard"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
