//! Onboarding wizard endpoints.
//!
//! ```text
//! GET  /api/onboarding
//! POST /api/onboarding/access {"email":"owner@example.com"}
//! GET  /api/onboarding/authorize
//! POST /api/onboarding/advertisers/reload
//! POST /api/onboarding/advertiser {"advertiserId":"7001"}
//! POST /api/onboarding/pixel {"pixelName":"PX-AB12CD34"}
//! POST /api/onboarding/pixel/select {"pixelCode":"C1ABC"}
//! POST /api/onboarding/event {"productName":"Course","productPrice":97.0,"currency":"BRL"}
//! POST /api/onboarding/acknowledge
//! POST /api/onboarding/reset
//! POST /api/onboarding/notice/dismiss
//! ```
//!
//! Every endpoint answers with the updated workflow view. The workflow is
//! process-wide: one operator drives one onboarding session.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::workflow::TestEventInput;
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::success;
use crate::inbound::http::schemas::{ErrorEnvelopeSchema, WorkflowEnvelopeSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error};

fn required(value: Option<String>, field: &'static str) -> ApiResult<String> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| missing_field_error(FieldName::new(field)))
}

/// Request body for `POST /api/onboarding/access`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AccessRequest {
    /// Address to verify against the access gate.
    #[schema(example = "owner@example.com")]
    pub email: Option<String>,
}

/// Request body for `POST /api/onboarding/advertiser`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvertiserRequest {
    /// One of the listed advertiser ids.
    #[schema(example = "7001")]
    pub advertiser_id: Option<String>,
}

/// Request body for `POST /api/onboarding/pixel`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePixelRequest {
    /// Pixel name; the suggested name is used when omitted.
    #[schema(example = "PX-AB12CD34")]
    pub pixel_name: Option<String>,
}

/// Request body for `POST /api/onboarding/pixel/select`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectPixelRequest {
    /// One of the listed pixel codes.
    pub pixel_code: Option<String>,
}

/// Request body for `POST /api/onboarding/event`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestEventRequest {
    /// Optional buyer email.
    pub email: Option<String>,
    /// Optional buyer phone.
    pub phone: Option<String>,
    /// Product display name.
    #[schema(example = "Online course")]
    pub product_name: Option<String>,
    /// Optional product description.
    pub product_description: Option<String>,
    /// Unit price.
    #[schema(example = 97.0)]
    pub product_price: Option<f64>,
    /// ISO 4217 currency code.
    #[schema(example = "BRL")]
    pub currency: Option<String>,
    /// Page the event is reported from.
    pub page_url: Option<String>,
}

impl From<TestEventRequest> for TestEventInput {
    fn from(body: TestEventRequest) -> Self {
        Self {
            email: body.email,
            phone: body.phone,
            product_name: body.product_name,
            product_description: body.product_description,
            product_price: body.product_price,
            currency: body.currency,
            page_url: body.page_url,
        }
    }
}

/// Response data of `GET /api/onboarding/authorize`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizationUrlResponse {
    /// TikTok authorisation URL to open.
    pub url: String,
}

/// Current workflow view.
#[utoipa::path(
    get,
    path = "/api/onboarding",
    responses(
        (status = 200, description = "Workflow view", body = WorkflowEnvelopeSchema),
        (status = 500, description = "Internal server error", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "getOnboarding"
)]
#[get("")]
pub async fn get_onboarding(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(success(state.workflow.view()?))
}

/// Verify the operator's email against the access gate.
#[utoipa::path(
    post,
    path = "/api/onboarding/access",
    request_body = AccessRequest,
    responses(
        (status = 200, description = "Address granted", body = WorkflowEnvelopeSchema),
        (status = 400, description = "Missing or malformed address", body = ErrorEnvelopeSchema),
        (status = 403, description = "Address denied", body = ErrorEnvelopeSchema),
        (status = 409, description = "Already logged in or a check is running", body = ErrorEnvelopeSchema),
        (status = 500, description = "Access gate failure", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "verifyOnboardingAccess"
)]
#[post("/access")]
pub async fn verify_access(
    state: web::Data<HttpState>,
    payload: web::Json<AccessRequest>,
) -> ApiResult<HttpResponse> {
    let email = required(payload.into_inner().email, "email")?;
    Ok(success(state.workflow.verify_access(&email).await?))
}

/// Authorisation URL for the login link.
#[utoipa::path(
    get,
    path = "/api/onboarding/authorize",
    responses(
        (status = 200, description = "Authorisation URL", body = AuthorizationUrlResponse),
        (status = 403, description = "Email not verified yet", body = ErrorEnvelopeSchema),
        (status = 409, description = "Already logged in or an exchange is running", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "getAuthorizationUrl"
)]
#[get("/authorize")]
pub async fn authorize(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let url = state.workflow.authorization_url()?;
    Ok(success(AuthorizationUrlResponse {
        url: url.to_string(),
    }))
}

/// List the advertiser accounts again.
#[utoipa::path(
    post,
    path = "/api/onboarding/advertisers/reload",
    responses(
        (status = 200, description = "Advertisers listed", body = WorkflowEnvelopeSchema),
        (status = 401, description = "Session expired", body = ErrorEnvelopeSchema),
        (status = 409, description = "Not selecting a pixel or a listing is running", body = ErrorEnvelopeSchema),
        (status = 500, description = "Ads platform rejected or failed the call", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "reloadAdvertisers"
)]
#[post("/advertisers/reload")]
pub async fn reload_advertisers(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(success(state.workflow.reload_advertisers().await?))
}

/// Choose the advertiser account.
#[utoipa::path(
    post,
    path = "/api/onboarding/advertiser",
    request_body = AdvertiserRequest,
    responses(
        (status = 200, description = "Advertiser selected", body = WorkflowEnvelopeSchema),
        (status = 400, description = "Unknown advertiser", body = ErrorEnvelopeSchema),
        (status = 401, description = "Session expired", body = ErrorEnvelopeSchema),
        (status = 409, description = "Not selecting a pixel", body = ErrorEnvelopeSchema),
        (status = 500, description = "Listing pixels failed", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "selectAdvertiser"
)]
#[post("/advertiser")]
pub async fn select_advertiser(
    state: web::Data<HttpState>,
    payload: web::Json<AdvertiserRequest>,
) -> ApiResult<HttpResponse> {
    let advertiser_id = required(payload.into_inner().advertiser_id, "advertiserId")?;
    Ok(success(
        state.workflow.select_advertiser(&advertiser_id).await?,
    ))
}

/// Create a pixel under the selected advertiser.
#[utoipa::path(
    post,
    path = "/api/onboarding/pixel",
    request_body(content = CreatePixelRequest, description = "Optional; defaults to the suggested name"),
    responses(
        (status = 200, description = "Pixel created", body = WorkflowEnvelopeSchema),
        (status = 400, description = "No advertiser selected", body = ErrorEnvelopeSchema),
        (status = 401, description = "Session expired", body = ErrorEnvelopeSchema),
        (status = 409, description = "Not selecting a pixel or creation running", body = ErrorEnvelopeSchema),
        (status = 500, description = "Ads platform rejected or failed the call", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "createPixel"
)]
#[post("/pixel")]
pub async fn create_pixel(
    state: web::Data<HttpState>,
    payload: Option<web::Json<CreatePixelRequest>>,
) -> ApiResult<HttpResponse> {
    let request = payload.map(web::Json::into_inner).unwrap_or_default();
    Ok(success(
        state
            .workflow
            .create_pixel(request.pixel_name.as_deref())
            .await?,
    ))
}

/// Reuse one of the listed pixels.
#[utoipa::path(
    post,
    path = "/api/onboarding/pixel/select",
    request_body = SelectPixelRequest,
    responses(
        (status = 200, description = "Pixel selected", body = WorkflowEnvelopeSchema),
        (status = 400, description = "Unknown pixel", body = ErrorEnvelopeSchema),
        (status = 404, description = "Not part of this profile", body = ErrorEnvelopeSchema),
        (status = 409, description = "Not selecting a pixel", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "selectPixel"
)]
#[post("/pixel/select")]
pub async fn select_pixel(
    state: web::Data<HttpState>,
    payload: web::Json<SelectPixelRequest>,
) -> ApiResult<HttpResponse> {
    let pixel_code = required(payload.into_inner().pixel_code, "pixelCode")?;
    Ok(success(state.workflow.select_pixel(&pixel_code)?))
}

/// Send the `CompletePayment` test event for the ready pixel.
#[utoipa::path(
    post,
    path = "/api/onboarding/event",
    request_body = TestEventRequest,
    responses(
        (status = 200, description = "Event accepted", body = WorkflowEnvelopeSchema),
        (status = 400, description = "Missing or malformed field", body = ErrorEnvelopeSchema),
        (status = 401, description = "Session expired", body = ErrorEnvelopeSchema),
        (status = 409, description = "No pixel ready or an event is being sent", body = ErrorEnvelopeSchema),
        (status = 500, description = "Ads platform rejected or failed the call", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "sendTestEvent"
)]
#[post("/event")]
pub async fn send_test_event(
    state: web::Data<HttpState>,
    payload: web::Json<TestEventRequest>,
) -> ApiResult<HttpResponse> {
    Ok(success(
        state
            .workflow
            .send_test_event(payload.into_inner().into())
            .await?,
    ))
}

/// Confirm the pixel was configured in the checkout platform.
#[utoipa::path(
    post,
    path = "/api/onboarding/acknowledge",
    responses(
        (status = 200, description = "Configuration acknowledged", body = WorkflowEnvelopeSchema),
        (status = 404, description = "Not part of this profile", body = ErrorEnvelopeSchema),
        (status = 409, description = "Test event not sent yet", body = ErrorEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "acknowledgeConfiguration"
)]
#[post("/acknowledge")]
pub async fn acknowledge(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(success(state.workflow.acknowledge_external_configuration()?))
}

/// Log out and start over.
#[utoipa::path(
    post,
    path = "/api/onboarding/reset",
    responses(
        (status = 200, description = "Fresh workflow", body = WorkflowEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "resetOnboarding"
)]
#[post("/reset")]
pub async fn reset(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(success(state.workflow.reset()?))
}

/// Clear the current notice.
#[utoipa::path(
    post,
    path = "/api/onboarding/notice/dismiss",
    responses(
        (status = 200, description = "Notice cleared", body = WorkflowEnvelopeSchema)
    ),
    tags = ["onboarding"],
    operation_id = "dismissNotice"
)]
#[post("/notice/dismiss")]
pub async fn dismiss_notice(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(success(state.workflow.dismiss_notice()?))
}
