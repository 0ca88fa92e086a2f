//! Stateless test event relay.
//!
//! ```text
//! POST /api/track-event {"accessToken":"...","pixelCode":"...","externalId":"...",
//!                        "productName":"Course","productPrice":97.0,"currency":"BRL"}
//! ```
//!
//! Fields are validated by the gateway before any network call; the first
//! missing or malformed field is named in `details.field`.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ActionOutcome, Error, TrackEventInput};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorEnvelopeSchema, TrackEventEnvelopeSchema};
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/track-event`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventBody {
    /// Bearer token for the ads platform.
    pub access_token: Option<String>,
    /// Pixel receiving the event.
    #[schema(example = "C1ABCDEF2GHIJ3KLMNOP")]
    pub pixel_code: Option<String>,
    /// Client-generated user id.
    pub external_id: Option<String>,
    /// Optional buyer email; hashed before sending.
    pub email: Option<String>,
    /// Optional buyer phone in E.164; hashed before sending.
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
    /// OAuth click id, when known.
    pub ttclid: Option<String>,
    /// Page the event originated from.
    pub page_url: Option<String>,
}

impl From<TrackEventBody> for TrackEventInput {
    fn from(body: TrackEventBody) -> Self {
        Self {
            access_token: body.access_token,
            pixel_code: body.pixel_code,
            external_id: body.external_id,
            email: body.email,
            phone: body.phone,
            product_name: body.product_name,
            product_description: body.product_description,
            product_price: body.product_price,
            currency: body.currency,
            ttclid: body.ttclid,
            page_url: body.page_url,
        }
    }
}

/// Assemble and send one `CompletePayment` test event.
#[utoipa::path(
    post,
    path = "/api/track-event",
    request_body = TrackEventBody,
    responses(
        (status = 200, description = "Event accepted", body = TrackEventEnvelopeSchema),
        (status = 400, description = "Missing or malformed field", body = ErrorEnvelopeSchema),
        (status = 500, description = "Ads platform rejected or failed the call", body = ErrorEnvelopeSchema)
    ),
    tags = ["tracking"],
    operation_id = "trackEvent"
)]
#[post("/track-event")]
pub async fn track_event(
    state: web::Data<HttpState>,
    payload: web::Json<TrackEventBody>,
) -> ApiResult<HttpResponse> {
    let receipt = state
        .gateway
        .send_track_event(payload.into_inner().into())
        .await
        .map_err(Error::from)?;
    Ok(HttpResponse::Ok().json(ActionOutcome::success(receipt)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{AdsApiError, FixtureAccessGate, MockAdsApi};
    use crate::domain::{AccessToken, TrackEventReceipt, TrackEventRequest};
    use crate::inbound::http::test_utils::http_state;

    fn valid_body() -> Value {
        json!({
            "accessToken": "act.example",
            "pixelCode": "C1ABC",
            "externalId": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "email": "buyer@example.com",
            "productName": "Online course",
            "productPrice": 97.0,
            "currency": "brl"
        })
    }

    async fn call(api: MockAdsApi, body: Value) -> (StatusCode, Value) {
        let state = http_state(
            Arc::new(api),
            Arc::new(FixtureAccessGate),
            crate::domain::workflow::WorkflowOptions::default(),
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").service(track_event)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/track-event")
            .set_json(body)
            .to_request();
        let res = test::call_service(&app, req).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn accepted_event_returns_the_receipt() {
        let mut api = MockAdsApi::new();
        api.expect_track_event()
            .withf(|token: &AccessToken, request: &TrackEventRequest| {
                token.expose() == "act.example"
                    && request.pixel_code == "C1ABC"
                    && request.currency.as_str() == "BRL"
            })
            .times(1)
            .returning(|_, request| {
                Ok(TrackEventReceipt {
                    request_id: Some("req-1".to_owned()),
                    event_id: request.event_id,
                })
            });

        let (status, body) = call(api, valid_body()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["requestId"], "req-1");
        assert!(body["data"]["eventId"].is_string());
    }

    #[rstest]
    #[case("accessToken")]
    #[case("pixelCode")]
    #[case("externalId")]
    #[case("productName")]
    #[case("productPrice")]
    #[case("currency")]
    #[actix_web::test]
    async fn missing_fields_are_named_without_a_network_call(#[case] field: &str) {
        let mut api = MockAdsApi::new();
        api.expect_track_event().times(0);
        let mut body = valid_body();
        if let Some(object) = body.as_object_mut() {
            object.remove(field);
        }

        let (status, body) = call(api, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], "missing_field");
    }

    #[actix_web::test]
    async fn upstream_rejection_surfaces_the_platform_message() {
        let mut api = MockAdsApi::new();
        api.expect_track_event()
            .times(1)
            .returning(|_, _| Err(AdsApiError::rejected(40002, "Pixel code not found")));

        let (status, body) = call(api, valid_body()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "upstream_failure");
        assert_eq!(body["error"], "Pixel code not found");
    }

    #[actix_web::test]
    async fn transport_failures_are_redacted() {
        let mut api = MockAdsApi::new();
        api.expect_track_event()
            .times(1)
            .returning(|_, _| Err(AdsApiError::transport("connection reset by 10.0.0.4")));

        let (status, body) = call(api, valid_body()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
