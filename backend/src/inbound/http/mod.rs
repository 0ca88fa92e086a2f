//! HTTP inbound adapter exposing REST endpoints.

pub mod envelope;
pub mod error;
pub mod health;
pub mod oauth_callback;
pub mod onboarding;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod track_event;
pub mod validation;
pub mod verify_email;

pub use error::ApiResult;

use actix_web::web;

use crate::domain::Error;

/// JSON extractor settings shared by every scope.
///
/// Malformed or oversized bodies answer with the `invalid_request` envelope
/// instead of Actix's plain-text error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            Error::invalid_request(format!("malformed JSON body: {err}")).into()
        })
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, post, test};
    use serde::Deserialize;
    use serde_json::Value;

    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[expect(dead_code, reason = "only deserialisation is exercised")]
        name: String,
    }

    #[post("/echo")]
    async fn echo(_body: web::Json<Body>) -> HttpResponse {
        HttpResponse::NoContent().finish()
    }

    #[actix_web::test]
    async fn malformed_json_uses_the_error_envelope() {
        let app = test::init_service(App::new().app_data(json_config()).service(echo)).await;
        let req = test::TestRequest::post()
            .uri("/echo")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();

        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "invalid_request");
    }
}
