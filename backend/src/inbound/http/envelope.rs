//! Success side of the `{success, data}` response envelope.
//!
//! Failures are rendered by the [`actix_web::ResponseError`] implementation
//! on [`crate::domain::Error`].

use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
struct SuccessEnvelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

/// `200 OK` with `{"success": true, "data": data}`.
pub fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(SuccessEnvelope {
        success: true,
        data: Some(data),
    })
}

/// `200 OK` with a bare `{"success": true}`.
pub fn acknowledged() -> HttpResponse {
    HttpResponse::Ok().json(SuccessEnvelope::<()> {
        success: true,
        data: None,
    })
}
