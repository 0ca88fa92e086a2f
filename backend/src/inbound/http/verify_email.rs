//! Stateless access gate check.
//!
//! ```text
//! POST /api/verify-email {"email":"owner@example.com"}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::domain::{AccessDecision, EmailAddress, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::acknowledged;
use crate::inbound::http::schemas::{AcknowledgementSchema, ErrorEnvelopeSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, missing_field_error};

const EMAIL: FieldName = FieldName::new("email");

/// Request body for `POST /api/verify-email`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct VerifyEmailRequest {
    /// Address to check.
    #[schema(example = "owner@example.com")]
    pub email: Option<String>,
}

/// Check whether an email address may use the onboarding tool.
#[utoipa::path(
    post,
    path = "/api/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Address granted", body = AcknowledgementSchema),
        (status = 400, description = "Missing or malformed address", body = ErrorEnvelopeSchema),
        (status = 403, description = "Address denied", body = ErrorEnvelopeSchema),
        (status = 500, description = "Access gate failure", body = ErrorEnvelopeSchema)
    ),
    tags = ["access"],
    operation_id = "verifyEmail"
)]
#[post("/verify-email")]
pub async fn verify_email(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyEmailRequest>,
) -> ApiResult<HttpResponse> {
    let raw = payload
        .into_inner()
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| missing_field_error(EMAIL))?;
    let email =
        EmailAddress::parse(&raw).map_err(|err| invalid_field_error(EMAIL, err.to_string()))?;

    match state.access_gate.verify(&email).await {
        Ok(AccessDecision::Granted) => {
            info!(domain = email.domain(), "email granted");
            Ok(acknowledged())
        }
        Ok(AccessDecision::Denied { reason }) => {
            info!(domain = email.domain(), "email denied");
            Err(Error::forbidden(reason))
        }
        Err(gate_error) => {
            error!(error = %gate_error, "access gate failed");
            Err(Error::internal(gate_error.to_string()))
        }
    }
}
