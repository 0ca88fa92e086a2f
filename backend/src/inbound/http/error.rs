//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into the `{success: false, error, code}`
//! envelope and consistent status codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::domain::workflow::{TransitionError, WorkflowError};
use crate::domain::{Error, ErrorCode, GatewayError, ValidationKind};
use crate::inbound::http::validation::{FieldName, invalid_field_error, missing_field_error};
use crate::middleware::TRACE_ID_HEADER;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const REDACTED: &str = "Internal server error";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureEnvelope<'a> {
    success: bool,
    error: &'a str,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::UpstreamFailure | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal(REDACTED);
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        let payload = redact_if_internal(self);
        builder.json(FailureEnvelope {
            success: false,
            error: payload.message(),
            code: payload.code().as_str(),
            details: payload.details(),
            trace_id: payload.trace_id(),
        })
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(REDACTED)
    }
}

impl From<GatewayError> for Error {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation {
                field,
                kind: ValidationKind::Missing,
                ..
            } => missing_field_error(FieldName::new(field)),
            GatewayError::Validation {
                field,
                kind: ValidationKind::Invalid,
                message,
            } => invalid_field_error(FieldName::new(field), message),
            GatewayError::Upstream { code, message } => {
                Error::upstream(message).with_details(json!({ "upstreamCode": code }))
            }
            GatewayError::Unexpected { message } => Error::internal(message),
        }
    }
}

impl From<WorkflowError> for Error {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::Transition(TransitionError::UnknownAdvertiser { .. }) => {
                invalid_field_error(FieldName::new("advertiserId"), "is not available")
            }
            WorkflowError::Transition(TransitionError::UnknownPixel { .. }) => {
                invalid_field_error(FieldName::new("pixelCode"), "is not available")
            }
            WorkflowError::Transition(TransitionError::Invalid { stage, event }) => {
                Error::conflict(message)
                    .with_details(json!({ "stage": stage.as_str(), "event": event }))
            }
            WorkflowError::Transition(TransitionError::StaleAdvertiser { .. })
            | WorkflowError::Stale => Error::conflict(message),
            WorkflowError::ActionInFlight { action } => {
                Error::conflict(message).with_details(json!({ "action": action.as_str() }))
            }
            WorkflowError::Gateway(gateway) => Error::from(gateway),
            WorkflowError::InvalidEmail(reason) => {
                invalid_field_error(FieldName::new("email"), reason.to_string())
            }
            WorkflowError::AccessDenied { reason } => Error::forbidden(reason),
            WorkflowError::AccessGateRequired => Error::forbidden(message),
            WorkflowError::NotAuthenticated | WorkflowError::SessionExpired => {
                Error::unauthorized(message)
            }
            WorkflowError::StateMismatch => Error::invalid_request(message),
            WorkflowError::NotInProfile { .. } => Error::not_found(message),
            WorkflowError::AccessGate(_)
            | WorkflowError::Credential(_)
            | WorkflowError::Poisoned => {
                error!(error = %message, "onboarding workflow failed");
                Error::internal(message)
            }
        }
    }
}
