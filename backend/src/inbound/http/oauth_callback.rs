//! OAuth redirect target.
//!
//! ```text
//! GET /oauth/callback?auth_code=...&state=...&ttclid=...
//! ```
//!
//! The browser is always sent on to the post-login page with a `303 See
//! Other`, so the one-time code never stays in the address bar or history.
//! Outcomes surface through the workflow notice.

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::IntoParams;

use crate::domain::workflow::AuthorizationCallback;
use crate::inbound::http::state::HttpState;

/// Query parameters TikTok appends to the redirect URI.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// One-time authorisation code.
    pub auth_code: Option<String>,
    /// Alias of `auth_code` sent alongside it by TikTok.
    pub code: Option<String>,
    /// Click id for attributing events.
    pub ttclid: Option<String>,
    /// Error reported instead of a code.
    pub error: Option<String>,
    /// Detail accompanying `error`.
    pub error_description: Option<String>,
    /// Anti-forgery value from the authorisation URL.
    pub state: Option<String>,
}

impl From<CallbackQuery> for AuthorizationCallback {
    fn from(query: CallbackQuery) -> Self {
        Self {
            auth_code: query.auth_code.or(query.code),
            ttclid: query.ttclid,
            error: query.error,
            error_description: query.error_description,
            state: query.state,
        }
    }
}

/// Complete the TikTok login and redirect to the wizard.
#[utoipa::path(
    get,
    path = "/oauth/callback",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Redirect to the post-login page", headers(("Location" = String)))
    ),
    tags = ["onboarding"],
    operation_id = "oauthCallback"
)]
#[get("/oauth/callback")]
pub async fn oauth_callback(
    state: web::Data<HttpState>,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    match state
        .workflow
        .complete_authorization(query.into_inner().into())
        .await
    {
        Ok(view) => info!(stage = %view.stage, "oauth callback processed"),
        Err(error) => warn!(%error, "oauth callback rejected"),
    }
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, state.post_login_path.as_str()))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}
