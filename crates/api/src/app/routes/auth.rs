//! Session endpoints: login, refresh, logout, whoami.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use gestor_auth::Principal;
use gestor_session::LoginMeta;

use crate::app::dto::{LoginRequest, MeResponse, RefreshRequest, TokenResponse};
use crate::app::errors::{json_error, session_error_to_response};
use crate::app::AppState;

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Response {
    let meta = LoginMeta {
        ip: header_string(&headers, "x-forwarded-for"),
        user_agent: header_string(&headers, "user-agent"),
    };

    match state.sessions.login(&body.email, &body.senha, meta).await {
        Ok(pair) => Json(TokenResponse::from(pair)).into_response(),
        Err(err) => session_error_to_response(err),
    }
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Response {
    match state.sessions.refresh(&body.refresh_token).await {
        Ok(pair) => Json(TokenResponse::from(pair)).into_response(),
        Err(err) => session_error_to_response(err),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Response {
    match state.sessions.revoke(&body.refresh_token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => session_error_to_response(err),
    }
}

/// The verified identity as the access token describes it (no DB round
/// trip: this is the embedded snapshot).
pub async fn me(principal: Option<Extension<Principal>>) -> Response {
    match principal {
        Some(Extension(principal)) => Json(MeResponse::from(principal)).into_response(),
        None => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        ),
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
