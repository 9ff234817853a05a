use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gestor_context::RequestScope;
use gestor_session::SessionError;
use gestor_store::StoreError;

pub fn session_error_to_response(err: SessionError) -> axum::response::Response {
    match err {
        SessionError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        ),
        SessionError::InvalidToken => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_refresh_token",
            "refresh token is not valid",
        ),
        SessionError::TokenExpired => json_error(
            StatusCode::UNAUTHORIZED,
            "refresh_token_expired",
            "refresh token expired; log in again",
        ),
        SessionError::SuspiciousActivity => json_error(
            StatusCode::FORBIDDEN,
            "suspicious_activity",
            "refresh token reuse detected; all sessions revoked",
        ),
        SessionError::Password(e) => {
            tracing::error!(error = %e, "password backend failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
        SessionError::Token(e) => {
            tracing::error!(error = %e, "token signing failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
        SessionError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    let request_id = RequestScope::request_id().ok();
    let tenant_id = RequestScope::tenant_hint();
    match err {
        StoreError::Unavailable(_) | StoreError::Timeout | StoreError::CircuitOpen => {
            tracing::error!(
                error = %err,
                request_id = request_id.as_ref().map(|r| r.as_str()),
                tenant_id = tenant_id.map(|t| t.to_string()),
                "storage failure"
            );
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "storage_unavailable",
                "storage temporarily unavailable",
            )
        }
        StoreError::Internal(msg) => {
            tracing::error!(
                error = %msg,
                request_id = request_id.as_ref().map(|r| r.as_str()),
                tenant_id = tenant_id.map(|t| t.to_string()),
                "storage internal error"
            );
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
