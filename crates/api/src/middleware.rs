//! Authentication and context-propagation middleware.
//!
//! Two layers run on every request, in order:
//!
//! 1. `authenticate` — decodes the bearer token (when present) into a
//!    verified [`Principal`] request extension. A missing header leaves the
//!    request unauthenticated; only the authorization guard decides whether
//!    that matters.
//! 2. `propagate_context` — establishes the task-local request scope
//!    (correlation id, subject, selected tenant) around the rest of the
//!    pipeline, so the data layer sees the tenant without it being threaded
//!    through every call.
//!
//! Tenant selection comes only from an explicit `x-empresa-id` header, and
//! only on authenticated requests. There is no fallback to a tenant implied
//! by the token: ambiguity about which tenant is being acted on is never
//! resolved silently, and unauthenticated flows (login, refresh) must run
//! unscoped so they can see the subject's memberships across all tenants.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};

use gestor_auth::{Principal, TokenError, TokenSigner};
use gestor_context::{RequestContext, RequestScope};
use gestor_core::{RequestId, TenantId};

use crate::app::errors::json_error;

/// Header selecting the tenant a request acts on.
pub const TENANT_HEADER: &str = "x-empresa-id";
/// Correlation-id header, echoed back on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AuthState {
    pub signer: Arc<TokenSigner>,
}

/// Decode the bearer token into a [`Principal`] extension.
///
/// A present-but-bad token is rejected here (401); an absent header is not.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    match bearer_token(req.headers()) {
        None => next.run(req).await,
        Some(token) => match state.signer.verify(token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims.into_principal());
                next.run(req).await
            }
            Err(TokenError::Expired) => json_error(
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "access token expired",
            ),
            Err(TokenError::Invalid(_)) => json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "access token invalid",
            ),
        },
    }
}

/// Establish the request scope around the rest of the pipeline.
pub async fn propagate_context(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(RequestId::from_inbound)
        .unwrap_or_else(RequestId::generate);

    let subject = req
        .extensions()
        .get::<Principal>()
        .map(|principal| principal.subject_id);

    let tenant = match selected_tenant(req.headers(), subject.is_some()) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };

    let ctx = RequestContext::anonymous(request_id.clone());
    let mut response = RequestScope::run(ctx, async move {
        // Inside the scope these cannot fail.
        if let Some(subject_id) = subject {
            let _ = RequestScope::set_subject(subject_id);
        }
        if let Some(tenant_id) = tenant {
            let _ = RequestScope::set_tenant(tenant_id);
        }
        next.run(req).await
    })
    .await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// The explicit header is the only tenant selector, and it is honored only
/// for authenticated requests.
fn selected_tenant(headers: &HeaderMap, authenticated: bool) -> Result<Option<TenantId>, Response> {
    if !authenticated {
        return Ok(None);
    }

    let Some(raw) = headers.get(TENANT_HEADER) else {
        return Ok(None);
    };

    let parsed = raw
        .to_str()
        .ok()
        .and_then(|v| v.parse::<TenantId>().ok())
        .ok_or_else(|| {
            json_error(
                StatusCode::BAD_REQUEST,
                "invalid_tenant_header",
                format!("{TENANT_HEADER} must be a valid uuid"),
            )
        })?;
    Ok(Some(parsed))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
