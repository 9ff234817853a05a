//! Per-route permission guard.
//!
//! Runs after authentication and context propagation: the principal comes
//! from the request extensions, the selected tenant from the request scope.
//! An unauthenticated request is a 401; every other denial is a 403 with a
//! cause-specific body.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

use gestor_auth::{check_access, AccessDenied, Principal, RequiredPermissions};
use gestor_context::RequestScope;

use crate::app::errors::json_error;

/// Middleware body: resolve the membership or refuse.
///
/// On success the resolved [`gestor_auth::TenantMembership`] is attached as
/// a request extension for the handler.
pub async fn require(required: RequiredPermissions, mut req: Request, next: Next) -> Response {
    let Some(principal) = req.extensions().get::<Principal>().cloned() else {
        return json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        );
    };

    match check_access(&principal, RequestScope::tenant_hint(), &required) {
        Ok(membership) => {
            req.extensions_mut().insert(membership.clone());
            next.run(req).await
        }
        Err(denied) => denied_to_response(denied),
    }
}

pub fn denied_to_response(denied: AccessDenied) -> Response {
    let code = match denied {
        AccessDenied::NoMemberships => "no_memberships",
        AccessDenied::MissingTenantSelector => "missing_tenant_header",
        AccessDenied::NoTenantAccess => "no_tenant_access",
        AccessDenied::MissingPermission => "missing_permission",
    };
    json_error(StatusCode::FORBIDDEN, code, denied.to_string())
}
