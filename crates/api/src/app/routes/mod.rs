use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;

use gestor_auth::RequiredPermissions;

use super::AppState;
use crate::authz;

pub mod admin;
pub mod auth;
pub mod system;

/// All application routes except the `/health` probe.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(guarded("READ_EMPRESAS", "/empresas", get(admin::list_companies)))
        .merge(guarded("READ_PERFIS", "/perfis", get(admin::list_profiles)))
        .with_state(state)
}

/// One route behind a permission check.
fn guarded(
    code: &'static str,
    path: &str,
    handler: axum::routing::MethodRouter<AppState>,
) -> Router<AppState> {
    let required = RequiredPermissions::one(code);
    Router::new().route(path, handler).route_layer(from_fn(
        move |req: axum::extract::Request, next: axum::middleware::Next| {
            authz::require(required.clone(), req, next)
        },
    ))
}
