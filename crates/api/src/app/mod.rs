//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Router};

use gestor_auth::{Argon2Hasher, TokenConfig, TokenSigner};
use gestor_session::{SessionService, TracingAuditSink};
use gestor_store::{BreakerConfig, MemoryStore, ResilientStore, ScopedStore};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// The production store composition: scoping on the outside (so every call
/// is rewritten), circuit breaking between scoping and the backend.
pub type Backend = ScopedStore<ResilientStore<MemoryStore>>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Backend>,
    pub sessions: Arc<SessionService<Backend, Argon2Hasher, TracingAuditSink>>,
}

/// Build the full HTTP router over a fresh empty backend.
pub fn build_app(jwt_secret: String) -> Router {
    let store = Arc::new(ScopedStore::new(ResilientStore::new(
        MemoryStore::new(),
        BreakerConfig::default(),
    )));
    build_app_with(store, jwt_secret)
}

/// Build the router over an existing backend (tests seed it first).
pub fn build_app_with(store: Arc<Backend>, jwt_secret: String) -> Router {
    let signer = TokenSigner::new(TokenConfig::new(jwt_secret));
    let sessions = Arc::new(SessionService::new(
        Arc::clone(&store),
        signer.clone(),
        Argon2Hasher,
        Arc::new(TracingAuditSink),
    ));
    let state = AppState { store, sessions };

    let auth_state = middleware::AuthState {
        signer: Arc::new(signer),
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(state))
        .layer(axum::middleware::from_fn(middleware::propagate_context))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::authenticate,
        ))
}
