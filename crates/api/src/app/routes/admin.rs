//! Guarded admin reads.
//!
//! Handlers here never mention tenants: the scoped store reads the active
//! tenant from the request context established by the middleware.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use gestor_store::records::{CompanyRecord, ProfileRecord};
use gestor_store::{DataStore, Filter, Operation};

use crate::app::dto::{CompanyView, ProfileView};
use crate::app::errors::store_error_to_response;
use crate::app::AppState;

pub async fn list_companies(State(state): State<AppState>) -> Response {
    let result = state
        .store
        .execute::<CompanyRecord>(Operation::FindMany {
            filter: Filter::all(),
        })
        .await
        .and_then(|o| o.into_many());

    match result {
        Ok(rows) => Json(
            rows.into_iter()
                .map(CompanyView::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => store_error_to_response(err),
    }
}

pub async fn list_profiles(State(state): State<AppState>) -> Response {
    let result = state
        .store
        .execute::<ProfileRecord>(Operation::FindMany {
            filter: Filter::all(),
        })
        .await
        .and_then(|o| o.into_many());

    match result {
        Ok(rows) => Json(
            rows.into_iter()
                .map(ProfileView::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => store_error_to_response(err),
    }
}
