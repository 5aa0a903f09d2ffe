//! Person record endpoints: crossing submission and recent listing.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tracing::{error, warn};

use border_registry_core::errors::CoreError;
use border_registry_core::models::PersonRecord;
use border_registry_core::{RecordLister, RecordMerger};

use crate::api::status::AppError;
use crate::AppState;

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(add_person))
        .route("/last", get(list_last))
}

async fn list_last(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PersonRecord>>, AppError> {
    let records = RecordLister::new(&state.db)
        .last_n(state.config.registry.last_n)
        .map_err(|e| {
            error!(error = %e, "failed to list records");
            AppError::from(e)
        })?;
    Ok(Json(records))
}

async fn add_person(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<PersonRecord>), AppError> {
    let record = RecordMerger::with_clock(&state.db, state.clock)
        .merge_json(&body)
        .map_err(|e| {
            match &e {
                CoreError::Validation(err) => warn!(error = %err, "rejected submission"),
                CoreError::Store(err) => error!(
                    error = %err,
                    retryable = err.is_retryable(),
                    "failed to merge submission"
                ),
            }
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(record)))
}
