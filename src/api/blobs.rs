//! Demo data blob endpoints.
//!
//! The mobile app ships with a bundled dataset and asks `/demo/blob/update`
//! on launch whether a newer revision exists for its app version. Admin
//! tooling pushes new datasets through `/demo/blob` and audits the stores
//! through the history endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{AppVersionEntry, BlobHistory, InsertBlobRequest, UpdateCheck};
use crate::AppState;

/// Query parameters for the update check. Both are kept as raw strings so a
/// missing or malformed value yields the documented 400 message instead of
/// an extractor rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckParams {
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
}

/// GET /api/demo/blob/update - Check whether a newer blob exists for an app version.
pub async fn data_blob_update_check(
    State(state): State<AppState>,
    Query(params): Query<UpdateCheckParams>,
) -> ApiResult<UpdateCheck> {
    let app_version = match params.app_version {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            return Err(AppError::Validation(
                "appVersion and revision are required as query params".to_string(),
            ))
        }
    };

    // Revision 0 is a valid, distinct-from-missing value.
    let revision = match params.revision.as_deref().map(str::parse::<i64>) {
        Some(Ok(r)) if r >= 0 => r,
        Some(_) => {
            return Err(AppError::Validation(
                "revision must be a non-negative integer".to_string(),
            ))
        }
        None => {
            return Err(AppError::Validation(
                "appVersion and revision are required as query params".to_string(),
            ))
        }
    };

    let result = state.repo.check_blob_update(&app_version, revision).await?;
    success(result)
}

/// POST /api/demo/blob - Ingest a new data blob for an app version.
pub async fn insert_data_blob(
    State(state): State<AppState>,
    Json(request): Json<InsertBlobRequest>,
) -> ApiResult<AppVersionEntry> {
    let blob = match request.blob {
        Some(b) if b.is_object() => b,
        Some(_) => {
            return Err(AppError::Validation(
                "blob must be a JSON object".to_string(),
            ))
        }
        None => {
            return Err(AppError::Validation(
                "blob and appVersion are required on the request body".to_string(),
            ))
        }
    };
    let app_version = match request.app_version {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            return Err(AppError::Validation(
                "blob and appVersion are required on the request body".to_string(),
            ))
        }
    };
    if matches!(request.revision, Some(r) if r < 0) {
        return Err(AppError::Validation(
            "revision must be a non-negative integer".to_string(),
        ));
    }

    let entry = state
        .repo
        .insert_data_blob(&blob, &app_version, request.revision)
        .await?;

    tracing::info!(
        app_version = %entry.app_version,
        revision = entry.revision,
        blob_id = %entry.revision_id,
        "Ingested data blob"
    );

    success(entry)
}

/// GET /api/demo/blob - Full revision index and blob history for audit tooling.
pub async fn get_blob_history(State(state): State<AppState>) -> ApiResult<BlobHistory> {
    let history = state.repo.blob_history().await?;
    success(history)
}
