//! POI endpoints for the park map.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{InsertPoiRequest, Poi};
use crate::AppState;

/// POST /api/pois - Save a POI.
pub async fn insert_poi(
    State(state): State<AppState>,
    Json(request): Json<InsertPoiRequest>,
) -> ApiResult<Poi> {
    let poi = request.poi.ok_or_else(|| {
        AppError::Validation("poi object is required in the request body".to_string())
    })?;

    let saved = state.repo.insert_poi(&poi).await?;
    success(saved)
}

/// GET /api/pois - List all POIs.
pub async fn list_pois(State(state): State<AppState>) -> ApiResult<Vec<Poi>> {
    let pois = state.repo.list_pois().await?;
    success(pois)
}

/// GET /api/pois/park/:park_id - List the POIs of one park.
pub async fn list_park_pois(
    State(state): State<AppState>,
    Path(park_id): Path<String>,
) -> ApiResult<Vec<Poi>> {
    let pois = state.repo.list_park_pois(&park_id).await?;
    success(pois)
}
