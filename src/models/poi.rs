//! Point-of-interest model for the park map.

use serde::{Deserialize, Serialize};

/// A point of interest on a park map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub id: String,
    pub park_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Required rider height in centimeters, for attractions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_requirement: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

/// POI fields accepted on insert. The store assigns the id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoiRequest {
    #[serde(default)]
    pub park_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub coordinate_x: Option<f64>,
    #[serde(default)]
    pub coordinate_y: Option<f64>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub height_requirement: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<Vec<String>>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub picture_url: Option<String>,
}

/// Request body for POST /api/pois: `{ "poi": { ... } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertPoiRequest {
    #[serde(default)]
    pub poi: Option<CreatePoiRequest>,
}
