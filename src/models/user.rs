//! App user model.

use serde::{Deserialize, Serialize};

/// A companion-app user. Groups are plain numeric ids shared by users
/// visiting the park together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location_y: Option<f64>,
    /// POI ids the user favorited or added to their plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_received: Option<Vec<i64>>,
}

/// User fields accepted on insert. Any client-supplied id is discarded; the
/// store assigns one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub current_location_x: Option<f64>,
    #[serde(default)]
    pub current_location_y: Option<f64>,
    #[serde(default)]
    pub favorites: Option<Vec<i64>>,
    #[serde(default)]
    pub notifications_received: Option<Vec<i64>>,
}

/// Request body for POST /api/users/user: `{ "user": { ... } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertUserRequest {
    #[serde(default)]
    pub user: Option<CreateUserRequest>,
}
