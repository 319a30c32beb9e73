//! User endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{InsertUserRequest, User};
use crate::AppState;

/// GET /api/users - List all users.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.repo.list_users().await?;
    success(users)
}

/// POST /api/users/user - Save a user.
pub async fn insert_user(
    State(state): State<AppState>,
    Json(request): Json<InsertUserRequest>,
) -> ApiResult<User> {
    let user = request.user.ok_or_else(|| {
        AppError::Validation("user object is required in the request body".to_string())
    })?;

    let saved = state.repo.insert_user(&user).await?;
    success(saved)
}

/// GET /api/users/user/:user_id - Get a single user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<User> {
    match state.repo.get_user(&user_id).await? {
        Some(user) => success(user),
        None => Err(AppError::NotFound(format!("User {} not found", user_id))),
    }
}

/// GET /api/users/group/:group_id - List the users of one group.
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> ApiResult<Vec<User>> {
    let users = state.repo.list_group_users(group_id).await?;
    success(users)
}
