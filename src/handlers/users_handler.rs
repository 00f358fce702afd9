use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::AuthenticatedUser,
    models::{ProfileUpdateResponse, UpdateProfileInput, UserRecord},
    AppError, AppResult, AppState,
};

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "List of all users", body = Vec<UserRecord>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
) -> AppResult<Json<Vec<UserRecord>>> {
    let users = state.users.list().await?;

    Ok(Json(users))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserRecord),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<UserRecord>> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(user))
}

/// GET /api/users/subject/{subject}
#[utoipa::path(
    get,
    path = "/api/users/subject/{subject}",
    params(
        ("subject" = String, Path, description = "Identity provider subject, e.g. google-oauth2|1234")
    ),
    responses(
        (status = 200, description = "User found", body = UserRecord),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_user_by_subject(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    Path(subject): Path<String>,
) -> AppResult<Json<UserRecord>> {
    let user = state
        .users
        .find_by_subject(&subject)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(Json(user))
}

/// GET /api/users/email/{email}
#[utoipa::path(
    get,
    path = "/api/users/email/{email}",
    params(
        ("email" = String, Path, description = "Email address on the user record")
    ),
    responses(
        (status = 200, description = "User found", body = UserRecord),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_user_by_email(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    Path(email): Path<String>,
) -> AppResult<Json<UserRecord>> {
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(Json(user))
}

/// PUT /api/users/me - Update own profile (self-service)
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileInput,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdateResponse),
        (status = 400, description = "No valid fields, or a blank/oversized value")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn update_own_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<Json<ProfileUpdateResponse>> {
    let changes = input.validated()?;

    let user = state
        .users
        .update_fields(&auth.user.subject, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    tracing::info!(user_id = user.id, "Profile updated");

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully.".to_string(),
        user,
    }))
}
