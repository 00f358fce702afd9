use axum::Json;

use crate::{extractors::AuthenticatedUser, models::UserRecord, AppResult};

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current authenticated user, created on first sign-in", body = UserRecord),
        (status = 401, description = "Missing, invalid or expired bearer token"),
        (status = 503, description = "User store unavailable")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(auth: AuthenticatedUser) -> AppResult<Json<UserRecord>> {
    Ok(Json(auth.user))
}
