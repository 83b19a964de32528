use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_login::AuthSession;
use tracing::instrument;

use crate::auth::user_store::Backend as AuthBackend;
use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::models::users::UpdateProfileRequest;
use crate::services::profile_service;
use crate::state::AppState;

type CurrentAuthSession = AuthSession<AuthBackend>;

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(get_profile_handler).put(update_profile_handler),
    )
}

#[instrument(skip(auth_session, state), err)]
pub async fn get_profile_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_session
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    let profile = profile_service::get_profile(&state.pool, user.id).await?;
    Ok(Json(ApiResponse::new(profile)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn update_profile_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_session
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    let updated = profile_service::update_profile(&state.pool, user.id, payload).await?;
    Ok(Json(ApiResponse::new(updated)))
}
