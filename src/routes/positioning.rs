use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_login::AuthSession;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::policy::assert_master_account;
use crate::auth::user_store::Backend as AuthBackend;
use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::models::positioning::{CreateSessionRequest, SaveAnswersRequest};
use crate::models::users::User;
use crate::services::positioning_service;
use crate::state::AppState;

type CurrentAuthSession = AuthSession<AuthBackend>;

pub fn positioning_routes() -> Router<AppState> {
    Router::new()
        .route("/chapters", get(list_chapters_handler))
        .route(
            "/missions/by-chapter/{chapter_id}",
            get(list_missions_handler),
        )
        .route("/missions/{id}", get(get_mission_handler))
        .route("/missions/{id}/questions", get(list_questions_handler))
        .route(
            "/sessions",
            get(list_sessions_handler).post(create_session_handler),
        )
        .route("/sessions/{session_id}", get(get_session_handler))
        .route("/sessions/{session_id}/progress", get(get_progress_handler))
        .route(
            "/sessions/{session_id}/missions/{mission_id}/answers",
            get(get_answers_handler).post(save_answers_handler),
        )
}

/// Every brand-positioning endpoint requires an authenticated master account.
async fn require_master(
    auth_session: &CurrentAuthSession,
    state: &AppState,
) -> Result<User, AppError> {
    let user = auth_session
        .user
        .clone()
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;
    assert_master_account(&state.pool, user.id).await?;
    Ok(user)
}

#[instrument(skip(auth_session, state), err)]
pub async fn list_chapters_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;
    let chapters = positioning_service::list_chapters_with_counts(&state.pool).await?;
    Ok(Json(ApiResponse::new(chapters)))
}

#[instrument(skip(auth_session, state), err)]
pub async fn list_missions_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path(chapter_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;
    if chapter_id <= 0 {
        return Err(AppError::BadRequest("Invalid chapter id".to_string()));
    }
    let missions = positioning_service::list_missions_for_chapter(&state.pool, chapter_id).await?;
    Ok(Json(ApiResponse::new(missions)))
}

#[instrument(skip(auth_session, state), err)]
pub async fn get_mission_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path(mission_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;
    let mission = positioning_service::get_mission_with_questions(&state.pool, mission_id).await?;
    Ok(Json(ApiResponse::new(mission)))
}

#[instrument(skip(auth_session, state), err)]
pub async fn list_questions_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path(mission_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;
    let questions = positioning_service::list_questions_for_mission(&state.pool, mission_id).await?;
    Ok(Json(ApiResponse::new(questions)))
}

#[instrument(skip(auth_session, state), err)]
pub async fn list_sessions_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_master(&auth_session, &state).await?;
    let sessions = positioning_service::list_sessions_for_user(&state.pool, user.id).await?;
    Ok(Json(ApiResponse::new(sessions)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn create_session_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_master(&auth_session, &state).await?;
    let session = positioning_service::create_session(&state.pool, user.id, payload.title).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(session))))
}

#[instrument(skip(auth_session, state), err)]
pub async fn get_session_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_master(&auth_session, &state).await?;
    let detail =
        positioning_service::get_session_detail(&state.pool, user.id, session_id).await?;
    Ok(Json(ApiResponse::new(detail)))
}

#[instrument(skip(auth_session, state), err)]
pub async fn get_progress_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_master(&auth_session, &state).await?;
    let progress =
        positioning_service::get_chapter_progress(&state.pool, user.id, session_id).await?;
    Ok(Json(ApiResponse::new(progress)))
}

#[instrument(skip(auth_session, state), err)]
pub async fn get_answers_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path((session_id, mission_id)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_master(&auth_session, &state).await?;
    let answers =
        positioning_service::get_mission_answers(&state.pool, user.id, session_id, mission_id)
            .await?;
    Ok(Json(ApiResponse::new(answers)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn save_answers_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path((session_id, mission_id)): Path<(Uuid, i32)>,
    Json(payload): Json<SaveAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_master(&auth_session, &state).await?;
    positioning_service::save_mission_answers(
        &state.pool,
        user.id,
        session_id,
        mission_id,
        payload.answers,
    )
    .await?;
    Ok(Json(ApiResponse::new("Answers saved successfully")))
}
