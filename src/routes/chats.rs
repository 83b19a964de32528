use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use axum_login::AuthSession;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::user_store::Backend as AuthBackend;
use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::models::chats::{CreateChatSessionRequest, SendMessageRequest};
use crate::services::chat_service;
use crate::state::AppState;

type CurrentAuthSession = AuthSession<AuthBackend>;

const DEFAULT_PAGE_LIMIT: i64 = 20;

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions",
            get(list_sessions_handler).post(create_session_handler),
        )
        .route("/sessions/{id}", delete(delete_session_handler))
        .route("/sessions/{id}/messages", get(get_messages_handler))
        .route("/messages", post(send_message_handler))
}

#[derive(Deserialize, Debug, Default)]
pub struct SessionListQuery {
    pub tool_id: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[instrument(skip(auth_session, state), err)]
pub async fn list_sessions_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_session
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    let sessions =
        chat_service::list_sessions_for_user(&state.pool, user.id, query.tool_id).await?;
    Ok(Json(ApiResponse::new(sessions)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn create_session_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateChatSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_session
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    let tool_id = payload
        .tool_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Tool id is required".to_string()))?;

    info!(user_id = %user.id, %tool_id, "Creating chat session");
    let session =
        chat_service::create_session(&state.pool, user.id, tool_id, payload.title).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(session))))
}

#[instrument(skip(auth_session, state), err)]
pub async fn delete_session_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_session
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    chat_service::delete_session(&state.pool, user.id, session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(auth_session, state), err)]
pub async fn get_messages_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_session
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let messages =
        chat_service::get_messages_page(&state.pool, user.id, session_id, page, limit).await?;
    Ok(Json(ApiResponse::new(messages)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn send_message_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_session
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    let session_id = payload
        .session_id
        .ok_or_else(|| AppError::BadRequest("Session id is required".to_string()))?;
    let content = payload
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Message content is required".to_string()))?;

    let exchange =
        chat_service::create_exchange(&state.pool, user.id, session_id, content).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(exchange))))
}
