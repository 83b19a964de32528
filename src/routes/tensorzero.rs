use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_login::AuthSession;
use tracing::instrument;

use crate::auth::policy::assert_master_account;
use crate::auth::user_store::Backend as AuthBackend;
use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::models::tensorzero::{
    CreateFunctionRequest, CreateModelRequest, CreateVariantRequest, NewTensorZeroFunction,
    NewTensorZeroModel, NewTensorZeroVariant, SaveConfigRequest, SaveConfigResponse,
    VariantListQuery, WriteConfigRequest,
};
use crate::models::users::User;
use crate::services::tensorzero_config;
use crate::state::AppState;

type CurrentAuthSession = AuthSession<AuthBackend>;

pub fn tensorzero_routes() -> Router<AppState> {
    Router::new()
        .route("/models", get(list_models_handler).post(create_model_handler))
        .route(
            "/functions",
            get(list_functions_handler).post(create_function_handler),
        )
        .route(
            "/variants",
            get(list_variants_handler).post(create_variant_handler),
        )
        .route("/config", post(write_config_handler))
        .route("/config/generate", get(generate_config_handler))
        .route("/config/save", post(save_config_handler))
}

/// TensorZero management is restricted to authenticated master accounts.
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
pub async fn list_models_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;
    let models = tensorzero_config::list_models(&state.pool).await?;
    Ok(Json(ApiResponse::new(models)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn create_model_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateModelRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;

    let new_model = NewTensorZeroModel {
        name: required(payload.name, "name")?,
        provider: required(payload.provider, "provider")?,
        model_type: required(payload.model_type, "model_type")?,
        api_key_field: required(payload.api_key_field, "api_key_field")?,
        max_tokens: payload.max_tokens,
        temperature: payload.temperature,
        is_active: payload.is_active.unwrap_or(true),
    };

    let model = tensorzero_config::create_model(&state.pool, new_model).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(model))))
}

#[instrument(skip(auth_session, state), err)]
pub async fn list_functions_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;
    let functions = tensorzero_config::list_functions(&state.pool).await?;
    Ok(Json(ApiResponse::new(functions)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn create_function_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateFunctionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_master(&auth_session, &state).await?;

    let new_function = NewTensorZeroFunction {
        user_id: user.id,
        name: required(payload.name, "name")?,
        function_type: required(payload.function_type, "function_type")?,
        description: payload.description,
        is_active: payload.is_active.unwrap_or(true),
    };

    let function = tensorzero_config::create_function(&state.pool, new_function).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(function))))
}

#[instrument(skip(auth_session, state), err)]
pub async fn list_variants_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Query(query): Query<VariantListQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;
    let variants = tensorzero_config::list_variants(&state.pool, query.function_id).await?;
    Ok(Json(ApiResponse::new(variants)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn create_variant_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateVariantRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;

    let new_variant = NewTensorZeroVariant {
        function_id: required(payload.function_id, "function_id")?,
        model_id: required(payload.model_id, "model_id")?,
        name: required(payload.name, "name")?,
        variant_type: required(payload.variant_type, "variant_type")?,
        weight: payload.weight.unwrap_or(1.0),
        system_prompt: payload.system_prompt,
        user_prompt: payload.user_prompt,
        json_schema: payload.json_schema,
        is_active: payload.is_active.unwrap_or(true),
    };

    let variant = tensorzero_config::create_variant(&state.pool, new_variant).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(variant))))
}

#[instrument(skip(auth_session, state), err)]
pub async fn generate_config_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;
    let config = tensorzero_config::generate_config(&state.pool).await?;
    Ok(Json(ApiResponse::new(config)))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn write_config_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<WriteConfigRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_master(&auth_session, &state).await?;

    let content = payload
        .content
        .filter(|content| !content.is_empty())
        .ok_or_else(|| AppError::BadRequest("Content is required".to_string()))?;
    let file_path = payload
        .file_path
        .unwrap_or_else(|| state.config.tensorzero_config_path.clone());

    let written =
        tensorzero_config::write_config_file(std::path::Path::new(&file_path), &content).await?;
    Ok(Json(ApiResponse::new(written.display().to_string())))
}

#[instrument(skip(auth_session, state, payload), err)]
pub async fn save_config_handler(
    auth_session: CurrentAuthSession,
    State(state): State<AppState>,
    Json(payload): Json<SaveConfigRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_master(&auth_session, &state).await?;

    let functions = payload
        .functions
        .ok_or_else(|| AppError::BadRequest("Functions data is required".to_string()))?;
    let variants = payload
        .variants
        .ok_or_else(|| AppError::BadRequest("Variants data is required".to_string()))?;

    let (saved_functions, saved_variants) =
        tensorzero_config::save_config_batch(&state.pool, user.id, functions, variants).await?;

    let mut toml_content = None;
    let mut written_path = None;
    if payload.generate_file {
        let config = tensorzero_config::generate_config(&state.pool).await?;
        let file_path = payload
            .file_path
            .unwrap_or_else(|| state.config.tensorzero_config_path.clone());
        let written =
            tensorzero_config::write_config_file(std::path::Path::new(&file_path), &config)
                .await?;
        written_path = Some(written.display().to_string());
        toml_content = Some(config);
    }

    Ok(Json(ApiResponse::new(SaveConfigResponse {
        functions: saved_functions,
        variants: saved_variants,
        toml_content,
        file_path: written_path,
    })))
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}
