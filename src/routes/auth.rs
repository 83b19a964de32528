use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_login::AuthSession;
use secrecy::ExposeSecret;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::user_store::Backend as AuthBackend;
use crate::auth::{self, hash_password};
use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::models::auth::{AuthResponse, LoginPayload, MIN_PASSWORD_LENGTH, RegisterPayload};
use crate::models::users::NewUser;
use crate::state::AppState;

type CurrentAuthSession = AuthSession<AuthBackend>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/me", get(me_handler))
}

#[instrument(skip(state, payload), err)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if payload.password.expose_secret().len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::ValidationError(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let password_hash = hash_password(payload.password.clone()).await?;
    let new_user = NewUser {
        username: payload.username.clone(),
        email: payload.email.clone(),
        password_hash,
        parent_id: payload.parent_id,
    };

    let pool = state.pool.clone();
    let user = pool
        .get()
        .await?
        .interact(move |conn| auth::create_user(conn, new_user))
        .await?
        .map_err(AppError::from)?;

    info!(user_id = %user.id, "User registration successful");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(AuthResponse::from(&user))),
    ))
}

#[instrument(skip(auth_session, payload), err)]
pub async fn login_handler(
    mut auth_session: CurrentAuthSession,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    let user = match auth_session.authenticate(payload.clone()).await? {
        Some(user) => user,
        None => {
            warn!(identifier = %payload.identifier, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }
    };

    auth_session.login(&user).await?;
    info!(user_id = %user.id, "User logged in");
    Ok(Json(ApiResponse::new(AuthResponse::from(&user))))
}

#[instrument(skip(auth_session), err)]
pub async fn logout_handler(
    mut auth_session: CurrentAuthSession,
) -> Result<impl IntoResponse, AppError> {
    match auth_session.logout().await? {
        Some(user) => info!(user_id = %user.id, "User logged out"),
        None => warn!("Logout called without an active session"),
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(auth_session), err)]
pub async fn me_handler(auth_session: CurrentAuthSession) -> Result<impl IntoResponse, AppError> {
    let user = auth_session
        .user
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;
    Ok(Json(ApiResponse::new(AuthResponse::from(&user))))
}
