// This file defines the auth module, including credential verification logic.

pub mod policy;
pub mod session_store;
pub mod user_store;

use crate::models::users::{NewUser, User};
use crate::schema::users;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper,
};
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Wrong credentials")]
    WrongCredentials,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Email already taken")]
    EmailTaken,
    #[error("Password hashing failed")]
    HashingError,
    #[error("User not found")]
    UserNotFound,
    #[error("Database error during authentication: {0}")]
    DatabaseError(String),
    #[error("Database pool error: {0}")]
    PoolError(#[from] deadpool_diesel::PoolError),
    #[error("Database interaction error: {0}")]
    InteractError(String),
}

// Manual From implementation for InteractError
impl From<deadpool_diesel::InteractError> for AuthError {
    fn from(err: deadpool_diesel::InteractError) -> Self {
        Self::InteractError(err.to_string())
    }
}

// From implementation for diesel::result::Error
impl From<diesel::result::Error> for AuthError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::UserNotFound,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => {
                if info.constraint_name() == Some("users_username_key") {
                    Self::UsernameTaken
                } else if info.constraint_name() == Some("users_email_key") {
                    Self::EmailTaken
                } else {
                    Self::DatabaseError(format!(
                        "Unique constraint violation: {:?}",
                        info.message()
                    ))
                }
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

/// Hashes a password on a blocking thread.
///
/// # Errors
///
/// Returns `AuthError::HashingError` if bcrypt fails or the blocking task
/// is cancelled.
pub async fn hash_password(password: Secret<String>) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password.expose_secret(), bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        error!(error = ?e, "Password hashing task failed to join");
        AuthError::HashingError
    })?
    .map_err(|e| {
        error!(error = ?e, "bcrypt hashing failed");
        AuthError::HashingError
    })
}

/// Inserts a new user row. The password must already be hashed.
#[instrument(skip(conn, new_user), err)]
pub fn create_user(conn: &mut PgConnection, new_user: NewUser) -> Result<User, AuthError> {
    debug!(username = %new_user.username, "Inserting new user into database");
    let insert_result = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result::<User>(conn);

    match insert_result {
        Ok(user) => {
            info!(user_id = %user.id, "User created successfully in DB.");
            Ok(user)
        }
        Err(e) => {
            error!(error = ?e, "Database error creating user");
            Err(AuthError::from(e))
        }
    }
}

/// Looks a user up by username or email and verifies the password.
#[instrument(skip(conn, password), err)]
pub fn verify_credentials(
    conn: &mut PgConnection,
    identifier: &str,
    password: Secret<String>,
) -> Result<User, AuthError> {
    debug!(%identifier, "Looking up user for credential verification");
    let user = users::table
        .filter(
            users::username
                .eq(identifier)
                .or(users::email.eq(identifier)),
        )
        .select(User::as_select())
        .first::<User>(conn)
        .map_err(AuthError::from)?;

    let password_matches = bcrypt::verify(password.expose_secret(), &user.password_hash)
        .map_err(|e| {
            error!(error = ?e, "bcrypt verification failed");
            AuthError::HashingError
        })?;

    if password_matches {
        info!(user_id = %user.id, "Credentials verified");
        Ok(user)
    } else {
        warn!(%identifier, "Password mismatch");
        Err(AuthError::WrongCredentials)
    }
}

/// Fetches a user by id.
#[instrument(skip(conn), err)]
pub fn get_user(conn: &mut PgConnection, user_id: Uuid) -> Result<User, AuthError> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first::<User>(conn)
        .map_err(AuthError::from)
}
