// src/auth/user_store.rs
use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId};
use std::fmt::{self, Debug};
use tracing::{debug, error, info, instrument, warn};

use crate::auth::AuthError;
use crate::models::auth::LoginPayload;
use crate::models::users::User;
use crate::state::DbPool;

// Manually implement Debug because DbPool doesn't implement it.
#[derive(Clone)]
pub struct Backend {
    pool: DbPool,
}

impl Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("pool", &"<DbPool>")
            .finish()
    }
}

impl Backend {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = User;
    type Credentials = LoginPayload;
    type Error = AuthError;

    #[instrument(skip(self, creds), err)]
    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let pool = self.pool.clone();
        let identifier = creds.identifier.clone();
        let password = creds.password.clone();

        let verify_result = pool
            .get()
            .await
            .map_err(AuthError::PoolError)?
            .interact(move |conn| crate::auth::verify_credentials(conn, &identifier, password))
            .await
            .map_err(AuthError::from)?;

        match verify_result {
            Ok(user) => {
                info!(identifier = %creds.identifier, user_id = %user.id, "Authentication successful.");
                Ok(Some(user))
            }
            Err(AuthError::WrongCredentials) => {
                warn!(identifier = %creds.identifier, "Authentication failed (wrong credentials).");
                Ok(None)
            }
            Err(AuthError::UserNotFound) => {
                warn!(identifier = %creds.identifier, "Authentication failed (user not found).");
                Ok(None)
            }
            Err(e) => {
                error!(identifier = %creds.identifier, error = ?e, "Authentication failed.");
                Err(e)
            }
        }
    }

    #[instrument(skip(self), err)]
    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        let pool = self.pool.clone();
        let id: uuid::Uuid = *user_id;

        let get_result = pool
            .get()
            .await
            .map_err(AuthError::PoolError)?
            .interact(move |conn| crate::auth::get_user(conn, id))
            .await
            .map_err(AuthError::from)?;

        match get_result {
            Ok(user) => Ok(Some(user)),
            Err(AuthError::UserNotFound) => {
                // Not an error for session restoration; the session simply dies.
                debug!(user_id = %id, "Get user failed (user not found).");
                Ok(None)
            }
            Err(e) => {
                error!(user_id = %id, error = ?e, "Get user failed.");
                Err(e)
            }
        }
    }
}
