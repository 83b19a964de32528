// src/services/profile_service.rs

use chrono::Utc;
use diesel::prelude::*;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::users::{UpdateProfileRequest, User},
    schema::users,
    state::DbPool,
};

/// Fetches the caller's profile row.
#[instrument(skip(pool), err)]
pub async fn get_profile(pool: &DbPool, user_id: Uuid) -> Result<User, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first::<User>(conn)
            .optional()?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    })
    .await?
}

/// Applies a whitelisted partial update to the caller's profile. Fields the
/// payload leaves as None stay untouched; updated_at is always stamped.
#[instrument(skip(pool, update), err)]
pub async fn update_profile(
    pool: &DbPool,
    user_id: Uuid,
    update: UpdateProfileRequest,
) -> Result<User, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let updated = diesel::update(users::table.find(user_id))
            .set((update, users::updated_at.eq(Utc::now())))
            .returning(User::as_returning())
            .get_result::<User>(conn)
            .optional()?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        info!(%user_id, "User profile updated");
        Ok(updated)
    })
    .await?
}
