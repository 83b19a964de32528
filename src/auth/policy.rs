// src/auth/policy.rs
//
// The master-account check recurs across brand-positioning and TensorZero
// management endpoints; every gated handler goes through this single guard.

use diesel::prelude::*;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::schema::users;
use crate::state::DbPool;

/// Fails with Forbidden when the caller is a sub-account (non-null
/// parent_id), NotFound when the profile row does not exist.
#[instrument(skip(pool), err)]
pub async fn assert_master_account(pool: &DbPool, user_id: Uuid) -> Result<(), AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let parent_id = users::table
            .find(user_id)
            .select(users::parent_id)
            .first::<Option<Uuid>>(conn)
            .optional()?;

        match parent_id {
            Some(None) => Ok(()),
            Some(Some(parent)) => {
                warn!(%user_id, %parent, "Sub-account attempted to access a master-only endpoint");
                Err(AppError::Forbidden(
                    "Access restricted to master accounts".to_string(),
                ))
            }
            None => Err(AppError::NotFound("User profile not found".to_string())),
        }
    })
    .await?
}
