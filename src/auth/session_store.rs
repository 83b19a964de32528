// src/auth/session_store.rs
//
// Diesel-backed implementation of the tower-sessions SessionStore trait.
// Session records live in the `sessions` table as JSON strings.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use std::fmt::{self, Debug};

use crate::schema::sessions;
use crate::state::DbPool;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use axum_login::tower_sessions::{
    SessionStore,
    session::{Id, Record},
    session_store,
};
use tracing::{debug, error, info, instrument};

// Mirrors the `sessions` table in schema.rs.
#[derive(Queryable, Insertable, AsChangeset, Identifiable, Debug, Clone)]
#[diesel(table_name = sessions)]
#[diesel(primary_key(id))]
pub struct SessionRecord {
    pub id: String,
    pub expires: Option<DateTime<Utc>>,
    pub session: String,
}

#[derive(Clone)]
pub struct DieselSessionStore {
    pool: DbPool,
}

// Manually implement Debug because DbPool doesn't implement it.
impl Debug for DieselSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DieselSessionStore")
            .field("pool", &"<DbPool>")
            .finish()
    }
}

impl DieselSessionStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_diesel_error(e: &DieselError) -> session_store::Error {
        error!(error = ?e, "Diesel operation failed");
        match e {
            DieselError::NotFound => {
                session_store::Error::Backend("Session record not found in DB".into())
            }
            _ => session_store::Error::Backend(e.to_string()),
        }
    }

    fn map_pool_error(e: &deadpool_diesel::PoolError) -> session_store::Error {
        error!(error = ?e, "Failed to get connection from pool");
        session_store::Error::Backend(e.to_string())
    }

    fn map_interact_error(e: &deadpool_diesel::InteractError) -> session_store::Error {
        error!(error = ?e, "Interact error during DB operation");
        session_store::Error::Backend(e.to_string())
    }

    fn map_json_error(e: &serde_json::Error) -> session_store::Error {
        error!(error = ?e, "Session JSON serialization/deserialization failed");
        session_store::Error::Decode(e.to_string())
    }

    /// Deletes sessions whose expiration timestamp has passed.
    #[instrument(skip(self), err)]
    pub async fn delete_expired_sessions(&self) -> Result<usize, session_store::Error> {
        let pool = self.pool.clone();
        let now = Utc::now();

        let deleted = pool
            .get()
            .await
            .map_err(|e| Self::map_pool_error(&e))?
            .interact(move |conn| {
                diesel::delete(sessions::table.filter(sessions::expires.lt(now)))
                    .execute(conn)
                    .map_err(|e| Self::map_diesel_error(&e))
            })
            .await
            .map_err(|e| Self::map_interact_error(&e))??;

        info!(deleted_count = deleted, "Deleted expired sessions");
        Ok(deleted)
    }
}

// Helper function to convert time::OffsetDateTime to chrono::DateTime<Utc>
#[must_use]
pub fn offset_to_utc(offset_dt: Option<OffsetDateTime>) -> Option<DateTime<Utc>> {
    offset_dt.and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), 0))
}

// Helper function to convert chrono::DateTime<Utc> to time::OffsetDateTime
fn utc_to_offset(utc_dt: Option<DateTime<Utc>>) -> Option<OffsetDateTime> {
    utc_dt.and_then(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).ok())
}

#[async_trait]
impl SessionStore for DieselSessionStore {
    #[instrument(skip(self, session), err)]
    async fn save(&self, session: &Record) -> session_store::Result<()> {
        let session_data_json =
            serde_json::to_string(&session.data).map_err(|e| Self::map_json_error(&e))?;

        let record = SessionRecord {
            id: session.id.0.to_string(),
            expires: offset_to_utc(Some(session.expiry_date)),
            session: session_data_json,
        };

        debug!(session_id = %record.id, expires = ?record.expires, "Saving session record");

        let pool = self.pool.clone();
        pool.get()
            .await
            .map_err(|e| Self::map_pool_error(&e))?
            .interact(move |conn| {
                diesel::insert_into(sessions::table)
                    .values(&record)
                    .on_conflict(sessions::id)
                    .do_update()
                    .set((
                        sessions::expires.eq(&record.expires),
                        sessions::session.eq(&record.session),
                    ))
                    .execute(conn)
                    .map_err(|e| Self::map_diesel_error(&e))
            })
            .await
            .map_err(|e| Self::map_interact_error(&e))??;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let session_id_str = session_id.0.to_string();
        let pool = self.pool.clone();

        let lookup_id = session_id_str.clone();
        let maybe_db_record = pool
            .get()
            .await
            .map_err(|e| Self::map_pool_error(&e))?
            .interact(move |conn| {
                sessions::table
                    .find(&lookup_id)
                    .first::<SessionRecord>(conn)
                    .optional()
                    .map_err(|e| Self::map_diesel_error(&e))
            })
            .await
            .map_err(|e| Self::map_interact_error(&e))??;

        let Some(db_record) = maybe_db_record else {
            debug!(session_id = %session_id_str, "Session record not found in DB.");
            return Ok(None);
        };

        let session_data: std::collections::HashMap<String, serde_json::Value> =
            serde_json::from_str(&db_record.session).map_err(|e| Self::map_json_error(&e))?;

        let Some(expiry_date) = utc_to_offset(db_record.expires) else {
            // A record without a usable expiry is unloadable; drop it.
            error!(session_id = %session_id_str, "Session record has no usable expiry, deleting.");
            self.delete(session_id).await?;
            return Ok(None);
        };

        if expiry_date <= OffsetDateTime::now_utc() {
            info!(session_id = %session_id_str, "Session loaded but expired, deleting.");
            self.delete(session_id).await?;
            return Ok(None);
        }

        Ok(Some(Record {
            id: *session_id,
            data: session_data,
            expiry_date,
        }))
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        let session_id_str = session_id.0.to_string();
        let pool = self.pool.clone();

        pool.get()
            .await
            .map_err(|e| Self::map_pool_error(&e))?
            .interact(move |conn| {
                diesel::delete(sessions::table.find(session_id_str))
                    .execute(conn)
                    .map_err(|e| Self::map_diesel_error(&e))
            })
            .await
            .map_err(|e| Self::map_interact_error(&e))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_utc_round_trip() {
        let now = OffsetDateTime::from_unix_timestamp(1_750_000_000).unwrap();
        let utc = offset_to_utc(Some(now)).expect("convert to chrono");
        let back = utc_to_offset(Some(utc)).expect("convert back to time");
        assert_eq!(back.unix_timestamp(), now.unix_timestamp());
    }

    #[test]
    fn test_missing_expiry_converts_to_none() {
        assert!(offset_to_utc(None).is_none());
        assert!(utc_to_offset(None).is_none());
    }
}
