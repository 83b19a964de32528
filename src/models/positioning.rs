use crate::models::users::User;
use crate::schema::{positioning_sessions, session_answers, session_progress};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;
use uuid::Uuid;

// Import necessary Diesel traits for manual enum mapping
use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::{AsExpression, FromSqlRow};
use std::io::Write;

// Lifecycle of a brand positioning session
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = crate::schema::sql_types::PositioningStatus)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
}

// Manual ToSql implementation
impl ToSql<crate::schema::sql_types::PositioningStatus, Pg> for SessionStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            SessionStatus::Draft => out.write_all(b"draft")?,
            SessionStatus::InProgress => out.write_all(b"in_progress")?,
            SessionStatus::Completed => out.write_all(b"completed")?,
        }
        Ok(IsNull::No)
    }
}

// Manual FromSql implementation
impl FromSql<crate::schema::sql_types::PositioningStatus, Pg> for SessionStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"draft" => Ok(SessionStatus::Draft),
            b"in_progress" => Ok(SessionStatus::InProgress),
            b"completed" => Ok(SessionStatus::Completed),
            unrecognized => {
                error!(
                    "Unrecognized positioning_status enum variant from DB: {:?}",
                    String::from_utf8_lossy(unrecognized)
                );
                Err("Unrecognized enum variant from database".into())
            }
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Draft => write!(f, "draft"),
            SessionStatus::InProgress => write!(f, "in_progress"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A user's run through the chapter/mission/question questionnaire.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(table_name = positioning_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PositioningSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub status: SessionStatus,
    pub current_chapter: Option<i32>,
    pub current_mission: Option<i32>,
    pub total_progress: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = positioning_sessions)]
pub struct NewPositioningSession {
    pub user_id: Uuid,
    pub title: String,
    pub status: SessionStatus,
    pub total_progress: i32,
}

/// One stored answer, unique per (session, question).
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(belongs_to(PositioningSession, foreign_key = session_id))]
#[diesel(table_name = session_answers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionAnswer {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_id: i32,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = session_answers)]
pub struct NewSessionAnswer {
    pub session_id: Uuid,
    pub question_id: i32,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

/// Mission completion marker, unique per (session, chapter, mission).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = session_progress)]
pub struct NewSessionProgress {
    pub session_id: Uuid,
    pub chapter_id: i32,
    pub mission_id: i32,
    pub is_mission_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

// API Request/Response Structures

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreateSessionRequest {
    pub title: Option<String>,
}

/// Answers submitted for a mission, keyed by question id. JSON object keys
/// arrive as strings; serde parses them into i32 keys.
#[derive(Deserialize, Debug, Clone)]
pub struct SaveAnswersRequest {
    pub answers: HashMap<i32, String>,
}

/// Session detail enriched with questionnaire-wide counts and the
/// per-chapter progress map (chapter order_number -> percent).
#[derive(Serialize, Debug, Clone)]
pub struct SessionWithProgress {
    #[serde(flatten)]
    pub session: PositioningSession,
    pub answered_questions_count: i64,
    pub total_questions_count: i64,
    pub chapter_progress: HashMap<i32, i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_status_serde_names() {
        assert_eq!(
            serde_json::to_value(SessionStatus::InProgress).unwrap(),
            json!("in_progress")
        );
        assert_eq!(
            serde_json::from_value::<SessionStatus>(json!("completed")).unwrap(),
            SessionStatus::Completed
        );
    }

    #[test]
    fn test_save_answers_request_parses_integer_keys() {
        let parsed: SaveAnswersRequest = serde_json::from_value(json!({
            "answers": { "12": "We sell trust.", "15": "bold" }
        }))
        .expect("deserialize answers payload");
        assert_eq!(parsed.answers.len(), 2);
        assert_eq!(parsed.answers[&12], "We sell trust.");
    }

    #[test]
    fn test_session_with_progress_flattens_session() {
        let session = PositioningSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Q3 repositioning".to_string(),
            status: SessionStatus::Draft,
            current_chapter: None,
            current_mission: None,
            total_progress: 0,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let detail = SessionWithProgress {
            session,
            answered_questions_count: 3,
            total_questions_count: 12,
            chapter_progress: HashMap::from([(1, 25), (2, 0)]),
        };
        let value = serde_json::to_value(&detail).expect("serialize session detail");
        assert_eq!(value["title"], "Q3 repositioning");
        assert_eq!(value["status"], "draft");
        assert_eq!(value["answered_questions_count"], 3);
        assert_eq!(value["chapter_progress"]["1"], 25);
    }
}
