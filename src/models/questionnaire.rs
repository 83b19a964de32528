use crate::schema::{chapters, missions, questions};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

// Import necessary Diesel traits for manual enum mapping
use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::{AsExpression, FromSqlRow};
use std::io::Write;

/// A chapter of the brand positioning questionnaire.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = chapters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Chapter {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub order_number: i32,
    pub reward_title: String,
    pub created_at: DateTime<Utc>,
}

/// A mission inside a chapter.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(belongs_to(Chapter, foreign_key = chapter_id))]
#[diesel(table_name = missions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Mission {
    pub id: i32,
    pub chapter_id: i32,
    pub title: String,
    pub description: String,
    pub order_number: i32,
    pub created_at: DateTime<Utc>,
}

// Enum to represent the rendering kind of a question
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = crate::schema::sql_types::QuestionKind)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Text,
    Textarea,
    Select,
    MultiSelect,
}

// Manual ToSql implementation
impl ToSql<crate::schema::sql_types::QuestionKind, Pg> for QuestionType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            QuestionType::Text => out.write_all(b"text")?,
            QuestionType::Textarea => out.write_all(b"textarea")?,
            QuestionType::Select => out.write_all(b"select")?,
            QuestionType::MultiSelect => out.write_all(b"multi_select")?,
        }
        Ok(IsNull::No)
    }
}

// Manual FromSql implementation
impl FromSql<crate::schema::sql_types::QuestionKind, Pg> for QuestionType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"text" => Ok(QuestionType::Text),
            b"textarea" => Ok(QuestionType::Textarea),
            b"select" => Ok(QuestionType::Select),
            b"multi_select" => Ok(QuestionType::MultiSelect),
            unrecognized => {
                error!(
                    "Unrecognized question_kind enum variant from DB: {:?}",
                    String::from_utf8_lossy(unrecognized)
                );
                Err("Unrecognized enum variant from database".into())
            }
        }
    }
}

/// A question inside a mission. `options` holds the choices for select-style
/// questions as a JSON array.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(belongs_to(Mission, foreign_key = mission_id))]
#[diesel(table_name = questions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Question {
    pub id: i32,
    pub mission_id: i32,
    pub prompt: String,
    pub description: Option<String>,
    pub question_kind: QuestionType,
    pub options: Option<Value>,
    pub is_required: bool,
    pub order_number: i32,
    pub created_at: DateTime<Utc>,
}

// API response shapes

/// Chapter annotated with the number of missions it contains.
#[derive(Serialize, Debug, Clone)]
pub struct ChapterWithCount {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub missions_count: i64,
}

/// Mission returned together with its ordered questions.
#[derive(Serialize, Debug, Clone)]
pub struct MissionWithQuestions {
    #[serde(flatten)]
    pub mission: Mission,
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_question() -> Question {
        Question {
            id: 7,
            mission_id: 3,
            prompt: "Which words describe your brand?".to_string(),
            description: None,
            question_kind: QuestionType::MultiSelect,
            options: Some(json!(["bold", "playful", "premium"])),
            is_required: true,
            order_number: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_question_kind_serde_names() {
        assert_eq!(
            serde_json::to_value(QuestionType::MultiSelect).unwrap(),
            json!("multi_select")
        );
        assert_eq!(
            serde_json::from_value::<QuestionType>(json!("textarea")).unwrap(),
            QuestionType::Textarea
        );
    }

    #[test]
    fn test_question_serializes_options_array() {
        let question = sample_question();
        let value = serde_json::to_value(&question).expect("serialize question");
        assert_eq!(value["question_kind"], "multi_select");
        assert_eq!(value["options"][0], "bold");
    }

    #[test]
    fn test_chapter_with_count_flattens() {
        let chapter = Chapter {
            id: 1,
            title: "Foundations".to_string(),
            description: "Define who you are".to_string(),
            icon: "flag".to_string(),
            order_number: 1,
            reward_title: "Foundation Builder".to_string(),
            created_at: Utc::now(),
        };
        let annotated = ChapterWithCount {
            chapter,
            missions_count: 4,
        };
        let value = serde_json::to_value(&annotated).expect("serialize chapter");
        assert_eq!(value["title"], "Foundations");
        assert_eq!(value["missions_count"], 4);
    }
}
