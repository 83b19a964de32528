use crate::models::users::User;
use crate::schema::{chat_messages, chat_sessions};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

// Import necessary Diesel traits for manual enum mapping
use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::{AsExpression, FromSqlRow};
use std::io::Write;

/// A conversation thread tied to one AI tool.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(table_name = chat_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tool_id: String,
    pub title: String,
    pub is_active: bool,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// For creating a new chat session
#[derive(Insertable, Debug)]
#[diesel(table_name = chat_sessions)]
pub struct NewChatSession {
    pub user_id: Uuid,
    pub tool_id: String,
    pub title: String,
    pub is_active: bool,
    pub last_message_at: DateTime<Utc>,
}

// Enum to represent the sender of a message
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = crate::schema::sql_types::MessageKind)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    User,
    Bot,
    System,
}

// Manual ToSql implementation
impl ToSql<crate::schema::sql_types::MessageKind, Pg> for MessageKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            MessageKind::User => out.write_all(b"user")?,
            MessageKind::Bot => out.write_all(b"bot")?,
            MessageKind::System => out.write_all(b"system")?,
        }
        Ok(IsNull::No)
    }
}

// Manual FromSql implementation
impl FromSql<crate::schema::sql_types::MessageKind, Pg> for MessageKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"user" => Ok(MessageKind::User),
            b"bot" => Ok(MessageKind::Bot),
            b"system" => Ok(MessageKind::System),
            unrecognized => {
                error!(
                    "Unrecognized message_kind enum variant from DB: {:?}",
                    String::from_utf8_lossy(unrecognized)
                );
                Err("Unrecognized enum variant from database".into())
            }
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::User => write!(f, "user"),
            MessageKind::Bot => write!(f, "bot"),
            MessageKind::System => write!(f, "system"),
        }
    }
}

/// A single message inside a chat session.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(belongs_to(ChatSession, foreign_key = session_id))]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

// For inserting a new chat message
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = chat_messages)]
pub struct NewChatMessage {
    pub session_id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub metadata: Option<Value>,
}

impl NewChatMessage {
    pub fn new(session_id: Uuid, kind: MessageKind, content: String) -> Self {
        Self {
            session_id,
            kind,
            content,
            metadata: None,
        }
    }
}

// API Request/Response Structures

#[derive(Deserialize, Debug)]
pub struct CreateChatSessionRequest {
    pub tool_id: Option<String>,
    pub title: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SendMessageRequest {
    pub session_id: Option<Uuid>,
    pub content: Option<String>,
}

/// One page of a session's messages, chronological within the page.
#[derive(Serialize, Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<ChatMessage>,
    pub has_more: bool,
    pub total_messages: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

impl MessagePage {
    /// The "no messages on this page" result used when a page lies past the
    /// end of the conversation.
    #[must_use]
    pub fn empty(page: i64) -> Self {
        Self {
            messages: Vec::new(),
            has_more: false,
            total_messages: 0,
            current_page: page,
            total_pages: 0,
        }
    }
}

/// Response for POST /api/chat/messages: the stored user message plus the
/// synthesized bot reply.
#[derive(Serialize, Debug, Clone)]
pub struct MessageExchange {
    pub user_message: ChatMessage,
    pub bot_message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_message(kind: MessageKind) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            kind,
            content: "Hello!".to_string(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_message_kind_serde_names() {
        assert_eq!(serde_json::to_value(MessageKind::Bot).unwrap(), json!("bot"));
        assert_eq!(
            serde_json::from_value::<MessageKind>(json!("system")).unwrap(),
            MessageKind::System
        );
    }

    #[test]
    fn test_message_kind_display() {
        assert_eq!(MessageKind::User.to_string(), "user");
        assert_eq!(MessageKind::Bot.to_string(), "bot");
        assert_eq!(MessageKind::System.to_string(), "system");
    }

    #[test]
    fn test_debug_chat_message() {
        let message = sample_message(MessageKind::User);
        let debug_output = format!("{message:?}");
        assert!(debug_output.contains("kind: User"));
        assert!(debug_output.contains("Hello!"));
    }

    #[test]
    fn test_empty_page_shape() {
        let page = MessagePage::empty(3);
        assert!(page.messages.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_new_chat_message_defaults_metadata() {
        let new_message =
            NewChatMessage::new(Uuid::new_v4(), MessageKind::Bot, "Hi there!".to_string());
        assert!(new_message.metadata.is_none());
        assert_eq!(new_message.kind, MessageKind::Bot);
    }
}
