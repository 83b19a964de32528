// src/services/chat_service.rs

use chrono::Utc;
use diesel::prelude::*;
use rand::seq::SliceRandom;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::chats::{
        ChatMessage, ChatSession, MessageExchange, MessageKind, MessagePage, NewChatMessage,
        NewChatSession,
    },
    schema::{chat_messages, chat_sessions},
    state::DbPool,
};

/// Offset of the first row on a 1-based page.
pub(crate) const fn page_offset(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}

/// Whether rows remain past the current page window.
pub(crate) const fn page_has_more(offset: i64, limit: i64, total: i64) -> bool {
    offset + limit < total
}

pub(crate) fn total_pages(total: i64, limit: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

/// Verifies that the chat session exists and belongs to the user.
/// Missing and non-owned sessions are indistinguishable to the caller.
fn assert_session_owner(
    conn: &mut PgConnection,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<ChatSession, AppError> {
    chat_sessions::table
        .filter(chat_sessions::id.eq(session_id))
        .filter(chat_sessions::user_id.eq(user_id))
        .select(ChatSession::as_select())
        .first::<ChatSession>(conn)
        .optional()?
        .ok_or_else(|| AppError::NotFound("Chat session not found or not authorized".to_string()))
}

/// Lists the caller's chat sessions, most recently active first, optionally
/// restricted to one tool.
#[instrument(skip(pool), err)]
pub async fn list_sessions_for_user(
    pool: &DbPool,
    user_id: Uuid,
    tool_id: Option<String>,
) -> Result<Vec<ChatSession>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let mut query = chat_sessions::table
            .filter(chat_sessions::user_id.eq(user_id))
            .order(chat_sessions::last_message_at.desc())
            .select(ChatSession::as_select())
            .into_boxed();

        if let Some(tool_id) = tool_id {
            query = query.filter(chat_sessions::tool_id.eq(tool_id));
        }

        query.load::<ChatSession>(conn).map_err(AppError::from)
    })
    .await?
}

/// Creates a chat session for a tool. The title defaults to a dated label.
#[instrument(skip(pool), err)]
pub async fn create_session(
    pool: &DbPool,
    user_id: Uuid,
    tool_id: String,
    title: Option<String>,
) -> Result<ChatSession, AppError> {
    let conn = pool.get().await?;
    let created = conn
        .interact(move |conn| {
            let now = Utc::now();
            let new_session = NewChatSession {
                user_id,
                tool_id,
                title: title.unwrap_or_else(|| {
                    format!("New conversation - {}", now.format("%Y-%m-%d"))
                }),
                is_active: true,
                last_message_at: now,
            };
            diesel::insert_into(chat_sessions::table)
                .values(&new_session)
                .returning(ChatSession::as_returning())
                .get_result::<ChatSession>(conn)
                .map_err(AppError::from)
        })
        .await??;

    info!(session_id = %created.id, %user_id, "Chat session created");
    Ok(created)
}

/// Deletes the caller's chat session; messages cascade at the schema level.
#[instrument(skip(pool), err)]
pub async fn delete_session(
    pool: &DbPool,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<(), AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let deleted = diesel::delete(
            chat_sessions::table
                .filter(chat_sessions::id.eq(session_id))
                .filter(chat_sessions::user_id.eq(user_id)),
        )
        .execute(conn)?;

        if deleted == 0 {
            warn!(%session_id, %user_id, "Delete targeted a missing or foreign chat session");
            return Err(AppError::NotFound(
                "Chat session not found or not authorized".to_string(),
            ));
        }
        info!(%session_id, "Chat session deleted");
        Ok(())
    })
    .await?
}

/// Returns one page of a session's messages.
///
/// Storage order is newest-first; the page slice is reversed to chronological
/// order before returning. Page 1 is a plain head-limited query; later pages
/// use an explicit offset window. A page past the end of the conversation is
/// an empty page, not an error.
#[instrument(skip(pool), err)]
pub async fn get_messages_page(
    pool: &DbPool,
    user_id: Uuid,
    session_id: Uuid,
    page: i64,
    limit: i64,
) -> Result<MessagePage, AppError> {
    let page = page.max(1);
    let limit = limit.max(1);
    let offset = page_offset(page, limit);

    let conn = pool.get().await?;
    conn.interact(move |conn| {
        assert_session_owner(conn, session_id, user_id)?;

        let total: i64 = chat_messages::table
            .filter(chat_messages::session_id.eq(session_id))
            .count()
            .get_result(conn)?;

        if offset >= total {
            return Ok(MessagePage {
                total_messages: total,
                total_pages: total_pages(total, limit),
                ..MessagePage::empty(page)
            });
        }

        let newest_first = chat_messages::table
            .filter(chat_messages::session_id.eq(session_id))
            .order(chat_messages::created_at.desc())
            .select(ChatMessage::as_select());

        let mut messages: Vec<ChatMessage> = if page > 1 {
            newest_first.offset(offset).limit(limit).load(conn)?
        } else {
            newest_first.limit(limit).load(conn)?
        };
        messages.reverse();

        Ok(MessagePage {
            messages,
            has_more: page_has_more(offset, limit, total),
            total_messages: total,
            current_page: page,
            total_pages: total_pages(total, limit),
        })
    })
    .await?
}

/// Stores a user message and a synthesized bot reply, bumping the session's
/// last-message timestamp. The three writes run in one transaction.
#[instrument(skip(pool, content), err)]
pub async fn create_exchange(
    pool: &DbPool,
    user_id: Uuid,
    session_id: Uuid,
    content: String,
) -> Result<MessageExchange, AppError> {
    let reply = synthesize_reply(&content);

    let conn = pool.get().await?;
    let exchange = conn
        .interact(move |conn| {
            conn.transaction(|conn| {
                assert_session_owner(conn, session_id, user_id)?;

                let user_message = insert_message(
                    conn,
                    NewChatMessage::new(session_id, MessageKind::User, content),
                )?;
                let bot_message = insert_message(
                    conn,
                    NewChatMessage::new(session_id, MessageKind::Bot, reply),
                )?;

                let now = Utc::now();
                diesel::update(chat_sessions::table.find(session_id))
                    .set((
                        chat_sessions::last_message_at.eq(now),
                        chat_sessions::updated_at.eq(Some(now)),
                    ))
                    .execute(conn)?;

                Ok::<_, AppError>(MessageExchange {
                    user_message,
                    bot_message,
                })
            })
        })
        .await??;

    info!(
        session_id = %session_id,
        user_message_id = %exchange.user_message.id,
        bot_message_id = %exchange.bot_message.id,
        "Message exchange stored"
    );
    Ok(exchange)
}

fn insert_message(
    conn: &mut PgConnection,
    message: NewChatMessage,
) -> Result<ChatMessage, AppError> {
    diesel::insert_into(chat_messages::table)
        .values(&message)
        .returning(ChatMessage::as_returning())
        .get_result::<ChatMessage>(conn)
        .map_err(AppError::from)
}

/// Canned bot responder standing in for the real tool webhook.
#[must_use]
pub fn synthesize_reply(user_content: &str) -> String {
    let templates = [
        format!("I understand you said: \"{user_content}\". How can I help with that?"),
        format!("Interesting! About \"{user_content}\", I can suggest a few options..."),
        format!("Let me look into \"{user_content}\" and get back with a detailed answer."),
        format!("Based on what you mentioned (\"{user_content}\"), here is my suggestion..."),
        format!("Great question! About \"{user_content}\", I can explain that..."),
    ];
    templates
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset_is_one_based() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(2, 20), 20);
        assert_eq!(page_offset(3, 5), 10);
    }

    #[test]
    fn test_has_more_at_boundaries() {
        // 15 stored messages, limit 20: page 1 covers everything.
        assert!(!page_has_more(0, 20, 15));
        // Page 2 starts past the end.
        assert!(!page_has_more(20, 20, 15));
        // 45 messages: pages 1 and 2 leave a remainder.
        assert!(page_has_more(0, 20, 45));
        assert!(page_has_more(20, 20, 45));
        assert!(!page_has_more(40, 20, 45));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(15, 20), 1);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(41, 20), 3);
    }

    #[test]
    fn test_synthesized_reply_quotes_the_user() {
        let reply = synthesize_reply("improve my landing page");
        assert!(reply.contains("improve my landing page"));
    }
}
