// src/services/positioning_service.rs

use chrono::Utc;
use diesel::prelude::*;
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{
        positioning::{
            NewPositioningSession, NewSessionAnswer, NewSessionProgress, PositioningSession,
            SessionStatus, SessionWithProgress,
        },
        questionnaire::{Chapter, ChapterWithCount, Mission, MissionWithQuestions, Question},
    },
    schema::{
        chapters, missions, positioning_sessions, questions, session_answers, session_progress,
    },
    state::DbPool,
};

const DEFAULT_SESSION_TITLE: &str = "New positioning session";

/// Percentage of answered questions, rounded to the nearest integer.
/// A chapter with zero questions reports 0, never NaN.
pub(crate) fn chapter_percent(answered: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    ((answered as f64 / total as f64) * 100.0).round() as i32
}

/// Verifies that the positioning session exists and belongs to the user.
fn assert_session_owner(
    conn: &mut PgConnection,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<PositioningSession, AppError> {
    positioning_sessions::table
        .filter(positioning_sessions::id.eq(session_id))
        .filter(positioning_sessions::user_id.eq(user_id))
        .select(PositioningSession::as_select())
        .first::<PositioningSession>(conn)
        .optional()?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

/// Per-chapter progress keyed by chapter order_number. The numerator counts
/// session answers whose question belongs to the chapter's missions.
fn compute_chapter_progress(
    conn: &mut PgConnection,
    session_id: Uuid,
) -> Result<HashMap<i32, i32>, AppError> {
    let chapter_rows: Vec<(i32, i32)> = chapters::table
        .select((chapters::id, chapters::order_number))
        .order(chapters::order_number.asc())
        .load(conn)?;

    let mut progress = HashMap::with_capacity(chapter_rows.len());
    for (chapter_id, order_number) in chapter_rows {
        let mission_ids: Vec<i32> = missions::table
            .filter(missions::chapter_id.eq(chapter_id))
            .select(missions::id)
            .load(conn)?;

        if mission_ids.is_empty() {
            progress.insert(order_number, 0);
            continue;
        }

        let total: i64 = questions::table
            .filter(questions::mission_id.eq_any(&mission_ids))
            .count()
            .get_result(conn)?;

        if total == 0 {
            progress.insert(order_number, 0);
            continue;
        }

        let answered: i64 = session_answers::table
            .inner_join(questions::table)
            .filter(session_answers::session_id.eq(session_id))
            .filter(questions::mission_id.eq_any(&mission_ids))
            .count()
            .get_result(conn)?;

        progress.insert(order_number, chapter_percent(answered, total));
    }

    Ok(progress)
}

/// Recomputes total_progress across the whole questionnaire and moves the
/// session's status forward (completed at 100%).
fn refresh_session_progress(conn: &mut PgConnection, session_id: Uuid) -> Result<(), AppError> {
    let total: i64 = questions::table.count().get_result(conn)?;
    let answered: i64 = session_answers::table
        .filter(session_answers::session_id.eq(session_id))
        .count()
        .get_result(conn)?;

    let progress = chapter_percent(answered, total);
    let status = if progress >= 100 {
        SessionStatus::Completed
    } else {
        SessionStatus::InProgress
    };
    let completed_at = (status == SessionStatus::Completed).then(Utc::now);

    diesel::update(positioning_sessions::table.find(session_id))
        .set((
            positioning_sessions::total_progress.eq(progress),
            positioning_sessions::status.eq(status),
            positioning_sessions::completed_at.eq(completed_at),
            positioning_sessions::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

    info!(%session_id, answered, total, progress, "Session progress refreshed");
    Ok(())
}

/// Chapters in questionnaire order, each annotated with its mission count.
#[instrument(skip(pool), err)]
pub async fn list_chapters_with_counts(pool: &DbPool) -> Result<Vec<ChapterWithCount>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let all_chapters: Vec<Chapter> = chapters::table
            .order(chapters::order_number.asc())
            .select(Chapter::as_select())
            .load(conn)?;

        all_chapters
            .into_iter()
            .map(|chapter| {
                let missions_count: i64 = missions::table
                    .filter(missions::chapter_id.eq(chapter.id))
                    .count()
                    .get_result(conn)?;
                Ok(ChapterWithCount {
                    chapter,
                    missions_count,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()
    })
    .await?
}

#[instrument(skip(pool), err)]
pub async fn list_missions_for_chapter(
    pool: &DbPool,
    chapter_id: i32,
) -> Result<Vec<Mission>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        missions::table
            .filter(missions::chapter_id.eq(chapter_id))
            .order(missions::order_number.asc())
            .select(Mission::as_select())
            .load::<Mission>(conn)
            .map_err(AppError::from)
    })
    .await?
}

#[instrument(skip(pool), err)]
pub async fn list_questions_for_mission(
    pool: &DbPool,
    mission_id: i32,
) -> Result<Vec<Question>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| load_mission_questions(conn, mission_id))
        .await?
}

fn load_mission_questions(
    conn: &mut PgConnection,
    mission_id: i32,
) -> Result<Vec<Question>, AppError> {
    questions::table
        .filter(questions::mission_id.eq(mission_id))
        .order(questions::order_number.asc())
        .select(Question::as_select())
        .load::<Question>(conn)
        .map_err(AppError::from)
}

#[instrument(skip(pool), err)]
pub async fn get_mission_with_questions(
    pool: &DbPool,
    mission_id: i32,
) -> Result<MissionWithQuestions, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let mission = missions::table
            .find(mission_id)
            .select(Mission::as_select())
            .first::<Mission>(conn)
            .optional()?
            .ok_or_else(|| AppError::NotFound("Mission not found".to_string()))?;

        let mission_questions = load_mission_questions(conn, mission_id)?;
        Ok(MissionWithQuestions {
            mission,
            questions: mission_questions,
        })
    })
    .await?
}

/// Lists the caller's positioning sessions, newest first.
#[instrument(skip(pool), err)]
pub async fn list_sessions_for_user(
    pool: &DbPool,
    user_id: Uuid,
) -> Result<Vec<PositioningSession>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        positioning_sessions::table
            .filter(positioning_sessions::user_id.eq(user_id))
            .order(positioning_sessions::created_at.desc())
            .select(PositioningSession::as_select())
            .load::<PositioningSession>(conn)
            .map_err(AppError::from)
    })
    .await?
}

/// Creates a draft session for the user.
#[instrument(skip(pool), err)]
pub async fn create_session(
    pool: &DbPool,
    user_id: Uuid,
    title: Option<String>,
) -> Result<PositioningSession, AppError> {
    let conn = pool.get().await?;
    let created = conn
        .interact(move |conn| {
            let new_session = NewPositioningSession {
                user_id,
                title: title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
                status: SessionStatus::Draft,
                total_progress: 0,
            };
            diesel::insert_into(positioning_sessions::table)
                .values(&new_session)
                .returning(PositioningSession::as_returning())
                .get_result::<PositioningSession>(conn)
                .map_err(AppError::from)
        })
        .await??;

    info!(session_id = %created.id, %user_id, "Positioning session created");
    Ok(created)
}

/// Session detail: the row plus questionnaire-wide counts and the
/// per-chapter progress map.
#[instrument(skip(pool), err)]
pub async fn get_session_detail(
    pool: &DbPool,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<SessionWithProgress, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let session = assert_session_owner(conn, session_id, user_id)?;

        let answered_questions_count: i64 = session_answers::table
            .filter(session_answers::session_id.eq(session_id))
            .count()
            .get_result(conn)?;
        let total_questions_count: i64 = questions::table.count().get_result(conn)?;
        let chapter_progress = compute_chapter_progress(conn, session_id)?;

        Ok(SessionWithProgress {
            session,
            answered_questions_count,
            total_questions_count,
            chapter_progress,
        })
    })
    .await?
}

/// The per-chapter progress map alone.
#[instrument(skip(pool), err)]
pub async fn get_chapter_progress(
    pool: &DbPool,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<HashMap<i32, i32>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        assert_session_owner(conn, session_id, user_id)?;
        compute_chapter_progress(conn, session_id)
    })
    .await?
}

/// The stored answers for one mission, keyed by question id.
#[instrument(skip(pool), err)]
pub async fn get_mission_answers(
    pool: &DbPool,
    user_id: Uuid,
    session_id: Uuid,
    mission_id: i32,
) -> Result<HashMap<i32, String>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        assert_session_owner(conn, session_id, user_id)?;

        let rows: Vec<(i32, String)> = session_answers::table
            .inner_join(questions::table)
            .filter(session_answers::session_id.eq(session_id))
            .filter(questions::mission_id.eq(mission_id))
            .select((session_answers::question_id, session_answers::answer))
            .load(conn)?;

        Ok(rows.into_iter().collect())
    })
    .await?
}

/// Replaces a mission's answers and refreshes session progress.
///
/// Delete, insert, completion marker and progress recompute run inside one
/// transaction so a failure partway cannot leave a half-written answer set.
#[instrument(skip(pool, answers), err)]
pub async fn save_mission_answers(
    pool: &DbPool,
    user_id: Uuid,
    session_id: Uuid,
    mission_id: i32,
    answers: HashMap<i32, String>,
) -> Result<(), AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        conn.transaction(|conn| {
            assert_session_owner(conn, session_id, user_id)?;

            let mission = missions::table
                .find(mission_id)
                .select(Mission::as_select())
                .first::<Mission>(conn)
                .optional()?
                .ok_or_else(|| AppError::NotFound("Mission not found".to_string()))?;

            let question_ids: Vec<i32> = questions::table
                .filter(questions::mission_id.eq(mission_id))
                .select(questions::id)
                .load(conn)?;

            if !question_ids.is_empty() {
                diesel::delete(
                    session_answers::table
                        .filter(session_answers::session_id.eq(session_id))
                        .filter(session_answers::question_id.eq_any(&question_ids)),
                )
                .execute(conn)?;
            }

            let now = Utc::now();
            let rows: Vec<NewSessionAnswer> = answers
                .into_iter()
                .filter(|(question_id, _)| question_ids.contains(question_id))
                .map(|(question_id, answer)| NewSessionAnswer {
                    session_id,
                    question_id,
                    answer,
                    answered_at: now,
                })
                .collect();

            if !rows.is_empty() {
                // The unique (session_id, question_id) index backs this
                // conflict target; resubmitting keeps the latest value.
                diesel::insert_into(session_answers::table)
                    .values(&rows)
                    .on_conflict((session_answers::session_id, session_answers::question_id))
                    .do_update()
                    .set((
                        session_answers::answer.eq(diesel::upsert::excluded(
                            session_answers::answer,
                        )),
                        session_answers::answered_at.eq(diesel::upsert::excluded(
                            session_answers::answered_at,
                        )),
                    ))
                    .execute(conn)?;
            } else {
                warn!(%session_id, mission_id, "Answer payload contained no questions of this mission");
            }

            let marker = NewSessionProgress {
                session_id,
                chapter_id: mission.chapter_id,
                mission_id,
                is_mission_completed: true,
                completed_at: Some(now),
            };
            diesel::insert_into(session_progress::table)
                .values(&marker)
                .on_conflict((
                    session_progress::session_id,
                    session_progress::chapter_id,
                    session_progress::mission_id,
                ))
                .do_update()
                .set((
                    session_progress::is_mission_completed.eq(true),
                    session_progress::completed_at.eq(Some(now)),
                ))
                .execute(conn)?;

            refresh_session_progress(conn, session_id)
        })
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_questions_yields_zero_percent() {
        assert_eq!(chapter_percent(0, 0), 0);
        assert_eq!(chapter_percent(5, 0), 0);
    }

    #[test]
    fn test_percent_is_rounded_to_nearest() {
        assert_eq!(chapter_percent(1, 3), 33);
        assert_eq!(chapter_percent(2, 3), 67);
        assert_eq!(chapter_percent(1, 8), 13);
    }

    #[test]
    fn test_percent_stays_within_bounds() {
        for total in 1..=25_i64 {
            for answered in 0..=total {
                let percent = chapter_percent(answered, total);
                assert!((0..=100).contains(&percent), "{answered}/{total} -> {percent}");
            }
        }
        assert_eq!(chapter_percent(10, 10), 100);
    }
}
