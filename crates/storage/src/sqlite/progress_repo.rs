use chrono::{DateTime, Utc};
use learn_core::model::{CourseId, LessonId, LessonProgress, ProgressUpdate, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = "user_id, lesson_id, course_id, watch_time_seconds, \
     total_duration_seconds, completion_percentage, is_completed, last_accessed, completed_at";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM lesson_progress WHERE user_id = ?1 AND lesson_id = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(lesson_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn upsert_progress(
        &self,
        update: &ProgressUpdate,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        // ?6 NULL keeps the stored percentage on update and defaults to 0 on insert.
        sqlx::query(
            r"
            INSERT INTO lesson_progress (user_id, lesson_id, course_id, watch_time_seconds, total_duration_seconds, completion_percentage, is_completed, last_accessed, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, 0), 0, ?7, NULL)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                watch_time_seconds = excluded.watch_time_seconds,
                total_duration_seconds = excluded.total_duration_seconds,
                completion_percentage = COALESCE(?6, lesson_progress.completion_percentage),
                last_accessed = excluded.last_accessed
            ",
        )
        .bind(update.user_id.to_string())
        .bind(update.lesson_id.to_string())
        .bind(update.course_id.to_string())
        .bind(i64::from(update.watch_time()))
        .bind(i64::from(update.total_duration()))
        .bind(update.clamped_percentage().map(i64::from))
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        self.get_progress(update.user_id, update.lesson_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn mark_completed(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        sqlx::query(
            r"
            INSERT INTO lesson_progress (user_id, lesson_id, course_id, watch_time_seconds, total_duration_seconds, completion_percentage, is_completed, last_accessed, completed_at)
            VALUES (?1, ?2, ?3, 0, 0, 100, 1, ?4, ?4)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                is_completed = 1,
                completion_percentage = 100,
                completed_at = COALESCE(lesson_progress.completed_at, excluded.completed_at),
                last_accessed = excluded.last_accessed
            ",
        )
        .bind(user_id.to_string())
        .bind(lesson_id.to_string())
        .bind(course_id.to_string())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        self.get_progress(user_id, lesson_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn list_course_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM lesson_progress \
             WHERE user_id = ?1 AND course_id = ?2 \
             ORDER BY last_accessed DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(course_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }
}
