use chrono::{DateTime, Utc};
use learn_core::model::{CourseId, LessonId, LessonProgress, ProgressUpdate, UserId};
use reqwest::Method;

use super::rows::{ProgressRow, ProgressWrite};
use super::{RestGateway, RestGatewayError, eq, timestamp};
use crate::repository::{ProgressRepository, StorageError};

const TABLE: &str = "lesson_progress";

#[async_trait::async_trait]
impl ProgressRepository for RestGateway {
    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let rb = self.request(Method::GET, TABLE).query(&[
            ("user_id", eq(user_id)),
            ("lesson_id", eq(lesson_id)),
            ("select", "*".to_string()),
        ]);
        let rows: Vec<ProgressRow> = Self::fetch(rb).await?;
        let progress = rows
            .into_iter()
            .next()
            .map(ProgressRow::into_progress)
            .transpose()?;
        Ok(progress)
    }

    async fn upsert_progress(
        &self,
        update: &ProgressUpdate,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        // merge-duplicates only touches the columns present in the payload,
        // so an omitted percentage keeps the stored one.
        let payload = ProgressWrite {
            user_id: Some(update.user_id),
            lesson_id: Some(update.lesson_id),
            course_id: Some(update.course_id),
            watch_time_seconds: Some(update.watch_time()),
            total_duration_seconds: Some(update.total_duration()),
            completion_percentage: update.clamped_percentage(),
            last_accessed: timestamp(at),
            ..ProgressWrite::default()
        };
        let rb = self
            .write(
                Method::POST,
                TABLE,
                "resolution=merge-duplicates,return=representation",
            )
            .query(&[("on_conflict", "user_id,lesson_id")])
            .json(&payload);
        let row: ProgressRow = Self::fetch_one(rb).await?;
        Ok(row.into_progress()?)
    }

    async fn mark_completed(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        let existing = self.get_progress(user_id, lesson_id).await?;

        let rb = match existing {
            Some(existing) => {
                let completed_at = existing.completed_at().unwrap_or(at);
                let payload = ProgressWrite {
                    completion_percentage: Some(100),
                    is_completed: Some(true),
                    completed_at: Some(timestamp(completed_at)),
                    last_accessed: timestamp(at),
                    ..ProgressWrite::default()
                };
                self.write(Method::PATCH, TABLE, "return=representation")
                    .query(&[("user_id", eq(user_id)), ("lesson_id", eq(lesson_id))])
                    .json(&payload)
            }
            None => {
                let payload = ProgressWrite {
                    user_id: Some(user_id),
                    lesson_id: Some(lesson_id),
                    course_id: Some(course_id),
                    watch_time_seconds: Some(0),
                    total_duration_seconds: Some(0),
                    completion_percentage: Some(100),
                    is_completed: Some(true),
                    completed_at: Some(timestamp(at)),
                    last_accessed: timestamp(at),
                };
                self.write(Method::POST, TABLE, "return=representation")
                    .json(&payload)
            }
        };

        let row: ProgressRow = Self::fetch_one(rb).await?;
        Ok(row.into_progress()?)
    }

    async fn list_course_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let rb = self.request(Method::GET, TABLE).query(&[
            ("user_id", eq(user_id)),
            ("course_id", eq(course_id)),
            ("order", "last_accessed.desc".to_string()),
        ]);
        let rows: Vec<ProgressRow> = Self::fetch(rb).await?;
        let progress = rows
            .into_iter()
            .map(ProgressRow::into_progress)
            .collect::<Result<Vec<_>, RestGatewayError>>()?;
        Ok(progress)
    }
}
