use chrono::{DateTime, Utc};
use learn_core::model::{CourseId, UserId};

use super::SqliteRepository;
use super::mapping::conn;
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
        enrolled_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_courses (user_id, course_id, enrolled_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, course_id) DO NOTHING
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .bind(enrolled_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn is_enrolled(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM user_courses WHERE user_id = ?1 AND course_id = ?2")
            .bind(user_id.to_string())
            .bind(course_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        Ok(row.is_some())
    }
}
