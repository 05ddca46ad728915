use learn_core::model::{Course, CourseId, Lesson, Section, SectionId};
use sqlx::{QueryBuilder, Sqlite};

use super::SqliteRepository;
use super::mapping::{conn, map_course_row, map_lesson_row, map_section_row};
use crate::repository::{CatalogRepository, StorageError};

fn insert_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => conn(e),
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError> {
        let price = i64::try_from(course.price_cents())
            .map_err(|_| StorageError::Serialization("price_cents overflow".into()))?;

        sqlx::query(
            r"
            INSERT INTO courses (id, instructor_id, title, description, price_cents, has_certificate, is_lifetime_access, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(course.id().to_string())
        .bind(course.instructor_id().to_string())
        .bind(course.title())
        .bind(course.description())
        .bind(price)
        .bind(i64::from(course.has_certificate()))
        .bind(i64::from(course.is_lifetime_access()))
        .bind(course.created_at())
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;

        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, instructor_id, title, description, price_cents, has_certificate, is_lifetime_access, created_at
            FROM courses WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn insert_section(&self, section: &Section) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO course_sections (id, course_id, title, position)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(section.id().to_string())
        .bind(section.course_id().to_string())
        .bind(section.title())
        .bind(i64::from(section.position()))
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;

        Ok(())
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO course_lessons (id, section_id, title, video_url, duration, position)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(lesson.id().to_string())
        .bind(lesson.section_id().to_string())
        .bind(lesson.title())
        .bind(lesson.video_url().as_str())
        .bind(lesson.duration_label())
        .bind(i64::from(lesson.position()))
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;

        Ok(())
    }

    async fn list_sections(&self, course_id: CourseId) -> Result<Vec<Section>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, title, position
            FROM course_sections
            WHERE course_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(course_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_section_row).collect()
    }

    async fn list_lessons(&self, section_ids: &[SectionId]) -> Result<Vec<Lesson>, StorageError> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT id, section_id, title, video_url, duration, position FROM course_lessons WHERE section_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in section_ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(") ORDER BY section_id ASC, position ASC, id ASC");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(conn)?;
        rows.iter().map(map_lesson_row).collect()
    }
}
