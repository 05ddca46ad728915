use chrono::{DateTime, Utc};
use learn_core::model::{Course, CourseId, Lesson, Section, SectionId, UserId};
use reqwest::Method;

use super::rows::{CourseRow, EnrollmentRow, LessonRow, SectionRow};
use super::{RestGateway, RestGatewayError, eq, in_list};
use crate::repository::{CatalogRepository, EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl CatalogRepository for RestGateway {
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError> {
        let rb = self
            .write(Method::POST, "courses", "return=minimal")
            .json(&CourseRow::from_course(course));
        Self::execute(rb).await?;
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let rb = self
            .request(Method::GET, "courses")
            .query(&[("id", eq(id)), ("select", "*".to_string())]);
        let rows: Vec<CourseRow> = Self::fetch(rb).await?;
        let course = rows
            .into_iter()
            .next()
            .map(CourseRow::into_course)
            .transpose()?;
        Ok(course)
    }

    async fn insert_section(&self, section: &Section) -> Result<(), StorageError> {
        let rb = self
            .write(Method::POST, "course_sections", "return=minimal")
            .json(&SectionRow::from_section(section));
        Self::execute(rb).await?;
        Ok(())
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let rb = self
            .write(Method::POST, "course_lessons", "return=minimal")
            .json(&LessonRow::from_lesson(lesson));
        Self::execute(rb).await?;
        Ok(())
    }

    async fn list_sections(&self, course_id: CourseId) -> Result<Vec<Section>, StorageError> {
        let rb = self.request(Method::GET, "course_sections").query(&[
            ("course_id", eq(course_id)),
            ("order", "position.asc".to_string()),
        ]);
        let rows: Vec<SectionRow> = Self::fetch(rb).await?;
        let sections = rows
            .into_iter()
            .map(SectionRow::into_section)
            .collect::<Result<Vec<_>, RestGatewayError>>()?;
        Ok(sections)
    }

    async fn list_lessons(&self, section_ids: &[SectionId]) -> Result<Vec<Lesson>, StorageError> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rb = self.request(Method::GET, "course_lessons").query(&[
            ("section_id", in_list(section_ids)),
            ("order", "section_id.asc,position.asc".to_string()),
        ]);
        let rows: Vec<LessonRow> = Self::fetch(rb).await?;
        let lessons = rows
            .into_iter()
            .map(LessonRow::into_lesson)
            .collect::<Result<Vec<_>, RestGatewayError>>()?;
        Ok(lessons)
    }
}

#[async_trait::async_trait]
impl EnrollmentRepository for RestGateway {
    async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
        _enrolled_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // enrolled_at is stamped by the backend's column default
        let rb = self
            .write(
                Method::POST,
                "user_courses",
                "resolution=ignore-duplicates,return=minimal",
            )
            .query(&[("on_conflict", "user_id,course_id")])
            .json(&EnrollmentRow { user_id, course_id });
        Self::execute(rb).await?;
        Ok(())
    }

    async fn is_enrolled(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, StorageError> {
        let rb = self.request(Method::GET, "user_courses").query(&[
            ("user_id", eq(user_id)),
            ("course_id", eq(course_id)),
            ("select", "user_id".to_string()),
        ]);
        let rows: Vec<serde_json::Value> = Self::fetch(rb).await?;
        Ok(!rows.is_empty())
    }
}
