use std::sync::Arc;

use learn_core::model::{Course, CourseId, Lesson, LessonId, Section, SectionId, UserId};
use storage::repository::{CatalogRepository, EnrollmentRepository, Storage};

use crate::Clock;
use crate::error::CatalogServiceError;

/// Input for one lesson of a new course.
#[derive(Debug, Clone)]
pub struct LessonInput {
    pub title: String,
    pub video_url: String,
    pub duration: Option<String>,
}

/// Input for one section; lessons are positioned in the given order.
#[derive(Debug, Clone)]
pub struct SectionInput {
    pub title: String,
    pub lessons: Vec<LessonInput>,
}

/// Input for a whole course; sections are positioned in the given order.
#[derive(Debug, Clone)]
pub struct CourseInput {
    pub instructor_id: UserId,
    pub title: String,
    pub description: String,
    pub price_cents: u64,
    pub has_certificate: bool,
    pub sections: Vec<SectionInput>,
}

/// Course catalog writes and enrollments.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    catalog: Arc<dyn CatalogRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn CatalogRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            enrollments,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.enrollments),
        )
    }

    /// Validate and persist a course with its sections and lessons.
    ///
    /// Everything is validated before the first write.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::NoSections` for an empty outline.
    /// Returns `CatalogServiceError::Course` for validation failures.
    /// Returns `CatalogServiceError::Storage` if persistence fails.
    pub async fn create_course(&self, input: CourseInput) -> Result<Course, CatalogServiceError> {
        if input.sections.is_empty() {
            return Err(CatalogServiceError::NoSections);
        }
        let now = self.clock.now();
        let course = Course::new(
            CourseId::random(),
            input.instructor_id,
            input.title,
            input.description,
            input.price_cents,
            now,
        )?
        .with_certificate(input.has_certificate);

        let mut outline = Vec::with_capacity(input.sections.len());
        for (section_pos, section_in) in (1u32..).zip(input.sections) {
            let section = Section::new(
                SectionId::random(),
                course.id(),
                section_in.title,
                section_pos,
            )?;
            let mut lessons = Vec::with_capacity(section_in.lessons.len());
            for (lesson_pos, lesson_in) in (1u32..).zip(section_in.lessons) {
                lessons.push(Lesson::new(
                    LessonId::random(),
                    section.id(),
                    lesson_in.title,
                    &lesson_in.video_url,
                    lesson_in.duration,
                    lesson_pos,
                )?);
            }
            outline.push((section, lessons));
        }

        self.catalog.insert_course(&course).await?;
        for (section, lessons) in &outline {
            self.catalog.insert_section(section).await?;
            for lesson in lessons {
                self.catalog.insert_lesson(lesson).await?;
            }
        }
        tracing::info!(course_id = %course.id(), sections = outline.len(), "course created");
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn get_course(&self, id: CourseId) -> Result<Option<Course>, CatalogServiceError> {
        Ok(self.catalog.get_course(id).await?)
    }

    /// Grant the learner access to a course. Re-enrolling is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if the write fails.
    pub async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<(), CatalogServiceError> {
        let now = self.clock.now();
        self.enrollments.enroll(user_id, course_id, now).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::model::CourseError;
    use learn_core::time::fixed_clock;

    fn lesson(title: &str, url: &str) -> LessonInput {
        LessonInput {
            title: title.into(),
            video_url: url.into(),
            duration: Some("10:00".into()),
        }
    }

    fn input(sections: Vec<SectionInput>) -> CourseInput {
        CourseInput {
            instructor_id: UserId::random(),
            title: "Rust".into(),
            description: "Systems programming".into(),
            price_cents: 2500,
            has_certificate: true,
            sections,
        }
    }

    #[tokio::test]
    async fn create_course_positions_sections_and_lessons() {
        let storage = Storage::in_memory();
        let service = CatalogService::from_storage(fixed_clock(), &storage);

        let course = service
            .create_course(input(vec![
                SectionInput {
                    title: "Intro".into(),
                    lessons: vec![
                        lesson("Hello", "https://youtu.be/a"),
                        lesson("Setup", "https://youtu.be/b"),
                    ],
                },
                SectionInput {
                    title: "Deeper".into(),
                    lessons: vec![lesson("Traits", "https://youtu.be/c")],
                },
            ]))
            .await
            .unwrap();

        let sections = storage.catalog.list_sections(course.id()).await.unwrap();
        let positions: Vec<_> = sections.iter().map(|s| (s.title(), s.position())).collect();
        assert_eq!(positions, vec![("Intro", 1), ("Deeper", 2)]);

        let lessons = storage
            .catalog
            .list_lessons(&[sections[0].id()])
            .await
            .unwrap();
        let positions: Vec<_> = lessons.iter().map(|l| (l.title(), l.position())).collect();
        assert_eq!(positions, vec![("Hello", 1), ("Setup", 2)]);
    }

    #[tokio::test]
    async fn invalid_lesson_aborts_before_any_write() {
        let storage = Storage::in_memory();
        let service = CatalogService::from_storage(fixed_clock(), &storage);

        let err = service
            .create_course(input(vec![SectionInput {
                title: "Intro".into(),
                lessons: vec![lesson("Broken", "not a url")],
            }]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogServiceError::Course(CourseError::InvalidVideoUrl(_))
        ));
    }

    #[tokio::test]
    async fn empty_outline_is_rejected() {
        let service = CatalogService::from_storage(fixed_clock(), &Storage::in_memory());
        let err = service.create_course(input(Vec::new())).await.unwrap_err();
        assert!(matches!(err, CatalogServiceError::NoSections));
    }
}
