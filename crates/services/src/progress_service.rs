use std::collections::HashMap;
use std::sync::Arc;

use learn_core::model::{
    CourseId, CourseProgress, Lesson, LessonId, LessonProgress, ProgressUpdate, Section, UserId,
};
use serde::Serialize;
use storage::repository::{
    CatalogRepository, EnrollmentRepository, ProgressRepository, Storage,
};

use crate::Clock;
use crate::error::ProgressServiceError;

/// A lesson annotated with the learner's progress record, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonWithProgress {
    pub lesson: Lesson,
    pub progress: Option<LessonProgress>,
}

/// An ordered section with its ordered, annotated lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionWithLessons {
    pub section: Section,
    pub lessons: Vec<LessonWithProgress>,
}

impl SectionWithLessons {
    /// Iterate every annotated lesson of `sections` in course order.
    pub fn flatten(sections: &[Self]) -> impl Iterator<Item = &LessonWithProgress> {
        sections.iter().flat_map(|s| s.lessons.iter())
    }
}

/// Reads and writes per-learner lesson progress.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    catalog: Arc<dyn CatalogRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn CatalogRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            enrollments,
            progress,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.progress),
        )
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Fetch the stored progress for one lesson. No record is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn get_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, ProgressServiceError> {
        Ok(self.progress.get_progress(user_id, lesson_id).await?)
    }

    /// Create or update the record for `(user, lesson)`, stamping `last_accessed`.
    ///
    /// A `None` percentage leaves the stored value untouched.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the write fails.
    pub async fn upsert_lesson_progress(
        &self,
        update: &ProgressUpdate,
    ) -> Result<LessonProgress, ProgressServiceError> {
        let now = self.clock.now();
        let progress = self.progress.upsert_progress(update, now).await?;
        tracing::debug!(
            lesson_id = %update.lesson_id,
            watch = progress.watch_time_seconds(),
            pct = progress.completion_percentage(),
            "progress saved"
        );
        Ok(progress)
    }

    /// Flag a lesson completed at 100%. Creates a zeroed record if none exists.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the write fails.
    pub async fn mark_lesson_completed(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
    ) -> Result<LessonProgress, ProgressServiceError> {
        let now = self.clock.now();
        let progress = self
            .progress
            .mark_completed(user_id, lesson_id, course_id, now)
            .await?;
        tracing::info!(%lesson_id, "lesson marked completed");
        Ok(progress)
    }

    /// Sections and lessons of a course in order, each lesson paired with the
    /// learner's record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn lessons_with_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<SectionWithLessons>, ProgressServiceError> {
        let sections = self.catalog.list_sections(course_id).await?;
        let section_ids: Vec<_> = sections.iter().map(Section::id).collect();
        let lessons = self.catalog.list_lessons(&section_ids).await?;
        let rows = self.progress.list_course_progress(user_id, course_id).await?;
        Ok(merge_progress(sections, lessons, rows))
    }

    /// Whether the learner holds an enrollment for the course.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn validate_course_access(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, ProgressServiceError> {
        Ok(self.enrollments.is_enrolled(user_id, course_id).await?)
    }

    /// All of the learner's records for a course, most recently accessed first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn course_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>, ProgressServiceError> {
        Ok(self.progress.list_course_progress(user_id, course_id).await?)
    }

    /// Aggregate completion for one course.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn course_progress_summary(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CourseProgress, ProgressServiceError> {
        let sections = self.catalog.list_sections(course_id).await?;
        let section_ids: Vec<_> = sections.iter().map(Section::id).collect();
        let lessons = self.catalog.list_lessons(&section_ids).await?;
        let total = u32::try_from(lessons.len()).unwrap_or(u32::MAX);

        let rows = self.progress.list_course_progress(user_id, course_id).await?;
        Ok(CourseProgress::from_rows(course_id, total, &rows))
    }

    /// Summaries for several courses. A course that fails to load yields an
    /// empty summary instead of failing the batch.
    pub async fn multiple_course_progress(
        &self,
        user_id: UserId,
        course_ids: &[CourseId],
    ) -> Vec<CourseProgress> {
        let mut out = Vec::with_capacity(course_ids.len());
        for &course_id in course_ids {
            match self.course_progress_summary(user_id, course_id).await {
                Ok(summary) => out.push(summary),
                Err(e) => {
                    tracing::warn!(%course_id, error = %e, "course progress unavailable");
                    out.push(CourseProgress::empty(course_id));
                }
            }
        }
        out
    }
}

/// Group `lessons` under their `sections` and attach the matching rows.
///
/// Both inputs are expected in position order; that order is preserved.
/// Lessons whose section is not listed are dropped.
#[must_use]
pub fn merge_progress(
    sections: Vec<Section>,
    lessons: Vec<Lesson>,
    rows: Vec<LessonProgress>,
) -> Vec<SectionWithLessons> {
    let mut by_lesson: HashMap<LessonId, LessonProgress> = rows
        .into_iter()
        .map(|p| (p.lesson_id(), p))
        .collect();

    let mut out: Vec<SectionWithLessons> = sections
        .into_iter()
        .map(|section| SectionWithLessons {
            section,
            lessons: Vec::new(),
        })
        .collect();
    let index: HashMap<_, _> = out
        .iter()
        .enumerate()
        .map(|(i, s)| (s.section.id(), i))
        .collect();

    for lesson in lessons {
        let Some(&slot) = index.get(&lesson.section_id()) else {
            continue;
        };
        let progress = by_lesson.remove(&lesson.id());
        out[slot].lessons.push(LessonWithProgress { lesson, progress });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::model::{Course, SectionId};
    use learn_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    struct Fixture {
        service: ProgressService,
        repo: InMemoryRepository,
        course: Course,
        lessons: Vec<Lesson>,
    }

    async fn fixture() -> Fixture {
        let repo = InMemoryRepository::new();
        let course = Course::new(
            CourseId::random(),
            UserId::random(),
            "Rust",
            "",
            0,
            fixed_now(),
        )
        .unwrap();
        repo.insert_course(&course).await.unwrap();

        let mut lessons = Vec::new();
        for (s_pos, count) in [(1, 2), (2, 1)] {
            let section =
                Section::new(SectionId::random(), course.id(), format!("S{s_pos}"), s_pos)
                    .unwrap();
            repo.insert_section(&section).await.unwrap();
            for l_pos in 1..=count {
                let lesson = Lesson::new(
                    LessonId::random(),
                    section.id(),
                    format!("L{s_pos}.{l_pos}"),
                    "https://youtu.be/abc",
                    None,
                    l_pos,
                )
                .unwrap();
                repo.insert_lesson(&lesson).await.unwrap();
                lessons.push(lesson);
            }
        }

        let service = ProgressService::from_storage(fixed_clock(), &Storage::from_backend(repo.clone()));
        Fixture {
            service,
            repo,
            course,
            lessons,
        }
    }

    #[tokio::test]
    async fn lessons_with_progress_attaches_only_matching_rows() {
        let fx = fixture().await;
        let user = UserId::random();
        let update = ProgressUpdate {
            user_id: user,
            lesson_id: fx.lessons[1].id(),
            course_id: fx.course.id(),
            watch_time_seconds: 42.0,
            total_duration_seconds: 100.0,
            completion_percentage: Some(42),
        };
        fx.service.upsert_lesson_progress(&update).await.unwrap();

        let sections = fx
            .service
            .lessons_with_progress(user, fx.course.id())
            .await
            .unwrap();

        assert_eq!(sections.len(), 2);
        let annotated: Vec<_> = SectionWithLessons::flatten(&sections)
            .map(|l| (l.lesson.title(), l.progress.as_ref().map(LessonProgress::watch_time_seconds)))
            .collect();
        assert_eq!(
            annotated,
            vec![("L1.1", None), ("L1.2", Some(42)), ("L2.1", None)]
        );
    }

    #[tokio::test]
    async fn summary_rounds_completed_share() {
        let fx = fixture().await;
        let user = UserId::random();
        fx.service
            .mark_lesson_completed(user, fx.lessons[0].id(), fx.course.id())
            .await
            .unwrap();

        let summary = fx
            .service
            .course_progress_summary(user, fx.course.id())
            .await
            .unwrap();
        assert_eq!(summary.total_lessons, 3);
        assert_eq!(summary.completed_lessons, 1);
        assert_eq!(summary.completion_percentage, 33);
        assert_eq!(summary.last_accessed, Some(fixed_now()));
    }

    #[tokio::test]
    async fn access_follows_enrollment() {
        let fx = fixture().await;
        let user = UserId::random();
        assert!(!fx.service.validate_course_access(user, fx.course.id()).await.unwrap());

        fx.repo.enroll(user, fx.course.id(), fixed_now()).await.unwrap();
        assert!(fx.service.validate_course_access(user, fx.course.id()).await.unwrap());
    }

    #[tokio::test]
    async fn multiple_course_progress_keeps_input_order() {
        let fx = fixture().await;
        let user = UserId::random();
        let unknown = CourseId::random();

        let summaries = fx
            .service
            .multiple_course_progress(user, &[unknown, fx.course.id()])
            .await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0], CourseProgress::empty(unknown));
        assert_eq!(summaries[1].total_lessons, 3);
    }

    #[test]
    fn merge_drops_lessons_of_unknown_sections() {
        let course = CourseId::random();
        let section = Section::new(SectionId::random(), course, "Only", 1).unwrap();
        let stray = Lesson::new(
            LessonId::random(),
            SectionId::random(),
            "Stray",
            "https://youtu.be/x",
            None,
            1,
        )
        .unwrap();

        let merged = merge_progress(vec![section], vec![stray], Vec::new());
        assert_eq!(merged.len(), 1);
        assert!(merged[0].lessons.is_empty());
    }
}
