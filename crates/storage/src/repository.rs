use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learn_core::model::{
    Course, CourseId, Lesson, LessonId, LessonProgress, ProgressUpdate, Section, SectionId, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Catalog contract: courses and their ordered sections and lessons.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persist a new course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken, or other storage errors.
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. A missing course is `Ok(None)`.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the section cannot be stored.
    async fn insert_section(&self, section: &Section) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Sections of a course ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_sections(&self, course_id: CourseId) -> Result<Vec<Section>, StorageError>;

    /// Lessons belonging to the given sections, ordered by position within each section.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_lessons(&self, section_ids: &[SectionId]) -> Result<Vec<Lesson>, StorageError>;
}

/// Purchased-course access.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Grant a user access to a course. Enrolling twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
        enrolled_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn is_enrolled(&self, user_id: UserId, course_id: CourseId)
    -> Result<bool, StorageError>;
}

/// Per-user lesson progress, keyed by `(user_id, lesson_id)`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. No record is `Ok(None)`.
    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError>;

    /// Create or overwrite position/duration (and percentage when given).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn upsert_progress(
        &self,
        update: &ProgressUpdate,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError>;

    /// Flag the lesson completed. Safe to call on an already completed lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn mark_completed(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError>;

    /// All rows for a course, most recently accessed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_course_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    sections: Arc<Mutex<HashMap<SectionId, Section>>>,
    lessons: Arc<Mutex<HashMap<LessonId, Lesson>>>,
    enrollments: Arc<Mutex<HashMap<(UserId, CourseId), DateTime<Utc>>>>,
    progress: Arc<Mutex<HashMap<(UserId, LessonId), LessonProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        if guard.contains_key(&course.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn insert_section(&self, section: &Section) -> Result<(), StorageError> {
        let mut guard = self.sections.lock().map_err(poisoned)?;
        if guard.contains_key(&section.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(section.id(), section.clone());
        Ok(())
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = self.lessons.lock().map_err(poisoned)?;
        if guard.contains_key(&lesson.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(lesson.id(), lesson.clone());
        Ok(())
    }

    async fn list_sections(&self, course_id: CourseId) -> Result<Vec<Section>, StorageError> {
        let guard = self.sections.lock().map_err(poisoned)?;
        let mut sections: Vec<Section> = guard
            .values()
            .filter(|s| s.course_id() == course_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| (s.position(), s.id()));
        Ok(sections)
    }

    async fn list_lessons(&self, section_ids: &[SectionId]) -> Result<Vec<Lesson>, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        let mut lessons: Vec<Lesson> = guard
            .values()
            .filter(|l| section_ids.contains(&l.section_id()))
            .cloned()
            .collect();
        lessons.sort_by_key(|l| (l.section_id(), l.position(), l.id()));
        Ok(lessons)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
        enrolled_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.enrollments.lock().map_err(poisoned)?;
        guard.entry((user_id, course_id)).or_insert(enrolled_at);
        Ok(())
    }

    async fn is_enrolled(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, StorageError> {
        let guard = self.enrollments.lock().map_err(poisoned)?;
        Ok(guard.contains_key(&(user_id, course_id)))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(&(user_id, lesson_id)).cloned())
    }

    async fn upsert_progress(
        &self,
        update: &ProgressUpdate,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let entry = guard
            .entry((update.user_id, update.lesson_id))
            .or_insert_with(|| {
                LessonProgress::new(update.user_id, update.lesson_id, update.course_id, at)
            });
        entry.apply_update(update, at);
        Ok(entry.clone())
    }

    async fn mark_completed(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        course_id: CourseId,
        at: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        let entry = guard
            .entry((user_id, lesson_id))
            .or_insert_with(|| LessonProgress::new(user_id, lesson_id, course_id, at));
        entry.mark_completed(at);
        Ok(entry.clone())
    }

    async fn list_course_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        let mut rows: Vec<LessonProgress> = guard
            .values()
            .filter(|p| p.user_id() == user_id && p.course_id() == course_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.last_accessed().cmp(&a.last_accessed()));
        Ok(rows)
    }
}

/// Aggregates the repositories the services layer depends on.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self::from_backend(repo)
    }

    /// Share one backend value across all three repository roles.
    #[must_use]
    pub fn from_backend<R>(repo: R) -> Self
    where
        R: CatalogRepository + EnrollmentRepository + ProgressRepository + Clone + 'static,
    {
        let catalog: Arc<dyn CatalogRepository> = Arc::new(repo.clone());
        let enrollments: Arc<dyn EnrollmentRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            catalog,
            enrollments,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use learn_core::time::fixed_now;

    fn update(user: UserId, lesson: LessonId, course: CourseId, watch: f64) -> ProgressUpdate {
        ProgressUpdate {
            user_id: user,
            lesson_id: lesson,
            course_id: course,
            watch_time_seconds: watch,
            total_duration_seconds: 600.0,
            completion_percentage: None,
        }
    }

    #[tokio::test]
    async fn first_upsert_creates_zero_percent_record() {
        let repo = InMemoryRepository::new();
        let (user, lesson, course) = (UserId::random(), LessonId::random(), CourseId::random());

        let stored = repo
            .upsert_progress(&update(user, lesson, course, 42.7), fixed_now())
            .await
            .unwrap();

        assert_eq!(stored.watch_time_seconds(), 42);
        assert_eq!(stored.completion_percentage(), 0);
        assert!(!stored.is_completed());
    }

    #[tokio::test]
    async fn mark_completed_twice_keeps_single_row() {
        let repo = InMemoryRepository::new();
        let (user, lesson, course) = (UserId::random(), LessonId::random(), CourseId::random());
        let now = fixed_now();

        repo.mark_completed(user, lesson, course, now).await.unwrap();
        let second = repo
            .mark_completed(user, lesson, course, now + Duration::seconds(5))
            .await
            .unwrap();

        assert_eq!(second.completed_at(), Some(now));
        let rows = repo.list_course_progress(user, course).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn course_progress_is_most_recent_first() {
        let repo = InMemoryRepository::new();
        let (user, course) = (UserId::random(), CourseId::random());
        let (older, newer) = (LessonId::random(), LessonId::random());
        let now = fixed_now();

        repo.upsert_progress(&update(user, older, course, 1.0), now)
            .await
            .unwrap();
        repo.upsert_progress(&update(user, newer, course, 1.0), now + Duration::minutes(1))
            .await
            .unwrap();

        let rows = repo.list_course_progress(user, course).await.unwrap();
        let ids: Vec<_> = rows.iter().map(LessonProgress::lesson_id).collect();
        assert_eq!(ids, vec![newer, older]);
    }

    #[tokio::test]
    async fn duplicate_course_insert_conflicts() {
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
        let err = repo.insert_course(&course).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn enrollment_grants_access() {
        let repo = InMemoryRepository::new();
        let (user, course) = (UserId::random(), CourseId::random());
        assert!(!repo.is_enrolled(user, course).await.unwrap());
        repo.enroll(user, course, fixed_now()).await.unwrap();
        repo.enroll(user, course, fixed_now()).await.unwrap();
        assert!(repo.is_enrolled(user, course).await.unwrap());
    }
}
