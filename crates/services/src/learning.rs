use learn_core::model::{Course, CourseId, Lesson, LessonId, Section};

use crate::catalog_service::CatalogService;
use crate::error::LearningSessionError;
use crate::learner::LearnerSession;
use crate::progress_service::{LessonWithProgress, ProgressService, SectionWithLessons};
use crate::tracker::{ProgressTracker, TrackerConfig};

/// Outcome of opening a course for learning.
pub enum LearningView {
    /// The learner is not enrolled. Terminal.
    AccessDenied,
    Ready(Box<CourseLearningSession>),
}

/// The learning page of one course: outline, selection and tracker.
pub struct CourseLearningSession {
    course: Course,
    sections: Vec<SectionWithLessons>,
    tracker: ProgressTracker,
}

impl CourseLearningSession {
    /// Check access, load the outline and select the initial lesson.
    ///
    /// # Errors
    ///
    /// Returns `LearningSessionError::CourseNotFound` if the course does not exist,
    /// `LearningSessionError::Catalog` if the course lookup fails and
    /// `LearningSessionError::Progress` if loading progress fails.
    pub async fn open(
        session: LearnerSession,
        course_id: CourseId,
        progress: ProgressService,
        catalog: &CatalogService,
        config: TrackerConfig,
    ) -> Result<LearningView, LearningSessionError> {
        let user_id = session.user_id;
        if !progress.validate_course_access(user_id, course_id).await? {
            tracing::info!(%user_id, %course_id, "course access denied");
            return Ok(LearningView::AccessDenied);
        }

        let course = catalog
            .get_course(course_id)
            .await?
            .ok_or(LearningSessionError::CourseNotFound(course_id))?;
        let sections = progress.lessons_with_progress(user_id, course_id).await?;

        let mut tracker = ProgressTracker::new(session, course_id, progress, config);
        if let Some((section, lesson)) = initial_lesson(&sections) {
            tracker.select_lesson(lesson, section.title()).await;
        }

        Ok(LearningView::Ready(Box::new(Self {
            course,
            sections,
            tracker,
        })))
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionWithLessons] {
        &self.sections
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ProgressTracker {
        &mut self.tracker
    }

    #[must_use]
    pub fn selected_lesson_id(&self) -> Option<LessonId> {
        self.tracker.selected().map(|s| s.lesson_id)
    }

    /// Select a lesson of this course. Returns `false` for an unknown id.
    pub async fn select_lesson(&mut self, lesson_id: LessonId) -> bool {
        let Some((section, lesson)) = find_lesson(&self.sections, lesson_id) else {
            return false;
        };
        let (title, lesson) = (section.title().to_string(), lesson.clone());
        self.tracker.select_lesson(&lesson, &title).await;
        true
    }

    /// Mark the selected lesson completed and refresh the outline.
    ///
    /// Returns `false` if nothing was selected or the write failed. When only
    /// the reload fails the stale outline is kept and `true` is returned.
    pub async fn mark_completed(&mut self) -> bool {
        let Some(completion) = self.tracker.mark_completed().await else {
            return false;
        };
        if let Some(sections) = completion.outline {
            self.sections = sections;
        }
        true
    }
}

fn find_lesson(sections: &[SectionWithLessons], lesson_id: LessonId) -> Option<(&Section, &Lesson)> {
    sections.iter().find_map(|s| {
        s.lessons
            .iter()
            .find(|l| l.lesson.id() == lesson_id)
            .map(|l| (&s.section, &l.lesson))
    })
}

/// Lesson to open first: the most recently accessed one, else the first not
/// completed, else the very first.
#[must_use]
pub fn initial_lesson(sections: &[SectionWithLessons]) -> Option<(&Section, &Lesson)> {
    let with_section = || {
        sections
            .iter()
            .flat_map(|s| s.lessons.iter().map(move |l| (&s.section, l)))
    };

    let recent = with_section()
        .filter_map(|(s, l)| l.progress.as_ref().map(|p| (p.last_accessed(), s, l)))
        .max_by_key(|(at, _, _)| *at)
        .map(|(_, s, l)| (s, l));
    let unfinished = || with_section().find(|(_, l)| !is_completed(l));

    recent
        .or_else(unfinished)
        .or_else(|| with_section().next())
        .map(|(s, l)| (s, &l.lesson))
}

fn is_completed(lesson: &LessonWithProgress) -> bool {
    lesson.progress.as_ref().is_some_and(|p| p.is_completed())
}
