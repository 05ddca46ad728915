use learn_core::model::{CourseId, Lesson, LessonId};

use super::schedule::PollSchedule;

/// The lesson the tracker is currently attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedLesson {
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub section_title: String,
}

impl SelectedLesson {
    #[must_use]
    pub fn new(lesson: &Lesson, course_id: CourseId, section_title: impl Into<String>) -> Self {
        Self {
            lesson_id: lesson.id(),
            course_id,
            title: lesson.title().to_string(),
            section_title: section_title.into(),
        }
    }
}

/// Lifecycle of the tracker. Polls exist only while `Tracking`.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerState {
    /// No lesson selected.
    Idle,
    /// Waiting for the player to become ready so the resume seek can be issued.
    Seeking {
        lesson: SelectedLesson,
        resume_at: f64,
    },
    Tracking {
        lesson: SelectedLesson,
        polls: PollSchedule,
    },
    /// Lesson selected, player not playing.
    Suspended { lesson: SelectedLesson },
    Ended { lesson: SelectedLesson },
}

impl TrackerState {
    #[must_use]
    pub fn lesson(&self) -> Option<&SelectedLesson> {
        match self {
            Self::Idle => None,
            Self::Seeking { lesson, .. }
            | Self::Tracking { lesson, .. }
            | Self::Suspended { lesson }
            | Self::Ended { lesson } => Some(lesson),
        }
    }

    pub(super) fn into_lesson(self) -> Option<SelectedLesson> {
        match self {
            Self::Idle => None,
            Self::Seeking { lesson, .. }
            | Self::Tracking { lesson, .. }
            | Self::Suspended { lesson }
            | Self::Ended { lesson } => Some(lesson),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Seeking { .. } => "seeking",
            Self::Tracking { .. } => "tracking",
            Self::Suspended { .. } => "suspended",
            Self::Ended { .. } => "ended",
        }
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking { .. })
    }
}
