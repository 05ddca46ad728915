use learn_core::model::LessonId;
use services::{ProgressDisplay, SectionWithLessons};

/// Per-lesson status shown by the navigator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl LessonStatus {
    #[must_use]
    pub fn from_progress(is_completed: bool, completion_percentage: u8) -> Self {
        if is_completed {
            Self::Completed
        } else if completion_percentage > 0 {
            Self::InProgress
        } else {
            Self::NotStarted
        }
    }

    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::NotStarted => "lesson-not-started",
            Self::InProgress => "lesson-in-progress",
            Self::Completed => "lesson-completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonRowVm {
    pub id: LessonId,
    pub title: String,
    pub duration_label: Option<String>,
    pub status: LessonStatus,
    pub completion_percentage: u8,
    pub is_selected: bool,
}

impl LessonRowVm {
    /// "N% complete", only once some progress exists.
    #[must_use]
    pub fn completion_hint(&self) -> Option<String> {
        (self.completion_percentage > 0).then(|| format!("{}% complete", self.completion_percentage))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionVm {
    pub title: String,
    pub lessons: Vec<LessonRowVm>,
}

/// Build navigator rows. The selected lesson shows the tracker's live
/// percentage instead of the stored one.
#[must_use]
pub fn map_navigator(
    sections: &[SectionWithLessons],
    selected: Option<LessonId>,
    live: Option<&ProgressDisplay>,
) -> Vec<SectionVm> {
    sections
        .iter()
        .map(|section| SectionVm {
            title: section.section.title().to_string(),
            lessons: section
                .lessons
                .iter()
                .map(|item| {
                    let id = item.lesson.id();
                    let is_selected = selected == Some(id);
                    let is_completed = item.progress.as_ref().is_some_and(|p| p.is_completed());
                    let stored = item
                        .progress
                        .as_ref()
                        .map_or(0, |p| p.completion_percentage());
                    let completion_percentage = match live {
                        Some(display) if is_selected => display.completion_percentage,
                        _ => stored,
                    };
                    LessonRowVm {
                        id,
                        title: item.lesson.title().to_string(),
                        duration_label: item.lesson.duration_label().map(ToString::to_string),
                        status: LessonStatus::from_progress(is_completed, completion_percentage),
                        completion_percentage,
                        is_selected,
                    }
                })
                .collect(),
        })
        .collect()
}
