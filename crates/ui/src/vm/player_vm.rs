use learn_core::model::Lesson;
use services::ProgressDisplay;
use services::tracker::SelectedLesson;

use crate::vm::time_fmt::format_clock;

/// Header and controls around the embedded player.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerPanelVm {
    pub heading: String,
    pub video_id: Option<String>,
    pub elapsed_str: String,
    pub duration_str: String,
    pub completion_percentage: u8,
    pub is_completed: bool,
}

impl PlayerPanelVm {
    #[must_use]
    pub fn embed_url(&self) -> Option<String> {
        self.video_id
            .as_ref()
            .map(|id| format!("https://www.youtube.com/embed/{id}?enablejsapi=1"))
    }

    #[must_use]
    pub fn complete_label(&self) -> &'static str {
        if self.is_completed {
            "Completed"
        } else {
            "Mark as completed"
        }
    }
}

#[must_use]
pub fn map_player_panel(
    lesson: &Lesson,
    selected: &SelectedLesson,
    display: &ProgressDisplay,
) -> PlayerPanelVm {
    PlayerPanelVm {
        heading: format!("{} - {}", selected.section_title, selected.title),
        video_id: lesson.youtube_video_id(),
        elapsed_str: format_clock(display.elapsed_seconds),
        duration_str: format_clock(display.duration_seconds),
        completion_percentage: display.completion_percentage,
        is_completed: display.is_completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::model::{CourseId, LessonId, SectionId};

    #[test]
    fn panel_shows_heading_and_clock() {
        let lesson = Lesson::new(
            LessonId::random(),
            SectionId::random(),
            "Borrowing",
            "https://www.youtube.com/watch?v=abcDEF12345",
            None,
            1,
        )
        .unwrap();
        let selected = SelectedLesson::new(&lesson, CourseId::random(), "Ownership");
        let display = ProgressDisplay {
            elapsed_seconds: 75.4,
            duration_seconds: 600.0,
            completion_percentage: 13,
            is_completed: false,
        };

        let vm = map_player_panel(&lesson, &selected, &display);
        assert_eq!(vm.heading, "Ownership - Borrowing");
        assert_eq!(vm.elapsed_str, "1:15");
        assert_eq!(vm.duration_str, "10:00");
        assert_eq!(
            vm.embed_url().as_deref(),
            Some("https://www.youtube.com/embed/abcDEF12345?enablejsapi=1")
        );
        assert_eq!(vm.complete_label(), "Mark as completed");
    }
}
