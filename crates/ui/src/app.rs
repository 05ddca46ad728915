use dioxus::prelude::*;
use learn_core::model::LessonId;

use crate::context::AppContext;
use crate::views::{CourseOutlineView, LearningPageView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Outline,
    Learning { start_at: Option<LessonId> },
}

/// Root of the desktop window: the course outline, then the learning page.
#[component]
pub fn App() -> Element {
    let ctx = use_context::<AppContext>();
    let course_id = ctx.current_course_id();
    let mut screen = use_signal(|| Screen::Outline);

    rsx! {
        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| rsx! {
                    div { class: "fatal",
                        h1 { "Something went wrong" }
                        pre { "{errors:?}" }
                    }
                },
                match screen() {
                    Screen::Outline => rsx! {
                        button {
                            class: "resume-button",
                            onclick: move |_| screen.set(Screen::Learning { start_at: None }),
                            "Continue learning"
                        }
                        CourseOutlineView {
                            course_id,
                            on_select: move |lesson_id| screen.set(Screen::Learning { start_at: Some(lesson_id) }),
                        }
                    },
                    Screen::Learning { start_at } => rsx! {
                        LearningPageView {
                            course_id,
                            start_at,
                            on_back: move |()| screen.set(Screen::Outline),
                        }
                    },
                }
            }
        }
    }
}
