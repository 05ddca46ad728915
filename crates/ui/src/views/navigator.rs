use dioxus::prelude::*;
use learn_core::model::LessonId;

use crate::vm::{LessonRowVm, LessonStatus, SectionVm};

/// Course outline with per-lesson status. Selection is delegated to the host.
#[component]
pub fn LessonNavigator(sections: Vec<SectionVm>, on_select: EventHandler<LessonId>) -> Element {
    rsx! {
        nav { class: "lesson-navigator",
            h2 { "Course content" }
            for section in sections {
                div { class: "navigator-section",
                    h3 { "{section.title}" }
                    ul {
                        for row in section.lessons {
                            LessonRow { key: "{row.id}", row, on_select }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn LessonRow(row: LessonRowVm, on_select: EventHandler<LessonId>) -> Element {
    let id = row.id;
    let selected = if row.is_selected { " selected" } else { "" };
    let class = format!("lesson-row {}{selected}", row.status.css_class());
    let marker = match row.status {
        LessonStatus::Completed => "✓",
        LessonStatus::InProgress => "◐",
        LessonStatus::NotStarted => "▶",
    };
    let hint = row.completion_hint();
    let duration = row.duration_label.clone().unwrap_or_default();

    rsx! {
        li {
            button { class: "{class}", onclick: move |_| on_select.call(id),
                span { class: "lesson-marker", "{marker}" }
                span { class: "lesson-title", "{row.title}" }
                if let Some(hint) = hint {
                    span { class: "lesson-hint", "{hint}" }
                }
                span { class: "lesson-duration", "{duration}" }
            }
        }
    }
}
