use dioxus::prelude::*;
use learn_core::model::{CourseId, LessonId};

use crate::context::AppContext;
use crate::views::{AccessDeniedView, LessonNavigator, ViewError, ViewState, view_state_from_resource};
use crate::vm::{CourseSummaryVm, SectionVm, map_navigator};

#[derive(Clone, Debug, PartialEq)]
struct OutlineData {
    summary: CourseSummaryVm,
    sections: Vec<SectionVm>,
}

/// Read-only course overview: completion summary plus the navigator.
#[component]
pub fn CourseOutlineView(course_id: CourseId, on_select: EventHandler<LessonId>) -> Element {
    let ctx = use_context::<AppContext>();
    let progress = ctx.progress_service();
    let user_id = ctx.learner().user_id;

    let resource = use_resource(move || {
        let progress = progress.clone();
        async move {
            let allowed = progress
                .validate_course_access(user_id, course_id)
                .await
                .map_err(|_| ViewError::Unknown)?;
            if !allowed {
                return Err(ViewError::AccessDenied);
            }
            let sections = progress
                .lessons_with_progress(user_id, course_id)
                .await
                .map_err(|_| ViewError::Unknown)?;
            let summary = progress
                .course_progress_summary(user_id, course_id)
                .await
                .map_err(|_| ViewError::Unknown)?;
            Ok(OutlineData {
                summary: CourseSummaryVm::from(&summary),
                sections: map_navigator(&sections, None, None),
            })
        }
    });

    let state = view_state_from_resource(&resource);

    match state {
        ViewState::Idle => rsx! {
            p { "Idle" }
        },
        ViewState::Loading => rsx! {
            p { "Loading..." }
        },
        ViewState::Ready(data) => rsx! {
            div { class: "page course-outline",
                div { class: "course-summary",
                    span { "{data.summary.lessons_str}" }
                    span { " ({data.summary.completion_percentage}%)" }
                    if let Some(last) = data.summary.last_accessed_str {
                        span { class: "last-accessed", " Last watched {last}" }
                    }
                }
                LessonNavigator { sections: data.sections, on_select }
            }
        },
        ViewState::Error(ViewError::AccessDenied) => rsx! {
            AccessDeniedView {}
        },
        ViewState::Error(err) => rsx! {
            p { "{err.message()}" }
        },
    }
}
