use dioxus::prelude::*;
use learn_core::model::{CourseId, LessonId};
use services::{CourseLearningSession, LearningView, ProgressService, SectionWithLessons};

use crate::context::AppContext;
use crate::views::{
    AccessDeniedView, LessonNavigator, PlayerPanel, ViewError, ViewState, view_state_from_resource,
};
use crate::vm::{PlayerPanelVm, SectionVm, map_navigator, map_player_panel};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LearningPageVm {
    pub title: String,
    pub sections: Vec<SectionVm>,
    pub player: Option<PlayerPanelVm>,
}

/// Snapshot of the session for rendering. The selected row carries the
/// tracker's live percentage.
pub(crate) fn map_learning_page(page: &CourseLearningSession) -> LearningPageVm {
    let tracker = page.tracker();
    let display = tracker.display();
    let player = tracker.selected().and_then(|selected| {
        SectionWithLessons::flatten(page.sections())
            .find(|item| item.lesson.id() == selected.lesson_id)
            .map(|item| map_player_panel(&item.lesson, selected, display))
    });

    LearningPageVm {
        title: page.course().title().to_string(),
        sections: map_navigator(page.sections(), page.selected_lesson_id(), Some(display)),
        player,
    }
}

/// Player, completion button and navigator around one course learning session.
///
/// Selection and completion are handed to the session's progress tracker.
#[component]
pub fn LearningPageView(
    course_id: CourseId,
    start_at: Option<LessonId>,
    on_back: EventHandler<()>,
) -> Element {
    let ctx = use_context::<AppContext>();
    let page = use_signal(|| None::<Box<CourseLearningSession>>);
    let error = use_signal(|| None::<ViewError>);

    let resource = use_resource(move || {
        let ctx = ctx.clone();
        let mut page = page;

        async move {
            let progress = ProgressService::clone(&ctx.progress_service());
            let view = CourseLearningSession::open(
                ctx.learner().clone(),
                course_id,
                progress,
                &ctx.catalog_service(),
                ctx.tracker_config(),
            )
            .await
            .map_err(|_| ViewError::Unknown)?;

            let LearningView::Ready(mut session) = view else {
                return Err(ViewError::AccessDenied);
            };
            if let Some(lesson_id) = start_at {
                session.select_lesson(lesson_id).await;
            }
            page.set(Some(session));
            Ok::<_, ViewError>(())
        }
    });

    let on_select = use_callback(move |lesson_id: LessonId| {
        let mut page = page;
        let mut error = error;
        spawn(async move {
            let Some(mut session) = page.write().take() else {
                return;
            };
            let found = session.select_lesson(lesson_id).await;
            // put the session back even when the lesson was unknown
            page.set(Some(session));
            error.set((!found).then_some(ViewError::Unknown));
        });
    });

    let on_complete = use_callback(move |()| {
        let mut page = page;
        let mut error = error;
        spawn(async move {
            let Some(mut session) = page.write().take() else {
                return;
            };
            let completed = session.mark_completed().await;
            page.set(Some(session));
            error.set((!completed).then_some(ViewError::Unknown));
        });
    });

    let state = view_state_from_resource(&resource);
    let vm = page.read().as_deref().map(map_learning_page);

    match state {
        ViewState::Idle => rsx! {
            p { "Idle" }
        },
        ViewState::Loading => rsx! {
            p { "Loading..." }
        },
        ViewState::Error(ViewError::AccessDenied) => rsx! {
            AccessDeniedView {}
        },
        ViewState::Error(err) => rsx! {
            p { "{err.message()}" }
        },
        ViewState::Ready(()) => match vm {
            None => rsx! {
                p { "Loading..." }
            },
            Some(LearningPageVm { title, sections, player }) => rsx! {
                div { class: "page course-learning",
                    div { class: "learning-header",
                        button { class: "back-button", onclick: move |_| on_back.call(()), "← Course outline" }
                        h1 { "{title}" }
                    }
                    if let Some(err) = error() {
                        p { class: "learning-error", "{err.message()}" }
                    }
                    div { class: "learning-layout",
                        match player {
                            Some(player) => rsx! {
                                PlayerPanel { vm: player, on_complete }
                            },
                            None => rsx! {
                                p { class: "player-missing", "This course has no lessons yet." }
                            },
                        }
                        LessonNavigator { sections, on_select }
                    }
                }
            },
        },
    }
}
