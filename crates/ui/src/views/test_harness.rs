use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use learn_core::model::{CourseId, UserId};
use learn_core::time::fixed_clock;
use services::{
    CatalogService, CourseInput, LearnerSession, LessonInput, ProgressService, SectionInput,
};
use storage::repository::Storage;

use crate::app::App;
use crate::context::{UiApp, build_app_context};
use crate::views::{CourseOutlineView, LearningPageView, LessonNavigator, PlayerPanel};
use crate::vm::{PlayerPanelVm, SectionVm};

struct TestApp {
    learner: LearnerSession,
    course_id: CourseId,
    progress: Arc<ProgressService>,
    catalog: Arc<CatalogService>,
}

impl UiApp for TestApp {
    fn learner(&self) -> LearnerSession {
        self.learner.clone()
    }

    fn current_course_id(&self) -> CourseId {
        self.course_id
    }

    fn progress_service(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    fn catalog_service(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }
}

#[derive(Props, Clone)]
struct OutlineHarnessProps {
    app: Arc<TestApp>,
    course_id: CourseId,
}

impl PartialEq for OutlineHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn OutlineHarness(props: OutlineHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    rsx! {
        CourseOutlineView { course_id: props.course_id, on_select: move |_| {} }
    }
}

#[component]
fn LearningHarness(props: OutlineHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    rsx! {
        LearningPageView { course_id: props.course_id, start_at: None, on_back: move |()| {} }
    }
}

#[component]
fn AppHarness(props: OutlineHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    rsx! {
        App {}
    }
}

/// Which root the harness mounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HarnessRoot {
    Outline,
    Learning,
    App,
}

#[derive(Props, Clone, PartialEq)]
pub struct NavigatorHarnessProps {
    pub sections: Vec<SectionVm>,
}

#[component]
pub fn NavigatorHarness(props: NavigatorHarnessProps) -> Element {
    rsx! {
        LessonNavigator { sections: props.sections, on_select: move |_| {} }
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct PlayerHarnessProps {
    pub vm: PlayerPanelVm,
}

#[component]
pub fn PlayerHarness(props: PlayerHarnessProps) -> Element {
    rsx! {
        PlayerPanel { vm: props.vm, on_complete: move |_| {} }
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub storage: Storage,
    pub user_id: UserId,
    pub course_id: CourseId,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// Seed a two-lesson course and mount the outline view for a fresh learner.
pub async fn setup_outline_harness(enrolled: bool) -> ViewHarness {
    setup_harness(HarnessRoot::Outline, enrolled).await
}

/// Seed a two-lesson course and mount `root` for a fresh learner.
pub async fn setup_harness(root: HarnessRoot, enrolled: bool) -> ViewHarness {
    let storage = Storage::in_memory();
    let clock = fixed_clock();
    let catalog = CatalogService::from_storage(clock, &storage);
    let course = catalog
        .create_course(CourseInput {
            instructor_id: UserId::random(),
            title: "Web basics".into(),
            description: String::new(),
            price_cents: 0,
            has_certificate: false,
            sections: vec![SectionInput {
                title: "Getting started".into(),
                lessons: vec![
                    LessonInput {
                        title: "Welcome".into(),
                        video_url: "https://youtu.be/welcome01".into(),
                        duration: Some("03:10".into()),
                    },
                    LessonInput {
                        title: "Tooling".into(),
                        video_url: "https://youtu.be/tooling02".into(),
                        duration: Some("08:45".into()),
                    },
                ],
            }],
        })
        .await
        .expect("create course");

    let user_id = UserId::random();
    if enrolled {
        catalog.enroll(user_id, course.id()).await.expect("enroll");
    }

    let app = Arc::new(TestApp {
        learner: LearnerSession::new(user_id),
        course_id: course.id(),
        progress: Arc::new(ProgressService::from_storage(clock, &storage)),
        catalog: Arc::new(catalog),
    });
    let props = OutlineHarnessProps {
        app,
        course_id: course.id(),
    };
    let dom = match root {
        HarnessRoot::Outline => VirtualDom::new_with_props(OutlineHarness, props),
        HarnessRoot::Learning => VirtualDom::new_with_props(LearningHarness, props),
        HarnessRoot::App => VirtualDom::new_with_props(AppHarness, props),
    };

    ViewHarness {
        dom,
        storage,
        user_id,
        course_id: course.id(),
    }
}

pub fn render_component<P: Clone + 'static>(root: fn(P) -> Element, props: P) -> String {
    let mut dom = VirtualDom::new_with_props(root, props);
    dom.rebuild_in_place();
    dioxus_ssr::render(&dom)
}
