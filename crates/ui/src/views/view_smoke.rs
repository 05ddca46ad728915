use learn_core::model::{LessonId, ProgressUpdate};
use learn_core::time::{fixed_clock, fixed_now};
use services::{
    CatalogService, CourseLearningSession, LearnerSession, LearningView, ProgressService,
    TrackerConfig,
};
use storage::repository::{CatalogRepository, ProgressRepository};

use super::learning::map_learning_page;
use super::test_harness::{
    HarnessRoot, NavigatorHarness, NavigatorHarnessProps, PlayerHarness, PlayerHarnessProps,
    render_component, setup_harness, setup_outline_harness,
};
use crate::vm::{LessonRowVm, LessonStatus, PlayerPanelVm, SectionVm};

fn row(title: &str, status: LessonStatus, pct: u8, is_selected: bool) -> LessonRowVm {
    LessonRowVm {
        id: LessonId::random(),
        title: title.into(),
        duration_label: Some("05:00".into()),
        status,
        completion_percentage: pct,
        is_selected,
    }
}

#[test]
fn navigator_renders_status_and_hint() {
    let sections = vec![SectionVm {
        title: "Basics".into(),
        lessons: vec![
            row("Intro", LessonStatus::Completed, 100, false),
            row("Setup", LessonStatus::InProgress, 40, true),
            row("Next", LessonStatus::NotStarted, 0, false),
        ],
    }];

    let html = render_component(NavigatorHarness, NavigatorHarnessProps { sections });

    assert!(html.contains("Basics"), "missing section in {html}");
    assert!(html.contains("lesson-completed"), "missing completed class in {html}");
    assert!(html.contains("lesson-in-progress selected"), "missing selection in {html}");
    assert!(html.contains("40% complete"), "missing hint in {html}");
    assert_eq!(html.matches("lesson-hint").count(), 2);
}

#[test]
fn player_panel_disables_completion_when_done() {
    let vm = PlayerPanelVm {
        heading: "Basics - Intro".into(),
        video_id: Some("abc".into()),
        elapsed_str: "10:00".into(),
        duration_str: "10:00".into(),
        completion_percentage: 100,
        is_completed: true,
    };

    let html = render_component(PlayerHarness, PlayerHarnessProps { vm });

    assert!(html.contains("Completed"), "missing label in {html}");
    assert!(html.contains("disabled"), "button not disabled in {html}");
    assert!(html.contains("youtube.com/embed/abc"), "missing embed in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn outline_view_smoke_renders_progress() {
    let mut harness = setup_outline_harness(true).await;
    let sections = harness
        .storage
        .catalog
        .list_sections(harness.course_id)
        .await
        .unwrap();
    let lessons = harness
        .storage
        .catalog
        .list_lessons(&[sections[0].id()])
        .await
        .unwrap();
    harness
        .storage
        .progress
        .upsert_progress(
            &ProgressUpdate {
                user_id: harness.user_id,
                lesson_id: lessons[1].id(),
                course_id: harness.course_id,
                watch_time_seconds: 105.0,
                total_duration_seconds: 525.0,
                completion_percentage: Some(20),
            },
            fixed_now(),
        )
        .await
        .unwrap();

    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();

    assert!(html.contains("0/2 lessons"), "missing summary in {html}");
    assert!(html.contains("Welcome"), "missing lesson in {html}");
    assert!(html.contains("20% complete"), "missing hint in {html}");
    assert!(html.contains("08:45"), "missing duration in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn outline_view_smoke_denies_unenrolled() {
    let mut harness = setup_outline_harness(false).await;
    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Access denied"), "missing denial in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn learning_page_smoke_opens_first_lesson() {
    let mut harness = setup_harness(HarnessRoot::Learning, true).await;
    harness.rebuild();
    for _ in 0..4 {
        harness.drive_async().await;
    }
    let html = harness.render();

    assert!(html.contains("Web basics"), "missing title in {html}");
    assert!(html.contains("Mark as completed"), "missing button in {html}");
    assert!(html.contains("youtube.com/embed/welcome01"), "missing embed in {html}");
    assert!(html.contains("Tooling"), "missing navigator in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn learning_page_smoke_denies_unenrolled() {
    let mut harness = setup_harness(HarnessRoot::Learning, false).await;
    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Access denied"), "missing denial in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn app_starts_on_the_outline() {
    let mut harness = setup_harness(HarnessRoot::App, true).await;
    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();

    assert!(html.contains("Continue learning"), "missing resume button in {html}");
    assert!(html.contains("0/2 lessons"), "missing outline in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn learning_page_reflects_completion() {
    let harness = setup_outline_harness(true).await;
    let clock = fixed_clock();
    let progress = ProgressService::from_storage(clock, &harness.storage);
    let catalog = CatalogService::from_storage(clock, &harness.storage);
    let view = CourseLearningSession::open(
        LearnerSession::new(harness.user_id),
        harness.course_id,
        progress,
        &catalog,
        TrackerConfig::default(),
    )
    .await
    .unwrap();
    let LearningView::Ready(mut page) = view else {
        panic!("enrolled learner was denied");
    };

    let before = map_learning_page(&page);
    assert_eq!(before.title, "Web basics");
    assert_eq!(before.sections[0].lessons[0].status, LessonStatus::NotStarted);
    assert!(before.sections[0].lessons[0].is_selected);

    assert!(page.mark_completed().await);

    let after = map_learning_page(&page);
    let player = after.player.expect("selected lesson");
    assert!(player.is_completed);
    assert_eq!(player.complete_label(), "Completed");
    assert_eq!(after.sections[0].lessons[0].status, LessonStatus::Completed);
    assert_eq!(after.sections[0].lessons[0].completion_percentage, 100);
}
