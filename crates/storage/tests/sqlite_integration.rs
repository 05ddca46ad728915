use chrono::Duration;
use learn_core::model::{
    Course, CourseId, Lesson, LessonId, LessonProgress, ProgressUpdate, Section, SectionId, UserId,
};
use learn_core::time::fixed_now;
use storage::repository::{
    CatalogRepository, EnrollmentRepository, ProgressRepository, StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn progress_update(
    user: UserId,
    lesson: LessonId,
    course: CourseId,
    watch: f64,
    pct: Option<u8>,
) -> ProgressUpdate {
    ProgressUpdate {
        user_id: user,
        lesson_id: lesson,
        course_id: course,
        watch_time_seconds: watch,
        total_duration_seconds: 600.0,
        completion_percentage: pct,
    }
}

#[tokio::test]
async fn sqlite_catalog_lists_sections_and_lessons_in_order() {
    let repo = connect("memdb_catalog").await;
    let now = fixed_now();

    let course = Course::new(
        CourseId::random(),
        UserId::random(),
        "Rust for Web",
        "From zero to server",
        4900,
        now,
    )
    .unwrap()
    .with_certificate(true);
    repo.insert_course(&course).await.unwrap();

    let second = Section::new(SectionId::random(), course.id(), "Advanced", 2).unwrap();
    let first = Section::new(SectionId::random(), course.id(), "Basics", 1).unwrap();
    repo.insert_section(&second).await.unwrap();
    repo.insert_section(&first).await.unwrap();

    for (pos, title) in [(2, "Ownership"), (1, "Hello")] {
        let lesson = Lesson::new(
            LessonId::random(),
            first.id(),
            title,
            "https://youtu.be/abc123",
            Some("05:00".into()),
            pos,
        )
        .unwrap();
        repo.insert_lesson(&lesson).await.unwrap();
    }

    let fetched = repo.get_course(course.id()).await.unwrap().expect("course");
    assert_eq!(fetched, course);

    let sections = repo.list_sections(course.id()).await.unwrap();
    let titles: Vec<_> = sections.iter().map(Section::title).collect();
    assert_eq!(titles, vec!["Basics", "Advanced"]);

    let lessons = repo.list_lessons(&[first.id()]).await.unwrap();
    let titles: Vec<_> = lessons.iter().map(Lesson::title).collect();
    assert_eq!(titles, vec!["Hello", "Ownership"]);
    assert_eq!(lessons[0].duration_label(), Some("05:00"));

    assert!(repo.list_lessons(&[]).await.unwrap().is_empty());

    let dup = repo.insert_section(&first).await.unwrap_err();
    assert!(matches!(dup, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_upsert_keeps_percentage_when_omitted() {
    let repo = connect("memdb_upsert").await;
    let (user, lesson, course) = (UserId::random(), LessonId::random(), CourseId::random());
    let now = fixed_now();

    let first = repo
        .upsert_progress(&progress_update(user, lesson, course, 300.4, Some(50)), now)
        .await
        .unwrap();
    assert_eq!(first.watch_time_seconds(), 300);
    assert_eq!(first.completion_percentage(), 50);

    let later = now + Duration::seconds(10);
    let second = repo
        .upsert_progress(&progress_update(user, lesson, course, 310.0, None), later)
        .await
        .unwrap();
    assert_eq!(second.watch_time_seconds(), 310);
    assert_eq!(second.completion_percentage(), 50);
    assert_eq!(second.last_accessed(), later);
    assert!(!second.is_completed());
}

#[tokio::test]
async fn sqlite_mark_completed_is_idempotent() {
    let repo = connect("memdb_complete").await;
    let (user, lesson, course) = (UserId::random(), LessonId::random(), CourseId::random());
    let now = fixed_now();

    repo.upsert_progress(&progress_update(user, lesson, course, 120.0, Some(20)), now)
        .await
        .unwrap();

    let first = repo.mark_completed(user, lesson, course, now).await.unwrap();
    let second = repo
        .mark_completed(user, lesson, course, now + Duration::minutes(3))
        .await
        .unwrap();

    assert!(second.is_completed());
    assert_eq!(second.completion_percentage(), 100);
    assert_eq!(second.watch_time_seconds(), 120);
    assert_eq!(second.completed_at(), first.completed_at());
    assert_eq!(second.completed_at(), Some(now));

    let rows = repo.list_course_progress(user, course).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn sqlite_course_progress_orders_by_last_access() {
    let repo = connect("memdb_order").await;
    let (user, course) = (UserId::random(), CourseId::random());
    let now = fixed_now();
    let lessons: Vec<LessonId> = (0..3).map(|_| LessonId::random()).collect();

    for (i, lesson) in lessons.iter().enumerate() {
        let at = now + Duration::minutes(i64::try_from(i).unwrap());
        repo.upsert_progress(&progress_update(user, *lesson, course, 10.0, None), at)
            .await
            .unwrap();
    }
    // another learner's row never leaks in
    repo.upsert_progress(
        &progress_update(UserId::random(), lessons[0], course, 10.0, None),
        now,
    )
    .await
    .unwrap();

    let rows = repo.list_course_progress(user, course).await.unwrap();
    let ids: Vec<_> = rows.iter().map(LessonProgress::lesson_id).collect();
    assert_eq!(ids, vec![lessons[2], lessons[1], lessons[0]]);
}

#[tokio::test]
async fn sqlite_enrollment_roundtrip() {
    let repo = connect("memdb_enroll").await;
    let course = Course::new(
        CourseId::random(),
        UserId::random(),
        "Course",
        "",
        0,
        fixed_now(),
    )
    .unwrap();
    repo.insert_course(&course).await.unwrap();
    let user = UserId::random();

    assert!(!repo.is_enrolled(user, course.id()).await.unwrap());
    repo.enroll(user, course.id(), fixed_now()).await.unwrap();
    repo.enroll(user, course.id(), fixed_now()).await.unwrap();
    assert!(repo.is_enrolled(user, course.id()).await.unwrap());
}
