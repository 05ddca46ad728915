mod args;
mod sim_player;

use std::sync::Arc;
use std::time::Duration;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use learn_core::model::{CourseId, UserId};
use services::{
    CatalogService, Clock, CourseInput, CourseLearningSession, LearnerSession, LearningView,
    LessonInput, PlayerState, ProgressService, SectionInput, TrackerConfig,
};
use storage::repository::Storage;
use storage::rest::RestConfig;
use ui::vm::{CourseSummaryVm, LessonStatus, format_clock, map_navigator};
use ui::{App, UiApp, build_app_context};

use crate::args::{Args, ArgsError, Command, parse_duration_label, print_usage, session_file};
use crate::sim_player::SimulatedPlayer;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Fallback length for lessons without a parseable duration label.
const DEFAULT_LESSON_SECONDS: f64 = 600.0;

struct DesktopApp {
    learner: LearnerSession,
    course_id: CourseId,
    progress: Arc<ProgressService>,
    catalog: Arc<CatalogService>,
}

impl UiApp for DesktopApp {
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

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let level = std::env::var("LEARN_LOG").unwrap_or_else(|_| "info".into());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

async fn open_storage(db_url: Option<String>) -> AppResult<Storage> {
    if db_url.is_none() {
        if let Some(config) = RestConfig::from_env() {
            tracing::info!(base_url = %config.base_url, "using REST backend");
            return Ok(Storage::rest(config)?);
        }
    }

    let url = args::sqlite_url(db_url);
    prepare_sqlite_file(&url)?;
    tracing::info!(%url, "using SQLite backend");
    Ok(Storage::sqlite(&url).await?)
}

fn resolve_learner(args: &Args) -> AppResult<LearnerSession> {
    if let Some(user_id) = args.user {
        return Ok(LearnerSession::new(user_id));
    }
    LearnerSession::load(&session_file())?.ok_or_else(|| ArgsError::MissingUser.into())
}

async fn run() -> AppResult<()> {
    let mut argv = std::env::args().skip(1);
    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        print_usage();
        e
    })?;

    match cmd {
        Command::Login => login(&parsed),
        Command::Logout => {
            LearnerSession::clear(&session_file())?;
            println!("signed out");
            Ok(())
        }
        Command::Seed => {
            let storage = open_storage(parsed.db_url.clone()).await?;
            seed(&storage, &parsed).await
        }
        Command::Outline => {
            let learner = resolve_learner(&parsed)?;
            let storage = open_storage(parsed.db_url.clone()).await?;
            outline(&storage, &learner, parsed.course()?).await
        }
        Command::Summary => {
            let learner = resolve_learner(&parsed)?;
            if parsed.courses.is_empty() {
                return Err(ArgsError::MissingCourse.into());
            }
            let storage = open_storage(parsed.db_url.clone()).await?;
            summary(&storage, &learner, &parsed.courses).await
        }
        Command::Watch => {
            let learner = resolve_learner(&parsed)?;
            let storage = open_storage(parsed.db_url.clone()).await?;
            watch(&storage, learner, &parsed).await
        }
        Command::Ui => {
            let learner = resolve_learner(&parsed)?;
            let course_id = parsed.course()?;
            let storage = open_storage(parsed.db_url.clone()).await?;
            launch_desktop(&storage, learner, course_id);
            Ok(())
        }
    }
}

fn launch_desktop(storage: &Storage, learner: LearnerSession, course_id: CourseId) {
    let clock = Clock::system();
    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        learner,
        course_id,
        progress: Arc::new(ProgressService::from_storage(clock, storage)),
        catalog: Arc::new(CatalogService::from_storage(clock, storage)),
    });
    let context = build_app_context(&app);

    tracing::info!(%course_id, "launching desktop window");
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Learn")
            .with_always_on_top(false),
    );
    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
}

fn login(args: &Args) -> AppResult<()> {
    let user_id = args.user.ok_or(ArgsError::MissingUser)?;
    let mut session = LearnerSession::new(user_id);
    if let Some(name) = &args.name {
        session = session.with_display_name(name.clone());
    }
    let path = session_file();
    session.save(&path)?;
    println!("signed in as {user_id} ({})", path.display());
    Ok(())
}

async fn seed(storage: &Storage, args: &Args) -> AppResult<()> {
    let clock = Clock::system();
    let catalog = CatalogService::from_storage(clock, storage);
    let lesson = |title: &str, video: &str, duration: &str| LessonInput {
        title: title.into(),
        video_url: format!("https://www.youtube.com/watch?v={video}"),
        duration: Some(duration.into()),
    };

    let course = catalog
        .create_course(CourseInput {
            instructor_id: UserId::random(),
            title: "Rust from scratch".into(),
            description: "Ownership, traits and async in practice.".into(),
            price_cents: 4900,
            has_certificate: true,
            sections: vec![
                SectionInput {
                    title: "Getting started".into(),
                    lessons: vec![
                        lesson("Installing the toolchain", "r9yS8uZpk1E", "06:12"),
                        lesson("Hello, cargo", "Gv3VG0g6vQc", "09:40"),
                    ],
                },
                SectionInput {
                    title: "Ownership".into(),
                    lessons: vec![
                        lesson("Moves and copies", "VFIOSWy93H0", "12:05"),
                        lesson("Borrowing", "fi3f3iU2nbs", "14:30"),
                    ],
                },
            ],
        })
        .await?;
    println!("course {}", course.id());

    let learner = match args.user {
        Some(user_id) => Some(user_id),
        None => LearnerSession::load(&session_file())?.map(|s| s.user_id),
    };
    if let Some(user_id) = learner {
        catalog.enroll(user_id, course.id()).await?;
        println!("enrolled {user_id}");
    }
    Ok(())
}

async fn outline(storage: &Storage, learner: &LearnerSession, course_id: CourseId) -> AppResult<()> {
    let progress = ProgressService::from_storage(Clock::system(), storage);
    if !progress
        .validate_course_access(learner.user_id, course_id)
        .await?
    {
        println!("access denied");
        return Ok(());
    }
    let sections = progress
        .lessons_with_progress(learner.user_id, course_id)
        .await?;
    let summary = progress
        .course_progress_summary(learner.user_id, course_id)
        .await?;
    let summary = CourseSummaryVm::from(&summary);

    println!("{} ({}%)", summary.lessons_str, summary.completion_percentage);
    if let Some(last) = summary.last_accessed_str {
        println!("last watched {last}");
    }
    for section in map_navigator(&sections, None, None) {
        println!("{}", section.title);
        for row in section.lessons {
            let marker = match row.status {
                LessonStatus::Completed => "[x]",
                LessonStatus::InProgress => "[~]",
                LessonStatus::NotStarted => "[ ]",
            };
            let hint = row.completion_hint().unwrap_or_default();
            let duration = row.duration_label.unwrap_or_default();
            println!("  {marker} {} {} {duration} {hint}", row.id, row.title);
        }
    }
    Ok(())
}

async fn summary(storage: &Storage, learner: &LearnerSession, courses: &[CourseId]) -> AppResult<()> {
    let progress = ProgressService::from_storage(Clock::system(), storage);
    for item in progress
        .multiple_course_progress(learner.user_id, courses)
        .await
    {
        let vm = CourseSummaryVm::from(&item);
        #[allow(clippy::cast_precision_loss)]
        let watched = item.total_watch_time_seconds as f64;
        println!(
            "{} {} {}% watched {}",
            item.course_id,
            vm.lessons_str,
            vm.completion_percentage,
            format_clock(watched)
        );
    }
    Ok(())
}

async fn watch(storage: &Storage, learner: LearnerSession, args: &Args) -> AppResult<()> {
    let course_id = args.course()?;
    let clock = Clock::system();
    let catalog = CatalogService::from_storage(clock, storage);
    let progress = ProgressService::from_storage(clock, storage);

    let view = CourseLearningSession::open(
        learner,
        course_id,
        progress,
        &catalog,
        TrackerConfig::default(),
    )
    .await?;
    let LearningView::Ready(mut page) = view else {
        println!("access denied");
        return Ok(());
    };

    if let Some(lesson_id) = args.lesson {
        if !page.select_lesson(lesson_id).await {
            return Err(ArgsError::InvalidId {
                flag: "--lesson",
                raw: lesson_id.to_string(),
            }
            .into());
        }
    }
    let Some(lesson_id) = page.selected_lesson_id() else {
        println!("course has no lessons");
        return Ok(());
    };
    let duration = page
        .sections()
        .iter()
        .flat_map(|s| s.lessons.iter())
        .find(|l| l.lesson.id() == lesson_id)
        .and_then(|l| l.lesson.duration_label())
        .and_then(parse_duration_label)
        .filter(|d| *d > 0.0)
        .unwrap_or(DEFAULT_LESSON_SECONDS);

    let player = SimulatedPlayer::new(duration);
    let tracker = page.tracker_mut();
    tracker.on_player_ready(Box::new(player.clone()));
    player.set_state(PlayerState::Playing);
    tracker.on_player_state_change(PlayerState::Playing).await;

    let step = Duration::from_secs(1);
    for _ in 0..args.seconds {
        if args.realtime {
            tokio::time::sleep(step).await;
        }
        let ended = player.step(step.as_secs_f64());
        tracker.advance(step).await;
        if ended {
            tracker.on_player_state_change(PlayerState::Ended).await;
            break;
        }
    }
    if args.pause && tracker.state().is_tracking() {
        player.set_state(PlayerState::Paused);
        tracker.on_player_state_change(PlayerState::Paused).await;
    }

    if args.complete && !page.mark_completed().await {
        tracing::warn!(%lesson_id, "lesson was not marked completed");
    }

    let tracker = page.tracker();
    let display = tracker.display();
    if let Some(selected) = tracker.selected() {
        println!("{} - {}", selected.section_title, selected.title);
    }
    println!(
        "{} / {} ({}%){}",
        format_clock(display.elapsed_seconds),
        format_clock(display.duration_seconds),
        display.completion_percentage,
        if display.is_completed { " completed" } else { "" }
    );
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> AppResult<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
