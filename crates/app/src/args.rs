use std::fmt;
use std::path::PathBuf;

use learn_core::model::{CourseId, LessonId, UserId};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    MissingCourse,
    MissingUser,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingCourse => write!(f, "--course is required"),
            ArgsError::MissingUser => write!(
                f,
                "no learner: pass --user, set LEARN_USER_ID, or run `login` first"
            ),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- login   --user <uuid> [--name <display name>]");
    eprintln!("  cargo run -p app -- logout");
    eprintln!("  cargo run -p app -- seed    [--db <sqlite_url>] [--user <uuid>]");
    eprintln!("  cargo run -p app -- outline --course <uuid> [--db <sqlite_url>] [--user <uuid>]");
    eprintln!("  cargo run -p app -- summary --course <uuid>... [--db <sqlite_url>] [--user <uuid>]");
    eprintln!(
        "  cargo run -p app -- watch   --course <uuid> [--lesson <uuid>] [--seconds <n>] [--pause] [--complete] [--realtime]"
    );
    eprintln!("  cargo run -p app -- ui      --course <uuid> [--db <sqlite_url>] [--user <uuid>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:learn.sqlite3 (ignored when the REST backend is configured)");
    eprintln!("  --seconds 30");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_USER_ID, LEARN_SESSION_FILE, LEARN_LOG, RUST_LOG");
    eprintln!("  LEARN_BACKEND_URL, LEARN_BACKEND_KEY, LEARN_BACKEND_TOKEN, LEARN_BACKEND_TIMEOUT_SECS");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Login,
    Logout,
    Seed,
    Outline,
    Summary,
    Watch,
    Ui,
}

impl Command {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "seed" => Some(Self::Seed),
            "outline" => Some(Self::Outline),
            "summary" => Some(Self::Summary),
            "watch" => Some(Self::Watch),
            "ui" => Some(Self::Ui),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Args {
    /// Explicit `--db`; `None` lets the environment decide the backend.
    pub db_url: Option<String>,
    pub user: Option<UserId>,
    pub name: Option<String>,
    pub courses: Vec<CourseId>,
    pub lesson: Option<LessonId>,
    pub seconds: u64,
    pub pause: bool,
    pub complete: bool,
    pub realtime: bool,
}

pub const DEFAULT_WATCH_SECONDS: u64 = 30;

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

impl Args {
    pub fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            seconds: DEFAULT_WATCH_SECONDS,
            user: std::env::var("LEARN_USER_ID")
                .ok()
                .and_then(|value| value.parse().ok()),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(normalize_sqlite_url(value));
                }
                "--user" => parsed.user = Some(parse_id("--user", require_value(args, "--user")?)?),
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--course" => parsed
                    .courses
                    .push(parse_id("--course", require_value(args, "--course")?)?),
                "--lesson" => {
                    parsed.lesson = Some(parse_id("--lesson", require_value(args, "--lesson")?)?);
                }
                "--seconds" => {
                    let value = require_value(args, "--seconds")?;
                    parsed.seconds = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--seconds",
                        raw: value.clone(),
                    })?;
                }
                "--pause" => parsed.pause = true,
                "--complete" => parsed.complete = true,
                "--realtime" => parsed.realtime = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    pub fn course(&self) -> Result<CourseId, ArgsError> {
        self.courses.first().copied().ok_or(ArgsError::MissingCourse)
    }
}

/// `LEARN_DB_URL` when `--db` was not given, else the default file.
pub fn sqlite_url(explicit: Option<String>) -> String {
    explicit.unwrap_or_else(|| {
        std::env::var("LEARN_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("learn.sqlite3".into()), normalize_sqlite_url)
    })
}

pub fn session_file() -> PathBuf {
    std::env::var_os("LEARN_SESSION_FILE")
        .map_or_else(|| PathBuf::from(".learn-session.json"), PathBuf::from)
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Seconds from a display label such as `12:34` or `1:02:03`.
pub fn parse_duration_label(label: &str) -> Option<f64> {
    let mut total = 0u64;
    let mut parts = 0;
    for part in label.trim().split(':') {
        total = total * 60 + part.trim().parse::<u64>().ok()?;
        parts += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let seconds = total as f64;
    (1..=3).contains(&parts).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = raw.iter().map(ToString::to_string);
        Args::parse(&mut iter)
    }

    #[test]
    fn collects_repeated_courses() {
        let a = "6f1c2a4e-3b7d-4c8e-9a0b-1d2e3f405162";
        let b = "00000000-0000-4000-8000-000000000001";
        let args = parse(&["--course", a, "--course", b, "--seconds", "12", "--complete"]).unwrap();
        assert_eq!(args.courses.len(), 2);
        assert_eq!(args.course().unwrap().to_string(), a);
        assert_eq!(args.seconds, 12);
        assert!(args.complete);
        assert!(!args.realtime);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(&["--course", "nope"]),
            Err(ArgsError::InvalidId { flag: "--course", .. })
        ));
        assert!(matches!(
            parse(&["--seconds"]),
            Err(ArgsError::MissingValue { flag: "--seconds" })
        ));
        assert!(matches!(parse(&["--bogus"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn knows_every_subcommand() {
        assert_eq!(Command::from_arg("ui"), Some(Command::Ui));
        assert_eq!(Command::from_arg("watch"), Some(Command::Watch));
        assert_eq!(Command::from_arg("review"), None);
    }

    #[test]
    fn duration_labels() {
        assert_eq!(parse_duration_label("10:00"), Some(600.0));
        assert_eq!(parse_duration_label("1:02:03"), Some(3723.0));
        assert_eq!(parse_duration_label("abc"), None);
    }

    #[test]
    fn sqlite_urls_are_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert!(normalize_sqlite_url("sqlite:dev.db".into()).starts_with("sqlite:///"));
    }
}
