use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::{CourseId, LessonId, SectionId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("section title cannot be empty")]
    EmptySectionTitle,

    #[error("lesson title cannot be empty")]
    EmptyLessonTitle,

    #[error("position must be >= 1")]
    InvalidPosition,

    #[error("invalid video url: {0}")]
    InvalidVideoUrl(String),
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A course offered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    instructor_id: UserId,
    title: String,
    description: String,
    price_cents: u64,
    has_certificate: bool,
    is_lifetime_access: bool,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates a new course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank.
    pub fn new(
        id: CourseId,
        instructor_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        price_cents: u64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        Ok(Self {
            id,
            instructor_id,
            title: title.trim().to_string(),
            description: description.into(),
            price_cents,
            has_certificate: false,
            is_lifetime_access: true,
            created_at,
        })
    }

    #[must_use]
    pub fn with_certificate(mut self, has_certificate: bool) -> Self {
        self.has_certificate = has_certificate;
        self
    }

    #[must_use]
    pub fn with_lifetime_access(mut self, is_lifetime_access: bool) -> Self {
        self.is_lifetime_access = is_lifetime_access;
        self
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn instructor_id(&self) -> UserId {
        self.instructor_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn price_cents(&self) -> u64 {
        self.price_cents
    }

    #[must_use]
    pub fn has_certificate(&self) -> bool {
        self.has_certificate
    }

    #[must_use]
    pub fn is_lifetime_access(&self) -> bool {
        self.is_lifetime_access
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// An ordered grouping of lessons within a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    id: SectionId,
    course_id: CourseId,
    title: String,
    position: u32,
}

impl Section {
    /// # Errors
    ///
    /// Returns `CourseError` if the title is blank or the position is zero.
    pub fn new(
        id: SectionId,
        course_id: CourseId,
        title: impl Into<String>,
        position: u32,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptySectionTitle);
        }
        if position == 0 {
            return Err(CourseError::InvalidPosition);
        }
        Ok(Self {
            id,
            course_id,
            title: title.trim().to_string(),
            position,
        })
    }

    #[must_use]
    pub fn id(&self) -> SectionId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A single playable video unit inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    id: LessonId,
    section_id: SectionId,
    title: String,
    video_url: Url,
    duration_label: Option<String>,
    position: u32,
}

impl Lesson {
    /// # Errors
    ///
    /// Returns `CourseError` if the title is blank, the position is zero, or
    /// the video URL does not parse.
    pub fn new(
        id: LessonId,
        section_id: SectionId,
        title: impl Into<String>,
        video_url: &str,
        duration_label: Option<String>,
        position: u32,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyLessonTitle);
        }
        if position == 0 {
            return Err(CourseError::InvalidPosition);
        }
        let video_url = Url::parse(video_url.trim())
            .map_err(|e| CourseError::InvalidVideoUrl(e.to_string()))?;
        Ok(Self {
            id,
            section_id,
            title: title.trim().to_string(),
            video_url,
            duration_label: duration_label.filter(|d| !d.trim().is_empty()),
            position,
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn section_id(&self) -> SectionId {
        self.section_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn video_url(&self) -> &Url {
        &self.video_url
    }

    /// Human readable length as entered by the author, e.g. `"12:30"`.
    #[must_use]
    pub fn duration_label(&self) -> Option<&str> {
        self.duration_label.as_deref()
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// The embedded-player video id, when the lesson is hosted on YouTube.
    #[must_use]
    pub fn youtube_video_id(&self) -> Option<String> {
        youtube_video_id(&self.video_url)
    }
}

/// Extracts the video id from `youtube.com/watch?v=<id>` and `youtu.be/<id>` links.
#[must_use]
pub fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.");
    let id = match host {
        "youtube.com" | "m.youtube.com" if url.path() == "/watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "youtu.be" => url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(ToString::to_string),
        _ => None,
    };
    id.filter(|id| !id.is_empty())
}
