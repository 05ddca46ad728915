use std::time::Duration;

use learn_core::model::{
    CourseId, Lesson, LessonId, LessonProgress, ProgressUpdate, completion_percentage,
};
use serde::Serialize;

use super::config::TrackerConfig;
use super::player::{PlayerState, VideoPlayer};
use super::schedule::{Poll, PollSchedule};
use super::state::{SelectedLesson, TrackerState};
use crate::learner::LearnerSession;
use crate::progress_service::{ProgressService, SectionWithLessons};

/// Values shown next to the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProgressDisplay {
    pub elapsed_seconds: f64,
    pub duration_seconds: f64,
    pub completion_percentage: u8,
    pub is_completed: bool,
}

impl ProgressDisplay {
    fn from_progress(progress: &LessonProgress) -> Self {
        Self {
            elapsed_seconds: f64::from(progress.watch_time_seconds()),
            duration_seconds: f64::from(progress.total_duration_seconds()),
            completion_percentage: progress.completion_percentage(),
            is_completed: progress.is_completed(),
        }
    }
}

/// Result of [`ProgressTracker::mark_completed`].
#[derive(Debug, Clone)]
pub struct Completion {
    /// The stored row after the write.
    pub progress: LessonProgress,
    /// The reloaded outline; `None` if the reload failed.
    pub outline: Option<Vec<SectionWithLessons>>,
}

/// Turns player events into persisted progress for one learner in one course.
///
/// Time is cooperative: the host calls [`ProgressTracker::advance`] and due
/// polls run inline, in order. Persistence failures are logged and dropped.
pub struct ProgressTracker {
    session: LearnerSession,
    course_id: CourseId,
    service: ProgressService,
    config: TrackerConfig,
    player: Option<Box<dyn VideoPlayer>>,
    state: TrackerState,
    display: ProgressDisplay,
    elapsed: Duration,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(
        session: LearnerSession,
        course_id: CourseId,
        service: ProgressService,
        config: TrackerConfig,
    ) -> Self {
        Self {
            session,
            course_id,
            service,
            config,
            player: None,
            state: TrackerState::Idle,
            display: ProgressDisplay::default(),
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    #[must_use]
    pub fn display(&self) -> &ProgressDisplay {
        &self.display
    }

    #[must_use]
    pub fn selected(&self) -> Option<&SelectedLesson> {
        self.state.lesson()
    }

    #[must_use]
    pub fn session(&self) -> &LearnerSession {
        &self.session
    }

    #[must_use]
    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    /// Time on the tracker's own clock.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// How long until the next poll fires, if any are armed.
    #[must_use]
    pub fn until_next_poll(&self) -> Option<Duration> {
        match &self.state {
            TrackerState::Tracking { polls, .. } => {
                Some(polls.next_due().saturating_sub(self.elapsed))
            }
            _ => None,
        }
    }

    /// Switch to `lesson`: cancel the previous lesson's polls, restore the
    /// stored position and record the access.
    pub async fn select_lesson(&mut self, lesson: &Lesson, section_title: &str) {
        self.state = TrackerState::Idle;
        let selected = SelectedLesson::new(lesson, self.course_id, section_title);
        let user_id = self.session.user_id;

        let stored = match self.service.get_lesson_progress(user_id, lesson.id()).await {
            Ok(stored) => stored,
            Err(e) => {
                // unknown stored values must not be overwritten by the access write
                tracing::warn!(lesson_id = %lesson.id(), error = %e, "failed to load lesson progress");
                self.display = ProgressDisplay::default();
                self.state = TrackerState::Suspended { lesson: selected };
                return;
            }
        };
        self.display = stored
            .as_ref()
            .map_or_else(ProgressDisplay::default, ProgressDisplay::from_progress);

        let resume_at = self.display.elapsed_seconds;
        self.state = match self.player.as_deref() {
            None if resume_at > 0.0 => TrackerState::Seeking {
                lesson: selected,
                resume_at,
            },
            Some(player) if resume_at > 0.0 => {
                seek(player, lesson.id(), resume_at);
                TrackerState::Suspended { lesson: selected }
            }
            _ => TrackerState::Suspended { lesson: selected },
        };
        tracing::debug!(lesson_id = %lesson.id(), state = self.state.name(), "lesson selected");

        let ProgressDisplay {
            elapsed_seconds,
            duration_seconds,
            completion_percentage,
            ..
        } = self.display;
        self.save(elapsed_seconds, duration_seconds, Some(completion_percentage))
            .await;
    }

    /// Attach a ready player and issue the pending resume seek, if any.
    ///
    /// A player that is already playing when the resume seek lands starts
    /// tracking right away.
    pub fn on_player_ready(&mut self, player: Box<dyn VideoPlayer>) {
        let previous = std::mem::replace(&mut self.state, TrackerState::Idle);
        let player = self.player.insert(player);
        self.state = match previous {
            TrackerState::Idle => TrackerState::Idle,
            TrackerState::Seeking { lesson, resume_at } => {
                seek(&**player, lesson.lesson_id, resume_at);
                if player.state() == Some(PlayerState::Playing) {
                    TrackerState::Tracking {
                        lesson,
                        polls: PollSchedule::arm(
                            self.elapsed,
                            self.config.coarse_period(),
                            self.config.fine_period(),
                        ),
                    }
                } else {
                    TrackerState::Suspended { lesson }
                }
            }
            other => match other.into_lesson() {
                Some(lesson) => TrackerState::Suspended { lesson },
                None => TrackerState::Idle,
            },
        };
    }

    pub async fn on_player_state_change(&mut self, new_state: PlayerState) {
        let previous = std::mem::replace(&mut self.state, TrackerState::Idle);
        let from = previous.name();
        self.state = match previous {
            TrackerState::Idle => return,
            // the resume seek stays pending until the player is ready
            TrackerState::Seeking { lesson, resume_at } if new_state != PlayerState::Ended => {
                TrackerState::Seeking { lesson, resume_at }
            }
            other => {
                let Some(lesson) = other.into_lesson() else {
                    return;
                };
                match new_state {
                    PlayerState::Playing => TrackerState::Tracking {
                        lesson,
                        polls: PollSchedule::arm(
                            self.elapsed,
                            self.config.coarse_period(),
                            self.config.fine_period(),
                        ),
                    },
                    PlayerState::Ended => TrackerState::Ended { lesson },
                    _ => TrackerState::Suspended { lesson },
                }
            }
        };
        tracing::debug!(from, to = self.state.name(), code = new_state.code(), "player state changed");

        if new_state == PlayerState::Ended {
            self.finish().await;
        }
    }

    /// Move the tracker clock forward, running every poll that falls due.
    pub async fn advance(&mut self, by: Duration) {
        let target = self.elapsed + by;
        loop {
            let due = match &mut self.state {
                TrackerState::Tracking { polls, .. } => polls.pop_due(target),
                _ => None,
            };
            let Some((poll, at)) = due else {
                break;
            };
            self.elapsed = at;
            match poll {
                Poll::Fine => self.fine_poll(),
                Poll::Coarse => self.coarse_poll().await,
            }
        }
        self.elapsed = target;
    }

    /// Flag the selected lesson completed and reload the outline.
    ///
    /// Returns `None` when no lesson is selected or the completion write
    /// fails. A failed reload still reports the completion, without an outline.
    pub async fn mark_completed(&mut self) -> Option<Completion> {
        let lesson = self.state.lesson()?.clone();
        let user_id = self.session.user_id;

        let progress = match self
            .service
            .mark_lesson_completed(user_id, lesson.lesson_id, lesson.course_id)
            .await
        {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!(lesson_id = %lesson.lesson_id, error = %e, "failed to mark lesson completed");
                return None;
            }
        };
        self.display.is_completed = true;
        self.display.completion_percentage = progress.completion_percentage();

        let outline = match self
            .service
            .lessons_with_progress(user_id, lesson.course_id)
            .await
        {
            Ok(sections) => Some(sections),
            Err(e) => {
                tracing::warn!(course_id = %lesson.course_id, error = %e, "failed to refresh lessons");
                None
            }
        };
        Some(Completion { progress, outline })
    }

    /// Drop the player and cancel everything. Nothing is flushed.
    pub fn dispose(&mut self) {
        self.state = TrackerState::Idle;
        self.player = None;
        self.display = ProgressDisplay::default();
    }

    fn playing_player(&self) -> Option<&dyn VideoPlayer> {
        self.player
            .as_deref()
            .filter(|p| p.state() == Some(PlayerState::Playing))
    }

    fn fine_poll(&mut self) {
        let Some(time) = self.playing_player().and_then(|p| p.current_time()) else {
            return;
        };
        if time > 0.0 {
            self.display.elapsed_seconds = time;
        }
    }

    async fn coarse_poll(&mut self) {
        let Some(player) = self.playing_player() else {
            return;
        };
        let (Some(time), Some(duration)) = (player.current_time(), player.duration()) else {
            return;
        };
        if duration <= 0.0 {
            return;
        }
        let pct = completion_percentage(time, duration);
        self.display.completion_percentage = pct;
        self.display.duration_seconds = duration;
        self.save(time, duration, Some(pct)).await;
    }

    async fn finish(&mut self) {
        let duration = self
            .player
            .as_deref()
            .and_then(|p| p.duration())
            .filter(|d| *d > 0.0)
            .unwrap_or(self.display.duration_seconds);
        self.display.elapsed_seconds = duration;
        self.display.duration_seconds = duration;
        self.display.completion_percentage = 100;
        self.save(duration, duration, Some(100)).await;
    }

    async fn save(&self, watch: f64, duration: f64, pct: Option<u8>) {
        let Some(lesson) = self.state.lesson() else {
            return;
        };
        let update = ProgressUpdate {
            user_id: self.session.user_id,
            lesson_id: lesson.lesson_id,
            course_id: lesson.course_id,
            watch_time_seconds: watch,
            total_duration_seconds: duration,
            completion_percentage: pct,
        };
        if let Err(e) = self.service.upsert_lesson_progress(&update).await {
            tracing::warn!(lesson_id = %update.lesson_id, error = %e, "failed to save lesson progress");
        }
    }
}

fn seek(player: &dyn VideoPlayer, lesson_id: LessonId, at: f64) {
    match player.seek_to(at) {
        Ok(()) => tracing::debug!(%lesson_id, at, "resumed playback position"),
        Err(e) => tracing::warn!(%lesson_id, error = %e, "resume seek failed"),
    }
}
