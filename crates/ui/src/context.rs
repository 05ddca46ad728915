use std::sync::Arc;

use learn_core::model::CourseId;
use services::{CatalogService, LearnerSession, ProgressService, TrackerConfig};

/// What the host application hands to the views.
pub trait UiApp: Send + Sync {
    fn learner(&self) -> LearnerSession;
    fn current_course_id(&self) -> CourseId;

    fn progress_service(&self) -> Arc<ProgressService>;
    fn catalog_service(&self) -> Arc<CatalogService>;

    fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig::default()
    }
}

#[derive(Clone)]
pub struct AppContext {
    learner: LearnerSession,
    current_course_id: CourseId,
    tracker_config: TrackerConfig,

    progress: Arc<ProgressService>,
    catalog: Arc<CatalogService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            learner: app.learner(),
            current_course_id: app.current_course_id(),
            tracker_config: app.tracker_config(),
            progress: app.progress_service(),
            catalog: app.catalog_service(),
        }
    }

    #[must_use]
    pub fn learner(&self) -> &LearnerSession {
        &self.learner
    }

    #[must_use]
    pub fn current_course_id(&self) -> CourseId {
        self.current_course_id
    }

    #[must_use]
    pub fn tracker_config(&self) -> TrackerConfig {
        self.tracker_config
    }

    #[must_use]
    pub fn progress_service(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn catalog_service(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }
}

// This context is provided by the composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
