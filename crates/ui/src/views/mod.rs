mod access_denied;
mod learning;
mod navigator;
mod outline;
mod player_panel;
mod state;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use access_denied::AccessDeniedView;
pub use learning::LearningPageView;
pub use navigator::LessonNavigator;
pub use outline::CourseOutlineView;
pub use player_panel::PlayerPanel;
pub use state::{ViewError, ViewState, view_state_from_resource};
