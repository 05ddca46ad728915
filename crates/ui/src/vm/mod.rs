mod course_vm;
mod navigator_vm;
mod player_vm;
mod time_fmt;

pub use course_vm::CourseSummaryVm;
pub use navigator_vm::{LessonRowVm, LessonStatus, SectionVm, map_navigator};
pub use player_vm::{PlayerPanelVm, map_player_panel};
pub use time_fmt::{format_clock, format_datetime};
