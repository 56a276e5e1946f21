//! Domain types for PalaceBuilder
//!
//! Core domain types: DailySession, Task, and the dashboard views built on them

mod dashboard;
mod session;
mod task;

pub use dashboard::{Dashboard, Mission, TaskProgress};
pub use session::{ANONYMOUS_OWNER, DEFAULT_THEME, DailySession};
pub use task::{
    Category, ImageSlot, MAX_COMPLEXITY, MIN_COMPLEXITY, NewMission, NewSubTask, SubTaskEdit, Task, clamp_complexity,
};
