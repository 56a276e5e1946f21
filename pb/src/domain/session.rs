//! DailySession domain type
//!
//! One session per (owner, calendar date). Sessions are created lazily the
//! first time an owner submits a task on a given day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Theme given to sessions created without an explicit one
pub const DEFAULT_THEME: &str = "Default";

/// Owner used when a request carries no identity
pub const ANONYMOUS_OWNER: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySession {
    pub id: i64,
    pub owner: String,
    pub date: NaiveDate,
    pub palace_theme: String,
    pub is_completed: bool,
    pub palace_image: Option<String>,
}

impl std::fmt::Display for DailySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.owner, self.date)
    }
}
