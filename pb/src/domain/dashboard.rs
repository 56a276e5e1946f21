//! Dashboard summary types

use serde::{Deserialize, Serialize};

use super::Task;

/// A top-level task with its sub-task progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub task: Task,
    pub total_subtasks: usize,
    pub completed_subtasks: usize,
    /// 0-100
    pub progress_percentage: f64,
}

impl TaskProgress {
    pub fn new(task: Task, total_subtasks: usize, completed_subtasks: usize) -> Self {
        let progress_percentage = if total_subtasks > 0 {
            completed_subtasks as f64 / total_subtasks as f64 * 100.0
        } else {
            0.0
        };
        Self {
            task,
            total_subtasks,
            completed_subtasks,
            progress_percentage,
        }
    }
}

/// Summary of one owner's day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    /// Top-level tasks that already have a revealed palace image
    pub total_palaces: usize,
    /// Five most recent top-level tasks, newest first
    pub recent_tasks: Vec<TaskProgress>,
}

/// A top-level task together with its sub-tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    #[serde(flatten)]
    pub task: Task,
    pub sub_tasks: Vec<Task>,
}
