//! Decomposition plan types and normalization

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{Category, NewMission, NewSubTask, clamp_complexity};

/// A normalized sub-task proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskPlan {
    pub title: String,
    pub category: Category,
    pub complexity: i64,
    /// 1-based layer position; 0 when the model omitted it
    pub order: i64,
    /// Minutes
    pub time_estimate: Option<i64>,
}

/// A normalized decomposition of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPlan {
    pub category: Category,
    pub complexity: i64,
    pub layer_description: String,
    pub sub_tasks: Vec<SubTaskPlan>,
}

impl TaskPlan {
    /// Turn the plan into a mission ready to be persisted under `title`
    pub fn into_new_mission(self, title: impl Into<String>) -> NewMission {
        NewMission {
            title: title.into(),
            category: self.category,
            complexity: self.complexity,
            sub_tasks: self
                .sub_tasks
                .into_iter()
                .map(|sub| NewSubTask {
                    title: sub.title,
                    category: sub.category,
                    complexity: sub.complexity,
                    order: sub.order,
                    time_estimate: sub.time_estimate,
                })
                .collect(),
        }
    }
}

/// Outcome of a decomposition request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "plan", rename_all = "snake_case")]
pub enum Decomposition {
    /// The model returned a usable plan
    Parsed(TaskPlan),
    /// The call failed or nothing parseable came back
    Fallback(TaskPlan),
}

impl Decomposition {
    pub fn plan(&self) -> &TaskPlan {
        match self {
            Self::Parsed(plan) | Self::Fallback(plan) => plan,
        }
    }

    pub fn into_plan(self) -> TaskPlan {
        match self {
            Self::Parsed(plan) | Self::Fallback(plan) => plan,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// The fixed plan used when the model gives nothing usable
pub fn fallback_plan() -> TaskPlan {
    let step = |title: &str, category: Category, complexity: i64, order: i64| SubTaskPlan {
        title: title.to_string(),
        category,
        complexity,
        order,
        time_estimate: None,
    };

    TaskPlan {
        category: Category::Analytical,
        complexity: 3,
        layer_description: "Basic task foundation".to_string(),
        sub_tasks: vec![
            step("Plan the approach", Category::Analytical, 2, 1),
            step("Execute the task", Category::Analytical, 3, 2),
            step("Review and refine", Category::Analytical, 2, 3),
            step("Complete and document", Category::Administrative, 1, 4),
        ],
    }
}

/// Plan shape as the model writes it; `category` and `sub_tasks` are required
#[derive(Debug, Deserialize)]
pub(crate) struct RawPlan {
    category: String,
    #[serde(default)]
    complexity: Option<Value>,
    #[serde(default)]
    layer_description: Option<String>,
    sub_tasks: Vec<RawSubTask>,
}

#[derive(Debug, Deserialize)]
struct RawSubTask {
    title: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    complexity: Option<Value>,
    #[serde(default)]
    order: Option<Value>,
    #[serde(default)]
    time_estimate: Option<Value>,
}

/// Read an integer that may arrive as a number, a float or a numeric string
fn as_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

/// Minutes must be positive; anything else is logged and dropped
fn positive_minutes(title: &str, value: Option<&Value>) -> Option<i64> {
    let minutes = as_int(value)?;
    if minutes > 0 {
        Some(minutes)
    } else {
        warn!(%title, minutes, "Sub-task time estimate is not positive, dropping it");
        None
    }
}

impl RawPlan {
    /// Clamp, default and map the raw fields onto the domain
    pub(crate) fn normalize(self) -> TaskPlan {
        debug!(sub_tasks = self.sub_tasks.len(), "RawPlan::normalize: called");
        let category = Category::parse_lenient(&self.category);
        let complexity = clamp_complexity(as_int(self.complexity.as_ref()).unwrap_or(1));

        let sub_tasks = self
            .sub_tasks
            .into_iter()
            .map(|raw| {
                let order = as_int(raw.order.as_ref()).unwrap_or_else(|| {
                    warn!(title = %raw.title, "Sub-task has no order, it will never be revealed");
                    0
                });
                SubTaskPlan {
                    category: raw
                        .category
                        .as_deref()
                        .map(Category::parse_lenient)
                        .unwrap_or(category),
                    complexity: clamp_complexity(as_int(raw.complexity.as_ref()).unwrap_or(1)),
                    order,
                    time_estimate: positive_minutes(&raw.title, raw.time_estimate.as_ref()),
                    title: raw.title,
                }
            })
            .collect();

        TaskPlan {
            category,
            complexity,
            layer_description: self.layer_description.unwrap_or_default(),
            sub_tasks,
        }
    }
}
