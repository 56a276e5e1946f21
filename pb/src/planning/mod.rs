//! Task decomposition
//!
//! Asks the LLM to split a free-text task into ordered sub-tasks and turns
//! whatever comes back into a usable plan.

mod decomposer;
mod plan;

pub use decomposer::{TaskDecomposer, extract_last_json_block, strip_think_blocks};
pub use plan::{Decomposition, SubTaskPlan, TaskPlan, fallback_plan};
