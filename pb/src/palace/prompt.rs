//! Complete palace prompt

use tracing::debug;

use crate::domain::Task;
use crate::prompts::{PalaceContext, PalaceStep};

/// Collect the template variables for a mission and its sub-tasks
pub fn palace_context(task: &Task, sub_tasks: &[Task]) -> PalaceContext {
    debug!(id = task.id, sub_tasks = sub_tasks.len(), "palace_context: called");
    let mut steps: Vec<PalaceStep> = sub_tasks
        .iter()
        .map(|sub| PalaceStep {
            order: sub.order.unwrap_or(0),
            title: sub.title.clone(),
            time_estimate: sub.time_estimate,
        })
        .collect();
    steps.sort_by_key(|step| step.order);

    PalaceContext {
        title: task.title.clone(),
        category: task.category.to_string(),
        complexity: task.complexity,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::prompts::PromptLoader;

    fn task(id: i64, title: &str, order: Option<i64>, time_estimate: Option<i64>) -> Task {
        Task {
            id,
            session_id: 1,
            parent_id: order.map(|_| 1),
            title: title.to_string(),
            category: Category::Analytical,
            complexity: 2,
            is_completed: false,
            order,
            time_estimate,
            layer_image: None,
            layer_revealed_image: None,
            palace_image: None,
            complete_palace_image: None,
        }
    }

    #[test]
    fn test_steps_sorted_by_order() {
        let mission = task(1, "Write a report", None, None);
        let subs = vec![task(3, "Draft", Some(2), Some(45)), task(2, "Outline", Some(1), Some(15))];

        let context = palace_context(&mission, &subs);
        assert_eq!(context.category, "analytical");
        assert_eq!(context.steps[0].title, "Outline");
        assert_eq!(context.steps[1].title, "Draft");

        let prompt = PromptLoader::embedded_only().palace_prompt(&context).unwrap();
        assert!(prompt.contains("step 1: Outline (15 min), step 2: Draft (45 min)"));
        assert!(prompt.contains("completion of this mission: \"Write a report\""));
    }
}
