//! Route handlers

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{ApiError, AppState, Owner};
use crate::domain::{Dashboard, Mission, SubTaskEdit};
use crate::worker::EnqueueResult;

/// Where every form post lands afterwards
const TASKS_PAGE: &str = "/tasks/";

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Dashboard summary for today
pub async fn dashboard(State(state): State<AppState>, Owner(owner): Owner) -> Result<Json<Dashboard>, ApiError> {
    debug!(%owner, "dashboard: called");
    let dashboard = state.state.dashboard(&owner, state.today()).await?;
    Ok(Json(dashboard))
}

/// Today's top-level tasks with their sub-tasks
pub async fn list_tasks(State(state): State<AppState>, Owner(owner): Owner) -> Result<Json<Vec<Mission>>, ApiError> {
    debug!(%owner, "list_tasks: called");
    let missions = state.state.missions_for(&owner, state.today()).await?;
    Ok(Json(missions))
}

#[derive(Debug, Deserialize)]
pub struct AddTaskForm {
    #[serde(default)]
    pub task_description: String,
}

/// Decompose a new task, persist it and queue its palace
pub async fn add_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Form(form): Form<AddTaskForm>,
) -> Result<Redirect, ApiError> {
    let description = form.task_description.trim();
    debug!(%owner, %description, "add_task: called");
    if description.is_empty() {
        debug!("add_task: empty description, nothing to do");
        return Ok(Redirect::to(TASKS_PAGE));
    }

    let session = state.state.get_or_create_session(&owner, state.today()).await?;

    let decomposition = state.decomposer.analyze(description).await;
    if decomposition.is_fallback() {
        warn!(%description, "Using fallback plan for new task");
    }

    let mission = decomposition.into_plan().into_new_mission(description);
    let task = state.state.create_mission(session.id, mission).await?;
    info!(task_id = task.id, %owner, "Task created");

    enqueue(&state, task.id);
    Ok(Redirect::to(TASKS_PAGE))
}

/// Flip a task's completion; a sub-task re-renders its parent's palace
pub async fn toggle_complete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Redirect, ApiError> {
    debug!(id, "toggle_complete: called");
    let task = state.state.toggle_task(id).await?;
    info!(id, completed = task.is_completed, "Task toggled");

    if let Some(parent_id) = task.parent_id {
        enqueue(&state, parent_id);
    }
    Ok(Redirect::to(TASKS_PAGE))
}

/// Delete a task and its sub-tasks
pub async fn delete_task(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Redirect, ApiError> {
    debug!(id, "delete_task: called");
    let paths = state.state.delete_task(id).await?;
    state.media.discard(&paths).await;
    info!(id, images = paths.len(), "Task deleted");
    Ok(Redirect::to(TASKS_PAGE))
}

#[derive(Debug, Default, Deserialize)]
pub struct EditSubTaskForm {
    pub title: Option<String>,
    pub complexity: Option<String>,
    pub time_estimate: Option<String>,
}

impl EditSubTaskForm {
    /// Validate the raw form fields
    fn into_edit(self) -> Result<SubTaskEdit, ApiError> {
        let parse = |field: &str, value: Option<String>| -> Result<Option<i64>, ApiError> {
            match value.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(raw) => raw
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|_| ApiError::BadRequest(format!("Invalid {}: {}", field, raw))),
            }
        };

        Ok(SubTaskEdit {
            title: self.title,
            complexity: parse("complexity", self.complexity)?,
            time_estimate: parse("time_estimate", self.time_estimate)?,
        })
    }
}

/// Edit a sub-task's title, complexity and time estimate
pub async fn edit_sub_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<EditSubTaskForm>,
) -> Result<Redirect, ApiError> {
    debug!(id, ?form, "edit_sub_task: called");
    let edit = form.into_edit()?;
    state.state.edit_sub_task(id, edit).await?;
    Ok(Redirect::to(TASKS_PAGE))
}

fn enqueue(state: &AppState, task_id: i64) {
    match state.queue.enqueue(task_id) {
        EnqueueResult::Queued | EnqueueResult::Coalesced => {}
        result => warn!(task_id, ?result, "Palace job not queued"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_form_blank_estimate_clears() {
        let edit = EditSubTaskForm {
            title: Some("Outline".to_string()),
            complexity: Some(" 4 ".to_string()),
            time_estimate: Some("".to_string()),
        }
        .into_edit()
        .unwrap();
        assert_eq!(edit.title.as_deref(), Some("Outline"));
        assert_eq!(edit.complexity, Some(4));
        assert_eq!(edit.time_estimate, None);
    }

    #[test]
    fn test_edit_form_rejects_non_numbers() {
        let result = EditSubTaskForm {
            time_estimate: Some("soon".to_string()),
            ..Default::default()
        }
        .into_edit();
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
