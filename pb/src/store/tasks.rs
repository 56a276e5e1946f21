//! Task persistence

use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, info};

use super::{Store, StoreResult};
use crate::domain::{Category, Dashboard, ImageSlot, NewMission, SubTaskEdit, Task, TaskProgress, clamp_complexity};

const TASK_COLUMNS: &str = "id, session_id, parent_id, title, category, complexity, is_completed, sort_order, \
     time_estimate, layer_image, layer_revealed_image, palace_image, complete_palace_image";

/// Number of tasks shown on the dashboard
const RECENT_TASKS: usize = 5;

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let category: String = row.get(4)?;
    let category = category
        .parse::<Category>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?;
    Ok(Task {
        id: row.get(0)?,
        session_id: row.get(1)?,
        parent_id: row.get(2)?,
        title: row.get(3)?,
        category,
        complexity: row.get(5)?,
        is_completed: row.get(6)?,
        order: row.get(7)?,
        time_estimate: row.get(8)?,
        layer_image: row.get(9)?,
        layer_revealed_image: row.get(10)?,
        palace_image: row.get(11)?,
        complete_palace_image: row.get(12)?,
    })
}

impl Store {
    /// Insert a top-level task and all of its sub-tasks in one transaction
    pub fn create_mission(&mut self, session_id: i64, mission: &NewMission) -> StoreResult<Task> {
        debug!(session_id, title = %mission.title, sub_tasks = mission.sub_tasks.len(), "Store::create_mission: called");
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO tasks (session_id, parent_id, title, category, complexity, created_ts)
             VALUES (?1, NULL, ?2, ?3, ?4, ?5)",
            params![
                session_id,
                mission.title,
                mission.category.as_str(),
                clamp_complexity(mission.complexity),
                now
            ],
        )?;
        let parent_id = tx.last_insert_rowid();

        for sub in &mission.sub_tasks {
            tx.execute(
                "INSERT INTO tasks (session_id, parent_id, title, category, complexity, sort_order, time_estimate, created_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    session_id,
                    parent_id,
                    sub.title,
                    sub.category.as_str(),
                    clamp_complexity(sub.complexity),
                    sub.order,
                    sub.time_estimate,
                    now
                ],
            )?;
        }

        let task = tx.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            [parent_id],
            task_from_row,
        )?;
        tx.commit()?;

        info!(id = task.id, sub_tasks = mission.sub_tasks.len(), "Created mission");
        Ok(task)
    }

    pub fn get_task(&self, id: i64) -> StoreResult<Option<Task>> {
        debug!(id, "Store::get_task: called");
        let task = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                [id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    /// Top-level tasks of a session, oldest first
    pub fn list_top_level_tasks(&self, session_id: i64) -> StoreResult<Vec<Task>> {
        debug!(session_id, "Store::list_top_level_tasks: called");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE session_id = ?1 AND parent_id IS NULL ORDER BY id",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map([session_id], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Sub-tasks of a task, by layer order
    pub fn list_sub_tasks(&self, parent_id: i64) -> StoreResult<Vec<Task>> {
        debug!(parent_id, "Store::list_sub_tasks: called");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE parent_id = ?1 ORDER BY sort_order, id",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map([parent_id], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Flip the completion flag; returns the updated task
    pub fn toggle_task(&self, id: i64) -> StoreResult<Option<Task>> {
        debug!(id, "Store::toggle_task: called");
        let changed = self
            .conn
            .execute("UPDATE tasks SET is_completed = NOT is_completed WHERE id = ?1", [id])?;
        if changed == 0 {
            debug!(id, "Store::toggle_task: no such task");
            return Ok(None);
        }
        self.get_task(id)
    }

    /// Apply a user edit to a sub-task; returns the updated task
    pub fn edit_sub_task(&self, id: i64, edit: &SubTaskEdit) -> StoreResult<Option<Task>> {
        debug!(id, ?edit, "Store::edit_sub_task: called");
        let Some(mut task) = self.get_task(id)? else {
            return Ok(None);
        };

        if let Some(title) = edit.title.as_deref().map(str::trim)
            && !title.is_empty()
        {
            task.title = title.to_string();
        }
        if let Some(complexity) = edit.complexity {
            task.complexity = clamp_complexity(complexity);
        }
        task.time_estimate = edit.time_estimate;

        self.conn.execute(
            "UPDATE tasks SET title = ?1, complexity = ?2, time_estimate = ?3 WHERE id = ?4",
            params![task.title, task.complexity, task.time_estimate, id],
        )?;
        Ok(Some(task))
    }

    /// Delete a task and, through the cascade, its sub-tasks
    ///
    /// Returns the media paths the deleted rows pointed at, or `None` when
    /// the task does not exist.
    pub fn delete_task(&mut self, id: i64) -> StoreResult<Option<Vec<String>>> {
        debug!(id, "Store::delete_task: called");
        let tx = self.conn.transaction()?;
        let paths = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM tasks WHERE id = ?1 OR parent_id = ?1",
                TASK_COLUMNS
            ))?;
            let tasks = stmt.query_map([id], task_from_row)?.collect::<Result<Vec<_>, _>>()?;
            tasks
                .iter()
                .flat_map(|t| t.image_paths().map(str::to_string))
                .collect::<Vec<_>>()
        };

        if tx.execute("DELETE FROM tasks WHERE id = ?1", [id])? == 0 {
            return Ok(None);
        }
        tx.commit()?;
        info!(id, images = paths.len(), "Deleted task");
        Ok(Some(paths))
    }

    pub fn set_task_image(&self, id: i64, slot: ImageSlot, path: Option<&str>) -> StoreResult<bool> {
        debug!(id, ?slot, ?path, "Store::set_task_image: called");
        let sql = format!("UPDATE tasks SET {} = ?1 WHERE id = ?2", slot.column());
        Ok(self.conn.execute(&sql, params![path, id])? > 0)
    }

    /// Summarize a session's top-level tasks; `None` yields an empty dashboard
    pub fn dashboard(&self, session_id: Option<i64>) -> StoreResult<Dashboard> {
        debug!(?session_id, "Store::dashboard: called");
        let Some(session_id) = session_id else {
            return Ok(Dashboard::default());
        };

        let tasks = self.list_top_level_tasks(session_id)?;
        let total_tasks = tasks.len();
        let completed_tasks = tasks.iter().filter(|t| t.is_completed).count();
        let total_palaces = tasks.iter().filter(|t| t.palace_image.is_some()).count();

        let mut recent_tasks = Vec::with_capacity(RECENT_TASKS);
        for task in tasks.into_iter().rev().take(RECENT_TASKS) {
            let subs = self.list_sub_tasks(task.id)?;
            let completed = subs.iter().filter(|s| s.is_completed).count();
            recent_tasks.push(TaskProgress::new(task, subs.len(), completed));
        }

        Ok(Dashboard {
            total_tasks,
            completed_tasks,
            in_progress_tasks: total_tasks - completed_tasks,
            total_palaces,
            recent_tasks,
        })
    }
}
