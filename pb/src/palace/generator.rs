//! PalaceGenerator - renders the revealed palace for a mission
//!
//! Steps for one run:
//! 1. Make sure the complete palace exists (generated at most once)
//! 2. Build the layer mask from the completed sub-task orders
//! 3. Composite over grey and store the result as the task's palace image

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{PalaceError, build_layer_mask, composite_png, palace_context};
use crate::config::PalaceConfig;
use crate::domain::{ImageSlot, Task};
use crate::imagegen::{ImageClient, ImageSize};
use crate::media::MediaStore;
use crate::prompts::PromptLoader;
use crate::state::StateManager;

/// Result of one palace render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PalaceOutcome {
    /// The complete palace could not be generated; nothing was changed
    Skipped,
    /// A new revealed palace was stored
    Rendered {
        completed: usize,
        total: usize,
        /// Media-relative path of the revealed palace
        path: String,
    },
}

/// Orchestrates palace image generation
pub struct PalaceGenerator {
    state: StateManager,
    images: Arc<dyn ImageClient>,
    media: MediaStore,
    prompts: Arc<PromptLoader>,
    size: ImageSize,
    config: PalaceConfig,
}

impl PalaceGenerator {
    pub fn new(
        state: StateManager,
        images: Arc<dyn ImageClient>,
        media: MediaStore,
        prompts: Arc<PromptLoader>,
        size: ImageSize,
        config: PalaceConfig,
    ) -> Self {
        Self {
            state,
            images,
            media,
            prompts,
            size,
            config,
        }
    }

    /// Render the revealed palace for a task
    ///
    /// A sub-task id renders its parent's palace.
    pub async fn generate_palace_image(&self, task_id: i64) -> Result<PalaceOutcome, PalaceError> {
        debug!(task_id, "generate_palace_image: called");
        let mut task = self.load_mission(task_id).await?;
        let sub_tasks = self.state.list_sub_tasks(task.id).await?;

        // 1. Complete palace, generated once
        let complete_png = match task.complete_palace_image.as_deref() {
            Some(path) => {
                debug!(%path, "generate_palace_image: complete palace exists, skipping generation");
                self.media.read(path).await?
            }
            None => match self.generate_complete_palace(&mut task, &sub_tasks).await? {
                Some(bytes) => bytes,
                None => {
                    warn!(task_id = task.id, "Failed to generate complete palace, leaving images untouched");
                    return Ok(PalaceOutcome::Skipped);
                }
            },
        };

        // 2. Mask from completed orders
        warn_duplicate_orders(&sub_tasks);
        let completed_orders: Vec<i64> = sub_tasks
            .iter()
            .filter(|sub| sub.is_completed)
            .filter_map(|sub| sub.order)
            .collect();
        let total = sub_tasks.len();
        let completed = sub_tasks.iter().filter(|sub| sub.is_completed).count();
        debug!(completed, total, "generate_palace_image: building mask");

        let mask = build_layer_mask(
            &completed_orders,
            total,
            self.size.width,
            self.size.height,
            self.config.blur_sigma,
        );

        // 3. Composite and persist
        let revealed = composite_png(&complete_png, &mask, self.config.grey)?;
        let path = self.store_image(&task, ImageSlot::Palace, &revealed).await?;

        info!(task_id = task.id, completed, total, %path, "Palace rendered");
        Ok(PalaceOutcome::Rendered { completed, total, path })
    }

    /// Load the top-level task for `task_id`, following a sub-task to its parent
    async fn load_mission(&self, task_id: i64) -> Result<Task, PalaceError> {
        let task = self
            .state
            .get_task(task_id)
            .await?
            .ok_or(PalaceError::TaskNotFound(task_id))?;

        match task.parent_id {
            None => Ok(task),
            Some(parent_id) => {
                debug!(task_id, parent_id, "load_mission: following sub-task to parent");
                self.state
                    .get_task(parent_id)
                    .await?
                    .ok_or(PalaceError::TaskNotFound(parent_id))
            }
        }
    }

    /// Generate and store the complete palace; `None` when the image service fails
    async fn generate_complete_palace(&self, task: &mut Task, sub_tasks: &[Task]) -> Result<Option<Vec<u8>>, PalaceError> {
        debug!(task_id = task.id, "generate_complete_palace: called");
        let prompt = self
            .prompts
            .palace_prompt(&palace_context(task, sub_tasks))
            .map_err(|e| PalaceError::Prompt(e.to_string()))?;

        let Some(bytes) = self.images.generate(&prompt, self.size).await else {
            return Ok(None);
        };

        let path = self.store_image(task, ImageSlot::CompletePalace, &bytes).await?;
        info!(task_id = task.id, %path, "Complete palace saved");
        task.complete_palace_image = Some(path);
        Ok(Some(bytes))
    }

    /// Save a slot's new file, point the task at it and drop the file it replaced
    async fn store_image(&self, task: &Task, slot: ImageSlot, bytes: &[u8]) -> Result<String, PalaceError> {
        let path = self.media.save(slot, bytes).await?;
        if let Err(e) = self.state.set_task_image(task.id, slot, Some(path.clone())).await {
            // Task deleted mid-render; nothing points at the new file
            self.media.discard(std::slice::from_ref(&path)).await;
            return Err(e.into());
        }
        if let Some(previous) = task.image(slot)
            && previous != path
        {
            self.media.discard(&[previous.to_string()]).await;
        }
        Ok(path)
    }
}

fn warn_duplicate_orders(sub_tasks: &[Task]) {
    let mut seen = HashSet::new();
    for order in sub_tasks.iter().filter_map(|sub| sub.order) {
        if !seen.insert(order) {
            warn!(order, "Several sub-tasks share a layer order; their bands overlap");
        }
    }
}
