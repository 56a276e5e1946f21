//! StateManager - actor that owns the Store
//!
//! Processes commands via channels for thread-safe access to persistent state.

use std::path::Path;

use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::messages::{StateCommand, StateError, StateResponse};
use crate::domain::{Dashboard, DailySession, ImageSlot, Mission, NewMission, SubTaskEdit, Task};
use crate::store::Store;

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Open the database and spawn the actor
    pub fn spawn(db_path: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(db_path = %db_path.as_ref().display(), "spawn: called");
        let store = Store::open(db_path.as_ref())?;
        Ok(Self::with_store(store))
    }

    /// Spawn the actor around an already opened store
    pub fn with_store(store: Store) -> Self {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(store, rx));
        info!("StateManager spawned");
        Self { tx }
    }

    /// Send a command and wait for its reply
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    // === Session operations ===

    /// Get the owner's session for `date`, creating it on first use
    pub async fn get_or_create_session(&self, owner: &str, date: NaiveDate) -> StateResponse<DailySession> {
        debug!(%owner, %date, "get_or_create_session: called");
        self.request(|reply| StateCommand::GetOrCreateSession {
            owner: owner.to_string(),
            date,
            reply,
        })
        .await
    }

    pub async fn get_session_for(&self, owner: &str, date: NaiveDate) -> StateResponse<Option<DailySession>> {
        debug!(%owner, %date, "get_session_for: called");
        self.request(|reply| StateCommand::GetSessionFor {
            owner: owner.to_string(),
            date,
            reply,
        })
        .await
    }

    /// Delete a session together with all of its tasks
    pub async fn delete_session(&self, id: i64) -> StateResponse<()> {
        debug!(id, "delete_session: called");
        self.request(|reply| StateCommand::DeleteSession { id, reply }).await
    }

    pub async fn set_session_image(&self, id: i64, path: Option<String>) -> StateResponse<()> {
        debug!(id, ?path, "set_session_image: called");
        self.request(|reply| StateCommand::SetSessionImage { id, path, reply })
            .await
    }

    pub async fn set_session_completed(&self, id: i64, completed: bool) -> StateResponse<()> {
        debug!(id, completed, "set_session_completed: called");
        self.request(|reply| StateCommand::SetSessionCompleted { id, completed, reply })
            .await
    }

    // === Task operations ===

    /// Persist a top-level task and its sub-tasks atomically
    pub async fn create_mission(&self, session_id: i64, mission: NewMission) -> StateResponse<Task> {
        debug!(session_id, title = %mission.title, "create_mission: called");
        self.request(|reply| StateCommand::CreateMission {
            session_id,
            mission,
            reply,
        })
        .await
    }

    pub async fn get_task(&self, id: i64) -> StateResponse<Option<Task>> {
        debug!(id, "get_task: called");
        self.request(|reply| StateCommand::GetTask { id, reply }).await
    }

    pub async fn list_top_level_tasks(&self, session_id: i64) -> StateResponse<Vec<Task>> {
        debug!(session_id, "list_top_level_tasks: called");
        self.request(|reply| StateCommand::ListTopLevelTasks { session_id, reply })
            .await
    }

    pub async fn list_sub_tasks(&self, parent_id: i64) -> StateResponse<Vec<Task>> {
        debug!(parent_id, "list_sub_tasks: called");
        self.request(|reply| StateCommand::ListSubTasks { parent_id, reply })
            .await
    }

    /// Flip a task's completion flag
    pub async fn toggle_task(&self, id: i64) -> StateResponse<Task> {
        debug!(id, "toggle_task: called");
        self.request(|reply| StateCommand::ToggleTask { id, reply }).await
    }

    pub async fn edit_sub_task(&self, id: i64, edit: SubTaskEdit) -> StateResponse<Task> {
        debug!(id, ?edit, "edit_sub_task: called");
        self.request(|reply| StateCommand::EditSubTask { id, edit, reply })
            .await
    }

    /// Delete a task together with its sub-tasks; returns their media paths
    pub async fn delete_task(&self, id: i64) -> StateResponse<Vec<String>> {
        debug!(id, "delete_task: called");
        self.request(|reply| StateCommand::DeleteTask { id, reply }).await
    }

    pub async fn set_task_image(&self, id: i64, slot: ImageSlot, path: Option<String>) -> StateResponse<()> {
        debug!(id, ?slot, ?path, "set_task_image: called");
        self.request(|reply| StateCommand::SetTaskImage { id, slot, path, reply })
            .await
    }

    // === Views ===

    /// Summary of the owner's tasks for `date`
    pub async fn dashboard(&self, owner: &str, date: NaiveDate) -> StateResponse<Dashboard> {
        debug!(%owner, %date, "dashboard: called");
        self.request(|reply| StateCommand::Dashboard {
            owner: owner.to_string(),
            date,
            reply,
        })
        .await
    }

    /// Top-level tasks for `date`, each with its sub-tasks
    pub async fn missions_for(&self, owner: &str, date: NaiveDate) -> StateResponse<Vec<Mission>> {
        debug!(%owner, %date, "missions_for: called");
        let Some(session) = self.get_session_for(owner, date).await? else {
            debug!("missions_for: no session yet");
            return Ok(Vec::new());
        };

        let mut missions = Vec::new();
        for task in self.list_top_level_tasks(session.id).await? {
            let sub_tasks = self.list_sub_tasks(task.id).await?;
            missions.push(Mission { task, sub_tasks });
        }
        Ok(missions)
    }

    /// Shutdown the StateManager
    pub async fn shutdown(&self) -> Result<(), StateError> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

fn found(exists: bool, what: &str, id: i64) -> StateResponse<()> {
    if exists {
        Ok(())
    } else {
        Err(StateError::NotFound(format!("{} {}", what, id)))
    }
}

/// The actor loop that processes commands
async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::GetOrCreateSession { owner, date, reply } => {
                debug!(%owner, %date, "actor_loop: GetOrCreateSession command");
                let _ = reply.send(store.get_or_create_session(&owner, date).map_err(Into::into));
            }

            StateCommand::GetSessionFor { owner, date, reply } => {
                debug!(%owner, %date, "actor_loop: GetSessionFor command");
                let _ = reply.send(store.get_session_for(&owner, date).map_err(Into::into));
            }

            StateCommand::DeleteSession { id, reply } => {
                debug!(id, "actor_loop: DeleteSession command");
                let result = store
                    .delete_session(id)
                    .map_err(StateError::from)
                    .and_then(|deleted| found(deleted, "session", id));
                let _ = reply.send(result);
            }

            StateCommand::SetSessionImage { id, path, reply } => {
                debug!(id, "actor_loop: SetSessionImage command");
                let result = store
                    .set_session_image(id, path.as_deref())
                    .map_err(StateError::from)
                    .and_then(|updated| found(updated, "session", id));
                let _ = reply.send(result);
            }

            StateCommand::SetSessionCompleted { id, completed, reply } => {
                debug!(id, completed, "actor_loop: SetSessionCompleted command");
                let result = store
                    .set_session_completed(id, completed)
                    .map_err(StateError::from)
                    .and_then(|updated| found(updated, "session", id));
                let _ = reply.send(result);
            }

            StateCommand::CreateMission {
                session_id,
                mission,
                reply,
            } => {
                debug!(session_id, "actor_loop: CreateMission command");
                let _ = reply.send(store.create_mission(session_id, &mission).map_err(Into::into));
            }

            StateCommand::GetTask { id, reply } => {
                debug!(id, "actor_loop: GetTask command");
                let _ = reply.send(store.get_task(id).map_err(Into::into));
            }

            StateCommand::ListTopLevelTasks { session_id, reply } => {
                debug!(session_id, "actor_loop: ListTopLevelTasks command");
                let _ = reply.send(store.list_top_level_tasks(session_id).map_err(Into::into));
            }

            StateCommand::ListSubTasks { parent_id, reply } => {
                debug!(parent_id, "actor_loop: ListSubTasks command");
                let _ = reply.send(store.list_sub_tasks(parent_id).map_err(Into::into));
            }

            StateCommand::ToggleTask { id, reply } => {
                debug!(id, "actor_loop: ToggleTask command");
                let result = store
                    .toggle_task(id)
                    .map_err(StateError::from)
                    .and_then(|task| task.ok_or_else(|| StateError::NotFound(format!("task {}", id))));
                let _ = reply.send(result);
            }

            StateCommand::EditSubTask { id, edit, reply } => {
                debug!(id, "actor_loop: EditSubTask command");
                let result = store
                    .edit_sub_task(id, &edit)
                    .map_err(StateError::from)
                    .and_then(|task| task.ok_or_else(|| StateError::NotFound(format!("task {}", id))));
                let _ = reply.send(result);
            }

            StateCommand::DeleteTask { id, reply } => {
                debug!(id, "actor_loop: DeleteTask command");
                let result = store
                    .delete_task(id)
                    .map_err(StateError::from)
                    .and_then(|paths| paths.ok_or_else(|| StateError::NotFound(format!("task {}", id))));
                let _ = reply.send(result);
            }

            StateCommand::SetTaskImage { id, slot, path, reply } => {
                debug!(id, ?slot, "actor_loop: SetTaskImage command");
                let result = store
                    .set_task_image(id, slot, path.as_deref())
                    .map_err(StateError::from)
                    .and_then(|updated| found(updated, "task", id));
                let _ = reply.send(result);
            }

            StateCommand::Dashboard { owner, date, reply } => {
                debug!(%owner, %date, "actor_loop: Dashboard command");
                let result = store
                    .get_session_for(&owner, date)
                    .and_then(|session| store.dashboard(session.map(|s| s.id)))
                    .map_err(Into::into);
                let _ = reply.send(result);
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}
