//! State manager messages
//!
//! Commands and responses for the actor pattern.

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Dashboard, DailySession, ImageSlot, NewMission, SubTaskEdit, Task};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Channel error")]
    ChannelError,
}

impl From<crate::store::StoreError> for StateError {
    fn from(e: crate::store::StoreError) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    // Session operations
    GetOrCreateSession {
        owner: String,
        date: NaiveDate,
        reply: oneshot::Sender<StateResponse<DailySession>>,
    },
    GetSessionFor {
        owner: String,
        date: NaiveDate,
        reply: oneshot::Sender<StateResponse<Option<DailySession>>>,
    },
    DeleteSession {
        id: i64,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    SetSessionImage {
        id: i64,
        path: Option<String>,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    SetSessionCompleted {
        id: i64,
        completed: bool,
        reply: oneshot::Sender<StateResponse<()>>,
    },

    // Task operations
    CreateMission {
        session_id: i64,
        mission: NewMission,
        reply: oneshot::Sender<StateResponse<Task>>,
    },
    GetTask {
        id: i64,
        reply: oneshot::Sender<StateResponse<Option<Task>>>,
    },
    ListTopLevelTasks {
        session_id: i64,
        reply: oneshot::Sender<StateResponse<Vec<Task>>>,
    },
    ListSubTasks {
        parent_id: i64,
        reply: oneshot::Sender<StateResponse<Vec<Task>>>,
    },
    ToggleTask {
        id: i64,
        reply: oneshot::Sender<StateResponse<Task>>,
    },
    EditSubTask {
        id: i64,
        edit: SubTaskEdit,
        reply: oneshot::Sender<StateResponse<Task>>,
    },
    DeleteTask {
        id: i64,
        reply: oneshot::Sender<StateResponse<Vec<String>>>,
    },
    SetTaskImage {
        id: i64,
        slot: ImageSlot,
        path: Option<String>,
        reply: oneshot::Sender<StateResponse<()>>,
    },

    // Views
    Dashboard {
        owner: String,
        date: NaiveDate,
        reply: oneshot::Sender<StateResponse<Dashboard>>,
    },

    // Shutdown
    Shutdown,
}
