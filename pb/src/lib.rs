//! PalaceBuilder - task decomposition with a memory palace reward
//!
//! A user describes a task in plain language. An LLM breaks it into ordered
//! sub-tasks, and an image model paints a complete palace for the mission
//! once. Each time a sub-task is completed, the palace is re-rendered with
//! that sub-task's horizontal layer revealed over a grey background.
//!
//! # Modules
//!
//! - [`planning`] - LLM task decomposition with a fixed fallback plan
//! - [`imagegen`] - Text-to-image client
//! - [`palace`] - Layer masks, compositing and the render orchestrator
//! - [`worker`] - Bounded palace queue and worker pool
//! - [`state`] - Actor owning the SQLite store
//! - [`server`] - axum HTTP surface
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod imagegen;
pub mod llm;
pub mod media;
pub mod palace;
pub mod planning;
pub mod prompts;
pub mod server;
pub mod state;
pub mod store;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use domain::{Category, DailySession, ImageSlot, Task};
pub use imagegen::{ImageClient, ImageSize};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use palace::{PalaceError, PalaceGenerator, PalaceOutcome};
pub use planning::{Decomposition, TaskDecomposer, TaskPlan};
pub use server::{AppState, build_router};
pub use state::{StateError, StateManager};
pub use worker::{EnqueueResult, PalaceQueue, WorkerPool};
