//! Palace work queue
//!
//! A bounded queue of top-level task ids consumed by a fixed pool of
//! workers. Ids already waiting are coalesced and runs for the same task are
//! serialized, so the last run always sees the latest completion state.

mod pool;
mod queue;

pub use pool::{PalaceRenderer, WorkerPool};
pub use queue::{EnqueueResult, PalaceQueue};
