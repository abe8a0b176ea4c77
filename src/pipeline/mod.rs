//! Producer-consumer harvest pipeline
//!
//! ```text
//!   ┌──────────┐   ┌──────────┐          ┌──────────┐
//!   │ Worker 1 │   │ Worker 2 │   ...    │ Worker N │   one thread per source
//!   │  feed +  │   │  feed +  │          │  feed +  │
//!   │  filter  │   │  filter  │          │  filter  │
//!   └────┬─────┘   └────┬─────┘          └────┬─────┘
//!        └──────────────┼─────────────────────┘
//!                       ▼
//!          ┌──────────────────────────┐
//!          │     SubmissionQueue      │   unbounded MPSC
//!          └────────────┬─────────────┘
//!                       │  after every worker terminated
//!                       ▼
//!          ┌──────────────────────────┐
//!          │  Drain loop (caller)     │   one insert per record
//!          └────────────┬─────────────┘
//!                       ▼
//!                SubmissionStore
//! ```

pub mod coordinator;
pub mod drain;
pub mod queue;
pub mod worker;

pub use coordinator::{
    CollectProgress, CollectResult, Coordinator, InterruptHandle, SourceSpec, WaitOutcome,
};
pub use drain::{drain, read_back, DrainReport};
pub use queue::{QueueDrain, QueueSender, QueueStats, SubmissionQueue};
pub use worker::{HarvestTotals, SourceWorker, WorkerStats};

use crate::db::{SubmissionStore, SUBMISSIONS};
use crate::error::Result;
use crate::types::SubmissionRecord;
use tracing::warn;

/// Everything one harvest run produced
#[derive(Debug)]
pub struct HarvestReport {
    /// Fetch phase result
    pub collect: CollectResult,

    /// Drain phase result
    pub drain: DrainReport,

    /// Full store contents after the drain
    pub rows: Vec<SubmissionRecord>,

    /// Stored rows skipped by the read-back because they did not convert
    pub unreadable: u64,
}

/// Run one harvest: ensure the table, fetch, drain, read back
///
/// Only store-level failures (table creation, read-back query) and worker
/// spawn failures are returned as errors. Feed errors, failed inserts and
/// unreadable stored rows are absorbed and show up in the report counters.
pub fn run_harvest<F>(
    coordinator: &Coordinator,
    store: &SubmissionStore,
    on_progress: F,
) -> Result<HarvestReport>
where
    F: FnMut(&CollectProgress),
{
    store.create_table_if_absent(&SUBMISSIONS)?;

    let queue = SubmissionQueue::new();
    let collect = coordinator.run_with(&queue, on_progress)?;

    if !collect.completed() {
        warn!(
            outcome = ?collect.outcome,
            queued = queue.len(),
            "Draining a partial harvest"
        );
    }

    let drained = drain(queue.into_drain(), store);
    let stored = read_back(store)?;

    Ok(HarvestReport {
        collect,
        drain: drained,
        rows: stored.rows,
        unreadable: stored.unreadable,
    })
}
