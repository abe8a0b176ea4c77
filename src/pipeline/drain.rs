//! Drain loop - moves queued submissions into the store
//!
//! Runs on the calling thread once the coordinator has returned. Pops until
//! the queue is empty and issues one insert per submission, in pop order.
//! A failed insert is logged and counted, then the next submission is
//! attempted, so every record queued when the drain starts is tried.

use crate::db::{ReadBack, RecordSink};
use crate::error::StoreResult;
use crate::pipeline::queue::QueueDrain;
use tracing::{debug, error, info, warn};

/// Outcome of draining the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Submissions written
    pub inserted: u64,

    /// Submissions whose insert failed
    pub failed: u64,
}

impl DrainReport {
    /// Submissions popped from the queue
    pub fn drained(&self) -> u64 {
        self.inserted + self.failed
    }
}

/// Empty the queue into `sink`
pub fn drain<S: RecordSink + ?Sized>(queue: QueueDrain, sink: &S) -> DrainReport {
    let mut report = DrainReport::default();

    for record in queue {
        match sink.insert(&record) {
            Ok(()) => {
                report.inserted += 1;
                debug!(id = %record.id, source = %record.subreddit, "Submission stored");
            }
            Err(e) => {
                report.failed += 1;
                error!(
                    id = %record.id,
                    source = %record.subreddit,
                    error = %e,
                    "Insert failed, continuing with next submission"
                );
            }
        }
    }

    info!(
        inserted = report.inserted,
        failed = report.failed,
        "Queue drained"
    );

    report
}

/// Full read-back of the store, including rows from earlier runs
pub fn read_back<S: RecordSink + ?Sized>(sink: &S) -> StoreResult<ReadBack> {
    let read_back = sink.read_back()?;
    if read_back.unreadable > 0 {
        warn!(
            unreadable = read_back.unreadable,
            "Some stored rows could not be read back"
        );
    }
    debug!(rows = read_back.rows.len(), "Read-back complete");
    Ok(read_back)
}
