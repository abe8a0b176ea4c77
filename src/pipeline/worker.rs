//! Source worker threads
//!
//! Each worker:
//! - Owns one source and runs on its own named thread
//! - Reads that source's top listing from the shared feed client
//! - Projects each entry into a `SubmissionRecord`
//! - Filters against the date taken once when the worker starts
//! - Pushes survivors onto the shared queue, in feed order
//!
//! A feed error ends the worker early. That is logged and counted but never
//! reported as a worker failure: to the coordinator, a worker that errored
//! and a worker that ran dry look the same.

use crate::error::WorkerError;
use crate::feed::FeedClient;
use crate::filter::{self, Verdict};
use crate::pipeline::queue::QueueSender;
use crate::types::SubmissionRecord;
use chrono::{Local, NaiveDate};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Entries read from the feed
    pub fetched: AtomicU64,

    /// Entries that passed the filter and were queued
    pub kept: AtomicU64,

    /// Entries rejected as too recent
    pub too_recent: AtomicU64,

    /// Entries rejected as non-media links
    pub not_media: AtomicU64,

    /// Entries that could not be projected (empty id, bad timestamp)
    pub invalid: AtomicU64,

    /// Feed errors that ended the listing early
    pub feed_errors: AtomicU64,
}

impl WorkerStats {
    fn record_verdict(&self, verdict: Verdict) {
        let counter = match verdict {
            Verdict::Keep => &self.kept,
            Verdict::TooRecent => &self.too_recent,
            Verdict::NotMedia => &self.not_media,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters
    pub fn totals(&self) -> HarvestTotals {
        HarvestTotals {
            fetched: self.fetched.load(Ordering::Relaxed),
            kept: self.kept.load(Ordering::Relaxed),
            too_recent: self.too_recent.load(Ordering::Relaxed),
            not_media: self.not_media.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            feed_errors: self.feed_errors.load(Ordering::Relaxed),
        }
    }
}

/// Plain counter snapshot, summed across workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestTotals {
    pub fetched: u64,
    pub kept: u64,
    pub too_recent: u64,
    pub not_media: u64,
    pub invalid: u64,
    pub feed_errors: u64,
}

impl std::ops::AddAssign for HarvestTotals {
    fn add_assign(&mut self, other: Self) {
        self.fetched += other.fetched;
        self.kept += other.kept;
        self.too_recent += other.too_recent;
        self.not_media += other.not_media;
        self.invalid += other.invalid;
        self.feed_errors += other.feed_errors;
    }
}

/// Sends the worker id on the completion channel when dropped, so the
/// coordinator hears about panicking workers too
struct DoneGuard {
    id: usize,
    done: Sender<usize>,
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        let _ = self.done.send(self.id);
    }
}

/// A worker thread that harvests a single source
pub struct SourceWorker {
    id: usize,
    source: String,
    handle: Option<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl SourceWorker {
    /// Spawn a new worker thread for `source`
    pub fn spawn(
        id: usize,
        source: String,
        limit: Option<usize>,
        feed: Arc<dyn FeedClient>,
        queue: QueueSender,
        shutdown: Arc<AtomicBool>,
        done: Sender<usize>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);
        let thread_source = source.clone();

        let handle = thread::Builder::new()
            .name(format!("source-{}", source))
            .spawn(move || {
                let _done = DoneGuard { id, done };
                let today = Local::now().date_naive();
                harvest_source(
                    &thread_source,
                    limit,
                    feed.as_ref(),
                    &queue,
                    &shutdown,
                    &stats_clone,
                    today,
                );
            })
            .map_err(|e| WorkerError::SpawnFailed {
                source_name: source.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            source,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Source this worker harvests
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Check if the thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                source_name: self.source.clone(),
                message: "Worker thread panicked".into(),
            }),
            None => Ok(()),
        }
    }
}

/// Harvest one source into the queue; the body of a worker thread
///
/// `today` is fixed for the whole listing.
pub fn harvest_source(
    source: &str,
    limit: Option<usize>,
    feed: &dyn FeedClient,
    queue: &QueueSender,
    shutdown: &AtomicBool,
    stats: &WorkerStats,
    today: NaiveDate,
) {
    info!(source = source, limit = ?limit, "Worker starting");

    for item in feed.top(source, limit) {
        if shutdown.load(Ordering::Relaxed) {
            debug!(source = source, "Shutdown requested, stopping listing");
            break;
        }

        let raw = match item {
            Ok(raw) => raw,
            Err(e) => {
                stats.feed_errors.fetch_add(1, Ordering::Relaxed);
                warn!(source = source, error = %e, "Feed failed, ending listing early");
                break;
            }
        };
        stats.fetched.fetch_add(1, Ordering::Relaxed);

        let Some(record) = SubmissionRecord::from_raw(&raw, source) else {
            stats.invalid.fetch_add(1, Ordering::Relaxed);
            debug!(source = source, id = %raw.id, "Skipping unusable entry");
            continue;
        };

        let verdict = filter::evaluate(&record, &raw.url, today);
        stats.record_verdict(verdict);

        if verdict != Verdict::Keep {
            trace!(source = source, id = %record.id, verdict = ?verdict, "Filtered out");
            continue;
        }

        if shutdown.load(Ordering::Relaxed) {
            debug!(source = source, id = %record.id, "Shutdown requested, dropping kept entry");
            break;
        }

        trace!(source = source, id = %record.id, "Submission queued");
        if queue.push(record).is_err() {
            warn!(source = source, "Queue closed, stopping listing");
            break;
        }
    }

    let totals = stats.totals();
    info!(
        source = source,
        fetched = totals.fetched,
        kept = totals.kept,
        "Worker finished"
    );
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(workers: &[SourceWorker]) -> HarvestTotals {
    let mut totals = HarvestTotals::default();
    for worker in workers {
        totals += worker.stats.totals();
    }
    totals
}
