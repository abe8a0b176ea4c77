//! Harvest coordinator - fans out source workers and waits for all of them
//!
//! The coordinator is responsible for:
//! - Starting one worker per configured source
//! - Blocking until every worker has terminated, in any order
//! - Giving up early on a wait timeout or an interrupt
//! - Collecting final statistics
//!
//! Termination is counted on a completion channel: every worker sends its
//! id when its thread exits (normally, on a feed error, or by panicking).
//! The coordinator blocks on that channel with `select!`, so there is no
//! polling loop.
//!
//! On timeout or interrupt the coordinator stops waiting, raises the
//! shutdown flag and detaches the workers still running. A detached worker
//! stops at its next entry; anything it queues after the drain has started
//! is not stored.

use crate::error::{Result, WorkerError};
use crate::feed::FeedClient;
use crate::pipeline::queue::SubmissionQueue;
use crate::pipeline::worker::{aggregate_stats, HarvestTotals, SourceWorker};
use crossbeam_channel::{after, bounded, never, select, unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A configured source: display label plus feed source name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub label: String,
    pub source: String,
}

impl SourceSpec {
    pub fn new(label: &str, source: &str) -> Self {
        Self {
            label: label.to_string(),
            source: source.to_string(),
        }
    }
}

/// How the wait for workers ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every worker terminated
    Completed,

    /// The wait timeout elapsed first
    TimedOut,

    /// An interrupt arrived first
    Interrupted,
}

/// Progress snapshot passed to the coordinator's callback
#[derive(Debug, Clone, Copy)]
pub struct CollectProgress {
    /// Workers that have terminated
    pub finished: usize,

    /// Workers started
    pub total: usize,

    /// Submissions currently queued
    pub queued: usize,
}

/// Result of the fetch phase
#[derive(Debug)]
pub struct CollectResult {
    /// Workers started
    pub sources: usize,

    /// Workers that terminated before the wait ended
    pub finished: usize,

    /// Workers that panicked
    pub panicked: usize,

    /// Counters summed across workers
    pub totals: HarvestTotals,

    /// Time spent fetching
    pub duration: Duration,

    /// How the wait ended
    pub outcome: WaitOutcome,
}

impl CollectResult {
    /// Whether every worker terminated
    pub fn completed(&self) -> bool {
        self.outcome == WaitOutcome::Completed
    }
}

/// Handle for interrupting a running coordinator (signal handlers)
#[derive(Clone)]
pub struct InterruptHandle {
    tx: Sender<()>,
    shutdown: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Stop waiting for workers and ask them to wind down
    pub fn interrupt(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.tx.try_send(());
    }
}

/// Coordinates the per-source workers of one harvest
pub struct Coordinator {
    sources: Vec<SourceSpec>,
    limit: Option<usize>,
    feed: Arc<dyn FeedClient>,
    wait_timeout: Option<Duration>,
    shutdown: Arc<AtomicBool>,
    interrupt_tx: Sender<()>,
    interrupt_rx: Receiver<()>,
}

impl Coordinator {
    /// Create a coordinator over `sources`, all read through `feed`
    pub fn new(sources: Vec<SourceSpec>, feed: Arc<dyn FeedClient>) -> Self {
        let (interrupt_tx, interrupt_rx) = bounded(1);

        Self {
            sources,
            limit: None,
            feed,
            wait_timeout: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            interrupt_tx,
            interrupt_rx,
        }
    }

    /// Cap every source's listing at `limit` entries
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Stop waiting for workers after `timeout`
    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Configured sources
    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    /// Get an interrupt handle (for signal handlers)
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            tx: self.interrupt_tx.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Run the fetch phase into `queue`
    pub fn run(&self, queue: &SubmissionQueue) -> Result<CollectResult> {
        self.run_with(queue, |_| {})
    }

    /// Run the fetch phase, calling `on_progress` each time a worker ends
    pub fn run_with<F>(&self, queue: &SubmissionQueue, mut on_progress: F) -> Result<CollectResult>
    where
        F: FnMut(&CollectProgress),
    {
        let start_time = Instant::now();

        info!(
            sources = self.sources.len(),
            limit = ?self.limit,
            "Starting harvest"
        );

        let (done_tx, done_rx) = unbounded();
        let workers = self.spawn_workers(queue, done_tx)?;
        let total = workers.len();

        let (finished, outcome) = self.wait_for_workers(total, &done_rx, queue, &mut on_progress);

        if outcome != WaitOutcome::Completed {
            self.shutdown.store(true, Ordering::SeqCst);
        }

        let totals = aggregate_stats(&workers);
        let panicked = self.join_workers(workers);
        let duration = start_time.elapsed();

        info!(
            finished = finished,
            sources = total,
            kept = totals.kept,
            fetched = totals.fetched,
            duration_ms = duration.as_millis() as u64,
            outcome = ?outcome,
            "Fetch phase done"
        );

        Ok(CollectResult {
            sources: total,
            finished,
            panicked,
            totals,
            duration,
            outcome,
        })
    }

    /// Spawn one worker per source
    fn spawn_workers(
        &self,
        queue: &SubmissionQueue,
        done_tx: Sender<usize>,
    ) -> Result<Vec<SourceWorker>> {
        let mut workers = Vec::with_capacity(self.sources.len());

        for (id, spec) in self.sources.iter().enumerate() {
            info!(label = %spec.label, source = %spec.source, "Harvesting source");

            let worker = SourceWorker::spawn(
                id,
                spec.source.clone(),
                self.limit,
                Arc::clone(&self.feed),
                queue.sender(),
                Arc::clone(&self.shutdown),
                done_tx.clone(),
            );

            match worker {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Already-started workers finish on their own; stop them early
                    self.shutdown.store(true, Ordering::SeqCst);
                    self.join_workers(workers);
                    return Err(e.into());
                }
            }
        }

        debug!(count = workers.len(), "Workers spawned");
        Ok(workers)
    }

    /// Block until `total` completion notices arrive, the timeout elapses or
    /// an interrupt is received
    fn wait_for_workers<F>(
        &self,
        total: usize,
        done_rx: &Receiver<usize>,
        queue: &SubmissionQueue,
        on_progress: &mut F,
    ) -> (usize, WaitOutcome)
    where
        F: FnMut(&CollectProgress),
    {
        let deadline = self.wait_timeout.map_or_else(never, after);
        let mut finished = 0;

        if self.shutdown.load(Ordering::SeqCst) && total > 0 {
            return (finished, WaitOutcome::Interrupted);
        }

        while finished < total {
            select! {
                recv(done_rx) -> msg => match msg {
                    Ok(id) => {
                        finished += 1;
                        debug!(worker = id, finished = finished, total = total, "Worker terminated");
                        on_progress(&CollectProgress {
                            finished,
                            total,
                            queued: queue.len(),
                        });
                    }
                    // Every sender is gone, so every worker has exited
                    Err(_) => finished = total,
                },
                recv(self.interrupt_rx) -> _ => {
                    info!(finished = finished, total = total, "Interrupted, draining what is queued");
                    return (finished, WaitOutcome::Interrupted);
                },
                recv(deadline) -> _ => {
                    warn!(
                        finished = finished,
                        total = total,
                        "Wait timeout elapsed, draining what is queued"
                    );
                    return (finished, WaitOutcome::TimedOut);
                },
            }
        }

        (finished, WaitOutcome::Completed)
    }

    /// Join finished workers, detach the rest; returns the panic count
    fn join_workers(&self, workers: Vec<SourceWorker>) -> usize {
        let mut panicked = 0;

        for worker in workers {
            if !worker.is_finished() && self.shutdown.load(Ordering::SeqCst) {
                warn!(source = worker.source(), "Detaching worker still running");
                continue;
            }

            if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
                if matches!(e, WorkerError::Panicked { .. }) {
                    panicked += 1;
                }
            }
        }

        panicked
    }
}
