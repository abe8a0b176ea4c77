//! Shared submission queue
//!
//! An unbounded multi-producer, single-consumer FIFO built on
//! `crossbeam_channel::unbounded`. Source workers each hold a cloned
//! `QueueSender`; once the coordinator is done, the queue is converted into
//! its single `QueueDrain`, which empties it without blocking.
//!
//! The drain is bounded by the queue length at conversion time. Records a
//! detached worker pushes after that point stay in the channel and are
//! dropped with it.
//!
//! The queue is created per run and handed to the coordinator and drain
//! loop explicitly.

use crate::types::SubmissionRecord;
use crossbeam_channel::{unbounded, Receiver, SendError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the submission queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total submissions enqueued
    pub enqueued: AtomicU64,

    /// Total submissions dequeued
    pub dequeued: AtomicU64,
}

impl QueueStats {
    /// Submissions enqueued so far
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Submissions dequeued so far
    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }
}

/// Run-scoped queue of filtered submissions
pub struct SubmissionQueue {
    sender: Sender<SubmissionRecord>,
    receiver: Receiver<SubmissionRecord>,
    stats: Arc<QueueStats>,
}

impl SubmissionQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();

        Self {
            sender,
            receiver,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Get a sender for this queue (one per worker)
    pub fn sender(&self) -> QueueSender {
        QueueSender {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Give up the producer side and hand out the single consumer
    ///
    /// The consumer yields at most the records queued right now.
    pub fn into_drain(self) -> QueueDrain {
        QueueDrain {
            remaining: self.receiver.len(),
            receiver: self.receiver,
            stats: self.stats,
        }
    }
}

impl Default for SubmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle held by a source worker
#[derive(Clone)]
pub struct QueueSender {
    sender: Sender<SubmissionRecord>,
    stats: Arc<QueueStats>,
}

impl QueueSender {
    /// Enqueue a submission
    ///
    /// Returns `Err` with the record only if the drain side has been dropped.
    pub fn push(&self, record: SubmissionRecord) -> Result<(), SendError<SubmissionRecord>> {
        self.sender.send(record)?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Consumer side of the queue
///
/// Not `Clone`: there is exactly one drain per run. Iteration pops with
/// `try_recv` and ends once the records queued at conversion are gone, even
/// if a detached producer still holds a sender.
pub struct QueueDrain {
    receiver: Receiver<SubmissionRecord>,
    stats: Arc<QueueStats>,
    remaining: usize,
}

impl QueueDrain {
    /// Pop the oldest submission without blocking
    pub fn try_pop(&mut self) -> Option<SubmissionRecord> {
        if self.remaining == 0 {
            return None;
        }

        let record = self.receiver.try_recv().ok()?;
        self.remaining -= 1;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(record)
    }

    /// Records still to be yielded
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

impl Iterator for QueueDrain {
    type Item = SubmissionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_pop()
    }
}
