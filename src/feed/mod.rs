//! Feed clients for reading top submissions from a source
//!
//! A feed client turns a source name into a lazy, finite sequence of
//! `RawEntry` values. Each call to `top` starts a fresh listing; the
//! returned iterator is not restartable mid-stream.
//!
//! # Implementations
//!
//! - `RedditClient`: pages through the public JSON listing over HTTP
//! - `MemoryFeed`: serves fixture entries from memory (tests, benches, dry runs)
//!
//! Errors are yielded as items instead of ending the call, so a consumer
//! sees every entry that arrived before the failure. After an `Err` item the
//! iterator is exhausted.

pub mod memory;
pub mod reddit;

pub use memory::MemoryFeed;
pub use reddit::RedditClient;

use crate::error::FeedResult;
use crate::types::RawEntry;

/// Lazy listing of entries from a single source
pub type EntryIter<'a> = Box<dyn Iterator<Item = FeedResult<RawEntry>> + 'a>;

/// Read-only access to a paginated submissions feed
///
/// Implementations are shared across worker threads behind an `Arc`.
pub trait FeedClient: Send + Sync {
    /// Top-ranked entries for `source`, capped at `limit` (unbounded if `None`)
    fn top(&self, source: &str, limit: Option<usize>) -> EntryIter<'_>;
}
