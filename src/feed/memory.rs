//! In-memory fixture feed
//!
//! Serves pre-built entries per source. Used by the test suite and benches
//! to exercise the pipeline without network access.

use super::{EntryIter, FeedClient};
use crate::error::FeedError;
use crate::types::RawEntry;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
struct Fixture {
    entries: Vec<RawEntry>,
    /// Yield a feed error after this many entries
    fail_after: Option<usize>,
}

/// Feed client backed by fixture entries
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    fixtures: HashMap<String, Fixture>,
    /// Pause before each entry, to spread worker interleavings
    delay: Option<Duration>,
}

impl MemoryFeed {
    /// Create an empty feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Register entries for a source
    pub fn with_source(mut self, source: &str, entries: Vec<RawEntry>) -> Self {
        self.fixtures.insert(
            source.to_string(),
            Fixture {
                entries,
                fail_after: None,
            },
        );
        self
    }

    /// Register a source that errors out after yielding `fail_after` entries
    pub fn with_failing_source(
        mut self,
        source: &str,
        entries: Vec<RawEntry>,
        fail_after: usize,
    ) -> Self {
        self.fixtures.insert(
            source.to_string(),
            Fixture {
                entries,
                fail_after: Some(fail_after),
            },
        );
        self
    }

    /// Sleep for `delay` before yielding each entry
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl FeedClient for MemoryFeed {
    fn top(&self, source: &str, limit: Option<usize>) -> EntryIter<'_> {
        let Some(fixture) = self.fixtures.get(source) else {
            return Box::new(std::iter::once(Err(FeedError::UnknownSource(
                source.to_string(),
            ))));
        };

        let limit = limit.unwrap_or(usize::MAX);
        let delay = self.delay;
        let ok_count = fixture
            .fail_after
            .map_or(fixture.entries.len(), |n| n.min(fixture.entries.len()));

        let entries = fixture.entries[..ok_count].iter().cloned().map(Ok);
        let failure = fixture.fail_after.map(|_| {
            Err(FeedError::Request {
                source_name: source.to_string(),
                reason: "connection reset by fixture".into(),
            })
        });

        Box::new(
            entries
                .chain(failure)
                .take(limit)
                .inspect(move |_| {
                    if let Some(delay) = delay {
                        thread::sleep(delay);
                    }
                }),
        )
    }
}
