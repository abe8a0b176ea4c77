//! submission-harvest - Concurrent Top-Submission Harvester
//!
//! Fetches the all-time top submissions of a fixed set of subreddits,
//! keeps the ones older than 90 days whose URL looks like an image, and
//! appends them to a local SQLite store.
//!
//! # Features
//!
//! - **Parallel Fetching**: One worker thread per source, each paging
//!   through its own listing.
//!
//! - **Single Writer**: Workers only enqueue. One drain loop on the calling
//!   thread performs every insert after all workers have terminated.
//!
//! - **Contained Failures**: A failing feed ends only its own worker; a
//!   failing insert skips only its own row.
//!
//! - **Parameterized SQL**: Table and column names come from a fixed
//!   allow-list, values are always bound parameters.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Feed (top listings)                         │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ RawEntry
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Source Workers                             │
//! │  ┌─────────┐  ┌─────────┐  ┌───────────┐        ┌─────────┐     │
//! │  │   Art   │  │   aww   │  │ EarthPorn │  ...   │ source N│     │
//! │  │ filter  │  │ filter  │  │  filter   │        │ filter  │     │
//! │  └────┬────┘  └────┬────┘  └─────┬─────┘        └────┬────┘     │
//! │       └────────────┼─────────────┼───────────────────┘          │
//! │                    ▼             ▼                              │
//! │            ┌──────────────────────────┐                         │
//! │            │    Submission Queue      │                         │
//! │            │  (crossbeam unbounded)   │                         │
//! │            └────────────┬─────────────┘                         │
//! │                         │ after all workers terminated          │
//! │                         ▼                                       │
//! │            ┌──────────────────────────┐                         │
//! │            │       Drain Loop         │                         │
//! │            │  - one insert per row    │                         │
//! │            └──────────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────┐
//!                    │   SQLite DB      │
//!                    │   (admin.db)     │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Harvest everything into admin.db
//! submission-harvest
//!
//! # Cap each listing and bound the wait
//! submission-harvest --limit 200 --wait-timeout 120
//!
//! # Query results
//! sqlite3 admin.db "SELECT subreddit, COUNT(*) FROM submissions GROUP BY subreddit"
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod filter;
pub mod pipeline;
pub mod progress;
pub mod types;

pub use config::{CliArgs, HarvestConfig};
pub use error::{HarvestError, Result};
pub use pipeline::{run_harvest, Coordinator, HarvestReport, SourceSpec};
pub use types::{RawEntry, SubmissionRecord};
