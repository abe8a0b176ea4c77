//! SQLite persistence for harvested submissions
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        Drain loop (calling thread)         │
//! │  - one insert per queued submission        │
//! └─────────────────────┬───────────────────────┘
//!                       │ RecordSink
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │            SubmissionStore                  │
//! │  - allow-listed tables and columns          │
//! │  - bound parameters only                    │
//! └─────────────────────┬───────────────────────┘
//!                       │
//!                       ▼
//!              ┌──────────────────┐
//!              │   SQLite file    │
//!              │   (admin.db)     │
//!              └──────────────────┘
//! ```

pub mod schema;
pub mod store;

pub use schema::{ColumnSpec, TableSpec, SUBMISSIONS, SUBMISSIONS_TABLE};
pub use store::{ReadBack, RecordSink, Row, SubmissionStore};
