//! Core types for submissions flowing through the pipeline
//!
//! A `RawEntry` is what the feed client decodes off the wire. Source workers
//! project each one into a `SubmissionRecord`, which is what gets queued and
//! eventually persisted.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// Author placeholder used when the feed has no author for a submission
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Day-precision format used for the persisted `created` column
pub const CREATED_FORMAT: &str = "%m-%d-%Y";

/// A submission as delivered by the feed client
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    /// Source-assigned identifier
    pub id: String,

    /// Author name, `None` if the account is gone
    pub author: Option<String>,

    /// Submission title
    pub title: String,

    /// Net score
    pub score: i64,

    /// Fraction of upvotes (0.0 - 1.0)
    pub upvote_ratio: f64,

    /// Creation time (Unix timestamp, seconds)
    pub created_utc: i64,

    /// Link target of the submission
    pub url: String,
}

/// A filtered-in submission, ready for persistence
///
/// Field order matches the column order of the `submissions` table.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub id: String,
    pub author: String,
    pub title: String,
    pub score: i64,
    pub upvote_ratio: f64,
    pub created: NaiveDate,
    pub subreddit: String,
}

impl SubmissionRecord {
    /// Project a raw feed entry, using the local timezone for `created`
    ///
    /// Returns `None` for entries without an id or with an unrepresentable
    /// timestamp.
    pub fn from_raw(raw: &RawEntry, source: &str) -> Option<Self> {
        Self::from_raw_in(raw, source, &Local)
    }

    /// Project a raw feed entry using an explicit timezone for `created`
    pub fn from_raw_in<Tz: TimeZone>(raw: &RawEntry, source: &str, tz: &Tz) -> Option<Self> {
        if raw.id.is_empty() {
            return None;
        }

        let created = DateTime::from_timestamp(raw.created_utc, 0)?
            .with_timezone(tz)
            .date_naive();

        let author = raw
            .author
            .clone()
            .unwrap_or_else(|| DELETED_AUTHOR.to_string());

        // NaN from a broken feed collapses to 0.0
        let upvote_ratio = if raw.upvote_ratio.is_nan() {
            0.0
        } else {
            raw.upvote_ratio.clamp(0.0, 1.0)
        };

        Some(Self {
            id: raw.id.clone(),
            author,
            title: raw.title.clone(),
            score: raw.score,
            upvote_ratio,
            created,
            subreddit: source.to_string(),
        })
    }

    /// `created` formatted for storage
    pub fn created_text(&self) -> String {
        self.created.format(CREATED_FORMAT).to_string()
    }
}
