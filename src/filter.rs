//! Age and media-type filtering for submissions
//!
//! A submission is kept only when it is older than `MIN_AGE_DAYS` whole
//! calendar days and its URL looks like an image link. The media check is a
//! plain substring match on the URL, not a content-type check: any URL
//! containing `jpg`, `png` or `uploads` anywhere qualifies.

use crate::types::SubmissionRecord;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Minimum age in days; a submission must be strictly older than this
pub const MIN_AGE_DAYS: i64 = 90;

/// Matches URLs that are treated as image posts (case-sensitive)
static MEDIA_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"jpg|png|uploads").expect("Invalid media URL regex"));

/// Outcome of filtering a single submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Passes both predicates
    Keep,

    /// Not older than `MIN_AGE_DAYS`
    TooRecent,

    /// URL does not look like an image link
    NotMedia,
}

/// Check the age predicate at day granularity
pub fn is_old_enough(created: NaiveDate, today: NaiveDate) -> bool {
    (today - created).num_days() > MIN_AGE_DAYS
}

/// Check the media predicate
pub fn is_media_url(url: &str) -> bool {
    MEDIA_URL_REGEX.is_match(url)
}

/// Classify a submission against both predicates
///
/// Age is checked first, so a record failing both reports `TooRecent`.
pub fn evaluate(record: &SubmissionRecord, url: &str, today: NaiveDate) -> Verdict {
    if !is_old_enough(record.created, today) {
        Verdict::TooRecent
    } else if !is_media_url(url) {
        Verdict::NotMedia
    } else {
        Verdict::Keep
    }
}

/// Decide whether a submission should be queued for persistence
pub fn keep(record: &SubmissionRecord, url: &str, today: NaiveDate) -> bool {
    evaluate(record, url, today) == Verdict::Keep
}
