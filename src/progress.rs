//! Progress reporting and final output
//!
//! The spinner, header and summary go to stderr through indicatif and
//! console. The read-back listing goes to stdout, one row per line, so it
//! can be piped.

use crate::pipeline::{CollectProgress, HarvestReport, SourceSpec, WaitOutcome};
use crate::types::SubmissionRecord;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Spinner shown while sources are being fetched
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the display after a source finished
    pub fn update(&self, progress: &CollectProgress) {
        self.bar.set_message(format!(
            "Sources: {}/{} | Queued: {}",
            progress.finished,
            progress.total,
            format_number(progress.queued as u64),
        ));
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Print a header at the start of the run
pub fn print_header(sources: &[SourceSpec], limit: Option<usize>, db_path: &Path) {
    let names: Vec<String> = sources
        .iter()
        .map(|s| format!("{} (/r/{})", s.label, s.source))
        .collect();

    eprintln!();
    eprintln!(
        "{} {}",
        style("submission-harvest").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Sources:").bold(), names.join(", "));
    match limit {
        Some(limit) => eprintln!("  {} {} per source", style("Limit:").bold(), limit),
        None => eprintln!("  {} none", style("Limit:").bold()),
    }
    eprintln!("  {} {}", style("Store:").bold(), db_path.display());
    eprintln!();
}

/// Print a summary of the run
pub fn print_summary(report: &HarvestReport, db_path: &Path) {
    let collect = &report.collect;
    let totals = &collect.totals;

    let heading = match collect.outcome {
        WaitOutcome::Completed => style("Harvest Complete").green().bold(),
        WaitOutcome::TimedOut => style("Harvest Timed Out (partial)").yellow().bold(),
        WaitOutcome::Interrupted => style("Harvest Interrupted (partial)").yellow().bold(),
    };

    eprintln!();
    eprintln!("{}", heading);
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!(
        "  {} {}/{}",
        style("Sources done:").bold(),
        collect.finished,
        collect.sources
    );
    eprintln!("  {} {}", style("Fetched:").bold(), format_number(totals.fetched));
    eprintln!(
        "  {} {} (too recent: {}, not media: {})",
        style("Kept:").bold(),
        format_number(totals.kept),
        format_number(totals.too_recent),
        format_number(totals.not_media),
    );
    eprintln!(
        "  {} {}",
        style("Stored:").bold(),
        format_number(report.drain.inserted)
    );
    if report.drain.failed > 0 {
        eprintln!(
            "  {} {}",
            style("Insert errors:").yellow().bold(),
            format_number(report.drain.failed)
        );
    }
    if report.unreadable > 0 {
        eprintln!(
            "  {} {}",
            style("Unreadable rows:").yellow().bold(),
            format_number(report.unreadable)
        );
    }
    if totals.feed_errors > 0 {
        eprintln!(
            "  {} {}",
            style("Feed errors:").yellow().bold(),
            format_number(totals.feed_errors)
        );
    }
    eprintln!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        collect.duration.as_secs_f64()
    );
    eprintln!(
        "  {} {} ({} rows)",
        style("Store:").bold(),
        db_path.display(),
        format_number(report.rows.len() as u64)
    );
    eprintln!();
}

/// One read-back row as a display line
pub fn format_row(record: &SubmissionRecord) -> String {
    format!(
        "({:?}, {:?}, {:?}, {}, {}, {:?}, {:?})",
        record.id,
        record.author,
        record.title,
        record.score,
        record.upvote_ratio,
        record.created_text(),
        record.subreddit,
    )
}

/// Write every read-back row to `out`
pub fn write_rows<W: Write>(out: &mut W, rows: &[SubmissionRecord]) -> io::Result<()> {
    for row in rows {
        writeln!(out, "{}", format_row(row))?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_write_rows() {
        let rows = vec![SubmissionRecord {
            id: "8xwlg".into(),
            author: "[deleted]".into(),
            title: "Sunset \"over\" the bay".into(),
            score: 51234,
            upvote_ratio: 0.93,
            created: NaiveDate::from_ymd_opt(2018, 7, 11).unwrap(),
            subreddit: "EarthPorn".into(),
        }];

        let mut out = Vec::new();
        write_rows(&mut out, &rows).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "(\"8xwlg\", \"[deleted]\", \"Sunset \\\"over\\\" the bay\", 51234, 0.93, \
             \"07-11-2018\", \"EarthPorn\")\n"
        );
    }
}
