//! Integration tests for submission-harvest
//!
//! These run the full coordinator -> drain -> store pipeline against
//! in-memory feeds and on-disk SQLite stores. No network access.

use chrono::{Duration, Local, NaiveDate, TimeZone};
use std::collections::HashSet;
use std::sync::Arc;
use submission_harvest::db::{RecordSink, SubmissionStore, SUBMISSIONS};
use submission_harvest::feed::MemoryFeed;
use submission_harvest::filter;
use submission_harvest::pipeline::{run_harvest, Coordinator, SourceSpec, WaitOutcome};
use submission_harvest::types::{RawEntry, SubmissionRecord, DELETED_AUTHOR};
use tempfile::tempdir;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Entry created at local noon `days_old` days ago
fn entry(id: &str, days_old: i64, url: &str) -> RawEntry {
    let date = today() - Duration::days(days_old);
    let noon = Local
        .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
        .earliest()
        .unwrap();

    RawEntry {
        id: id.into(),
        author: Some(format!("user_{}", id)),
        title: format!("Submission {}", id),
        score: 1000,
        upvote_ratio: 0.95,
        created_utc: noon.timestamp(),
        url: url.into(),
    }
}

fn sources(names: &[&str]) -> Vec<SourceSpec> {
    names
        .iter()
        .map(|name| SourceSpec::new(&name.to_uppercase(), name))
        .collect()
}

#[test]
fn test_end_to_end_filtering() {
    let feed = MemoryFeed::new()
        .with_source(
            "A",
            vec![
                entry("a-old", 100, "https://i.redd.it/a-old.jpg"),
                entry("a-new", 10, "https://i.redd.it/a-new.jpg"),
            ],
        )
        .with_source("B", vec![entry("b-video", 200, "https://v.redd.it/b.mp4")]);

    let coordinator = Coordinator::new(sources(&["A", "B"]), Arc::new(feed));
    let store = SubmissionStore::open_in_memory().unwrap();

    let report = run_harvest(&coordinator, &store, |_| {}).unwrap();

    assert!(report.collect.completed());
    assert_eq!(report.drain.inserted, 1);
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].id, "a-old");
    assert_eq!(report.rows[0].subreddit, "A");
    assert_eq!(report.rows[0].created, today() - Duration::days(100));
}

#[test]
fn test_concurrent_sources_lose_and_duplicate_nothing() {
    const SOURCES: usize = 8;
    const PER_SOURCE: usize = 250;

    let names: Vec<String> = (0..SOURCES).map(|i| format!("src{}", i)).collect();
    let mut feed = MemoryFeed::new().with_delay(std::time::Duration::from_micros(50));
    for name in &names {
        let entries = (0..PER_SOURCE)
            .map(|i| entry(&format!("{}-{}", name, i), 365, "https://i.imgur.com/x.png"))
            .collect();
        feed = feed.with_source(name, entries);
    }

    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let coordinator = Coordinator::new(sources(&name_refs), Arc::new(feed));

    let dir = tempdir().unwrap();
    let store = SubmissionStore::open(&dir.path().join("admin.db")).unwrap();

    let report = run_harvest(&coordinator, &store, |_| {}).unwrap();

    assert_eq!(report.collect.totals.kept, (SOURCES * PER_SOURCE) as u64);
    assert_eq!(report.drain.inserted, (SOURCES * PER_SOURCE) as u64);
    assert_eq!(report.rows.len(), SOURCES * PER_SOURCE);

    let unique: HashSet<&str> = report.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(unique.len(), SOURCES * PER_SOURCE);

    // Within a source, rows land in feed order
    for name in &names {
        let order: Vec<usize> = report
            .rows
            .iter()
            .filter(|r| &r.subreddit == name)
            .map(|r| r.id.rsplit('-').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(order, (0..PER_SOURCE).collect::<Vec<_>>());
    }
}

#[test]
fn test_empty_harvest_keeps_existing_rows() {
    let dir = tempdir().unwrap();
    let path = SubmissionStore::file_for(&dir.path().join("admin"));

    let existing = SubmissionRecord {
        id: "prior".into(),
        author: DELETED_AUTHOR.into(),
        title: "From an earlier run".into(),
        score: 5,
        upvote_ratio: 0.5,
        created: NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
        subreddit: "aww".into(),
    };

    {
        let store = SubmissionStore::open(&path).unwrap();
        store.create_table_if_absent(&SUBMISSIONS).unwrap();
        store.insert(&existing).unwrap();
    }

    // Every entry is filtered out
    let feed = MemoryFeed::new().with_source(
        "aww",
        vec![
            entry("fresh", 3, "https://i.redd.it/fresh.jpg"),
            entry("gif", 400, "https://i.imgur.com/x.gifv"),
        ],
    );
    let coordinator = Coordinator::new(sources(&["aww"]), Arc::new(feed));
    let store = SubmissionStore::open(&path).unwrap();

    let report = run_harvest(&coordinator, &store, |_| {}).unwrap();

    assert_eq!(report.drain.drained(), 0);
    assert_eq!(report.rows, vec![existing]);
}

#[test]
fn test_repeated_runs_append_duplicates() {
    let feed = Arc::new(
        MemoryFeed::new().with_source("Art", vec![entry("same", 120, "https://i.redd.it/s.jpg")]),
    );
    let store = SubmissionStore::open_in_memory().unwrap();

    for _ in 0..2 {
        let coordinator = Coordinator::new(sources(&["Art"]), feed.clone());
        run_harvest(&coordinator, &store, |_| {}).unwrap();
    }

    let rows = store.read_back().unwrap().rows;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.id == "same"));
}

#[test]
fn test_failing_source_does_not_affect_others() {
    let feed = MemoryFeed::new()
        .with_failing_source(
            "EarthPorn",
            vec![
                entry("e1", 100, "https://i.redd.it/e1.jpg"),
                entry("e2", 100, "https://i.redd.it/e2.jpg"),
            ],
            1,
        )
        .with_source("Art", vec![entry("a1", 100, "https://i.redd.it/a1.png")]);

    let coordinator = Coordinator::new(sources(&["EarthPorn", "Art"]), Arc::new(feed));
    let store = SubmissionStore::open_in_memory().unwrap();

    let report = run_harvest(&coordinator, &store, |_| {}).unwrap();

    assert!(report.collect.completed());
    assert_eq!(report.collect.totals.feed_errors, 1);

    let mut ids: Vec<_> = report.rows.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a1", "e1"]);
}

#[test]
fn test_limit_applies_per_source() {
    let entries = |prefix: &str| {
        (0..10)
            .map(|i| entry(&format!("{}{}", prefix, i), 150, "https://x.com/uploads/p"))
            .collect::<Vec<_>>()
    };
    let feed = MemoryFeed::new()
        .with_source("Art", entries("a"))
        .with_source("aww", entries("w"));

    let coordinator =
        Coordinator::new(sources(&["Art", "aww"]), Arc::new(feed)).with_limit(Some(3));
    let store = SubmissionStore::open_in_memory().unwrap();

    let report = run_harvest(&coordinator, &store, |_| {}).unwrap();

    assert_eq!(report.rows.len(), 6);
    assert_eq!(store.submissions_from("Art").unwrap().len(), 3);
    assert_eq!(store.submissions_from("aww").unwrap().len(), 3);
}

#[test]
fn test_missing_author_persisted_as_sentinel() {
    let mut anonymous = entry("anon", 95, "https://i.redd.it/anon.jpg");
    anonymous.author = None;

    let feed = MemoryFeed::new().with_source("Art", vec![anonymous]);
    let coordinator = Coordinator::new(sources(&["Art"]), Arc::new(feed));
    let store = SubmissionStore::open_in_memory().unwrap();

    let report = run_harvest(&coordinator, &store, |_| {}).unwrap();
    assert_eq!(report.rows[0].author, DELETED_AUTHOR);
}

#[test]
fn test_age_boundary_through_filter() {
    let record = |days: i64| SubmissionRecord {
        id: "x".into(),
        author: "a".into(),
        title: "t".into(),
        score: 0,
        upvote_ratio: 0.0,
        created: today() - Duration::days(days),
        subreddit: "Art".into(),
    };

    assert!(!filter::keep(&record(90), "a.jpg", today()));
    assert!(filter::keep(&record(91), "a.jpg", today()));
}

#[test]
fn test_create_table_twice_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("admin.db");

    let store = SubmissionStore::open(&path).unwrap();
    store.create_table_if_absent(&SUBMISSIONS).unwrap();
    store.create_table_if_absent(&SUBMISSIONS).unwrap();
    drop(store);

    let conn = rusqlite::Connection::open(&path).unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='submissions'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_timed_out_harvest_stores_what_was_queued() {
    let entries = (0..1000)
        .map(|i| entry(&format!("slow-{}", i), 200, "https://i.redd.it/slow.jpg"))
        .collect();
    let feed = MemoryFeed::new()
        .with_source("EarthPorn", entries)
        .with_delay(std::time::Duration::from_millis(10));

    let coordinator = Coordinator::new(sources(&["EarthPorn"]), Arc::new(feed))
        .with_wait_timeout(Some(std::time::Duration::from_millis(300)));
    let store = SubmissionStore::open_in_memory().unwrap();

    let report = run_harvest(&coordinator, &store, |_| {}).unwrap();

    assert!(!report.collect.completed());
    assert_eq!(report.collect.outcome, WaitOutcome::TimedOut);
    assert!(report.drain.inserted >= 1);
    assert!(report.drain.inserted < 1000);
    assert_eq!(report.rows.len() as u64, report.drain.inserted);

    // Feed order survives the early stop
    for (i, row) in report.rows.iter().enumerate() {
        assert_eq!(row.id, format!("slow-{}", i));
    }
}

#[test]
fn test_unreadable_prior_row_does_not_fail_harvest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("admin.db");

    {
        let store = SubmissionStore::open(&path).unwrap();
        store.create_table_if_absent(&SUBMISSIONS).unwrap();
    }

    // A row from an older writer: ISO date and no score
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO submissions VALUES ('old', 'x', 't', NULL, 0.5, '2019-01-01', 'aww')",
        [],
    )
    .unwrap();
    drop(conn);

    let feed = MemoryFeed::new().with_source("aww", vec![entry("new", 120, "https://i.redd.it/n.png")]);
    let coordinator = Coordinator::new(sources(&["aww"]), Arc::new(feed));
    let store = SubmissionStore::open(&path).unwrap();

    let report = run_harvest(&coordinator, &store, |_| {}).unwrap();

    assert_eq!(report.drain.inserted, 1);
    assert_eq!(report.unreadable, 1);
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].id, "new");
}
