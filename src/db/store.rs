//! SQLite-backed persistence sink
//!
//! `SubmissionStore` wraps a single `rusqlite::Connection` and exposes a
//! small table interface: create, insert and select. Table and column names
//! are checked against the `TableSpec`s registered at construction; values
//! are always bound as parameters.
//!
//! There is no batching. Each insert is its own autocommitted statement, so
//! a row is durable by the time `insert_row` returns.

use crate::db::schema::{self, TableSpec, SUBMISSIONS};
use crate::error::{StoreError, StoreResult};
use crate::types::{SubmissionRecord, CREATED_FORMAT};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension appended to the store base name
pub const DB_EXTENSION: &str = "db";

/// A row as read back from the store, in declared column order
pub type Row = Vec<Value>;

/// SQLite pragmas for the harvest store
const STORE_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;
"#;

/// Result of reading every stored submission back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadBack {
    /// Rows that converted into records, in insertion order
    pub rows: Vec<SubmissionRecord>,

    /// Rows skipped because they could not be converted
    pub unreadable: u64,
}

/// Where the drain loop writes submissions
///
/// Implemented by `SubmissionStore`; the seam lets the drain run against
/// any sink with the same insert/read-back contract.
pub trait RecordSink {
    /// Persist one submission
    fn insert(&self, record: &SubmissionRecord) -> StoreResult<()>;

    /// Every persisted submission, including rows from earlier runs
    ///
    /// A row that cannot be converted is skipped and counted, not returned
    /// as an error.
    fn read_back(&self) -> StoreResult<ReadBack>;
}

/// Table store over a single SQLite connection
pub struct SubmissionStore {
    conn: Connection,
    tables: Vec<TableSpec>,
    path: Option<PathBuf>,
}

impl SubmissionStore {
    /// Path of the store file for a base name: `<base>.db`
    pub fn file_for(base: &Path) -> PathBuf {
        let mut name = base.as_os_str().to_owned();
        name.push(".");
        name.push(DB_EXTENSION);
        PathBuf::from(name)
    }

    /// Open (or create) the store file at `path` with the submissions table
    /// registered
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .and_then(|conn| conn.execute_batch(STORE_PRAGMAS).map(|()| conn))
            .map_err(|e| StoreError::Unavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(path = %path.display(), "Store opened");

        let mut store = Self::with_tables(conn, &[SUBMISSIONS])?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// In-memory store with the submissions table registered
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Unavailable {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;
        Self::with_tables(conn, &[SUBMISSIONS])
    }

    /// Wrap a connection, allowing only the given tables
    pub fn with_tables(conn: Connection, tables: &[TableSpec]) -> StoreResult<Self> {
        for table in tables {
            table.validate()?;
        }

        Ok(Self {
            conn,
            tables: tables.to_vec(),
            path: None,
        })
    }

    /// Path of the backing file (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn table(&self, name: &str) -> StoreResult<&TableSpec> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    /// Create a registered table unless it already exists
    ///
    /// `spec` must match the registered declaration exactly.
    pub fn create_table_if_absent(&self, spec: &TableSpec) -> StoreResult<()> {
        let registered = self.table(spec.name)?;

        if let Some(column) = spec.columns.iter().find(|c| !registered.columns.contains(c)) {
            return Err(StoreError::UnknownColumn {
                table: spec.name.to_string(),
                column: column.name.to_string(),
            });
        }
        if spec.columns.len() != registered.columns.len() {
            return Err(StoreError::ColumnCount {
                table: spec.name.to_string(),
                expected: registered.columns.len(),
                actual: spec.columns.len(),
            });
        }

        self.conn.execute(&registered.create_sql(), [])?;
        debug!(table = spec.name, "Table ready");
        Ok(())
    }

    /// Insert one row; `values` must follow the declared column order
    pub fn insert_row(&self, table: &str, values: &[Value]) -> StoreResult<()> {
        let spec = self.table(table)?;

        if values.len() != spec.columns.len() {
            return Err(StoreError::ColumnCount {
                table: table.to_string(),
                expected: spec.columns.len(),
                actual: values.len(),
            });
        }

        let mut stmt = self.conn.prepare_cached(&spec.insert_sql())?;
        stmt.execute(params_from_iter(values.iter()))?;
        Ok(())
    }

    /// Every row of `table`, in insertion order
    pub fn select_all(&self, table: &str) -> StoreResult<Vec<Row>> {
        let spec = self.table(table)?;
        let sql = format!("SELECT * FROM \"{}\" ORDER BY rowid", spec.name);
        self.query_rows(spec, &sql, &[])
    }

    /// Rows of `table` where `column` equals `value`
    pub fn select_where(&self, table: &str, column: &str, value: &Value) -> StoreResult<Vec<Row>> {
        let spec = self.table(table)?;
        if !spec.has_column(column) {
            return Err(StoreError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }

        let sql = format!(
            "SELECT * FROM \"{}\" WHERE \"{}\" = ?1 ORDER BY rowid",
            spec.name, column
        );
        self.query_rows(spec, &sql, std::slice::from_ref(value))
    }

    fn query_rows(&self, spec: &TableSpec, sql: &str, params: &[Value]) -> StoreResult<Vec<Row>> {
        let width = spec.columns.len();
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width).map(|i| row.get::<_, Value>(i)).collect()
            })?
            .collect::<Result<Vec<Row>, _>>()?;
        Ok(rows)
    }

    /// Submissions whose source is `subreddit`
    pub fn submissions_from(&self, subreddit: &str) -> StoreResult<Vec<SubmissionRecord>> {
        self.select_where(
            schema::SUBMISSIONS_TABLE,
            "subreddit",
            &Value::Text(subreddit.to_string()),
        )?
        .into_iter()
        .map(row_to_submission)
        .collect()
    }
}

impl RecordSink for SubmissionStore {
    fn insert(&self, record: &SubmissionRecord) -> StoreResult<()> {
        self.insert_row(schema::SUBMISSIONS_TABLE, &schema::submission_values(record))
    }

    fn read_back(&self) -> StoreResult<ReadBack> {
        let mut read_back = ReadBack::default();

        for (index, row) in self.select_all(schema::SUBMISSIONS_TABLE)?.into_iter().enumerate() {
            match row_to_submission(row) {
                Ok(record) => read_back.rows.push(record),
                Err(e) => {
                    read_back.unreadable += 1;
                    warn!(row = index + 1, error = %e, "Skipping unreadable stored row");
                }
            }
        }

        Ok(read_back)
    }
}

fn malformed(reason: impl Into<String>) -> StoreError {
    StoreError::MalformedRow {
        table: schema::SUBMISSIONS_TABLE.to_string(),
        reason: reason.into(),
    }
}

fn text(value: &Value, column: &str) -> StoreResult<String> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Real(r) => Ok(r.to_string()),
        Value::Null => Ok(String::new()),
        Value::Blob(_) => Err(malformed(format!("{} is a blob", column))),
    }
}

fn integer(value: &Value, column: &str) -> StoreResult<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        // Only whole reals inside the i64 range convert
        Value::Real(r) if r.fract() == 0.0 && *r >= i64::MIN as f64 && *r < i64::MAX as f64 => {
            Ok(*r as i64)
        }
        Value::Text(s) => s
            .parse()
            .map_err(|_| malformed(format!("{} is not an integer: {:?}", column, s))),
        _ => Err(malformed(format!("{} is not an integer", column))),
    }
}

fn real(value: &Value, column: &str) -> StoreResult<f64> {
    match value {
        Value::Real(r) => Ok(*r),
        Value::Integer(i) => Ok(*i as f64),
        Value::Text(s) => s
            .parse()
            .map_err(|_| malformed(format!("{} is not a number: {:?}", column, s))),
        _ => Err(malformed(format!("{} is not a number", column))),
    }
}

/// Convert a `submissions` row back into a record
pub fn row_to_submission(row: Row) -> StoreResult<SubmissionRecord> {
    let [id, author, title, score, ratio, created, subreddit]: [Value; 7] = row
        .try_into()
        .map_err(|row: Row| malformed(format!("expected 7 columns, got {}", row.len())))?;

    let created_text = text(&created, "created")?;
    let created = NaiveDate::parse_from_str(&created_text, CREATED_FORMAT)
        .map_err(|e| malformed(format!("created {:?}: {}", created_text, e)))?;

    Ok(SubmissionRecord {
        id: text(&id, "id")?,
        author: text(&author, "author")?,
        title: text(&title, "title")?,
        score: integer(&score, "score")?,
        upvote_ratio: real(&ratio, "upvote_ratio")?,
        created,
        subreddit: text(&subreddit, "subreddit")?,
    })
}
