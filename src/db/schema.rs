//! Table definitions for the submission store
//!
//! Tables are described by static `TableSpec`s. The store only accepts table
//! and column names that appear in a spec it was constructed with, so no SQL
//! identifier ever comes from runtime input.

use crate::error::{StoreError, StoreResult};
use crate::types::SubmissionRecord;
use rusqlite::types::Value;

/// A single column declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name
    pub name: &'static str,

    /// Declared type; `None` leaves the column untyped
    pub sql_type: Option<&'static str>,
}

impl ColumnSpec {
    /// Column with a declared type
    pub const fn typed(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type: Some(sql_type),
        }
    }

    /// Column without a declared type
    pub const fn untyped(name: &'static str) -> Self {
        Self {
            name,
            sql_type: None,
        }
    }

    fn definition(&self) -> String {
        match self.sql_type {
            Some(ty) => format!("\"{}\" {}", self.name, ty),
            None => format!("\"{}\"", self.name),
        }
    }
}

/// A table declaration: name plus ordered columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    /// Check every identifier in the spec
    pub fn validate(&self) -> StoreResult<()> {
        validate_identifier(self.name)?;
        for column in self.columns {
            validate_identifier(column.name)?;
            if let Some(ty) = column.sql_type {
                validate_identifier(ty)?;
            }
        }
        Ok(())
    }

    /// Check that `column` is declared by this table
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this spec
    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnSpec::definition).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            self.name,
            columns.join(", ")
        )
    }

    /// Parameterized `INSERT` statement with one placeholder per column
    pub fn insert_sql(&self) -> String {
        let names: Vec<String> = self.columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.name,
            names.join(", "),
            placeholders.join(", ")
        )
    }
}

/// Reject anything that is not a plain `[A-Za-z_][A-Za-z0-9_]*` identifier
pub fn validate_identifier(ident: &str) -> StoreResult<()> {
    let mut chars = ident.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(ident.to_string()))
    }
}

/// Name of the submissions table
pub const SUBMISSIONS_TABLE: &str = "submissions";

/// Submissions table. Only `id` carries a declared type, which keeps the
/// layout compatible with stores written by earlier harvester versions.
pub const SUBMISSIONS: TableSpec = TableSpec {
    name: SUBMISSIONS_TABLE,
    columns: &[
        ColumnSpec::typed("id", "TEXT"),
        ColumnSpec::untyped("author"),
        ColumnSpec::untyped("title"),
        ColumnSpec::untyped("score"),
        ColumnSpec::untyped("upvote_ratio"),
        ColumnSpec::untyped("created"),
        ColumnSpec::untyped("subreddit"),
    ],
};

/// Row values for a submission, in `SUBMISSIONS` column order
pub fn submission_values(record: &SubmissionRecord) -> Vec<Value> {
    vec![
        Value::Text(record.id.clone()),
        Value::Text(record.author.clone()),
        Value::Text(record.title.clone()),
        Value::Integer(record.score),
        Value::Real(record.upvote_ratio),
        Value::Text(record.created_text()),
        Value::Text(record.subreddit.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_submissions_spec_valid() {
        SUBMISSIONS.validate().unwrap();
        assert_eq!(SUBMISSIONS.columns.len(), 7);
        assert!(SUBMISSIONS.has_column("upvote_ratio"));
        assert!(!SUBMISSIONS.has_column("url"));
    }

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("submissions").is_ok());
        assert!(validate_identifier("_tmp2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("id; DROP TABLE x").is_err());
        assert!(validate_identifier("a\"b").is_err());
    }

    #[test]
    fn test_generated_sql() {
        assert_eq!(
            SUBMISSIONS.create_sql(),
            "CREATE TABLE IF NOT EXISTS \"submissions\" (\"id\" TEXT, \"author\", \"title\", \
             \"score\", \"upvote_ratio\", \"created\", \"subreddit\")"
        );
        assert!(SUBMISSIONS.insert_sql().ends_with("VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"));
    }

    #[test]
    fn test_submission_values_order() {
        let record = SubmissionRecord {
            id: "q1".into(),
            author: "me".into(),
            title: "t".into(),
            score: 7,
            upvote_ratio: 0.5,
            created: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            subreddit: "aww".into(),
        };
        let values = submission_values(&record);
        assert_eq!(values.len(), SUBMISSIONS.columns.len());
        assert_eq!(values[0], Value::Text("q1".into()));
        assert_eq!(values[3], Value::Integer(7));
        assert_eq!(values[5], Value::Text("01-02-2020".into()));
        assert_eq!(values[6], Value::Text("aww".into()));
    }
}
