//! Load reports - What happened to every chunk, file and table of a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk that could not be written
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkFailure {
    /// 1-based chunk number within the file
    pub chunk: usize,
    pub rows: usize,
    pub cause: String,
}

/// Outcome of loading one file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileReport {
    pub filename: String,
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub chunks_loaded: usize,
    pub chunk_failures: Vec<ChunkFailure>,
}

impl FileReport {
    pub fn new(filename: &str, rows_read: usize) -> Self {
        Self {
            filename: filename.to_string(),
            rows_read,
            ..Default::default()
        }
    }

    pub fn record_loaded(&mut self, rows: usize) {
        self.chunks_loaded += 1;
        self.rows_loaded += rows;
    }

    pub fn record_failed(&mut self, chunk: usize, rows: usize, cause: String) {
        self.chunk_failures.push(ChunkFailure { chunk, rows, cause });
    }

    pub fn chunks_failed(&self) -> usize {
        self.chunk_failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.chunk_failures.is_empty() && self.rows_loaded == self.rows_read
    }
}

/// A file the populator gave up on
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileFailure {
    pub filename: String,
    pub cause: String,
}

/// Outcome of populating one table
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TableReport {
    pub table_name: String,
    pub label: String,
    pub files: Vec<FileReport>,
    pub file_failures: Vec<FileFailure>,
    pub elapsed_ms: u64,
}

impl TableReport {
    pub fn new(table_name: &str, label: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn files_loaded(&self) -> usize {
        self.files.len()
    }

    pub fn files_failed(&self) -> usize {
        self.file_failures.len()
    }

    pub fn rows_loaded(&self) -> usize {
        self.files.iter().map(|f| f.rows_loaded).sum()
    }

    pub fn chunks_loaded(&self) -> usize {
        self.files.iter().map(|f| f.chunks_loaded).sum()
    }

    pub fn chunks_failed(&self) -> usize {
        self.files.iter().map(|f| f.chunks_failed()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed() > 0 || self.chunks_failed() > 0
    }
}

/// Outcome of a whole run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub tables: Vec<TableReport>,

    /// Tables that had no file to load and were left untouched
    pub skipped_tables: Vec<String>,

    /// Set when the run stopped early because the database went away
    pub aborted: Option<String>,
}

impl DatabaseReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            tables: Vec::new(),
            skipped_tables: Vec::new(),
            aborted: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn table(&self, table_name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table_name == table_name)
    }

    pub fn rows_loaded(&self) -> usize {
        self.tables.iter().map(|t| t.rows_loaded()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.aborted.is_some() || self.tables.iter().any(|t| t.has_failures())
    }
}

impl Default for DatabaseReport {
    fn default() -> Self {
        Self::new()
    }
}
