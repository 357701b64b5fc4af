//! Shared fixtures: an in-memory sink that records every call and a progress
//! observer that records every event

#![allow(dead_code)]

use async_trait::async_trait;
use cnpj_loader::error::{LoadError, Result};
use cnpj_loader::ingestion::{Progress, TableDescriptor};
use cnpj_loader::TableSink;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq)]
pub enum SinkEvent {
    /// One committed transaction with its statements, in order
    Transaction(Vec<String>),
    Insert { table: String, rows: usize },
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    inserted: Mutex<Vec<DataFrame>>,
    insert_calls: Mutex<usize>,
    /// 1-based insert call numbers that fail with a row error
    failing_inserts: HashSet<usize>,
    /// 1-based insert call number from which the connection is gone
    disconnect_at: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            failing_inserts: calls.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn disconnecting_at(call: usize) -> Self {
        Self {
            disconnect_at: Some(call),
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn insert_sizes(&self) -> Vec<usize> {
        self.insert_calls_for(None)
    }

    pub fn insert_calls_for(&self, table: Option<&str>) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Insert { table: t, rows } if table.map_or(true, |name| name == t) => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub fn statements(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Transaction(statements) => Some(statements),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Chunks that were accepted, in insertion order
    pub fn inserted(&self) -> Vec<DataFrame> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableSink for RecordingSink {
    async fn execute_in_transaction(&self, statements: &[String]) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Transaction(statements.to_vec()));
        Ok(())
    }

    async fn insert_chunk(&self, descriptor: &TableDescriptor, chunk: &DataFrame) -> Result<u64> {
        let call = {
            let mut calls = self.insert_calls.lock().unwrap();
            *calls += 1;
            *calls
        };

        if self.disconnect_at.is_some_and(|at| call >= at) {
            return Err(LoadError::Database(sqlx::Error::PoolClosed));
        }

        self.events.lock().unwrap().push(SinkEvent::Insert {
            table: descriptor.table_name.clone(),
            rows: chunk.height(),
        });

        if self.failing_inserts.contains(&call) {
            return Err(LoadError::Database(sqlx::Error::Protocol(
                "invalid input syntax for type date".to_string(),
            )));
        }

        self.inserted.lock().unwrap().push(chunk.clone());
        Ok(chunk.height() as u64)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    TableStarted(String),
    FileStarted(String),
    Chunk { rows_done: usize, total: usize },
    FileFinished { filename: String, total: usize },
    TableFinished(String),
    IndicesStarted,
    IndicesFinished(Vec<String>),
}

#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Progress for RecordingProgress {
    fn table_started(&self, label: &str) {
        self.push(ProgressEvent::TableStarted(label.to_string()));
    }

    fn file_started(&self, _table: &str, filename: &str) {
        self.push(ProgressEvent::FileStarted(filename.to_string()));
    }

    fn chunk_loaded(&self, _table: &str, rows_done: usize, total: usize) {
        self.push(ProgressEvent::Chunk { rows_done, total });
    }

    fn file_finished(&self, _table: &str, filename: &str, total: usize) {
        self.push(ProgressEvent::FileFinished {
            filename: filename.to_string(),
            total,
        });
    }

    fn table_finished(&self, label: &str) {
        self.push(ProgressEvent::TableFinished(label.to_string()));
    }

    fn indices_started(&self) {
        self.push(ProgressEvent::IndicesStarted);
    }

    fn indices_finished(&self, tables: &[String]) {
        self.push(ProgressEvent::IndicesFinished(tables.to_vec()));
    }
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// `rows` lines of `;`-separated cells `r<i>c<j>`
pub fn delimited_rows(rows: usize, columns: usize) -> String {
    (0..rows)
        .map(|i| {
            (0..columns)
                .map(|j| format!("r{}c{}", i, j))
                .collect::<Vec<_>>()
                .join(";")
                + "\n"
        })
        .collect()
}

pub fn two_column_table() -> TableDescriptor {
    TableDescriptor::new("letras", "letras", &["a", "b"], "utf-8")
}
