//! Populators - Drop, recreate and reload tables file by file
//!
//! A file that fails is logged and recorded; the remaining files of the table
//! and the remaining tables are still attempted. The only exception is a
//! lost database connection, which ends the run.

use crate::config::LoaderConfig;
use crate::db::TableSink;
use crate::error::{LoadError, Result};
use crate::ingestion::descriptor::TableDescriptor;
use crate::ingestion::loader::ChunkedLoader;
use crate::ingestion::progress::Progress;
use crate::ingestion::registry::TableRegistry;
use crate::ingestion::report::{DatabaseReport, FileFailure, TableReport};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

pub struct TablePopulator<'a> {
    sink: &'a dyn TableSink,
    progress: &'a dyn Progress,
    loader: ChunkedLoader<'a>,
}

impl<'a> TablePopulator<'a> {
    pub fn new(sink: &'a dyn TableSink, progress: &'a dyn Progress, config: LoaderConfig) -> Self {
        Self {
            sink,
            progress,
            loader: ChunkedLoader::new(sink, progress, config),
        }
    }

    /// Replace the table's content with the rows of `filenames`, in order.
    ///
    /// The table is dropped and recreated from the descriptor's schema in one
    /// committed transaction before the first file is read. Failing to do so
    /// is returned as an error since nothing can be loaded afterwards.
    pub async fn populate(
        &self,
        descriptor: &TableDescriptor,
        folder: &Path,
        filenames: &[String],
    ) -> Result<TableReport> {
        let started = Instant::now();
        let table = descriptor.table_name.as_str();
        let mut report = TableReport::new(table, &descriptor.label);

        self.progress.table_started(&descriptor.label);

        self.sink
            .execute_in_transaction(&[descriptor.drop_statement(), descriptor.create_statement()])
            .await?;
        info!(table, "table dropped and recreated");

        for filename in filenames {
            self.progress.file_started(table, filename);
            match self.loader.load(descriptor, folder, filename).await {
                Ok(file_report) => report.files.push(file_report),
                Err(LoadError::ConnectionLost(cause)) => {
                    report.file_failures.push(FileFailure {
                        filename: filename.clone(),
                        cause: cause.clone(),
                    });
                    return Err(LoadError::ConnectionLost(cause));
                }
                Err(e) => {
                    let failure = LoadError::FileLoad {
                        table: table.to_string(),
                        file: filename.clone(),
                        cause: e.to_string(),
                    };
                    error!(table, file = %filename, "{}", failure);
                    report.file_failures.push(FileFailure {
                        filename: filename.clone(),
                        cause: e.to_string(),
                    });
                }
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        self.progress.table_finished(&descriptor.label);
        info!(
            table,
            files_loaded = report.files_loaded(),
            files_failed = report.files_failed(),
            rows = report.rows_loaded(),
            elapsed = ?started.elapsed(),
            "Popular tabela"
        );
        Ok(report)
    }
}

/// Drives a [`TablePopulator`] over every table of a registry
pub struct DatabasePopulator<'a> {
    registry: &'a TableRegistry,
    tables: TablePopulator<'a>,
}

impl<'a> DatabasePopulator<'a> {
    pub fn new(
        sink: &'a dyn TableSink,
        progress: &'a dyn Progress,
        registry: &'a TableRegistry,
        config: LoaderConfig,
    ) -> Self {
        Self {
            registry,
            tables: TablePopulator::new(sink, progress, config),
        }
    }

    /// Populate every registered table, in registry order, with its files.
    ///
    /// Tables without an entry (or with no files) in `files` are skipped and
    /// keep whatever they held. A lost connection stops the run; the report
    /// then says so in `aborted`.
    pub async fn populate(&self, folder: &Path, files: &HashMap<String, Vec<String>>) -> DatabaseReport {
        let started = Instant::now();
        let mut report = DatabaseReport::new();

        for descriptor in self.registry.iter() {
            let table = descriptor.table_name.as_str();
            let filenames = match files.get(table) {
                Some(filenames) if !filenames.is_empty() => filenames,
                _ => {
                    warn!(table, "no files to load, table left untouched");
                    report.skipped_tables.push(table.to_string());
                    continue;
                }
            };

            match self.tables.populate(descriptor, folder, filenames).await {
                Ok(table_report) => report.tables.push(table_report),
                Err(e) if e.is_connection_loss() => {
                    error!(table, "stopping load: {}", e);
                    report.aborted = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    error!(table, "failed to prepare table: {}", e);
                    let mut table_report = TableReport::new(table, &descriptor.label);
                    table_report.file_failures = filenames
                        .iter()
                        .map(|filename| FileFailure {
                            filename: filename.clone(),
                            cause: e.to_string(),
                        })
                        .collect();
                    report.tables.push(table_report);
                }
            }
        }

        report.finish();
        info!(
            tables = report.tables.len(),
            rows = report.rows_loaded(),
            elapsed = ?started.elapsed(),
            "Popular banco"
        );
        report
    }
}
