//! Chunked Loader - Reads one file, transforms it and appends it to its table
//! in bounded batches
//!
//! Each chunk is written on its own: a failing chunk is logged and recorded,
//! and the next one is attempted. Only a lost connection stops the file.

use crate::config::LoaderConfig;
use crate::db::TableSink;
use crate::error::{LoadError, Result};
use crate::ingestion::descriptor::TableDescriptor;
use crate::ingestion::progress::Progress;
use crate::ingestion::reader::{assign_column_names, read_raw};
use crate::ingestion::report::FileReport;
use polars::prelude::*;
use std::path::Path;
use tracing::{error, info};

pub struct ChunkedLoader<'a> {
    sink: &'a dyn TableSink,
    progress: &'a dyn Progress,
    config: LoaderConfig,
}

impl<'a> ChunkedLoader<'a> {
    pub fn new(sink: &'a dyn TableSink, progress: &'a dyn Progress, config: LoaderConfig) -> Self {
        Self {
            sink,
            progress,
            config,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size.max(1)
    }

    /// Load `folder/filename` into the descriptor's table.
    ///
    /// Read, rename and transform errors fail the whole file. Chunk errors
    /// are recorded in the returned report, except a lost connection which
    /// is returned as [`LoadError::ConnectionLost`].
    pub async fn load(
        &self,
        descriptor: &TableDescriptor,
        folder: &Path,
        filename: &str,
    ) -> Result<FileReport> {
        let batch = self.prepare(descriptor, folder, filename)?;
        self.write_chunks(descriptor, filename, &batch).await
    }

    /// Parse, rename and transform one file into its canonical batch
    pub fn prepare(&self, descriptor: &TableDescriptor, folder: &Path, filename: &str) -> Result<DataFrame> {
        let path = folder.join(filename);
        let raw = read_raw(&path, &descriptor.encoding, self.config.delimiter)?;
        let named = assign_column_names(raw, &descriptor.columns, filename)?;
        let canonical = (descriptor.transform)(named)?;
        check_canonical(descriptor, &canonical, filename)?;
        Ok(canonical)
    }

    async fn write_chunks(
        &self,
        descriptor: &TableDescriptor,
        filename: &str,
        batch: &DataFrame,
    ) -> Result<FileReport> {
        let table = descriptor.table_name.as_str();
        let total = batch.height();
        let chunk_size = self.chunk_size();
        let mut report = FileReport::new(filename, total);

        for (index, offset) in (0..total).step_by(chunk_size).enumerate() {
            let chunk = batch.slice(offset as i64, chunk_size);
            let rows = chunk.height();

            match self.sink.insert_chunk(descriptor, &chunk).await {
                Ok(_) => {
                    report.record_loaded(rows);
                    self.progress.chunk_loaded(table, offset + rows, total);
                }
                Err(e) if e.is_connection_loss() => {
                    error!(table, file = filename, chunk = index + 1, "connection lost: {}", e);
                    return Err(LoadError::ConnectionLost(e.to_string()));
                }
                Err(e) => {
                    let failure = LoadError::ChunkInsert {
                        table: table.to_string(),
                        file: filename.to_string(),
                        chunk: index + 1,
                        cause: e.to_string(),
                    };
                    error!(table, file = filename, chunk = index + 1, rows, "{}", failure);
                    report.record_failed(index + 1, rows, e.to_string());
                }
            }
        }

        self.progress.file_finished(table, filename, total);
        info!(
            table,
            file = filename,
            rows_read = report.rows_read,
            rows_loaded = report.rows_loaded,
            chunks_failed = report.chunks_failed(),
            "file loaded"
        );
        Ok(report)
    }
}

/// The transform must hand back exactly the declared canonical columns
fn check_canonical(descriptor: &TableDescriptor, batch: &DataFrame, filename: &str) -> Result<()> {
    let found: Vec<String> = batch.get_column_names().iter().map(|c| c.to_string()).collect();
    let expected = descriptor.schema_names();
    if found.len() != expected.len() || found.iter().zip(&expected).any(|(f, e)| f.as_str() != *e) {
        return Err(LoadError::SchemaMismatch {
            file: filename.to_string(),
            expected: expected.join(","),
            found: found.join(","),
        });
    }
    Ok(())
}
