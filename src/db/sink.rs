//! Table Sink - The writes the pipeline needs from a database
//!
//! The populators only talk to a [`TableSink`]; [`Database`] implements it on
//! PostgreSQL, tests implement it in memory.

use crate::db::connection::Database;
use crate::error::Result;
use crate::ingestion::descriptor::TableDescriptor;
use async_trait::async_trait;
use polars::prelude::*;
use sqlx::postgres::PgPoolCopyExt;
use sqlx::Connection;
use tracing::debug;

/// Null marker used in the CSV payload of a `COPY`
pub const COPY_NULL: &str = "\\N";

#[async_trait]
pub trait TableSink: Send + Sync {
    /// Run `statements` one after the other inside a single transaction and
    /// commit once at the end
    async fn execute_in_transaction(&self, statements: &[String]) -> Result<()>;

    /// Append the rows of `chunk` to the descriptor's table, all or nothing.
    /// Returns the number of rows written.
    async fn insert_chunk(&self, descriptor: &TableDescriptor, chunk: &DataFrame) -> Result<u64>;
}

#[async_trait]
impl TableSink for Database {
    async fn execute_in_transaction(&self, statements: &[String]) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let mut tx = conn.begin().await?;
        for statement in statements {
            debug!(%statement, "executing");
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn insert_chunk(&self, descriptor: &TableDescriptor, chunk: &DataFrame) -> Result<u64> {
        let payload = encode_chunk(chunk)?;
        let statement = descriptor.copy_statement();

        let mut copy = self.pool.copy_in_raw(&statement).await?;
        let sent = copy.send(payload).await.map(|_| ());
        if let Err(e) = sent {
            copy.abort(e.to_string()).await?;
            return Err(e.into());
        }
        let rows = copy.finish().await?;
        Ok(rows)
    }
}

/// Serialize a chunk as header-less CSV with [`COPY_NULL`] for nulls.
///
/// Dates are written as ISO-8601 and floats with a dot, which is what
/// PostgreSQL expects for `DATE` and `DOUBLE PRECISION` columns.
pub fn encode_chunk(chunk: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunk = chunk.clone();
    CsvWriter::new(&mut buffer)
        .include_header(false)
        .with_separator(b',')
        .with_null_value(COPY_NULL.to_string())
        .finish(&mut chunk)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_chunk_marks_nulls() {
        let chunk = df!(
            "codigo" => &[Some("01"), None],
            "descricao" => &[Some("Agricultura"), Some("Pecuária")]
        )
        .unwrap();

        let payload = String::from_utf8(encode_chunk(&chunk).unwrap()).unwrap();
        let lines: Vec<&str> = payload.lines().collect();

        assert_eq!(lines, vec!["01,Agricultura", "\\N,Pecuária"]);
    }

    #[test]
    fn test_encode_chunk_quotes_separator() {
        let chunk = df!("nome" => &["SILVA, JOAO"]).unwrap();
        let payload = String::from_utf8(encode_chunk(&chunk).unwrap()).unwrap();
        assert_eq!(payload.trim_end(), "\"SILVA, JOAO\"");
    }

    #[test]
    fn test_encode_empty_chunk() {
        let chunk = df!("codigo" => Vec::<String>::new()).unwrap();
        assert!(encode_chunk(&chunk).unwrap().is_empty());
    }
}
