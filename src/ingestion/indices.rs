//! Index Builder - Lookup indices created once every table is loaded

use crate::db::TableSink;
use crate::error::Result;
use crate::ingestion::descriptor::quote_ident;
use crate::ingestion::progress::Progress;
use std::time::Instant;
use tracing::info;

/// Column every CNPJ table can be joined on
pub const KEY_COLUMN: &str = "cnpj_basico";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub table: String,
    pub column: String,
}

impl IndexSpec {
    pub fn new(name: &str, table: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    /// Re-running against an already indexed table is a no-op
    pub fn create_statement(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&self.name),
            quote_ident(&self.table),
            quote_ident(&self.column)
        )
    }
}

/// `<table>_cnpj` on `cnpj_basico` for the four company tables
pub fn default_indices() -> Vec<IndexSpec> {
    ["empresa", "estabelecimento", "socios", "simples"]
        .iter()
        .map(|table| IndexSpec::new(&format!("{}_cnpj", table), table, KEY_COLUMN))
        .collect()
}

pub struct IndexBuilder {
    indices: Vec<IndexSpec>,
}

impl IndexBuilder {
    pub fn new(indices: Vec<IndexSpec>) -> Self {
        Self { indices }
    }

    /// Create every index, one statement at a time, committing once
    pub async fn build(&self, sink: &dyn TableSink, progress: &dyn Progress) -> Result<()> {
        let started = Instant::now();
        progress.indices_started();

        let statements: Vec<String> = self.indices.iter().map(|i| i.create_statement()).collect();
        sink.execute_in_transaction(&statements).await?;

        let tables: Vec<String> = self.indices.iter().map(|i| i.table.clone()).collect();
        progress.indices_finished(&tables);
        info!(indices = statements.len(), elapsed = ?started.elapsed(), "Criar indices do banco");
        Ok(())
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(default_indices())
    }
}
