use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error connecting to database: {0}")]
    Connection(String),

    #[error("Connection to the database was lost: {0}")]
    ConnectionLost(String),

    #[error("Unsupported encoding: {0}")]
    Encoding(String),

    #[error("Schema mismatch in file {file}: expected {expected} columns, found {found}")]
    SchemaMismatch {
        file: String,
        expected: String,
        found: String,
    },

    #[error("Failed to insert chunk {chunk} for table {table} on file {file}: {cause}")]
    ChunkInsert {
        table: String,
        file: String,
        chunk: usize,
        cause: String,
    },

    #[error("Failed to load file {file} into table {table}: {cause}")]
    FileLoad {
        table: String,
        file: String,
        cause: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LoadError {
    /// True when the error means the database can no longer be reached, as
    /// opposed to a problem with the rows being written.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            LoadError::ConnectionLost(_) => true,
            LoadError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
