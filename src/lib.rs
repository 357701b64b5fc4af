pub mod config;
pub mod error;
pub mod ingestion;

// Database module for PostgreSQL
pub mod db;

pub use config::{DbConfig, LoaderConfig, CHUNK_SIZE};
pub use db::{Database, TableSink};
pub use error::{LoadError, Result};
