//! Database module for PostgreSQL connection and writes

pub mod connection;
pub mod sink;

pub use connection::Database;
pub use sink::{encode_chunk, TableSink};
