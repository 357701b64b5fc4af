//! Ingestion Module - Batched load of delimited extracts into PostgreSQL
//!
//! Control flow:
//! - `DatabasePopulator` walks the `TableRegistry`
//! - `TablePopulator` drops and recreates one table, then loads its files
//! - `ChunkedLoader` reads, renames and transforms one file and writes it
//!   chunk by chunk
//! - `IndexBuilder` runs once at the end

pub mod descriptor;
pub mod indices;
pub mod loader;
pub mod populator;
pub mod progress;
pub mod reader;
pub mod registry;
pub mod report;
pub mod transform;

pub use descriptor::{ColumnDef, ColumnType, TableDescriptor};
pub use indices::{default_indices, IndexBuilder, IndexSpec};
pub use loader::ChunkedLoader;
pub use populator::{DatabasePopulator, TablePopulator};
pub use progress::{ConsoleProgress, Progress, SilentProgress};
pub use registry::TableRegistry;
pub use report::{ChunkFailure, DatabaseReport, FileFailure, FileReport, TableReport};
pub use transform::Transform;
