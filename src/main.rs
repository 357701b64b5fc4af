use cnpj_loader::config::LoaderConfig;
use cnpj_loader::db::Database;
use cnpj_loader::ingestion::{
    default_indices, ConsoleProgress, DatabasePopulator, IndexBuilder, TableRegistry,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cnpj-loader")]
#[command(about = "Load the federal revenue CNPJ extracts into PostgreSQL")]
#[command(version)]
struct Args {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop, recreate and load every table from the extracted files
    Load {
        /// Folder holding the extracted files
        #[arg(short, long, default_value = "extracted")]
        folder: PathBuf,

        /// Only load these tables (repeatable)
        #[arg(short, long = "table")]
        tables: Vec<String>,

        /// Rows per insert batch
        #[arg(long, default_value_t = cnpj_loader::CHUNK_SIZE)]
        chunk_size: usize,

        /// Do not create the cnpj_basico indices afterwards
        #[arg(long)]
        skip_indices: bool,

        /// Write the JSON load report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Create the cnpj_basico indices only
    Index,
    /// List the known tables and their file patterns
    Tables,
    /// Check that the database is reachable
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Commands::Load {
            folder,
            tables,
            chunk_size,
            skip_indices,
            report,
        } => load(folder, tables, chunk_size, skip_indices, report).await,
        Commands::Index => {
            let db = open().await?;
            let result = IndexBuilder::default().build(&db, &ConsoleProgress).await;
            db.close().await;
            result.context("Failed to create indices")
        }
        Commands::Tables => {
            for descriptor in TableRegistry::cnpj().iter() {
                println!(
                    "{:<16} {:<24} {:<8} /{}/  {} columns",
                    descriptor.table_name,
                    descriptor.label,
                    descriptor.encoding,
                    descriptor.expression(),
                    descriptor.columns.len()
                );
            }
            Ok(())
        }
        Commands::Check => {
            let db = open().await?;
            db.close().await;
            println!("✅ Connected successfully!");
            Ok(())
        }
    }
}

async fn open() -> Result<Database> {
    match Database::open_from_env().await {
        Ok(db) => Ok(db),
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("   Check POSTGRES_USER, POSTGRES_PASSWORD, POSTGRES_HOST, POSTGRES_PORT and POSTGRES_DB");
            bail!("database unavailable")
        }
    }
}

async fn load(
    folder: PathBuf,
    tables: Vec<String>,
    chunk_size: usize,
    skip_indices: bool,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let registry = if tables.is_empty() {
        TableRegistry::cnpj()
    } else {
        TableRegistry::cnpj().select(&tables)?
    };

    let files = registry
        .discover_files(&folder)
        .with_context(|| format!("Failed to list {}", folder.display()))?;
    info!(
        folder = %folder.display(),
        files = files.values().map(|f| f.len()).sum::<usize>(),
        "files discovered"
    );

    let db = open().await?;
    let config = LoaderConfig::default().with_chunk_size(chunk_size);
    let progress = ConsoleProgress;

    let report = DatabasePopulator::new(&db, &progress, &registry, config)
        .populate(&folder, &files)
        .await;

    println!("## Processo de carga dos arquivos finalizado!");
    for table in &report.tables {
        println!(
            "- {}: {} rows, {} files loaded, {} files failed, {} chunks failed",
            table.table_name,
            table.rows_loaded(),
            table.files_loaded(),
            table.files_failed(),
            table.chunks_failed()
        );
    }

    if let Some(path) = &report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if let Some(cause) = &report.aborted {
        error!("load aborted: {}", cause);
        db.close().await;
        bail!("load aborted: {}", cause);
    }

    if skip_indices {
        info!("index creation skipped");
    } else {
        let indices = default_indices()
            .into_iter()
            .filter(|index| report.table(&index.table).is_some())
            .collect();
        if let Err(e) = IndexBuilder::new(indices).build(&db, &ConsoleProgress).await {
            error!("Failed to create indices: {}", e);
        }
    }

    if report.has_failures() {
        warn!("some files or chunks failed, see the messages above");
    }

    db.close().await;
    Ok(())
}
