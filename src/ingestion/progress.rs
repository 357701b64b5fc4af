//! Progress - Human-facing console output of a load run
//!
//! Kept apart from `tracing` output: progress lines are rewritten in place
//! with `\r` and banners are meant for a terminal, not a log collector.

use std::io::Write;

/// Fence printed above and below table banners
pub const FENCE: &str = "#######################################";

/// Observer of a load run. Every method defaults to doing nothing.
pub trait Progress: Send + Sync {
    /// A table is about to be dropped and reloaded
    fn table_started(&self, _label: &str) {}

    /// A file is about to be read
    fn file_started(&self, _table: &str, _filename: &str) {}

    /// A chunk was written; `rows_done` counts rows of the file so far
    fn chunk_loaded(&self, _table: &str, _rows_done: usize, _total: usize) {}

    /// Every chunk of a file has been attempted
    fn file_finished(&self, _table: &str, _filename: &str, _total: usize) {}

    fn table_finished(&self, _label: &str) {}

    fn indices_started(&self) {}

    fn indices_finished(&self, _tables: &[String]) {}
}

/// Discards every event
pub struct SilentProgress;

impl Progress for SilentProgress {}

/// Writes banners and progress lines to stdout
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn table_started(&self, label: &str) {
        println!("{}\n## Arquivos de {}:\n{}", FENCE, label.to_uppercase(), FENCE);
    }

    fn file_started(&self, _table: &str, filename: &str) {
        println!("Trabalhando no arquivo: {} [...]", filename);
    }

    fn chunk_loaded(&self, table: &str, rows_done: usize, total: usize) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r{}", progress_line(table, rows_done, total));
        let _ = stdout.flush();
    }

    fn file_finished(&self, table: &str, filename: &str, total: usize) {
        println!("\r{}", completion_line(table, total));
        println!("Arquivo {} inserido no banco de dados!", filename);
    }

    fn table_finished(&self, label: &str) {
        println!("Arquivos de {} finalizados!", label);
    }

    fn indices_started(&self) {
        println!("{}\n## Criar índices na base de dados [...]\n{}", FENCE, FENCE);
    }

    fn indices_finished(&self, tables: &[String]) {
        println!("{}", FENCE);
        println!("## Índices criados nas tabelas, para a coluna `cnpj_basico`:");
        for table in tables {
            println!("- {}", table);
        }
        println!("{}", FENCE);
    }
}

/// `"empresa 40.00% 02/05"`: percentage and zero-padded counter
pub fn progress_line(table: &str, rows_done: usize, total: usize) -> String {
    let percent = if total == 0 {
        100.0
    } else {
        rows_done as f64 * 100.0 / total as f64
    };
    let width = total.to_string().len();
    format!("{} {:.2}% {:0width$}/{}", table, percent, rows_done, total, width = width)
}

/// `"empresa 100% 5/5"`
pub fn completion_line(table: &str, total: usize) -> String {
    format!("{} 100% {}/{}", table, total, total)
}
