//! Raw Reader - Parses one delimited extract into an all-text DataFrame
//!
//! Columns come out positionally named `0..N-1`; naming them is the job of
//! [`assign_column_names`].

use crate::error::{LoadError, Result};
use csv::ReaderBuilder;
use encoding_rs::Encoding;
use polars::prelude::*;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

/// Text encoding of a source file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceEncoding {
    /// ISO-8859-1: every byte is the code point of the same value
    Latin1,
    Other(&'static Encoding),
}

impl SourceEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            SourceEncoding::Latin1 => "ISO-8859-1",
            SourceEncoding::Other(encoding) => encoding.name(),
        }
    }

    /// Decode `bytes` as this encoding. A leading byte order mark is data,
    /// not a hint. The flag is set when invalid sequences were replaced.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> (Cow<'a, str>, bool) {
        match self {
            SourceEncoding::Latin1 => (encoding_rs::mem::decode_latin1(bytes), false),
            SourceEncoding::Other(encoding) => encoding.decode_without_bom_handling(bytes),
        }
    }
}

/// Resolve an encoding label such as `latin-1` or `utf-8`
pub fn resolve_encoding(label: &str) -> Result<SourceEncoding> {
    let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
    match normalized.as_str() {
        // WHATWG maps these labels to windows-1252, which remaps 0x80-0x9F
        "latin-1" | "latin1" | "l1" | "iso-8859-1" | "iso8859-1" | "iso-ir-100" => {
            Ok(SourceEncoding::Latin1)
        }
        other => Encoding::for_label(other.as_bytes())
            .map(SourceEncoding::Other)
            .ok_or_else(|| LoadError::Encoding(label.to_string())),
    }
}

/// Read `path` as `delimiter`-separated text without a header row.
///
/// Every cell is kept as text; empty cells become null. The first row fixes
/// the width: shorter rows are padded with nulls, longer rows fail the file.
pub fn read_raw(path: &Path, encoding: &str, delimiter: u8) -> Result<DataFrame> {
    let encoding = resolve_encoding(encoding)?;
    let bytes = std::fs::read(path)?;
    let (text, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            file = %path.display(),
            encoding = encoding.name(),
            "file contains bytes invalid for its encoding, replaced"
        );
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut columns: Vec<Vec<Option<String>>> = Vec::new();
    let mut padded = 0usize;
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        if line == 0 {
            columns = vec![Vec::new(); record.len()];
        }
        if record.len() > columns.len() {
            return Err(LoadError::SchemaMismatch {
                file: path.display().to_string(),
                expected: columns.len().to_string(),
                found: format!("{} on line {}", record.len(), line + 1),
            });
        }
        if record.len() < columns.len() {
            padded += 1;
        }
        for (index, cells) in columns.iter_mut().enumerate() {
            cells.push(record.get(index).filter(|field| !field.is_empty()).map(str::to_string));
        }
    }
    if padded > 0 {
        warn!(file = %path.display(), rows = padded, "short rows padded with nulls");
    }

    let series: Vec<Series> = columns
        .into_iter()
        .enumerate()
        .map(|(index, cells)| Series::new(&index.to_string(), cells))
        .collect();
    let df = DataFrame::new(series)?;

    debug!(file = %path.display(), rows = df.height(), columns = df.width(), "read raw file");
    Ok(df)
}

/// Give the positional columns of `df` the descriptor's names, in order.
///
/// Only the column count is checked; a file with the right arity but a
/// different column order is accepted as is.
pub fn assign_column_names(mut df: DataFrame, names: &[String], filename: &str) -> Result<DataFrame> {
    if df.width() != names.len() {
        return Err(LoadError::SchemaMismatch {
            file: filename.to_string(),
            expected: names.len().to_string(),
            found: df.width().to_string(),
        });
    }

    for (index, name) in names.iter().enumerate() {
        df.rename(&index.to_string(), name)?;
    }
    Ok(df)
}
