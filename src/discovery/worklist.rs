//! Work list construction
//!
//! Turns a work source (directory scan, list file, or single id) into a
//! deduplicated list of resolved work items.

use crate::config::WorkSource;
use crate::discovery::{paths, scanner};
use crate::error::{Result, YtfexError};
use crate::types::WorkItem;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// Name of the identifier column in tabular list files
pub const ID_COLUMN: &str = "yt_id";

/// Build the work list for a batch run
///
/// List-based identifiers are deduplicated with set semantics, so their
/// order is not preserved.
pub fn build(source: &WorkSource, base_dir: &Path, delimiter: Option<u8>) -> Result<Vec<WorkItem>> {
    match source {
        WorkSource::Directory(root) => scanner::scan(root),
        WorkSource::List(list_file) => {
            let ids = read_ids(list_file, delimiter)?;
            info!("Work list: {} unique identifiers", ids.len());
            Ok(items_for_ids(base_dir, ids.into_iter()))
        }
        WorkSource::Single(id) => Ok(items_for_ids(base_dir, std::iter::once(id.clone()))),
    }
}

/// Resolve identifiers to work items via the deterministic path rules
fn items_for_ids(base_dir: &Path, ids: impl Iterator<Item = String>) -> Vec<WorkItem> {
    ids.filter_map(|id| {
        let input = paths::input_path(base_dir, &id);
        let output = paths::output_path(base_dir, &id);
        match (input, output) {
            (Some(input), Some(output)) => Some(WorkItem::new(input, output)),
            _ => {
                warn!("Skipping empty track identifier");
                None
            }
        }
    })
    .collect()
}

/// Read unique identifiers from a list file
///
/// The format is chosen by extension: `.csv` and `.parquet` files must carry
/// a `yt_id` column; anything else is treated as one identifier per line.
pub fn read_ids(path: &Path, delimiter: Option<u8>) -> Result<HashSet<String>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => read_csv_ids(path, delimiter),
        "parquet" => read_parquet_ids(path),
        _ => read_text_ids(path),
    }
}

/// Plain newline-delimited identifier list
fn read_text_ids(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| YtfexError::worklist_error(path, e.to_string()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// CSV list with a `yt_id` column
///
/// Without an explicit delimiter, a comma is tried first and a semicolon as
/// fallback, mirroring how exported spreadsheets commonly differ.
fn read_csv_ids(path: &Path, delimiter: Option<u8>) -> Result<HashSet<String>> {
    match delimiter {
        Some(d) => read_csv_with_delimiter(path, d),
        None => read_csv_with_delimiter(path, b',')
            .or_else(|_| read_csv_with_delimiter(path, b';')),
    }
}

fn read_csv_with_delimiter(path: &Path, delimiter: u8) -> Result<HashSet<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| YtfexError::worklist_error(path, e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| YtfexError::worklist_error(path, e.to_string()))?;
    let column = headers.iter().position(|h| h == ID_COLUMN).ok_or_else(|| {
        YtfexError::worklist_error(path, format!("no '{ID_COLUMN}' column"))
    })?;

    let mut ids = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| YtfexError::worklist_error(path, e.to_string()))?;
        if let Some(id) = record.get(column) {
            let id = id.trim();
            if !id.is_empty() {
                ids.insert(id.to_string());
            }
        }
    }
    debug!("Parsed {} ids from CSV {}", ids.len(), path.display());
    Ok(ids)
}

/// Parquet list with a `yt_id` column
fn read_parquet_ids(path: &Path) -> Result<HashSet<String>> {
    let file = File::open(path).map_err(|e| YtfexError::worklist_error(path, e.to_string()))?;
    let reader = SerializedFileReader::new(file)
        .map_err(|e| YtfexError::worklist_error(path, e.to_string()))?;

    let mut ids = HashSet::new();
    let rows = reader
        .get_row_iter(None)
        .map_err(|e| YtfexError::worklist_error(path, e.to_string()))?;
    for row in rows {
        let row = row.map_err(|e| YtfexError::worklist_error(path, e.to_string()))?;
        for (name, field) in row.get_column_iter() {
            if name == ID_COLUMN {
                if let Field::Str(id) = field {
                    let id = id.trim();
                    if !id.is_empty() {
                        ids.insert(id.to_string());
                    }
                }
            }
        }
    }
    debug!("Parsed {} ids from parquet {}", ids.len(), path.display());
    Ok(ids)
}
