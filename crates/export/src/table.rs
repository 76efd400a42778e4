use records::Chunk;
use serde_json::Value;
use std::collections::HashMap;

use crate::{ExportError, Result};

pub const MIN_COLUMN_WIDTH: usize = 10;
pub const MAX_COLUMN_WIDTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    /// Display length used for column sizing. Empty text counts as zero.
    pub fn display_len(&self) -> usize {
        match self {
            Self::Number(n) => n.to_string().chars().count(),
            Self::Text(s) => s.chars().count(),
        }
    }
}

/// Flattened chunks: one header row, one row per chunk. A row holds `None`
/// for columns its chunk doesn't have.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<Cell>>>,
}

impl ExportTable {
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn cell(&self, row: usize, header: &str) -> Option<&Cell> {
        let col = self.column(header)?;
        self.rows.get(row)?.get(col)?.as_ref()
    }
}

/// Turns chunks into a table. Fixed columns come first, then every metadata
/// key in the order it is first seen, then the optional top-level extras.
pub fn build_table(chunks: &[Chunk]) -> Result<ExportTable> {
    if chunks.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut headers: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<Vec<(usize, Cell)>> = Vec::with_capacity(chunks.len());

    for (index, chunk) in chunks.iter().enumerate() {
        let mut record = Vec::new();
        let mut put = |key: &str, cell: Cell| {
            let col = *positions.entry(key.to_string()).or_insert_with(|| {
                headers.push(key.to_string());
                headers.len() - 1
            });
            record.push((col, cell));
        };

        put("No", Cell::Number((index + 1) as f64));
        put("ID", Cell::Text(chunk.id.clone()));
        put("Content", Cell::Text(chunk.content.clone()));
        put("Characters", Cell::Number(chunk.char_count() as f64));

        for (key, value) in chunk.metadata.entries() {
            if let Some(text) = stringify(&value) {
                put(&key, Cell::Text(text));
            }
        }

        if let Some(file_id) = chunk.file_id.as_deref().filter(|s| !s.is_empty()) {
            put("File ID", Cell::Text(file_id.to_string()));
        }
        if let Some(n) = chunk.chunk_index {
            put("Chunk Index", Cell::Number(n as f64));
        }
        if let Some(n) = chunk.total_chunks {
            put("Total Chunks", Cell::Number(n as f64));
        }
        if let Some(text) = chunk.page_content.as_deref().filter(|s| !s.is_empty()) {
            put("Page Content", Cell::Text(text.to_string()));
        }

        records.push(record);
    }

    let width = headers.len();
    let rows = records
        .into_iter()
        .map(|record| {
            let mut row = vec![None; width];
            for (col, cell) in record {
                row[col] = Some(cell);
            }
            row
        })
        .collect();

    Ok(ExportTable { headers, rows })
}

/// Width per column: longest header or value plus two, kept within 10..=100.
pub fn column_widths(table: &ExportTable) -> Vec<usize> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = table
                .rows
                .iter()
                .filter_map(|row| row.get(col).and_then(Option::as_ref))
                .map(Cell::display_len)
                .max()
                .unwrap_or(0)
                .max(header.chars().count());
            (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

// Objects and arrays are written as JSON, nulls are skipped.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(_) | Value::Array(_) => Some(value.to_string()),
        other => Some(other.to_string()),
    }
}
