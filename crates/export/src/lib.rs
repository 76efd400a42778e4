//! Spreadsheet export of chunk records.

pub mod table;
pub mod xlsx;

pub use table::{Cell, ExportTable, build_table, column_widths};
pub use xlsx::{export_chunks, write_xlsx};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No chunks to export")]
    Empty,

    #[error("Failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, ExportError>;
