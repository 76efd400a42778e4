use records::Chunk;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

use crate::table::{Cell, ExportTable, build_table, column_widths};
use crate::Result;

const SHEET_NAME: &str = "Chunks";

/// Writes the table as a single-sheet workbook at `path`.
pub fn write_xlsx(table: &ExportTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &bold)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Some(Cell::Number(n)) => {
                    sheet.write_number(row_num, col as u16, *n)?;
                }
                Some(Cell::Text(s)) => {
                    sheet.write_string(row_num, col as u16, s)?;
                }
                None => {}
            }
        }
    }

    for (col, width) in column_widths(table).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width as f64)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Flattens `chunks` and writes them to `path`.
pub fn export_chunks(chunks: &[Chunk], path: &Path) -> Result<()> {
    let table = build_table(chunks)?;
    write_xlsx(&table, path)?;
    info!(
        rows = table.rows.len(),
        columns = table.headers.len(),
        path = %path.display(),
        "exported chunks"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExportError;
    use records::ChunkMetadata;

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks_export.xlsx");
        let chunks = vec![Chunk::new("c1", "hello", ChunkMetadata::default())];

        export_chunks(&chunks, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_export_empty_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.xlsx");

        let err = export_chunks(&[], &path).unwrap_err();
        assert!(matches!(err, ExportError::Empty));
        assert!(!path.exists());
    }
}
