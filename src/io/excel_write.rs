use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Writes the provided sheets to the given path, header row first.
pub fn write_workbook(path: &Path, tables: &[SheetTable]) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for table in tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, header)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
            }
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}
