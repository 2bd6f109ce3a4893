//! Spreadsheet export with typed cells.

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::info;

use crate::domain::{CellValue, RawTable};
use crate::error::Result;

/// One data sheet: a table truncated to `row_limit` rows.
pub struct SheetSpec<'a> {
    pub name: &'a str,
    pub table: &'a RawTable,
    pub row_limit: usize,
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: CellValue<'_>) -> Result<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, b)?;
        }
        CellValue::Int(i) => {
            sheet.write_number(row, col, i as f64)?;
        }
        CellValue::Float(f) => {
            sheet.write_number(row, col, f)?;
        }
        CellValue::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

fn write_header(sheet: &mut Worksheet, headers: &[String], bold: &Format) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, bold)?;
    }
    Ok(())
}

/// Writes the data sheets followed by a two-column `Summary` sheet.
pub fn write_workbook(path: &Path, sheets: &[SheetSpec<'_>], summary: &[(String, String)]) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for spec in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(spec.name)?;
        write_header(sheet, spec.table.headers(), &bold)?;
        for (r, cells) in spec.table.head(spec.row_limit).enumerate() {
            for (c, (header, cell)) in spec.table.headers().iter().zip(cells).enumerate() {
                write_cell(sheet, r as u32 + 1, c as u16, CellValue::infer_in(header, cell))?;
            }
        }
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;
    write_header(sheet, &["Metric".to_string(), "Value".to_string()], &bold)?;
    for (r, (metric, value)) in summary.iter().enumerate() {
        sheet.write_string(r as u32 + 1, 0, metric)?;
        write_cell(sheet, r as u32 + 1, 1, CellValue::infer(value))?;
    }

    workbook.save(path)?;
    info!("Workbook saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workbook_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let table = RawTable::from_reader("name,count,flag\nAcme,3,true\n,0.5,\n".as_bytes()).unwrap();
        let sheets = [SheetSpec { name: "Companies", table: &table, row_limit: 10 }];
        let summary = vec![("Companies".to_string(), "2".to_string())];

        write_workbook(&path, &sheets, &summary).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }
}
