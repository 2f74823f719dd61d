use crate::error::{ReportError, Result};
use crate::reports::{Report, Table};
use crate::types::Cell;
use crate::util::format_cell;
use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, FormatBorder, Workbook, XlsxError};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

/// Render the report as an xlsx workbook, one worksheet per table.
pub fn report_to_xlsx_bytes(report: &Report) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let date = Format::new().set_num_format("yyyy-mm-dd");

    for table in &report.tables {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&table.name)?;
        for (col, h) in table.headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, h, &header)?;
        }
        for (i, row) in table.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let c = col as u16;
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) => {
                        sheet.write_string(r, c, s)?;
                    }
                    Cell::Number(n) => {
                        sheet.write_number(r, c, *n)?;
                    }
                    Cell::Bool(b) => {
                        sheet.write_boolean(r, c, *b)?;
                    }
                    Cell::Date(d) => {
                        let dt = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
                        sheet.write_datetime_with_format(r, c, &dt, &date)?;
                    }
                }
            }
        }
        sheet.autofit();
    }

    workbook.save_to_buffer()
}

/// Write the xlsx report. The workbook is rendered in memory first so a
/// failure never leaves a partial file behind.
pub fn write_xlsx(path: &Path, report: &Report) -> Result<()> {
    let fail = |reason: String| ReportError::OutputWrite {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = report_to_xlsx_bytes(report).map_err(|e| fail(e.to_string()))?;
    std::fs::write(path, bytes).map_err(|e| fail(e.to_string()))?;
    Ok(())
}

/// Export every table as `<dir>/<name>.csv`.
pub fn write_csv_dir(dir: &Path, report: &Report) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for table in &report.tables {
        let mut wtr = csv::Writer::from_path(dir.join(format!("{}.csv", table.name)))?;
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row.iter().map(|c| c.to_string()))?;
        }
        wtr.flush()?;
    }
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows of a table.
pub fn preview_table(table: &Table, max_rows: usize) -> String {
    if table.rows.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(table.headers.iter().cloned());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(format_cell));
    }
    builder.build().with(Style::markdown()).to_string()
}
