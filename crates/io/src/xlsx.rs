// Excel file import (xlsx, xlsm, xls, xlsb, ods) and export (xlsx only)
//
// Import: first worksheet only, header row first. Cells become RawValues;
//         date-times are rendered as month-first text so downstream parsing
//         sees the same shape a CSV export would carry.
// Export: one worksheet per report sheet, bold header, fixed column widths.

use std::path::Path;

use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use callbill_recon::{CellValue, RawTable, RawValue, SheetSet};

use crate::csv::display_name;
use crate::error::IoError;

fn spreadsheet_err(path: &Path, message: impl Into<String>) -> IoError {
    IoError::Spreadsheet {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Read the first worksheet of a workbook.
pub fn import(path: &Path) -> Result<RawTable, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| spreadsheet_err(path, format!("failed to open workbook: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(spreadsheet_err(path, "workbook contains no sheets"));
    };

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| spreadsheet_err(path, format!("failed to read sheet '{first}': {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|c| cell_value(c).as_text().into_owned()).collect())
        .unwrap_or_default();

    let mut table = RawTable::new(display_name(path), headers);
    for row in rows {
        let values: Vec<RawValue> = row.iter().map(cell_value).collect();
        if values.iter().all(RawValue::is_empty) {
            continue;
        }
        table.push_row(values);
    }

    log::debug!(
        "{}: sheet '{first}' of {}, {} row(s), {} column(s)",
        table.name,
        sheet_names.len(),
        table.len(),
        table.headers.len()
    );
    Ok(table)
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Empty,
        Data::String(s) => RawValue::text(s.as_str()),
        Data::Float(n) => RawValue::Number(*n),
        Data::Int(n) => RawValue::Number(*n as f64),
        // Same TRUE/FALSE text a CSV export would carry
        Data::Bool(b) => RawValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => RawValue::text(format!("#{e:?}")),
        Data::DateTime(dt) => datetime_value(dt),
        Data::DateTimeIso(s) => iso_datetime_value(s),
        Data::DurationIso(s) => RawValue::text(s.as_str()),
    }
}

/// ODS stores dates as ISO 8601 text; bring them to the month-first shape
/// used for Excel serials. Anything unparseable passes through untouched.
fn iso_datetime_value(s: &str) -> RawValue {
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return RawValue::Text(ts.format("%-m/%-d/%Y %H:%M:%S").to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return RawValue::Text(date.format("%-m/%-d/%Y").to_string());
    }
    RawValue::text(s)
}

/// Serials below one day carry no date part and render as `HH:MM:SS`.
fn datetime_value(dt: &ExcelDateTime) -> RawValue {
    let serial = dt.as_f64();
    match dt.as_datetime() {
        Some(ts) if serial < 1.0 => RawValue::Text(ts.format("%H:%M:%S").to_string()),
        Some(ts) => RawValue::Text(ts.format("%-m/%-d/%Y %H:%M:%S").to_string()),
        None => RawValue::Number(serial),
    }
}

/// Write every sheet of the set to one workbook.
pub fn export(sheets: &SheetSet, path: &Path) -> Result<(), IoError> {
    let mut xlsx_workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format("0.00");

    for sheet in &sheets.sheets {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| IoError::write(path, format!("failed to create sheet '{}': {e}", sheet.name)))?;

        for (col, title) in sheet.columns.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, title, &header_format)
                .map_err(|e| IoError::write(path, e))?;
        }
        for (col, width) in sheet.widths.iter().enumerate() {
            worksheet
                .set_column_width(col as u16, *width)
                .map_err(|e| IoError::write(path, e))?;
        }

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            let row32 = (row_idx + 1) as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                let col16 = col_idx as u16;
                match cell {
                    CellValue::Text(s) => worksheet.write_string(row32, col16, s),
                    CellValue::Integer(n) => worksheet.write_number(row32, col16, *n as f64),
                    CellValue::Decimal(d) => worksheet.write_number_with_format(
                        row32,
                        col16,
                        d.to_f64().unwrap_or_default(),
                        &money_format,
                    ),
                }
                .map_err(|e| IoError::write(path, e))?;
            }
        }
    }

    if let Ok(ws) = xlsx_workbook.worksheet_from_index(sheets.primary) {
        let _ = ws.set_active(true);
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| IoError::write(path, format!("failed to save XLSX file: {e}")))?;
    Ok(())
}
