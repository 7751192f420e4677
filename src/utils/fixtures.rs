//! Test fixtures: small workbooks written on the fly.

use crate::Value;
use color_eyre::eyre::{Report, Result};
use std::path::Path;

/// Write a workbook with one worksheet per `(name, rows)` pair.
///
/// Rows are written from cell `A1`; empty values leave the cell blank.
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Value>>)]) -> Result<(), Report> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                match value {
                    Value::Empty => (),
                    Value::Number(n) => _ = worksheet.write_number(r as u32, c as u16, *n)?,
                    Value::Text(s) => _ = worksheet.write_string(r as u32, c as u16, s)?,
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// Shorthand for a text cell.
pub fn t(s: &str) -> Value {
    Value::from(s)
}

/// Shorthand for a numeric cell.
pub fn n(v: f64) -> Value {
    Value::Number(v)
}
