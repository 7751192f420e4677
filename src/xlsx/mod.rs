//! Read worksheets of an `.xlsx` [`Workbook`] into grids and [`Table`]s of [`Value`].

#[cfg(test)]
mod tests;

use crate::{Table, Value};
use calamine::{open_workbook, Reader, Xlsx};
use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::debug;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A dense grid of cells, indexed from cell `A1` as `grid[row][col]`.
pub type Grid = Vec<Vec<Value>>;

// ----------------------------------------------------------------------------
// Workbook
// ----------------------------------------------------------------------------

/// An open `.xlsx` workbook.
pub struct Workbook {
    /// Path the workbook was opened from.
    pub path: PathBuf,
    inner: Xlsx<BufReader<File>>,
}

impl Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook").field("path", &self.path).finish()
    }
}

impl Workbook {
    /// Open an `.xlsx` workbook for reading.
    pub fn open<P>(path: &P) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        let inner: Xlsx<_> = open_workbook(path.as_ref())
            .wrap_err_with(|| eyre!("Failed to open workbook: {path:?}"))?;
        Ok(Workbook { path: path.as_ref().to_path_buf(), inner })
    }

    /// Names of the worksheets, in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    /// Returns true if the workbook has a worksheet with this name.
    pub fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|s| s == sheet)
    }

    /// Name of the first worksheet.
    pub fn first_sheet(&self) -> Result<String, Report> {
        self.sheet_names()
            .into_iter()
            .next()
            .wrap_err_with(|| eyre!("Workbook has no worksheets: {:?}", self.path))
    }

    /// Read a worksheet into a dense [`Grid`] anchored at cell `A1`.
    ///
    /// Leading empty rows and columns are preserved, so grid positions match the
    /// positions shown in a spreadsheet application (minus one).
    pub fn grid(&mut self, sheet: &str) -> Result<Grid, Report> {
        if !self.has_sheet(sheet) {
            return Err(eyre!("Worksheet {sheet:?} was not found in workbook: {:?}", self.path)
                .suggestion(format!("Available worksheets: {}", self.sheet_names().join(", "))));
        }
        let range = self
            .inner
            .worksheet_range(sheet)
            .wrap_err_with(|| eyre!("Failed to read worksheet {sheet:?}: {:?}", self.path))?;

        let Some((end_row, end_col)) = range.end() else {
            debug!("Worksheet {sheet:?} is empty: {:?}", self.path);
            return Ok(Vec::new());
        };

        let grid = (0..=end_row)
            .map(|r| {
                (0..=end_col)
                    .map(|c| range.get_value((r, c)).map(Value::from).unwrap_or_default())
                    .collect_vec()
            })
            .collect_vec();

        Ok(grid)
    }

    /// Read a worksheet into a [`Table`], using the row at `header_row` (0-based) as headers.
    ///
    /// Rows above the header are ignored, and rows with no values are skipped.
    pub fn table(&mut self, sheet: &str, header_row: usize) -> Result<Table<Value>, Report> {
        let grid = self.grid(sheet)?;
        let mut table = grid_to_table(grid, header_row).wrap_err_with(|| {
            eyre!("Failed to read table from worksheet {sheet:?}: {:?}", self.path)
        })?;
        table.path = Some(self.path.clone());
        Ok(table)
    }
}

/// Convert a [`Grid`] into a [`Table`], using the row at `header_row` (0-based) as headers.
///
/// Header cells are trimmed, and empty header cells are named `Unnamed: <col>`.
pub fn grid_to_table(grid: Grid, header_row: usize) -> Result<Table<Value>, Report> {
    let mut rows = grid.into_iter().skip(header_row);
    let headers = rows
        .next()
        .wrap_err_with(|| eyre!("Header row ({header_row}) is past the end of the worksheet."))?
        .into_iter()
        .enumerate()
        .map(|(i, v)| match v.to_string().trim() {
            "" => format!("Unnamed: {i}"),
            h => h.to_string(),
        })
        .collect_vec();

    let mut table = Table::with_headers(headers);
    rows.filter(|row| row.iter().any(|v| !v.is_empty())).try_for_each(|row| table.add_row(row))?;

    Ok(table)
}
