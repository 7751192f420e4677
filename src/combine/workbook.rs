//! Write the combined [`Summary`] as an `.xlsx` workbook with a merged group header.

use crate::combine::Summary;
use crate::utils::create_parent_dir;
use crate::Value;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::debug;
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::fmt::Debug;
use std::path::Path;

/// Row of the group labels (Metadata, Gene, IC50, Max%Inhib).
const GROUP_ROW: u32 = 0;
/// Row of the column names.
const HEADER_ROW: u32 = 1;
/// First data row.
const DATA_ROW: u32 = 2;

/// Write the summary table to an `.xlsx` workbook.
///
/// The first row labels each column group, merged over the group's columns; groups
/// without columns are skipped and single-column groups are written unmerged. The
/// second row holds the column names and data starts on the third row.
pub fn write_summary<P>(summary: &Summary, path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    create_parent_dir(path)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let group_format = Format::new().set_bold().set_align(FormatAlign::Center);
    let header_format = Format::new().set_bold();

    // ------------------------------------------------------------------------
    // Group header

    let mut first: u16 = 0;
    for (label, span) in summary.groups() {
        let span = u16::try_from(span).wrap_err_with(|| eyre!("Too many columns in group {label}"))?;
        if span == 0 {
            continue;
        }
        let last = first + span - 1;
        match (label.is_empty(), span) {
            (true, _) => (),
            (false, 1) => {
                worksheet.write_string_with_format(GROUP_ROW, first, label, &group_format)?;
            }
            (false, _) => {
                debug!("Merging group {label}: columns {first}-{last}");
                worksheet.merge_range(GROUP_ROW, first, GROUP_ROW, last, label, &group_format)?;
            }
        }
        first += span;
    }

    // ------------------------------------------------------------------------
    // Column names and data

    for (c, header) in summary.table.headers.iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, column(c)?, header, &header_format)?;
    }

    for (r, row) in summary.table.rows.iter().enumerate() {
        let r = DATA_ROW
            + u32::try_from(r).wrap_err_with(|| eyre!("Too many rows in summary: {r}"))?;
        for (c, value) in row.iter().enumerate() {
            match value {
                Value::Empty => (),
                Value::Number(n) => _ = worksheet.write_number(r, column(c)?, *n)?,
                Value::Text(s) => _ = worksheet.write_string(r, column(c)?, s)?,
            }
        }
    }

    workbook.save(path.as_ref()).wrap_err_with(|| eyre!("Failed to write workbook: {path:?}"))?;

    Ok(())
}

fn column(c: usize) -> Result<u16, Report> {
    u16::try_from(c).wrap_err_with(|| eyre!("Too many columns in summary: {c}"))
}
