//! Detect test compounds from the XLFit chart section of an assay workbook.

use crate::xlsx::{Grid, Workbook};
use crate::Value;
use color_eyre::eyre::{Report, Result};
use log::{debug, warn};
use std::fmt::Debug;
use std::path::Path;

/// Worksheets that hold the XLFit chart section, in order of preference.
pub const ANALYSIS_SHEETS: [&str; 2] = ["Analyzed Data", "Data analysis for IC50"];

/// Column of the chart section (column B).
pub const CHART_COLUMN: usize = 1;

/// Number of rows scanned for the chart section (rows 1 to 49).
pub const SCAN_ROWS: usize = 49;

/// Extract the compound id from a chart label.
///
/// Labels are `CELLLINE_COMPOUND`, so the second `_`-separated field is returned;
/// labels without `_` are returned whole. Blank ids are `None`.
///
/// ## Examples
///
/// ```rust
/// use ccsp::extract::compounds::extract_compound_id;
///
/// assert_eq!(extract_compound_id(" BT20_TA145 "), Some("TA145"));
/// assert_eq!(extract_compound_id("BT20_TA145_rep2"), Some("TA145"));
/// assert_eq!(extract_compound_id("Staurosporine"), Some("Staurosporine"));
/// assert_eq!(extract_compound_id("BT20_"), None);
/// ```
pub fn extract_compound_id(label: &str) -> Option<&str> {
    let label = label.trim();
    let id = match label.contains('_') {
        true => label.split('_').nth(1).unwrap_or(label),
        false => label,
    };
    (!id.is_empty()).then_some(id)
}

/// Returns true if the compound is the Staurosporine control.
///
/// ## Examples
///
/// ```rust
/// use ccsp::extract::compounds::is_staurosporine;
///
/// assert!(is_staurosporine("STAUROSPORINE"));
/// assert!(is_staurosporine("stauro-1uM"));
/// assert!(!is_staurosporine("TA145"));
/// ```
pub fn is_staurosporine(compound: &str) -> bool {
    let compound = compound.to_lowercase();
    compound.contains("staurosporine") || compound.contains("stauro")
}

/// Find the test compounds of the XLFit chart section, in plot order.
///
/// The section starts after a column B label containing both `XLFit` and `Chart`,
/// and ends at the first empty cell once a compound was found. Staurosporine
/// controls are skipped. Non-text cells neither add a compound nor end the section.
pub fn find_compounds(grid: &Grid) -> Vec<String> {
    let mut compounds = Vec::new();
    let mut in_section = false;

    for row in grid.iter().take(SCAN_ROWS) {
        match row.get(CHART_COLUMN).unwrap_or(&Value::Empty) {
            Value::Text(label) if label.contains("XLFit") && label.contains("Chart") => {
                in_section = true;
            }
            Value::Text(label) if in_section => match extract_compound_id(label) {
                Some(id) if is_staurosporine(id) => debug!("Skipping control: {id}"),
                Some(id) => compounds.push(id.to_string()),
                None => (),
            },
            Value::Empty if in_section && !compounds.is_empty() => break,
            _ => (),
        }
    }

    compounds
}

/// Read the test compounds of an assay workbook.
///
/// A workbook without an analysis worksheet has no compounds.
pub fn read_compounds<P>(path: &P) -> Result<Vec<String>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let mut workbook = Workbook::open(path)?;
    let Some(sheet) = ANALYSIS_SHEETS.into_iter().find(|s| workbook.has_sheet(s)) else {
        warn!("No analysis worksheet ({}) in: {path:?}", ANALYSIS_SHEETS.join(", "));
        return Ok(Vec::new());
    };
    let grid = workbook.grid(sheet)?;
    Ok(find_compounds(&grid))
}

/// Read the test compounds of an assay workbook, or none if it can't be read.
pub fn extract_compounds<P>(path: &P) -> Vec<String>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    read_compounds(path).unwrap_or_else(|e| {
        warn!("Could not extract compounds from {path:?}: {e:#}");
        Vec::new()
    })
}
