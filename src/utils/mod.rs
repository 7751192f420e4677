//! Small helpers shared by the utilities.

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod tests;

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::debug;
use std::fmt::Debug;
use std::path::Path;

/// Round to two decimal places, with halves rounded away from zero.
///
/// ## Examples
///
/// ```rust
/// use ccsp::utils::round2;
///
/// assert_eq!(round2(1000.555), 1000.56);
/// assert_eq!(round2(2.0), 2.0);
/// ```
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Extract the cell line from an assay file name.
///
/// Assay files are named `YYYYMMDD_CELLLINE_..._paste.xlsx`, so the cell line is the
/// second `_`-separated field. A name without any `_` falls back to the name minus `.xlsx`.
///
/// ## Examples
///
/// ```rust
/// use ccsp::utils::cell_line_from_filename;
///
/// assert_eq!(cell_line_from_filename("20260122_BXPC3_6TA_144H_paste.xlsx"), "BXPC3");
/// assert_eq!(cell_line_from_filename("HCT116.xlsx"), "HCT116");
/// ```
pub fn cell_line_from_filename(filename: &str) -> String {
    match filename.split('_').nth(1) {
        Some(cell_line) => cell_line.to_string(),
        None => filename.replace(".xlsx", ""),
    }
}

/// Create the parent directory of a path, if it doesn't already exist.
pub fn create_parent_dir<P>(path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating directory: {parent:?}");
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| eyre!("Failed to create directory: {parent:?}"))?;
        }
    }
    Ok(())
}

/// Returns the file name of a path as an owned string (lossy).
pub fn file_name<P>(path: &P) -> String
where
    P: AsRef<Path> + ?Sized,
{
    path.as_ref().file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_default()
}
