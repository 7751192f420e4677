//! `ccsp` wrangles dose-response assay spreadsheets from **C**ancer **C**ell line **S**creening **P**anels.
//!
//! ## Utilities
//!
//! 1. [`combine`] merges per-batch assay spreadsheets into one summary workbook.
//!
//!    Each batch folder holds one `*_paste.xlsx` file per cell line. The IC50 and
//!    maximum % inhibition of every compound are pivoted into a wide table, joined
//!    to cell-line metadata, and written with a two-row merged header.
//!
//! 1. [`extract`] pulls the embedded % inhibition dose-response charts out of the
//!    assay spreadsheets and lays them out as a cell line × compound grid in a
//!    self-contained HTML report.
//!
//! 1. [`plot`] draws a broken-axis horizontal bar chart of IAA/Receptor ratios,
//!    as both PNG and PDF.
//!
//! Each utility is a single linear pass: read input files, reshape in memory,
//! write one output.

pub mod cli;
pub mod combine;
pub mod extract;
pub mod plot;
pub mod utils;
pub mod value;
pub mod xlsx;

#[doc(inline)]
pub use crate::cli::{Cli, Verbosity};
#[doc(inline)]
pub use crate::value::Value;
#[doc(inline)]
pub use ccsp_table::Table;
