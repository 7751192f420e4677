//! Combine per-batch dose-response assay spreadsheets into one summary workbook.
//!
//! A base directory holds one folder per batch (named `*cells`), each with one
//! spreadsheet per cell line. The `Summary` sheet of every spreadsheet is reduced
//! to (compound, max % inhibition, IC50), pivoted wide by (cell line, batch),
//! left-joined to cell-line metadata, and written with a merged two-row header.

pub mod metadata;
pub mod workbook;


#[doc(inline)]
pub use metadata::{Marker, Metadata};
#[doc(inline)]
pub use workbook::write_summary;

use crate::utils::{cell_line_from_filename, file_name};
use crate::xlsx::Workbook;
use crate::{Table, Value};
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Column of the compound list holding the compound identifier.
pub const COMPOUND_ID_COLUMN: &str = "TA_ID";
/// Column of the compound list holding the compound display name.
pub const COMPOUND_NAME_COLUMN: &str = "Compound";

/// Assay sheet column holding the (cell line prefixed) compound identifier.
pub const ASSAY_COMPOUND_COLUMN: &str = "Compound ID";
/// Assay sheet column holding the maximum % inhibition.
pub const ASSAY_INHIBITION_COLUMN: &str = "Max % Inhibition";
/// Assay sheet column holding the corrected absolute IC50 (nM).
pub const ASSAY_IC50_COLUMN: &str = "Corrected Abs IC50 nM";
/// The assay sheet headers are in the second row.
pub const ASSAY_HEADER_ROW: usize = 1;

// ----------------------------------------------------------------------------
// Arguments
// ----------------------------------------------------------------------------

/// Combine per-batch assay spreadsheets into one summary workbook.
///
/// Relative file paths are resolved against the base directory.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
#[clap(verbatim_doc_comment)]
pub struct CombineArgs {
    /// Base directory containing the batch folders.
    #[clap(short = 'd', long, default_value_os_t = CombineArgs::default().base_dir)]
    pub base_dir: PathBuf,

    /// Compound list spreadsheet, mapping TA_ID to Compound name.
    #[clap(short = 'c', long, default_value_os_t = CombineArgs::default().compound_list)]
    pub compound_list: PathBuf,

    /// Cell-line metadata table (.tsv, .txt, or .csv).
    #[clap(long, default_value_os_t = CombineArgs::default().metadata)]
    pub metadata: PathBuf,

    /// Gene markers to include from the metadata.
    ///
    /// Comma separated, ex. TACSTD2,CEACAM5
    #[clap(short = 'm', long, value_delimiter = ',', default_values_t = CombineArgs::default().markers)]
    pub markers: Vec<String>,

    /// Suffix of the batch folder names.
    #[clap(long, default_value_t = CombineArgs::default().batch_suffix)]
    pub batch_suffix: String,

    /// Worksheet of each assay spreadsheet to read.
    #[clap(long, default_value_t = CombineArgs::default().sheet)]
    pub sheet: String,

    /// Output workbook.
    #[clap(short = 'o', long, default_value_os_t = CombineArgs::default().output)]
    pub output: PathBuf,
}

impl Default for CombineArgs {
    fn default() -> Self {
        CombineArgs {
            base_dir: PathBuf::from("."),
            compound_list: PathBuf::from("CompoundList.xlsx"),
            metadata: PathBuf::from("samplemeta_TAA_DepMap25Q2.tsv"),
            markers: vec!["TACSTD2".to_string(), "CEACAM5".to_string()],
            batch_suffix: "cells".to_string(),
            sheet: "Summary".to_string(),
            output: PathBuf::from("combined_all_batches.xlsx"),
        }
    }
}

impl CombineArgs {
    pub fn new() -> Self {
        CombineArgs {
            base_dir: PathBuf::new(),
            compound_list: PathBuf::new(),
            metadata: PathBuf::new(),
            markers: Vec::new(),
            batch_suffix: String::new(),
            sheet: String::new(),
            output: PathBuf::new(),
        }
    }

    /// Resolve a path relative to the base directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match path.is_absolute() {
            true => path.to_path_buf(),
            false => self.base_dir.join(path),
        }
    }
}

// ----------------------------------------------------------------------------
// Records
// ----------------------------------------------------------------------------

/// One compound measurement from one assay spreadsheet.
#[derive(Clone, Debug, PartialEq)]
pub struct AssayRecord {
    /// Compound display name (or identifier, when not in the compound list).
    pub compound: String,
    /// Maximum % inhibition.
    pub inhibition: Value,
    /// Corrected absolute IC50 (nM).
    pub ic50: Value,
    pub cell_line: String,
    pub batch: String,
}

/// Pivoted measurements of one (cell line, batch).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PivotRow {
    pub ic50: BTreeMap<String, Value>,
    pub inhibition: BTreeMap<String, Value>,
}

/// Assay records pivoted wide, keyed by (cell line, batch).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pivot {
    /// Compound names, sorted.
    pub compounds: Vec<String>,
    pub rows: BTreeMap<(String, String), PivotRow>,
}

impl Pivot {
    /// Pivot records by (cell line, batch), keeping the first non-empty value of each compound.
    pub fn from_records(records: &[AssayRecord]) -> Self {
        let mut rows: BTreeMap<(String, String), PivotRow> = BTreeMap::new();
        let mut compounds = BTreeSet::new();

        for record in records {
            compounds.insert(record.compound.clone());
            let row = rows.entry((record.cell_line.clone(), record.batch.clone())).or_default();
            keep_first(&mut row.ic50, &record.compound, &record.ic50);
            keep_first(&mut row.inhibition, &record.compound, &record.inhibition);
        }

        Pivot { compounds: compounds.into_iter().collect(), rows }
    }
}

fn keep_first(values: &mut BTreeMap<String, Value>, compound: &str, value: &Value) {
    let current = values.entry(compound.to_string()).or_default();
    if current.is_empty() {
        *current = value.clone();
    }
}

// ----------------------------------------------------------------------------
// Summary
// ----------------------------------------------------------------------------

/// The combined summary table, ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Columns: CellLine, Batch, metadata, markers, IC50 compounds, inhibition compounds.
    pub table: Table<Value>,
    pub markers: Vec<String>,
    pub compounds: Vec<String>,
}

impl Summary {
    /// Labels and widths of the column groups, in column order.
    pub fn groups(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("", 2),
            ("Metadata", metadata::METADATA_COLUMNS.len()),
            ("Gene", self.markers.len()),
            ("IC50", self.compounds.len()),
            ("Max%Inhib", self.compounds.len()),
        ]
    }

    /// Number of cell lines per batch, as a table.
    pub fn batch_counts(&self) -> Result<Table<String>, Report> {
        let counts = self.table.get_column("Batch")?.into_iter().fold(
            BTreeMap::<String, usize>::new(),
            |mut counts, batch| {
                *counts.entry(batch.to_string()).or_default() += 1;
                counts
            },
        );
        let mut table = Table::with_headers(["Batch", "CellLine"]);
        counts.into_iter().try_for_each(|(batch, n)| table.add_row([batch, n.to_string()]))?;
        Ok(table)
    }
}

/// Left-join the pivoted assay rows to cell-line metadata.
///
/// Matching is case-insensitive on the cell-line name. Every matching metadata row
/// yields one output row; an assay cell line without metadata keeps its own name and
/// has blank metadata and marker fields. Rows are sorted by batch, then cell line.
pub fn summarize(pivot: &Pivot, metadata: &Metadata) -> Result<Summary, Report> {
    let headers = ["CellLine", "Batch"]
        .into_iter()
        .map(String::from)
        .chain(metadata::METADATA_COLUMNS.iter().map(|c| c.to_string()))
        .chain(metadata.markers.iter().cloned())
        .chain(pivot.compounds.iter().cloned())
        .chain(pivot.compounds.iter().cloned())
        .collect_vec();
    let mut table = Table::with_headers(headers);

    for ((cell_line, batch), measurements) in &pivot.rows {
        let assay_values = pivot
            .compounds
            .iter()
            .map(|c| measurements.ic50.get(c).cloned().unwrap_or_default())
            .chain(
                pivot
                    .compounds
                    .iter()
                    .map(|c| measurements.inhibition.get(c).cloned().unwrap_or_default()),
            )
            .collect_vec();

        let matches = metadata.lookup(cell_line);
        if matches.is_empty() {
            debug!("No metadata found for cell line: {cell_line}");
            let blanks = metadata::METADATA_COLUMNS.len() + metadata.markers.len();
            let row = [Value::from(cell_line.as_str()), Value::from(batch.as_str())]
                .into_iter()
                .chain(std::iter::repeat(Value::Empty).take(blanks))
                .chain(assay_values.iter().cloned())
                .collect_vec();
            table.add_row(row)?;
            continue;
        }

        for meta in matches {
            let name = match meta.cell_line.is_empty() {
                true => Value::from(cell_line.as_str()),
                false => meta.cell_line.clone(),
            };
            let row = [name, Value::from(batch.as_str())]
                .into_iter()
                .chain(meta.fields.iter().cloned())
                .chain(meta.markers.iter().cloned())
                .chain(assay_values.iter().cloned())
                .collect_vec();
            table.add_row(row)?;
        }
    }

    table.sort_by_columns(&["Batch", "CellLine"])?;

    Ok(Summary { table, markers: metadata.markers.clone(), compounds: pivot.compounds.clone() })
}

// ----------------------------------------------------------------------------
// Input
// ----------------------------------------------------------------------------

/// Read the compound list into a map of compound identifier to display name.
pub fn read_compound_map<P>(path: &P) -> Result<BTreeMap<String, String>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let mut workbook = Workbook::open(path)?;
    let sheet = workbook.first_sheet()?;
    let table = workbook.table(&sheet, 0)?;

    let ids = table.get_column(COMPOUND_ID_COLUMN)?;
    let names = table.get_column(COMPOUND_NAME_COLUMN)?;

    let map = ids
        .into_iter()
        .zip(names)
        .filter(|(id, _)| !id.is_empty())
        .map(|(id, name)| (id.to_string().trim().to_string(), name.to_string().trim().to_string()))
        .collect();

    Ok(map)
}

/// Find batch folders in the base directory, sorted by name.
pub fn find_batch_folders<P>(base_dir: &P, suffix: &str) -> Result<Vec<PathBuf>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let entries = std::fs::read_dir(base_dir)
        .wrap_err_with(|| eyre!("Failed to read base directory: {base_dir:?}"))?;

    let folders = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir() && file_name(path).ends_with(suffix))
        .sorted()
        .collect_vec();

    Ok(folders)
}

/// Find the assay spreadsheets directly inside a batch folder, sorted by name.
///
/// Office lock files (`~$...`) are skipped.
pub fn find_batch_files<P>(batch_dir: &P) -> Result<Vec<PathBuf>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let entries = std::fs::read_dir(batch_dir)
        .wrap_err_with(|| eyre!("Failed to read batch folder: {batch_dir:?}"))?;

    let files = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let name = file_name(path);
            path.is_file() && name.ends_with(".xlsx") && !name.starts_with('~')
        })
        .sorted()
        .collect_vec();

    Ok(files)
}

/// Remove the cell line prefix from a compound identifier.
///
/// Everything up to and including the first `_` is dropped, identifiers without `_` are kept.
///
/// ## Examples
///
/// ```rust
/// use ccsp::combine::strip_cell_line_prefix;
///
/// assert_eq!(strip_cell_line_prefix("BxPC3_TA145"), "TA145");
/// assert_eq!(strip_cell_line_prefix("BxPC3_TA_145"), "TA_145");
/// assert_eq!(strip_cell_line_prefix("Staurosporine"), "Staurosporine");
/// ```
pub fn strip_cell_line_prefix(compound_id: &str) -> &str {
    compound_id.split_once('_').map(|(_, id)| id).unwrap_or(compound_id)
}

/// Read the assay records of one batch spreadsheet.
pub fn read_batch_file<P>(
    path: &P,
    batch: &str,
    sheet: &str,
    compound_map: &BTreeMap<String, String>,
) -> Result<Vec<AssayRecord>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let cell_line = cell_line_from_filename(&file_name(path));

    let mut workbook = Workbook::open(path)?;
    let table = workbook.table(sheet, ASSAY_HEADER_ROW)?;

    let compound_i = table.get_header_index(ASSAY_COMPOUND_COLUMN)?;
    let inhibition_i = table.get_header_index(ASSAY_INHIBITION_COLUMN)?;
    let ic50_i = table.get_header_index(ASSAY_IC50_COLUMN)?;

    let records = table
        .rows
        .iter()
        .filter(|row| !row[compound_i].is_empty())
        .map(|row| {
            let compound_id = row[compound_i].to_string();
            let compound_id = strip_cell_line_prefix(compound_id.trim());
            let compound =
                compound_map.get(compound_id).cloned().unwrap_or_else(|| compound_id.to_string());
            AssayRecord {
                compound,
                inhibition: row[inhibition_i].normalize(),
                ic50: row[ic50_i].normalize(),
                cell_line: cell_line.clone(),
                batch: batch.to_string(),
            }
        })
        .collect_vec();

    Ok(records)
}

// ----------------------------------------------------------------------------
// Combine
// ----------------------------------------------------------------------------

/// Combine all batches under the base directory into one summary workbook.
///
/// Unreadable spreadsheets (missing sheet or columns) are skipped with a warning.
/// It is an error if no batch folders or no assay records are found.
pub fn combine_batches(args: &CombineArgs) -> Result<Summary, Report> {
    debug!("Arguments: {}", serde_json::to_string_pretty(args)?);

    // ------------------------------------------------------------------------
    // Compound mapping

    let compound_list = args.resolve(&args.compound_list);
    info!("Loading compound mapping: {compound_list:?}");
    let compound_map = read_compound_map(&compound_list)?;
    info!("Compound mapping: {} entries", compound_map.len());
    debug!("Compound mapping: {compound_map:?}");

    let batch_folders = find_batch_folders(&args.base_dir, &args.batch_suffix)?;
    if batch_folders.is_empty() {
        return Err(eyre!("No batch folders found in: {:?}", args.base_dir)
            .suggestion(format!("Batch folder names must end with {:?}", args.batch_suffix)));
    }
    info!(
        "Found {} batch folders: {}",
        batch_folders.len(),
        batch_folders.iter().map(file_name).join(", ")
    );

    // ------------------------------------------------------------------------
    // Assay records

    let mut records = Vec::new();
    for batch_dir in &batch_folders {
        let batch = file_name(batch_dir);
        let files = find_batch_files(batch_dir)?;
        info!("Processing batch: {batch} ({} files)", files.len());

        for file in files {
            match read_batch_file(&file, &batch, &args.sheet, &compound_map) {
                Ok(file_records) => {
                    let cell_line = cell_line_from_filename(&file_name(&file));
                    info!("  Read {cell_line}: {} compounds", file_records.len());
                    records.extend(file_records);
                }
                Err(e) => warn!("Skipping {file:?}: {e:#}"),
            }
        }
    }

    if records.is_empty() {
        return Err(eyre!("No assay records were read from: {:?}", args.base_dir));
    }
    info!("Total records: {}", records.len());

    let pivot = Pivot::from_records(&records);

    // ------------------------------------------------------------------------
    // Metadata

    let metadata_path = args.resolve(&args.metadata);
    info!("Loading metadata: {metadata_path:?}");
    let metadata = Metadata::read(&metadata_path, &args.markers)?;
    info!("Selected gene markers: {}", metadata.markers.join(", "));

    let summary = summarize(&pivot, &metadata)?;

    // ------------------------------------------------------------------------
    // Export

    let output = args.resolve(&args.output);
    write_summary(&summary, &output)?;

    info!("Output saved to: {output:?}");
    info!("Shape: {} rows x {} columns", summary.table.rows.len(), summary.table.headers.len());
    info!("Column breakdown:");
    info!("  - CellLine, Batch: 2 columns");
    info!("  - Metadata: {} columns", metadata::METADATA_COLUMNS.len());
    info!(
        "  - Gene markers: {} columns ({})",
        summary.markers.len(),
        summary.markers.join(", ")
    );
    info!("  - IC50: {} columns", summary.compounds.len());
    info!("  - Max%Inhib: {} columns", summary.compounds.len());
    info!("Cell lines per batch:\n{}", summary.batch_counts()?.to_markdown()?);

    Ok(summary)
}
