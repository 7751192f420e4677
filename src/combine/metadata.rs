//! Cell-line metadata and gene marker expression.

use crate::utils::round2;
use crate::{Table, Value};
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{info, warn};
use std::fmt::Debug;
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Metadata column holding the cell line name.
pub const CELL_LINE_COLUMN: &str = "CellLine";

/// Metadata columns written between the batch and the gene markers, in order.
pub const METADATA_COLUMNS: [&str; 6] = [
    "ModelID",
    "OncotreeLineage",
    "OncotreePrimaryDisease",
    "OncotreeSubtype",
    "OncotreeCode",
    "in_BioMetas",
];

/// Text that denotes a missing value in an exported metadata table.
const MISSING: [&str; 3] = ["", "NA", "NaN"];

// ----------------------------------------------------------------------------
// Marker
// ----------------------------------------------------------------------------

/// Gene markers with expression values in the cell-line metadata.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, PartialEq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Marker {
    Tacstd2,
    Ceacam5,
    Erbb2,
    Erbb3,
    Met,
    Egfr,
    Cd276,
    F3,
    Muc1,
    Ptk7,
    Itgb6,
    Folr1,
    Dll3,
    Adam9,
    Lrrc15,
    Fap,
    Itgav,
    Axl,
    Cdcp1,
    Tpbg,
    Ceacam6,
    Cldn18,
    Msln,
    Muc16,
    Cdh17,
    Slfn11,
    Top1,
    Abcb1,
    Abcc3,
    Abcg2,
    Paf1,
}

/// Keep the requested markers that are known and present in the metadata headers.
///
/// Unknown markers are dropped with a warning, as are known markers the metadata lacks.
/// Order and duplicates of the request are otherwise preserved.
///
/// ## Examples
///
/// ```rust
/// use ccsp::combine::metadata::validate_markers;
///
/// let headers = ["CellLine", "TACSTD2", "ERBB2"].map(String::from);
/// let requested = ["TACSTD2", "FOO", "ERBB2", "MET"].map(String::from);
/// assert_eq!(validate_markers(&requested, &headers), ["TACSTD2", "ERBB2"]);
/// ```
pub fn validate_markers(requested: &[String], headers: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|marker| match Marker::from_str(marker) {
            Err(_) => {
                warn!("Gene marker '{marker}' not found in metadata. Skipping.");
                warn!("Available gene markers: {}", Marker::iter().join(", "));
                false
            }
            Ok(_) if !headers.contains(marker) => {
                warn!("Gene marker '{marker}' is not a column of the metadata table. Skipping.");
                false
            }
            Ok(_) => true,
        })
        .cloned()
        .collect()
}

// ----------------------------------------------------------------------------
// Metadata
// ----------------------------------------------------------------------------

/// Metadata of one cell line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataRow {
    pub cell_line: Value,
    /// Values of [`METADATA_COLUMNS`], in order.
    pub fields: Vec<Value>,
    /// Marker expression values, rounded to two decimals, in the order of [`Metadata::markers`].
    pub markers: Vec<Value>,
}

/// Cell-line metadata restricted to the selected gene markers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    /// Validated gene markers.
    pub markers: Vec<String>,
    pub rows: Vec<MetadataRow>,
}

impl Metadata {
    /// Read a delimited metadata table (.tsv, .txt, or .csv) and select gene markers.
    pub fn read<P>(path: &P, markers: &[String]) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        let table = Table::read(path, None)
            .wrap_err_with(|| eyre!("Failed to read metadata: {path:?}"))
            .suggestion("The metadata is a delimited export of the cell-line annotation table.")?;
        let metadata = Metadata::from_table(&table, markers)?;
        info!("Metadata: {} cell lines", metadata.rows.len());
        Ok(metadata)
    }

    /// Select the cell info columns and the valid gene markers of a metadata table.
    pub fn from_table(table: &Table<String>, markers: &[String]) -> Result<Self, Report> {
        let markers = validate_markers(markers, &table.headers);

        let cell_line_i = table.get_header_index(CELL_LINE_COLUMN)?;
        let field_indices: Vec<usize> =
            METADATA_COLUMNS.iter().map(|h| table.get_header_index(h)).collect::<Result<_, _>>()?;
        let marker_indices: Vec<usize> =
            markers.iter().map(|h| table.get_header_index(h)).collect::<Result<_, _>>()?;

        let rows = table
            .rows
            .iter()
            .map(|row| MetadataRow {
                cell_line: parse_text(&row[cell_line_i]),
                fields: field_indices.iter().map(|&i| parse_text(&row[i])).collect(),
                markers: marker_indices.iter().map(|&i| parse_expression(&row[i])).collect(),
            })
            .collect();

        Ok(Metadata { markers, rows })
    }

    /// Rows whose cell line matches, ignoring case.
    pub fn lookup(&self, cell_line: &str) -> Vec<&MetadataRow> {
        let cell_line = cell_line.to_uppercase();
        self.rows.iter().filter(|row| row.cell_line.to_string().to_uppercase() == cell_line).collect()
    }
}

fn parse_text(field: &str) -> Value {
    match field.trim() {
        s if MISSING.contains(&s) => Value::Empty,
        s => Value::from(s),
    }
}

fn parse_expression(field: &str) -> Value {
    match field.trim() {
        s if MISSING.contains(&s) => Value::Empty,
        s => match s.parse::<f64>() {
            Ok(n) => Value::Number(round2(n)),
            Err(_) => Value::from(s),
        },
    }
}
