//! Plot IAA/Receptor values per gene as a horizontal bar chart with a broken x axis.

pub mod colormap;
pub mod layout;
pub mod render;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use layout::{Bar, BrokenBarChart, Scene};

use crate::xlsx::Workbook;
use crate::Value;
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use strum::Display;

/// File name (without extension) of the plots.
pub const OUTPUT_STEM: &str = "IAA_barplot";

// ----------------------------------------------------------------------------
// Arguments
// ----------------------------------------------------------------------------

/// Output file formats.
#[derive(Clone, Copy, Debug, Deserialize, Display, PartialEq, Serialize, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Pdf,
}

/// Plot IAA/Receptor values per gene as a broken-axis bar chart.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
#[clap(verbatim_doc_comment)]
pub struct PlotArgs {
    /// Input spreadsheet, read from its first worksheet.
    #[clap(short = 'i', long, default_value_os_t = PlotArgs::default().input)]
    pub input: PathBuf,

    /// Output directory, defaults to the directory of the input.
    #[clap(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Column of gene labels.
    #[clap(long, default_value_t = PlotArgs::default().label_column)]
    pub label_column: String,

    /// Column of IAA/Receptor values.
    #[clap(long, default_value_t = PlotArgs::default().value_column)]
    pub value_column: String,

    /// X range of the left panel, ex. 0,15
    #[clap(long, value_delimiter = ',', allow_hyphen_values = true)]
    #[clap(default_values_t = PlotArgs::default().left_range)]
    pub left_range: Vec<f64>,

    /// X range of the right panel, ex. 55,65
    #[clap(long, value_delimiter = ',', allow_hyphen_values = true)]
    #[clap(default_values_t = PlotArgs::default().right_range)]
    pub right_range: Vec<f64>,

    /// Plot title.
    #[clap(long, default_value_t = PlotArgs::default().title)]
    pub title: String,

    /// Output formats.
    #[clap(long, value_enum, value_delimiter = ',')]
    #[clap(default_values_t = PlotArgs::default().formats)]
    pub formats: Vec<OutputFormat>,

    /// Resolution of PNG output (dots per inch).
    #[clap(long, default_value_t = PlotArgs::default().dpi)]
    pub dpi: u32,
}

impl Default for PlotArgs {
    fn default() -> Self {
        let chart = BrokenBarChart::default();
        PlotArgs {
            input: PathBuf::from("IAA.xlsx"),
            output_dir: None,
            label_column: "TAA".to_string(),
            value_column: "IAA/Receptor".to_string(),
            left_range: vec![chart.left.0, chart.left.1],
            right_range: vec![chart.right.0, chart.right.1],
            title: chart.title,
            formats: vec![OutputFormat::Png, OutputFormat::Pdf],
            dpi: 300,
        }
    }
}

impl PlotArgs {
    /// Directory the plots are written to.
    pub fn output_dir(&self) -> PathBuf {
        match (&self.output_dir, self.input.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// The chart options, with validated panel ranges.
    pub fn chart(&self) -> Result<BrokenBarChart, Report> {
        Ok(BrokenBarChart {
            title: self.title.clone(),
            left: parse_range(&self.left_range, "left")?,
            right: parse_range(&self.right_range, "right")?,
            ..Default::default()
        })
    }
}

fn parse_range(range: &[f64], panel: &str) -> Result<(f64, f64), Report> {
    match range {
        [lo, hi] if lo < hi => Ok((*lo, *hi)),
        _ => Err(eyre!("Invalid {panel} panel range: {range:?}"))
            .suggestion("A range is two increasing numbers, ex. 0,15"),
    }
}

// ----------------------------------------------------------------------------
// Plot
// ----------------------------------------------------------------------------

/// Read labelled values from the first worksheet of a spreadsheet, sorted ascending by value.
///
/// Rows without a numeric value are skipped with a warning.
pub fn read_bars<P>(path: &P, label_column: &str, value_column: &str) -> Result<Vec<Bar>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let mut workbook = Workbook::open(path)?;
    let sheet = workbook.first_sheet()?;
    let table = workbook.table(&sheet, 0)?;
    let label_i = table.get_header_index(label_column)?;
    let value_i = table.get_header_index(value_column)?;

    let mut bars = table
        .rows
        .iter()
        .filter_map(|row| {
            let label = row[label_i].to_string();
            let value = match &row[value_i] {
                Value::Number(n) => Some(*n),
                Value::Text(s) => s.trim().parse::<f64>().ok(),
                Value::Empty => None,
            };
            match value.filter(|v| v.is_finite()) {
                Some(value) => Some(Bar { label, value }),
                None => {
                    warn!("Skipping {label:?}: {value_column} is not a number: {:?}", row[value_i]);
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    bars.sort_by(|a, b| a.value.total_cmp(&b.value));
    Ok(bars)
}

/// Plot IAA/Receptor values per gene, returning the paths written.
pub fn plot_iaa(args: &PlotArgs) -> Result<Vec<PathBuf>, Report> {
    debug!("Arguments: {}", serde_json::to_string_pretty(args)?);
    let chart = args.chart()?;

    info!("Reading: {:?}", args.input);
    let bars = read_bars(&args.input, &args.label_column, &args.value_column)?;
    if bars.is_empty() {
        return Err(eyre!("No plottable rows in: {:?}", args.input)).suggestion(format!(
            "Values must be numeric, in the columns {:?} and {:?}.",
            args.label_column, args.value_column
        ));
    }
    info!("Plotting {} genes", bars.len());

    let scene = chart.layout(&bars);
    let output_dir = args.output_dir();

    let mut paths = Vec::new();
    for format in &args.formats {
        let path = output_dir.join(format!("{OUTPUT_STEM}.{format}"));
        match format {
            OutputFormat::Png => render::write_png(&scene, &path, args.dpi)?,
            OutputFormat::Pdf => render::write_pdf(&scene, &path, &chart.title)?,
        }
        info!("Plot saved: {path:?}");
        paths.push(path);
    }

    Ok(paths)
}
