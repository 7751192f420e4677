//! Extract IC50 % inhibition plots from assay spreadsheets into an HTML report.
//!
//! Each assay spreadsheet (`*_paste.xlsx`) embeds its dose-response charts as EMF
//! images. The test compounds are read from the XLFit chart section of the first
//! spreadsheet, and the k-th chart image of every spreadsheet is assumed to plot the
//! k-th compound. This ordinal pairing is not verified against the chart contents.

pub mod compounds;
pub mod convert;
pub mod images;
pub mod report;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use compounds::extract_compounds;
#[doc(inline)]
pub use convert::{ImageConverter, Inkscape};
#[doc(inline)]
pub use report::PlotGrid;

use crate::utils::{cell_line_from_filename, create_parent_dir, file_name};
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use indicatif::{style::ProgressStyle, ProgressBar};
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::ZipArchive;

// ----------------------------------------------------------------------------
// Arguments
// ----------------------------------------------------------------------------

/// Extract IC50 % inhibition plots from assay spreadsheets into an HTML report.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
#[clap(verbatim_doc_comment)]
pub struct ExtractArgs {
    /// Zip file or folder containing assay spreadsheets (*_paste.xlsx).
    pub input: PathBuf,

    /// Output HTML file.
    pub output_html: PathBuf,

    /// JSON file mapping compound IDs to display names.
    #[clap(long)]
    pub compound_map: Option<PathBuf>,

    /// JSON file mapping cell lines to background colors.
    #[clap(long)]
    pub cell_colors: Option<PathBuf>,

    /// Seconds before an image conversion is abandoned.
    #[clap(long, default_value_t = ExtractArgs::default().timeout)]
    pub timeout: u64,

    /// Program used to convert EMF images to PNG.
    #[clap(long, default_value_t = ExtractArgs::default().inkscape)]
    pub inkscape: String,

    /// Display a progress bar.
    #[clap(short = 'p', long)]
    pub progress: bool,
}

impl Default for ExtractArgs {
    fn default() -> Self {
        ExtractArgs {
            input: PathBuf::new(),
            output_html: PathBuf::new(),
            compound_map: None,
            cell_colors: None,
            timeout: 60,
            inkscape: "inkscape".to_string(),
            progress: false,
        }
    }
}

impl ExtractArgs {
    pub fn new<P: Into<PathBuf>>(input: P, output_html: P) -> Self {
        ExtractArgs { input: input.into(), output_html: output_html.into(), ..Default::default() }
    }
}

// ----------------------------------------------------------------------------
// Input Discovery
// ----------------------------------------------------------------------------

/// An assay spreadsheet and its cell line.
#[derive(Clone, Debug, PartialEq)]
pub struct AssayFile {
    pub path: PathBuf,
    pub cell_line: String,
}

impl AssayFile {
    pub fn new(path: PathBuf) -> Self {
        let cell_line = cell_line_from_filename(&file_name(&path));
        AssayFile { path, cell_line }
    }
}

/// Assay spreadsheets found in an input.
///
/// When the input was a zip file, the files live in `extract_dir`, which is removed on drop.
#[derive(Debug)]
pub struct AssayFiles {
    /// Files sorted by cell line.
    pub files: Vec<AssayFile>,
    pub extract_dir: Option<TempDir>,
}

/// Returns true if a file name is an assay spreadsheet.
///
/// ## Examples
///
/// ```rust
/// use ccsp::extract::is_ccsp_file;
///
/// assert!(is_ccsp_file("20260122_BT20_6TA_144H_paste.xlsx"));
/// assert!(!is_ccsp_file("~$20260122_BT20_6TA_144H_paste.xlsx"));
/// assert!(!is_ccsp_file("Summary_BT20_paste.xlsx"));
/// assert!(!is_ccsp_file("20260122_BT20.xlsx"));
/// ```
pub fn is_ccsp_file(name: &str) -> bool {
    name.ends_with("_paste.xlsx") && !name.starts_with('~') && !name.contains("Summary")
}

/// Find the assay spreadsheets of a zip file or directory.
///
/// A zip file is extracted into a temporary directory and searched recursively,
/// skipping `__MACOSX` folders. A directory is searched along with its immediate
/// sub-directories, except those starting with `__` or `.`.
pub fn find_excel_files<P>(input: &P) -> Result<AssayFiles, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let input = input.as_ref();
    let is_zip = input.extension().is_some_and(|ext| ext == "zip");

    let (paths, extract_dir) = if is_zip && input.is_file() {
        let extract_dir = tempfile::Builder::new().prefix("ccsp_extract_").tempdir()?;
        info!("Extracting zip file to temporary directory: {:?}", extract_dir.path());
        let file = File::open(input).wrap_err_with(|| eyre!("Failed to open: {input:?}"))?;
        ZipArchive::new(BufReader::new(file))
            .and_then(|mut archive| archive.extract(extract_dir.path()))
            .wrap_err_with(|| eyre!("Failed to extract zip file: {input:?}"))?;

        let root = extract_dir.path();
        let paths = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                let relative = path.strip_prefix(root).unwrap_or(path);
                !relative.components().any(|c| c.as_os_str() == "__MACOSX")
            })
            .collect_vec();
        (paths, Some(extract_dir))
    } else if input.is_dir() {
        let mut paths = list_files(input)?;
        for dir in list_dirs(input)? {
            let name = file_name(&dir);
            if name.starts_with("__") || name.starts_with('.') {
                debug!("Skipping folder: {dir:?}");
                continue;
            }
            paths.extend(list_files(&dir)?);
        }
        (paths, None)
    } else {
        return Err(eyre!("Input path {input:?} is not a valid zip file or directory"))
            .suggestion("Provide a .zip file or a folder containing *_paste.xlsx files.");
    };

    let files = paths
        .into_iter()
        .filter(|path| is_ccsp_file(&file_name(path)))
        .sorted()
        .map(AssayFile::new)
        .sorted_by(|a, b| a.cell_line.cmp(&b.cell_line))
        .collect_vec();

    Ok(AssayFiles { files, extract_dir })
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, Report> {
    let entries = std::fs::read_dir(dir).wrap_err_with(|| eyre!("Failed to read: {dir:?}"))?;
    Ok(entries.filter_map(|e| e.ok().map(|e| e.path())).filter(|p| p.is_file()).collect())
}

fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>, Report> {
    let entries = std::fs::read_dir(dir).wrap_err_with(|| eyre!("Failed to read: {dir:?}"))?;
    Ok(entries.filter_map(|e| e.ok().map(|e| e.path())).filter(|p| p.is_dir()).sorted().collect())
}

/// Load an optional JSON object of string values.
///
/// A path that doesn't exist is skipped with a warning, malformed JSON is an error.
pub fn load_json_map(path: Option<&Path>, label: &str) -> Result<BTreeMap<String, String>, Report> {
    let Some(path) = path else {
        return Ok(BTreeMap::new());
    };
    if !path.exists() {
        warn!("The {label} mapping does not exist and will be skipped: {path:?}");
        return Ok(BTreeMap::new());
    }
    let json = std::fs::read_to_string(path).wrap_err_with(|| eyre!("Failed to read: {path:?}"))?;
    let map: BTreeMap<String, String> = serde_json::from_str(&json)
        .wrap_err_with(|| eyre!("Failed to parse {label} mapping: {path:?}"))
        .suggestion("The mapping must be a JSON object of strings, ex. {\"TA145\": \"Dxd\"}")?;
    info!("Loaded {label} mapping: {} entries", map.len());
    Ok(map)
}

// ----------------------------------------------------------------------------
// Extract
// ----------------------------------------------------------------------------

/// Convert EMF charts to PNG files in `output_dir`, keeping the conversions that succeeded.
pub fn convert_plots<C>(emfs: &[PathBuf], output_dir: &Path, converter: &C) -> Vec<PathBuf>
where
    C: ImageConverter + ?Sized,
{
    emfs.iter()
        .filter_map(|emf| {
            let png = output_dir.join(file_name(emf).replace(".emf", ".png"));
            match converter.convert(emf, &png) {
                Ok(()) if convert::is_converted(&png) => Some(png),
                Ok(()) => {
                    warn!("Conversion produced no usable image: {emf:?}");
                    None
                }
                Err(e) => {
                    warn!("Could not convert {emf:?}: {e:#}");
                    None
                }
            }
        })
        .collect()
}

/// Extract and convert the plots of one assay spreadsheet, paired with compounds in order.
pub fn extract_cell_line_plots<C>(
    file: &AssayFile,
    compounds: &[String],
    image_dir: &Path,
    converter: &C,
) -> Result<BTreeMap<String, PathBuf>, Report>
where
    C: ImageConverter + ?Sized,
{
    let output_dir = image_dir.join(&file.cell_line);
    let emfs = images::extract_plots(&file.path, compounds.len(), &output_dir.join("emf"))?;
    let pngs = convert_plots(&emfs, &output_dir, converter);
    debug!(
        "{}: {} compounds, {} chart images, {} converted",
        file.cell_line,
        compounds.len(),
        emfs.len(),
        pngs.len()
    );
    Ok(compounds.iter().cloned().zip(pngs).collect())
}

/// Build the plot grid of an input with a given image converter, and write the HTML report.
pub fn extract_ic50_plots_with<C>(args: &ExtractArgs, converter: &C) -> Result<PlotGrid, Report>
where
    C: ImageConverter + ?Sized,
{
    let compound_names = load_json_map(args.compound_map.as_deref(), "compound name")?;
    let cell_colors = load_json_map(args.cell_colors.as_deref(), "cell color")?;

    // ------------------------------------------------------------------------
    // Inputs

    let assay_files = find_excel_files(&args.input)?;
    let files = &assay_files.files;
    if files.is_empty() {
        return Err(eyre!("No CCSP Excel files found in: {:?}", args.input))
            .suggestion("Assay spreadsheets are named *_paste.xlsx");
    }
    info!("Found {} cell line files", files.len());

    let compounds = extract_compounds(&files[0].path);
    if compounds.is_empty() {
        return Err(eyre!("Could not extract compound list from: {:?}", files[0].path));
    }
    info!("Found {} test compounds: {}", compounds.len(), compounds.join(", "));
    info!("(Staurosporine excluded)");

    // ------------------------------------------------------------------------
    // Plots

    create_parent_dir(&args.output_html)?;
    let parent = match args.output_html.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let image_dir = tempfile::Builder::new()
        .prefix(".ic50_plots_")
        .tempdir_in(parent)
        .wrap_err_with(|| eyre!("Failed to create image directory in: {parent:?}"))?;

    let progress_bar = match args.progress {
        true => ProgressBar::new(files.len() as u64),
        false => ProgressBar::hidden(),
    };
    let progress_bar_style = ProgressStyle::with_template(
        "{bar:40} {pos}/{len} ({percent}%) | {msg} | Elapsed: {elapsed_precise}",
    )
    .wrap_err("Failed to create progress bar from template.")?;
    progress_bar.set_style(progress_bar_style);

    let mut grid = PlotGrid::new();
    for file in files {
        progress_bar.set_message(file.cell_line.clone());
        info!("Processing {}...", file.cell_line);
        match extract_cell_line_plots(file, &compounds, image_dir.path(), converter) {
            Ok(plots) if plots.is_empty() => warn!("  No plots extracted for {}", file.cell_line),
            Ok(plots) => {
                info!("  Extracted {} % Inhibition plots", plots.len());
                grid.insert(file.cell_line.clone(), plots);
            }
            Err(e) => warn!("  Skipping {:?}: {e:#}", file.path),
        }
        progress_bar.inc(1);
    }
    progress_bar.finish_and_clear();

    // ------------------------------------------------------------------------
    // Report

    report::write_html(&args.output_html, &grid, &compounds, &compound_names, &cell_colors)?;
    info!("Output saved to: {:?}", args.output_html);
    info!("  {} cell lines x {} test compounds", grid.len(), compounds.len());

    Ok(grid)
}

/// Extract IC50 % inhibition plots from assay spreadsheets into an HTML report, using inkscape.
///
/// It is an error if no assay spreadsheets or no test compounds are found, in which
/// case no report is written.
pub fn extract_ic50_plots(args: &ExtractArgs) -> Result<(), Report> {
    debug!("Arguments: {}", serde_json::to_string_pretty(args)?);
    let converter = Inkscape::new(&args.inkscape, Duration::from_secs(args.timeout));
    extract_ic50_plots_with(args, &converter)?;
    Ok(())
}
