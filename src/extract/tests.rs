use crate::extract::compounds::{find_compounds, read_compounds};
use crate::extract::convert::is_converted;
use crate::extract::images::{image_number, select_plots, MediaImage};
use crate::extract::report::render_html;
use crate::extract::*;
use crate::utils::file_name;
use crate::utils::fixtures::{n, t, write_workbook};
use crate::Value;
use color_eyre::eyre::{eyre, Report, Result};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

// ----------------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------------

/// Writes a fixed-size PNG stand-in, failing for the listed inputs.
#[derive(Default)]
struct FakeConverter {
    fail: Vec<String>,
    size: usize,
}

impl FakeConverter {
    fn new() -> Self {
        FakeConverter { fail: Vec::new(), size: 2000 }
    }
}

impl ImageConverter for FakeConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), Report> {
        if self.fail.contains(&file_name(input)) {
            return Err(eyre!("Conversion failed: {input:?}"));
        }
        std::fs::write(output, vec![b'p'; self.size])?;
        Ok(())
    }
}

fn chart_sheet(labels: &[&str]) -> Vec<Vec<Value>> {
    let mut rows = vec![vec![t("Plate 1")], vec![Value::Empty, t("XLFit Chart (% Inhibition)")]];
    rows.extend(labels.iter().map(|label| vec![Value::Empty, t(label)]));
    rows.push(vec![]);
    rows.push(vec![Value::Empty, t("Response Chart")]);
    rows
}

fn zip_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

/// Write an assay workbook with chart labels and `(name, size)` media entries.
fn write_assay(path: &Path, sheet: &str, labels: &[&str], media: &[(&str, usize)]) -> Result<(), Report> {
    let scratch = path.with_extension("scratch");
    write_workbook(&scratch, &[(sheet, chart_sheet(labels))])?;

    let mut archive = ZipArchive::new(std::fs::File::open(&scratch)?)?;
    let mut writer = ZipWriter::new(std::fs::File::create(path)?);
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        writer.start_file(entry.name().to_string(), zip_options())?;
        writer.write_all(&bytes)?;
    }
    for (name, size) in media {
        writer.start_file(format!("xl/media/{name}"), zip_options())?;
        writer.write_all(&vec![b'e'; *size])?;
    }
    writer.finish()?;
    std::fs::remove_file(&scratch)?;
    Ok(())
}

const MEDIA: [(&str, usize); 5] = [
    ("image10.emf", 4000),
    ("image1.emf", 500),
    ("image2.emf", 4000),
    ("image3.emf", 4000),
    ("image4.png", 9000),
];

fn media_image(index: usize, name: &str, size: u64) -> MediaImage {
    MediaImage { index, name: name.to_string(), size }
}

// ----------------------------------------------------------------------------
// Compounds
// ----------------------------------------------------------------------------

#[test]
fn compounds_in_chart_order() {
    let grid = chart_sheet(&["BT20_TA145", "BT20_Staurosporine", "BT20_TA146", "TA200"]);
    assert_eq!(find_compounds(&grid), ["TA145", "TA146", "TA200"]);
}

#[test]
fn compounds_ignore_numbers_and_rows_before_marker() {
    let grid = vec![
        vec![Value::Empty, t("BT20_TA001")],
        vec![Value::Empty, t("XLFit Chart")],
        vec![Value::Empty],
        vec![Value::Empty, n(3.0)],
        vec![Value::Empty, t("BT20_TA145")],
        vec![Value::Empty, t("  ")],
        vec![Value::Empty, t("BT20_stauro")],
        vec![Value::Empty, t("BT20_TA146")],
        vec![],
        vec![Value::Empty, t("BT20_TA999")],
    ];
    assert_eq!(find_compounds(&grid), ["TA145", "TA146"]);
}

#[test]
fn compounds_scan_first_49_rows() {
    let mut grid = vec![vec![Value::Empty]; 48];
    grid.push(vec![Value::Empty, t("XLFit Chart")]);
    grid.push(vec![Value::Empty, t("BT20_TA145")]);
    assert!(find_compounds(&grid).is_empty());

    grid.remove(0);
    assert_eq!(find_compounds(&grid), ["TA145"]);
}

#[test]
fn compounds_from_alternate_sheet() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("20260122_BT20_6TA_144H_paste.xlsx");
    write_assay(&path, "Data analysis for IC50", &["BT20_TA145"], &[])?;
    assert_eq!(read_compounds(&path)?, ["TA145"]);

    let other = dir.path().join("20260122_A549_6TA_144H_paste.xlsx");
    write_workbook(&other, &[("Raw Data", vec![vec![t("x")]])])?;
    assert!(read_compounds(&other)?.is_empty());

    let broken = dir.path().join("20260122_MCF7_6TA_144H_paste.xlsx");
    std::fs::write(&broken, "not a workbook")?;
    assert!(extract_compounds(&broken).is_empty());
    Ok(())
}

// ----------------------------------------------------------------------------
// Images
// ----------------------------------------------------------------------------

#[test]
fn image_numbers_from_names() {
    assert_eq!(image_number("xl/media/image1.emf"), 1);
    assert_eq!(image_number("xl/media/image107.emf"), 107);
    assert_eq!(image_number("xl/media/image4.png"), 0);
    assert_eq!(image_number("xl/media/image.emf"), 0);
    assert_eq!(image_number("xl/media/image3.emf.bak"), 0);
}

#[test]
fn plots_sorted_by_number_and_filtered_by_size() {
    let media = vec![
        media_image(0, "xl/media/image10.emf", 4000),
        media_image(1, "xl/media/image1.emf", 500),
        media_image(2, "xl/media/image2.emf", 4000),
        media_image(3, "xl/media/image3.emf", 3000),
        media_image(4, "xl/media/image4.png", 9000),
        media_image(5, "xl/drawings/image5.emf", 9000),
        media_image(6, "xl/media/image11.emf", 3001),
    ];
    let names =
        |plots: Vec<MediaImage>| plots.into_iter().map(|p| p.name).collect::<Vec<_>>();

    assert_eq!(
        names(select_plots(media.clone(), 5)),
        ["xl/media/image2.emf", "xl/media/image10.emf", "xl/media/image11.emf"]
    );
    assert_eq!(names(select_plots(media.clone(), 1)), ["xl/media/image2.emf"]);
    assert!(select_plots(media, 0).is_empty());
}

#[test]
fn extract_plots_from_workbook() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("20260122_BT20_6TA_144H_paste.xlsx");
    write_assay(&path, "Analyzed Data", &["BT20_TA145", "BT20_TA146"], &MEDIA)?;

    let emfs = images::extract_plots(&path, 2, &dir.path().join("emf"))?;
    let names: Vec<_> = emfs.iter().map(file_name).collect();
    assert_eq!(names, ["image2.emf", "image3.emf"]);
    assert_eq!(std::fs::metadata(&emfs[0])?.len(), 4000);
    Ok(())
}

// ----------------------------------------------------------------------------
// Input Discovery
// ----------------------------------------------------------------------------

#[test]
fn find_files_in_directory() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    for sub in ["plate2", "__MACOSX", ".hidden", "plate2/nested"] {
        std::fs::create_dir_all(root.join(sub))?;
    }
    for file in [
        "20260122_MCF7_6TA_paste.xlsx",
        "~$20260122_MCF7_6TA_paste.xlsx",
        "Summary_20260122_paste.xlsx",
        "notes.txt",
        "plate2/20260122_A549_6TA_paste.xlsx",
        "plate2/nested/20260122_BT20_6TA_paste.xlsx",
        "__MACOSX/20260122_HCT116_6TA_paste.xlsx",
        ".hidden/20260122_HCT116_6TA_paste.xlsx",
    ] {
        std::fs::write(root.join(file), "")?;
    }

    let found = find_excel_files(root)?;
    assert!(found.extract_dir.is_none());
    let cell_lines: Vec<_> = found.files.iter().map(|f| f.cell_line.as_str()).collect();
    assert_eq!(cell_lines, ["A549", "MCF7"]);
    assert_eq!(found.files[0].path, root.join("plate2/20260122_A549_6TA_paste.xlsx"));
    Ok(())
}

#[test]
fn find_files_in_zip() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.zip");
    let mut writer = ZipWriter::new(std::fs::File::create(&path)?);
    for name in [
        "run/plate1/deep/20260122_MCF7_6TA_paste.xlsx",
        "run/20260122_BT20_6TA_paste.xlsx",
        "__MACOSX/run/._20260122_BT20_6TA_paste.xlsx",
        "run/readme.txt",
    ] {
        writer.start_file(name, zip_options())?;
        writer.write_all(b"xlsx")?;
    }
    writer.finish()?;

    let found = find_excel_files(&path)?;
    let extract_dir = found.extract_dir.as_ref().map(|d| d.path().to_path_buf());
    let cell_lines: Vec<_> = found.files.iter().map(|f| f.cell_line.as_str()).collect();
    assert_eq!(cell_lines, ["BT20", "MCF7"]);
    assert!(extract_dir.as_ref().is_some_and(|d| file_name(d).starts_with("ccsp_extract_")));

    drop(found);
    assert!(extract_dir.is_some_and(|d| !d.exists()));
    Ok(())
}

#[test]
fn find_files_invalid_input() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.txt");
    std::fs::write(&path, "")?;
    assert!(find_excel_files(&path).is_err());
    assert!(find_excel_files(&dir.path().join("missing.zip")).is_err());
    Ok(())
}

#[test]
fn json_maps() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let valid = dir.path().join("names.json");
    let malformed = dir.path().join("colors.json");
    std::fs::write(&valid, r#"{"TA145": "Dxd", "TA146": "SN-38"}"#)?;
    std::fs::write(&malformed, r##"{"BT20": "#FFEEEE""##)?;

    assert!(load_json_map(None, "compound name")?.is_empty());
    assert!(load_json_map(Some(dir.path().join("missing.json").as_path()), "compound name")?.is_empty());
    assert_eq!(load_json_map(Some(valid.as_path()), "compound name")?["TA146"], "SN-38");
    assert!(load_json_map(Some(malformed.as_path()), "cell color").is_err());
    Ok(())
}

// ----------------------------------------------------------------------------
// Conversion
// ----------------------------------------------------------------------------

#[test]
fn convert_plots_skips_failures() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let emfs = ["image2.emf", "image3.emf", "image5.emf"].map(|e| dir.path().join(e));
    let converter = FakeConverter { fail: vec!["image3.emf".to_string()], ..FakeConverter::new() };

    let pngs = convert_plots(&emfs, dir.path(), &converter);
    let names: Vec<_> = pngs.iter().map(file_name).collect();
    assert_eq!(names, ["image2.png", "image5.png"]);

    let tiny = FakeConverter { size: 1000, ..Default::default() };
    assert!(convert_plots(&emfs, dir.path(), &tiny).is_empty());
    assert!(!is_converted(&dir.path().join("image9.png")));
    Ok(())
}

#[cfg(unix)]
#[test]
fn inkscape_runs_program() -> Result<(), Report> {
    use std::time::{Duration, Instant};

    let dir = tempfile::tempdir()?;
    let output = dir.path().join("image1.png");

    // `sh <script> --export-filename <output>` runs the script with the output as $2
    let script = dir.path().join("write.emf");
    std::fs::write(&script, "head -c 2000 /dev/zero > \"$2\"\n")?;
    let converter = Inkscape::new("sh", Duration::from_secs(10));
    converter.convert(&script, &output)?;
    assert!(is_converted(&output));

    let script = dir.path().join("hang.emf");
    std::fs::write(&script, "sleep 5\n")?;
    let converter = Inkscape::new("sh", Duration::from_millis(200));
    let start = Instant::now();
    assert!(converter.convert(&script, &dir.path().join("image2.png")).is_err());
    assert!(start.elapsed() < Duration::from_secs(4));

    let missing = Inkscape::new("ccsp-no-such-program", Duration::from_secs(1));
    assert!(missing.convert(&script, &output).is_err());
    Ok(())
}

// ----------------------------------------------------------------------------
// Report
// ----------------------------------------------------------------------------

#[test]
fn html_report() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let png = dir.path().join("image2.png");
    std::fs::write(&png, b"png")?;

    let compounds = ["TA145", "TA146"].map(String::from);
    let grid = PlotGrid::from([(
        "BT<20>".to_string(),
        BTreeMap::from([("TA145".to_string(), png), ("TA146".to_string(), dir.path().join("gone.png"))]),
    )]);
    let names = BTreeMap::from([("TA145".to_string(), "Dxd & co".to_string())]);
    let colors = BTreeMap::new();

    let html = render_html(&grid, &compounds, &names, &colors);
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"<span class="compound-name">Dxd &amp; co</span>"#));
    assert!(html.contains(r#"<th><span class="compound-id">TA146</span></th>"#));
    assert!(html.contains(r#"style="background-color: #FFFFFF;">BT&lt;20&gt;</td>"#));
    assert!(html.contains("data:image/png;base64,cG5n"));
    assert!(html.contains("<td>-</td>"));
    assert!(html.contains("2 test compounds × 1 cell lines (% Inhibition plots only)"));
    Ok(())
}

// ----------------------------------------------------------------------------
// Extract
// ----------------------------------------------------------------------------

fn write_inputs(input: &Path) -> Result<(), Report> {
    std::fs::create_dir_all(input)?;
    let labels = ["BT20_TA145", "BT20_Staurosporine", "BT20_TA146"];
    write_assay(&input.join("20260122_BT20_6TA_144H_paste.xlsx"), "Analyzed Data", &labels, &MEDIA)?;
    write_assay(&input.join("20260122_A549_6TA_144H_paste.xlsx"), "Analyzed Data", &labels, &MEDIA)?;
    write_assay(&input.join("20260122_MCF7_6TA_144H_paste.xlsx"), "Analyzed Data", &labels, &[])?;
    Ok(())
}

#[test]
fn extract_report() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input");
    write_inputs(&input)?;
    let names = dir.path().join("names.json");
    let colors = dir.path().join("colors.json");
    std::fs::write(&names, r#"{"TA145": "Dxd"}"#)?;
    std::fs::write(&colors, r##"{"BT20": "#FFE0E0"}"##)?;

    let output = dir.path().join("report").join("ic50.html");
    let args = ExtractArgs {
        compound_map: Some(names),
        cell_colors: Some(colors),
        ..ExtractArgs::new(input, output.clone())
    };
    let grid = extract_ic50_plots_with(&args, &FakeConverter::new())?;

    // MCF7 has no chart images
    assert_eq!(grid.keys().collect::<Vec<_>>(), ["A549", "BT20"]);
    assert_eq!(file_name(&grid["BT20"]["TA145"]), "image2.png");
    assert_eq!(file_name(&grid["BT20"]["TA146"]), "image3.png");

    let html = std::fs::read_to_string(&output)?;
    assert!(html.contains("2 test compounds × 2 cell lines"));
    assert!(html.contains(r#"<span class="compound-name">Dxd</span>"#));
    assert!(html.contains(r#"style="background-color: #FFE0E0;">BT20</td>"#));
    assert!(!html.contains("Staurosporine"));
    assert_eq!(html.matches("data:image/png;base64,").count(), 4);
    assert!(html.find("A549").unwrap_or(usize::MAX) < html.find(">BT20<").unwrap_or(0));

    // temporary images are removed
    let leftovers = std::fs::read_dir(dir.path().join("report"))?
        .filter_map(|e| e.ok())
        .filter(|e| file_name(&e.path()).starts_with(".ic50_plots_"))
        .count();
    assert_eq!(leftovers, 0);
    Ok(())
}

#[test]
fn extract_skips_failed_conversions() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input");
    write_inputs(&input)?;
    let output = dir.path().join("ic50.html");

    let converter = FakeConverter { fail: vec!["image2.emf".to_string()], ..FakeConverter::new() };
    let grid = extract_ic50_plots_with(&ExtractArgs::new(input, output.clone()), &converter)?;
    assert_eq!(grid["A549"].len(), 1);

    let html = std::fs::read_to_string(&output)?;
    assert_eq!(html.matches("<td>-</td>").count(), 2);
    Ok(())
}

#[test]
fn extract_without_files_is_error() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("empty");
    std::fs::create_dir_all(&input)?;
    let output = dir.path().join("ic50.html");

    let result = extract_ic50_plots_with(&ExtractArgs::new(input, output.clone()), &FakeConverter::new());
    assert!(result.is_err());
    assert!(!output.exists());
    Ok(())
}

#[test]
fn extract_without_compounds_is_error() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input)?;
    write_workbook(
        &input.join("20260122_BT20_6TA_144H_paste.xlsx"),
        &[("Analyzed Data", vec![vec![Value::Empty, t("BT20_TA145")]])],
    )?;
    let output = dir.path().join("ic50.html");

    let result = extract_ic50_plots_with(&ExtractArgs::new(input, output.clone()), &FakeConverter::new());
    assert!(result.is_err());
    assert!(!output.exists());
    Ok(())
}
