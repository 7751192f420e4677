use crate::plot::colormap::{coolwarm, normalize, value_colors, Rgb};
use crate::plot::layout::{nice_ticks, Shape};
use crate::plot::render::write_png;
use crate::plot::*;
use crate::utils::fixtures::{n, t, write_workbook};
use crate::Value;
use color_eyre::eyre::{Report, Result};
use std::path::Path;

fn bars(values: &[(&str, f64)]) -> Vec<Bar> {
    values.iter().map(|(label, value)| Bar { label: label.to_string(), value: *value }).collect()
}

fn write_iaa(path: &Path) -> Result<(), Report> {
    let rows = vec![
        vec![t("TAA"), t("IAA/Receptor")],
        vec![t("ERBB2"), n(60.5)],
        vec![t("TACSTD2"), n(3.2)],
        vec![t("MET"), t("n/a")],
        vec![t("CEACAM5"), Value::Empty],
        vec![t("EGFR"), t(" 12.5 ")],
    ];
    write_workbook(path, &[("Sheet1", rows)])
}

// ----------------------------------------------------------------------------
// Colormap
// ----------------------------------------------------------------------------

#[test]
fn coolwarm_anchors() {
    assert_eq!(coolwarm(0.5), Rgb::new(0.865395197, 0.86541021, 0.865395561));
    assert_eq!(coolwarm(0.25), Rgb::new(0.552953156, 0.688929332, 0.995375608));
    assert_eq!(coolwarm(-1.0), coolwarm(0.0));
    // halfway between the 0.75 and 0.78125 control points
    let between = coolwarm(0.765625);
    assert!((between.r - (0.958003065 + 0.943660866) / 2.0).abs() < 1e-9);
    assert!((between.g - (0.602842431 + 0.551750968) / 2.0).abs() < 1e-9);
    assert_eq!(Rgb::WHITE.to_u8(), (255, 255, 255));
}

#[test]
fn normalize_values() {
    assert_eq!(normalize(&[2.0, 4.0, 6.0]), [0.0, 0.5, 1.0]);
    assert_eq!(normalize(&[7.0, 7.0]), [0.0, 0.0]);
    let colors = value_colors(&[1.0, 100.0]);
    assert_eq!(colors[0], coolwarm(0.0));
    assert_eq!(colors[1], coolwarm(1.0));
    // equal values all take the low end of the colormap
    let colors = value_colors(&[7.0, 7.0]);
    assert_eq!(colors, [Rgb::new(0.2298057, 0.298717966, 0.753683153); 2]);
}

// ----------------------------------------------------------------------------
// Layout
// ----------------------------------------------------------------------------

#[test]
fn ticks_fit_range() {
    assert_eq!(nice_ticks(0.0, 100.0, 6), [0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    assert_eq!(nice_ticks(-1.0, 1.0, 5), [-1.0, -0.5, 0.0, 0.5, 1.0]);
    assert_eq!(nice_ticks(5.0, 5.0, 6), [5.0]);
}

#[test]
fn broken_axis_layout() {
    let bars = bars(&[("TACSTD2", 2.0), ("EGFR", 10.0), ("ERBB2", 60.0), ("MET", 70.0)]);
    let chart = BrokenBarChart::default();
    let (left, right) = chart.panels(&bars);
    let scene = chart.layout(&bars);

    assert_eq!((scene.width, scene.height), (720.0, 504.0));
    assert!((right.x - left.right() - 0.05 * left.width).abs() < 1e-9);

    // two bars fit the left panel, two are clipped to it, two reach the right panel
    let rects: Vec<_> = scene
        .rects()
        .filter_map(|s| match s {
            Shape::Rect { x, width, y, .. } => Some((*x, *width, *y)),
            _ => None,
        })
        .collect();
    assert_eq!(rects.len(), 6);
    assert!((rects[2].1 - left.width).abs() < 1e-9);
    assert!((rects[4].0 - right.x).abs() < 1e-9);
    assert!((rects[4].1 - right.width / 2.0).abs() < 1e-9);
    assert!((rects[5].1 - right.width).abs() < 1e-9);
    // ascending values are drawn bottom to top
    assert!(rects[0].2 > rects[3].2);

    // 6 spines, 4 + 5 x ticks, 4 y ticks, 4 break marks
    let lines = scene.shapes.iter().filter(|s| matches!(s, Shape::Line { .. })).count();
    assert_eq!(lines, 6 + 9 + 4 + 4);
    let inner_spine = scene.shapes.iter().any(|s| match s {
        Shape::Line { points, .. } => {
            points.iter().all(|(x, _)| (x - left.right()).abs() < 1e-9)
                && points.iter().any(|(_, y)| (y - left.y).abs() < 1e-9)
        }
        _ => false,
    });
    assert!(!inner_spine);

    let texts: Vec<_> = scene.texts().collect();
    assert_eq!(texts.iter().filter(|t| **t == "ERBB2").count(), 1);
    assert!(texts.contains(&"IAA/Receptor Values by Gene"));
    assert!(texts.contains(&"IAA/Receptor"));
    assert!(texts.contains(&"60"));
    let title_bold = scene.shapes.iter().any(|s| {
        matches!(s, Shape::Text { text, bold: true, size, .. } if text == "IAA/Receptor Values by Gene" && *size == 14.0)
    });
    assert!(title_bold);
}

// ----------------------------------------------------------------------------
// Plot
// ----------------------------------------------------------------------------

#[test]
fn read_bars_skips_non_numeric() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("IAA.xlsx");
    write_iaa(&path)?;

    let bars = read_bars(&path, "TAA", "IAA/Receptor")?;
    let labels: Vec<_> = bars.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["TACSTD2", "EGFR", "ERBB2"]);
    assert_eq!(bars[1].value, 12.5);

    assert!(read_bars(&path, "Gene", "IAA/Receptor").is_err());
    Ok(())
}

#[test]
fn plot_pdf() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("IAA.xlsx");
    write_iaa(&input)?;

    let args = PlotArgs { input, formats: vec![OutputFormat::Pdf], ..Default::default() };
    let paths = plot_iaa(&args)?;

    assert_eq!(paths, [dir.path().join("IAA_barplot.pdf")]);
    let pdf = std::fs::read(&paths[0])?;
    assert!(pdf.starts_with(b"%PDF"));
    Ok(())
}

#[test]
fn png_without_text() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("plots").join("bars.png");
    let mut scene = Scene::new(144.0, 72.0);
    scene.shapes.push(Shape::Rect { x: 10.0, y: 10.0, width: 50.0, height: 20.0, fill: coolwarm(1.0) });
    scene.shapes.push(Shape::Line { points: vec![(10.0, 40.0), (130.0, 40.0)], width: 0.8 });

    write_png(&scene, &path, 72)?;
    let png = std::fs::read(&path)?;
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    Ok(())
}

#[test]
fn plot_without_values_is_error() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("IAA.xlsx");
    write_workbook(&input, &[("Sheet1", vec![vec![t("TAA"), t("IAA/Receptor")], vec![t("MET"), t("-")]])])?;

    let args = PlotArgs { input, formats: vec![OutputFormat::Pdf], ..Default::default() };
    assert!(plot_iaa(&args).is_err());
    assert!(!dir.path().join("IAA_barplot.pdf").exists());
    Ok(())
}

#[test]
fn invalid_range_is_error() {
    let args = PlotArgs { right_range: vec![65.0, 55.0], ..Default::default() };
    assert!(args.chart().is_err());
    let args = PlotArgs { left_range: vec![0.0], ..Default::default() };
    assert!(args.chart().is_err());
    assert!(PlotArgs::default().chart().is_ok());
}

#[test]
fn output_dir_defaults_to_input_dir() {
    let args = PlotArgs { input: "/data/IAA.xlsx".into(), ..Default::default() };
    assert_eq!(args.output_dir(), Path::new("/data"));
    assert_eq!(PlotArgs::default().output_dir(), Path::new("."));
    let args = PlotArgs { output_dir: Some("plots".into()), ..Default::default() };
    assert_eq!(args.output_dir(), Path::new("plots"));
}
