use crate::utils::fixtures::{n, t, write_workbook};
use crate::xlsx::{grid_to_table, Workbook};
use crate::Value;
use color_eyre::eyre::{Report, Result};

#[test]
fn grid_anchored_at_a1() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("anchored.xlsx");
    let rows = vec![vec![], vec![Value::Empty, t("XLFit Chart")], vec![Value::Empty, t("BT20_TA145")]];
    write_workbook(&path, &[("Analyzed Data", rows)])?;

    let mut workbook = Workbook::open(&path)?;
    assert!(workbook.has_sheet("Analyzed Data"));
    let grid = workbook.grid("Analyzed Data")?;

    assert_eq!(grid.len(), 3);
    assert_eq!(grid[0][0], Value::Empty);
    assert_eq!(grid[1][1], t("XLFit Chart"));
    assert_eq!(grid[2][1], t("BT20_TA145"));
    Ok(())
}

#[test]
fn table_with_header_in_second_row() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("summary.xlsx");
    let rows = vec![
        vec![t("Assay summary")],
        vec![t("Compound ID"), t("Max % Inhibition"), t("Corrected Abs IC50 nM")],
        vec![t("BXPC3_TA145"), n(98.123), t(">10000")],
        vec![],
        vec![t("BXPC3_TA146"), n(55.0), n(12.5)],
    ];
    write_workbook(&path, &[("Summary", rows)])?;

    let mut workbook = Workbook::open(&path)?;
    let table = workbook.table("Summary", 1)?;

    assert_eq!(table.headers, ["Compound ID", "Max % Inhibition", "Corrected Abs IC50 nM"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.get("Corrected Abs IC50 nM", 0)?, &t(">10000"));
    assert_eq!(table.get("Max % Inhibition", 1)?, &n(55.0));
    Ok(())
}

#[test]
fn missing_sheet_is_error() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("other.xlsx");
    write_workbook(&path, &[("Sheet1", vec![vec![t("a")]])])?;

    let mut workbook = Workbook::open(&path)?;
    assert!(workbook.grid("Summary").is_err());
    assert_eq!(workbook.first_sheet()?, "Sheet1");
    Ok(())
}

#[test]
fn unnamed_headers() -> Result<(), Report> {
    let grid = vec![vec![t(" TAA "), Value::Empty], vec![t("ERBB2"), n(1.0)]];
    let table = grid_to_table(grid, 0)?;
    assert_eq!(table.headers, ["TAA", "Unnamed: 1"]);
    assert!(grid_to_table(Vec::new(), 0).is_err());
    Ok(())
}
