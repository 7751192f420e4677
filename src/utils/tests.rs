use crate::utils::{cell_line_from_filename, create_parent_dir, file_name, round2};
use color_eyre::eyre::{Report, Result};

#[test]
fn cell_line_standard() -> Result<(), Report> {
    assert_eq!(cell_line_from_filename("20260122_BXPC3_6TA_144H_paste.xlsx"), "BXPC3");
    assert_eq!(cell_line_from_filename("20250101_NCI-H1975_paste.xlsx"), "NCI-H1975");
    Ok(())
}

#[test]
fn cell_line_without_separator() -> Result<(), Report> {
    assert_eq!(cell_line_from_filename("BT20.xlsx"), "BT20");
    assert_eq!(cell_line_from_filename("BT20"), "BT20");
    Ok(())
}

#[test]
fn round_two_decimals() -> Result<(), Report> {
    assert_eq!(round2(1000.555), 1000.56);
    assert_eq!(round2(12.344), 12.34);
    assert_eq!(round2(-0.125), -0.13);
    Ok(())
}

#[test]
fn parent_dir_created() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("deeper").join("out.xlsx");
    create_parent_dir(&path)?;
    assert!(dir.path().join("nested").join("deeper").is_dir());
    assert_eq!(file_name(&path), "out.xlsx");
    Ok(())
}
