//! Recover the embedded chart images of an assay workbook.
//!
//! An `.xlsx` workbook is a zip archive, with embedded graphics stored under `xl/media/`.

use crate::utils::file_name;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::debug;
use regex::Regex;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use zip::ZipArchive;

/// Folder of the archive holding embedded graphics.
pub const MEDIA_DIR: &str = "xl/media/";

/// Chart images are larger than this (bytes), smaller ones are placeholders.
pub const MIN_PLOT_SIZE: u64 = 3000;

/// Numbered EMF image name, ex. `image12.emf`.
static IMAGE_NAME: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"image(\d+)\.emf$").ok());

/// An image entry of the workbook archive.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaImage {
    /// Index of the entry in the archive.
    pub index: usize,
    /// Full name of the entry, ex. `xl/media/image3.emf`.
    pub name: String,
    /// Uncompressed size (bytes).
    pub size: u64,
}

impl MediaImage {
    /// Number embedded in the image name.
    pub fn number(&self) -> u32 {
        image_number(&self.name)
    }
}

/// Number embedded in an `image<N>.emf` name, or 0 if there is none.
///
/// ## Examples
///
/// ```rust
/// use ccsp::extract::images::image_number;
///
/// assert_eq!(image_number("xl/media/image12.emf"), 12);
/// assert_eq!(image_number("image2.emf"), 2);
/// assert_eq!(image_number("xl/media/chart.emf"), 0);
/// ```
pub fn image_number(name: &str) -> u32 {
    IMAGE_NAME
        .as_ref()
        .and_then(|re| re.captures(name))
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(0)
}

/// Select the chart images among the media entries.
///
/// EMF entries directly in the media folder are sorted by image number, entries at
/// or below [`MIN_PLOT_SIZE`] are dropped, and the first `n` remain.
pub fn select_plots(mut images: Vec<MediaImage>, n: usize) -> Vec<MediaImage> {
    images.retain(|image| {
        image
            .name
            .strip_prefix(MEDIA_DIR)
            .is_some_and(|name| name.ends_with(".emf") && !name.contains('/'))
    });
    images.sort_by(|a, b| a.number().cmp(&b.number()).then_with(|| a.name.cmp(&b.name)));
    images.into_iter().filter(|image| image.size > MIN_PLOT_SIZE).take(n).collect()
}

/// List every entry of a workbook archive.
pub fn list_media<P>(path: &P) -> Result<Vec<MediaImage>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let mut archive = open_archive(path)?;
    let images = (0..archive.len())
        .map(|index| {
            let entry = archive.by_index(index)?;
            Ok(MediaImage { index, name: entry.name().to_string(), size: entry.size() })
        })
        .collect::<Result<Vec<_>, zip::result::ZipError>>()
        .wrap_err_with(|| eyre!("Failed to list workbook archive: {path:?}"))?;
    Ok(images)
}

/// Extract the first `n` chart images of a workbook into a directory.
///
/// Returns the paths of the extracted `.emf` files, in plot order.
pub fn extract_plots<P>(path: &P, n: usize, output_dir: &Path) -> Result<Vec<PathBuf>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let media = list_media(path)?;
    let total = media.len();
    let plots = select_plots(media, n);
    debug!("{path:?}: {total} archive entries, {} chart images selected", plots.len());

    std::fs::create_dir_all(output_dir)
        .wrap_err_with(|| eyre!("Failed to create directory: {output_dir:?}"))?;

    let mut archive = open_archive(path)?;
    let paths = plots
        .iter()
        .map(|image| {
            let output_path = output_dir.join(file_name(&image.name));
            let mut entry = archive.by_index(image.index)?;
            let mut reader = BufReader::new(&mut entry);
            let mut writer = BufWriter::new(File::create(&output_path)?);
            std::io::copy(&mut reader, &mut writer)?;
            Ok(output_path)
        })
        .collect::<Result<Vec<_>, Report>>()
        .wrap_err_with(|| eyre!("Failed to extract chart images from: {path:?}"))?;

    Ok(paths)
}

fn open_archive<P>(path: &P) -> Result<ZipArchive<BufReader<File>>, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let file = File::open(path).wrap_err_with(|| eyre!("Failed to open file: {path:?}"))?;
    ZipArchive::new(BufReader::new(file))
        .wrap_err_with(|| eyre!("Failed to read zip archive: {path:?}"))
}
