//! Render a [`Scene`] to PNG (raster) or PDF (vector).

use crate::plot::colormap::Rgb;
use crate::plot::layout::{text_width, Align, Scene, Shape};
use crate::utils::create_parent_dir;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color as PdfColor, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon,
};
use std::fmt::Debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Points per inch.
const POINTS_PER_INCH: f64 = 72.0;
/// Millimeters per point.
const MM_PER_POINT: f64 = 25.4 / POINTS_PER_INCH;

/// A drawing surface for scene shapes.
pub trait Canvas {
    fn draw(&mut self, shape: &Shape) -> Result<(), Report>;

    /// Complete the drawing and write it out.
    fn finish(self) -> Result<(), Report>;
}

/// Draw every shape of a scene, in order, and finish the canvas.
pub fn render<C: Canvas>(scene: &Scene, mut canvas: C) -> Result<(), Report> {
    scene.shapes.iter().try_for_each(|shape| canvas.draw(shape))?;
    canvas.finish()
}

// ----------------------------------------------------------------------------
// PNG
// ----------------------------------------------------------------------------

/// A raster canvas, writing a PNG with plotters.
pub struct PngCanvas<'a> {
    area: DrawingArea<BitMapBackend<'a>, Shift>,
    /// Pixels per point.
    scale: f64,
}

impl<'a> PngCanvas<'a> {
    /// Create a white canvas for a scene of `width` x `height` points.
    pub fn new(path: &'a Path, width: f64, height: f64, dpi: u32) -> Result<Self, Report> {
        create_parent_dir(path)?;
        let scale = dpi as f64 / POINTS_PER_INCH;
        let size = ((width * scale).round() as u32, (height * scale).round() as u32);
        debug!("PNG canvas: {}x{} pixels at {dpi} dpi", size.0, size.1);
        let area = BitMapBackend::new(path, size).into_drawing_area();
        area.fill(&WHITE).map_err(|e| eyre!("{e:?}"))?;
        Ok(PngCanvas { area, scale })
    }

    fn px(&self, (x, y): (f64, f64)) -> (i32, i32) {
        ((x * self.scale).round() as i32, (y * self.scale).round() as i32)
    }
}

fn rgb_color(color: &Rgb) -> RGBColor {
    let (r, g, b) = color.to_u8();
    RGBColor(r, g, b)
}

impl Canvas for PngCanvas<'_> {
    fn draw(&mut self, shape: &Shape) -> Result<(), Report> {
        let result = match shape {
            Shape::Rect { x, y, width, height, fill } => {
                let corners = [self.px((*x, *y)), self.px((x + width, y + height))];
                self.area.draw(&Rectangle::new(corners, rgb_color(fill).filled()))
            }
            Shape::Line { points, width } => {
                let points: Vec<_> = points.iter().map(|p| self.px(*p)).collect();
                let stroke = ((width * self.scale).round() as u32).max(1);
                self.area.draw(&PathElement::new(points, BLACK.stroke_width(stroke)))
            }
            Shape::Text { x, y, text, size, bold, align } => {
                let style = match bold {
                    true => FontStyle::Bold,
                    false => FontStyle::Normal,
                };
                let hpos = match align {
                    Align::Left => HPos::Left,
                    Align::Center => HPos::Center,
                    Align::Right => HPos::Right,
                };
                let font = ("sans-serif", size * self.scale, style)
                    .into_font()
                    .color(&BLACK)
                    .pos(Pos::new(hpos, VPos::Center));
                self.area.draw(&Text::new(text.clone(), self.px((*x, *y)), font))
            }
        };
        result.map_err(|e| eyre!("{e:?}"))
    }

    fn finish(self) -> Result<(), Report> {
        self.area.present().map_err(|e| eyre!("{e:?}"))
    }
}

// ----------------------------------------------------------------------------
// PDF
// ----------------------------------------------------------------------------

/// A vector canvas, writing a single-page PDF with printpdf.
pub struct PdfCanvas {
    path: PathBuf,
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Page height (points).
    height: f64,
}

impl PdfCanvas {
    /// Create a page of `width` x `height` points.
    pub fn new<P>(path: &P, title: &str, width: f64, height: f64) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(width), mm(height), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| eyre!("{e:?}"))?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(|e| eyre!("{e:?}"))?;
        Ok(PdfCanvas { path: path.as_ref().to_path_buf(), doc, layer, regular, bold, height })
    }

    /// PDF point from scene coordinates (the PDF origin is the bottom-left corner).
    fn point(&self, (x, y): (f64, f64)) -> Point {
        Point::new(mm(x), mm(self.height - y))
    }
}

fn mm(points: f64) -> Mm {
    Mm((points * MM_PER_POINT) as f32)
}

fn pdf_color(color: &Rgb) -> PdfColor {
    PdfColor::Rgb(printpdf::Rgb::new(color.r as f32, color.g as f32, color.b as f32, None))
}

impl Canvas for PdfCanvas {
    fn draw(&mut self, shape: &Shape) -> Result<(), Report> {
        match shape {
            Shape::Rect { x, y, width, height, fill } => {
                let corners = [(*x, *y), (x + width, *y), (x + width, y + height), (*x, y + height)];
                let ring = corners.into_iter().map(|c| (self.point(c), false)).collect();
                self.layer.set_fill_color(pdf_color(fill));
                self.layer.add_polygon(Polygon {
                    rings: vec![ring],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                });
            }
            Shape::Line { points, width } => {
                self.layer.set_outline_color(pdf_color(&Rgb::BLACK));
                self.layer.set_outline_thickness(*width as f32);
                self.layer.add_line(Line {
                    points: points.iter().map(|p| (self.point(*p), false)).collect(),
                    is_closed: false,
                });
            }
            Shape::Text { x, y, text, size, bold, align } => {
                let offset = match align {
                    Align::Left => 0.0,
                    Align::Center => text_width(text, *size) / 2.0,
                    Align::Right => text_width(text, *size),
                };
                // baseline sits below the vertical center by about a third of the size
                let baseline = y + size * 0.35;
                let font = match bold {
                    true => &self.bold,
                    false => &self.regular,
                };
                self.layer.set_fill_color(pdf_color(&Rgb::BLACK));
                self.layer.use_text(
                    text.as_str(),
                    *size as f32,
                    mm(x - offset),
                    mm(self.height - baseline),
                    font,
                );
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<(), Report> {
        create_parent_dir(&self.path)?;
        let file = File::create(&self.path)
            .wrap_err_with(|| eyre!("Failed to create file: {:?}", self.path))?;
        self.doc.save(&mut BufWriter::new(file)).map_err(|e| eyre!("{e:?}"))?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Formats
// ----------------------------------------------------------------------------

/// Write a scene as a PNG at the given resolution.
pub fn write_png(scene: &Scene, path: &Path, dpi: u32) -> Result<(), Report> {
    let canvas = PngCanvas::new(path, scene.width, scene.height, dpi)?;
    render(scene, canvas).wrap_err_with(|| eyre!("Failed to write PNG: {path:?}"))
}

/// Write a scene as a PDF.
pub fn write_pdf(scene: &Scene, path: &Path, title: &str) -> Result<(), Report> {
    let canvas = PdfCanvas::new(path, title, scene.width, scene.height)?;
    render(scene, canvas).wrap_err_with(|| eyre!("Failed to write PDF: {path:?}"))
}
