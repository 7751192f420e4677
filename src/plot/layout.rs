//! Backend-independent layout of a horizontal bar chart with a broken x axis.
//!
//! Everything is positioned in points (1/72 inch) from the top-left corner of the
//! figure, with y increasing downwards.

use crate::plot::colormap::{value_colors, Rgb};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Figure width (10 inches).
pub const FIGURE_WIDTH: f64 = 720.0;
/// Figure height (7 inches).
pub const FIGURE_HEIGHT: f64 = 504.0;
/// Gap between the panels, as a fraction of the mean panel width.
pub const PANEL_GAP: f64 = 0.05;
/// Size of the break marks, as a fraction of the panel size.
pub const BREAK_MARK: f64 = 0.015;
/// Bar thickness, in category units.
pub const BAR_HEIGHT: f64 = 0.8;

const TITLE_SIZE: f64 = 14.0;
const LABEL_SIZE: f64 = 12.0;
const TICK_LABEL_SIZE: f64 = 10.0;
const TICK_LENGTH: f64 = 3.5;
const TICK_PAD: f64 = 3.5;
const SPINE_WIDTH: f64 = 0.8;
const MARGIN: f64 = 12.0;
const TITLE_SPACE: f64 = 36.0;
const XAXIS_SPACE: f64 = 48.0;
const MAX_TICKS: usize = 6;

// ----------------------------------------------------------------------------
// Scene
// ----------------------------------------------------------------------------

/// Horizontal alignment of text around its anchor.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A drawing primitive.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Shape {
    /// A filled rectangle from its top-left corner.
    Rect { x: f64, y: f64, width: f64, height: f64, fill: Rgb },
    /// A black polyline.
    Line { points: Vec<(f64, f64)>, width: f64 },
    /// Black text, vertically centered on `y`.
    Text { x: f64, y: f64, text: String, size: f64, bold: bool, align: Align },
}

/// A figure laid out as drawing primitives, in drawing order.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Scene { width, height, shapes: Vec::new() }
    }

    /// Filled rectangles of the scene.
    pub fn rects(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| matches!(s, Shape::Rect { .. }))
    }

    /// Text of the scene, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn line(&mut self, points: Vec<(f64, f64)>, width: f64) {
        self.shapes.push(Shape::Line { points, width });
    }

    fn text(&mut self, x: f64, y: f64, text: &str, size: f64, bold: bool, align: Align) {
        self.shapes.push(Shape::Text { x, y, text: text.to_string(), size, bold, align });
    }
}

/// Approximate width of text, in points.
///
/// Uses an average glyph width of a sans-serif font, since layout happens before any
/// backend can measure text.
pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.55
}

// ----------------------------------------------------------------------------
// Ticks
// ----------------------------------------------------------------------------

/// Evenly spaced tick positions in `[lo, hi]`, at 1, 2, 2.5, or 5 x 10^k steps.
///
/// The smallest step giving at most `max_ticks` ticks is used.
///
/// ## Examples
///
/// ```rust
/// use ccsp::plot::layout::nice_ticks;
///
/// assert_eq!(nice_ticks(0.0, 15.0, 6), [0.0, 5.0, 10.0, 15.0]);
/// assert_eq!(nice_ticks(55.0, 65.0, 6), [56.0, 58.0, 60.0, 62.0, 64.0]);
/// assert_eq!(nice_ticks(0.0, 1.0, 5), [0.0, 0.25, 0.5, 0.75, 1.0]);
/// ```
pub fn nice_ticks(lo: f64, hi: f64, max_ticks: usize) -> Vec<f64> {
    if !(hi > lo) || max_ticks == 0 {
        return vec![lo];
    }
    let magnitude = 10_f64.powf(((hi - lo) / max_ticks as f64).log10().floor());
    let ticks_with = |step: f64| {
        let first = (lo / step - 1e-9).ceil() as i64;
        let last = (hi / step + 1e-9).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect_vec()
    };

    [1.0, 2.0, 2.5, 5.0, 10.0, 20.0]
        .iter()
        .map(|m| m * magnitude)
        .map(ticks_with)
        .find(|ticks| ticks.len() <= max_ticks)
        .unwrap_or_else(|| vec![lo, hi])
}

/// Format a tick value in its shortest form.
///
/// ## Examples
///
/// ```rust
/// use ccsp::plot::layout::format_tick;
///
/// assert_eq!(format_tick(60.0), "60");
/// assert_eq!(format_tick(2.5), "2.5");
/// assert_eq!(format_tick(0.1 + 0.2), "0.3");
/// assert_eq!(format_tick(-0.0), "0");
/// ```
pub fn format_tick(value: f64) -> String {
    let value = (value * 1e6).round() / 1e6 + 0.0;
    format!("{value}")
}

// ----------------------------------------------------------------------------
// Broken Bar Chart
// ----------------------------------------------------------------------------

/// A labelled bar.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Options of a horizontal bar chart whose x axis is broken into two ranges.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BrokenBarChart {
    pub title: String,
    pub xlabel: String,
    /// X range of the left panel.
    pub left: (f64, f64),
    /// X range of the right panel.
    pub right: (f64, f64),
    pub width: f64,
    pub height: f64,
}

impl Default for BrokenBarChart {
    fn default() -> Self {
        BrokenBarChart {
            title: "IAA/Receptor Values by Gene".to_string(),
            xlabel: "IAA/Receptor".to_string(),
            left: (0.0, 15.0),
            right: (55.0, 65.0),
            width: FIGURE_WIDTH,
            height: FIGURE_HEIGHT,
        }
    }
}

/// A panel of the chart, mapping data to figure coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Panel {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// X data range.
    pub range: (f64, f64),
    /// Y data range (category positions).
    pub categories: (f64, f64),
}

impl Panel {
    pub fn to_x(&self, value: f64) -> f64 {
        let (lo, hi) = self.range;
        self.x + (value - lo) / (hi - lo) * self.width
    }

    pub fn to_y(&self, position: f64) -> f64 {
        let (lo, hi) = self.categories;
        self.y + (hi - position) / (hi - lo) * self.height
    }

    /// Figure coordinates of a point in panel fractions (0-1, y upwards).
    pub fn fraction(&self, fx: f64, fy: f64) -> (f64, f64) {
        (self.x + fx * self.width, self.y + (1.0 - fy) * self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

impl BrokenBarChart {
    /// Place the two panels in the figure, leaving room for the category labels.
    pub fn panels(&self, bars: &[Bar]) -> (Panel, Panel) {
        let label_width =
            bars.iter().map(|bar| text_width(&bar.label, TICK_LABEL_SIZE)).fold(0.0, f64::max);
        let left_margin = MARGIN + label_width + TICK_LENGTH + TICK_PAD;

        let plot_width = (self.width - left_margin - MARGIN).max(1.0);
        let panel_width = plot_width / (2.0 + PANEL_GAP);
        let panel_height = (self.height - TITLE_SPACE - XAXIS_SPACE).max(1.0);
        // categories sit at 0..n, padded by half a bar gap on each side
        let categories = (-0.5 - (1.0 - BAR_HEIGHT) / 2.0, bars.len() as f64 - 0.5 + (1.0 - BAR_HEIGHT) / 2.0);

        let left = Panel {
            x: left_margin,
            y: TITLE_SPACE,
            width: panel_width,
            height: panel_height,
            range: self.left,
            categories,
        };
        let right = Panel { x: left.right() + panel_width * PANEL_GAP, range: self.right, ..left };
        (left, right)
    }

    /// Lay out bars, drawn bottom to top in the given order.
    ///
    /// Bars start at 0 and are clipped to each panel's x range. Bar colors follow the
    /// `coolwarm` colormap between the smallest and largest value.
    pub fn layout(&self, bars: &[Bar]) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        let (left, right) = self.panels(bars);
        let colors = value_colors(&bars.iter().map(|bar| bar.value).collect_vec());

        // bars
        for panel in [&left, &right] {
            let (lo, hi) = panel.range;
            for (i, (bar, color)) in bars.iter().zip(&colors).enumerate() {
                let x0 = bar.value.min(0.0).max(lo);
                let x1 = bar.value.max(0.0).min(hi);
                if x1 <= x0 {
                    continue;
                }
                let position = i as f64;
                let top = panel.to_y(position + BAR_HEIGHT / 2.0);
                let bottom = panel.to_y(position - BAR_HEIGHT / 2.0);
                scene.shapes.push(Shape::Rect {
                    x: panel.to_x(x0),
                    y: top,
                    width: panel.to_x(x1) - panel.to_x(x0),
                    height: bottom - top,
                    fill: *color,
                });
            }
        }

        // spines, the inner ones are hidden
        let spine = |scene: &mut Scene, a: (f64, f64), b: (f64, f64)| scene.line(vec![a, b], SPINE_WIDTH);
        spine(&mut scene, (left.x, left.y), (left.right(), left.y));
        spine(&mut scene, (left.x, left.bottom()), (left.right(), left.bottom()));
        spine(&mut scene, (left.x, left.y), (left.x, left.bottom()));
        spine(&mut scene, (right.x, right.y), (right.right(), right.y));
        spine(&mut scene, (right.x, right.bottom()), (right.right(), right.bottom()));
        spine(&mut scene, (right.right(), right.y), (right.right(), right.bottom()));

        // x ticks
        for panel in [&left, &right] {
            let (lo, hi) = panel.range;
            for tick in nice_ticks(lo, hi, MAX_TICKS) {
                let x = panel.to_x(tick);
                scene.line(vec![(x, panel.bottom()), (x, panel.bottom() + TICK_LENGTH)], SPINE_WIDTH);
                let y = panel.bottom() + TICK_LENGTH + TICK_PAD + TICK_LABEL_SIZE / 2.0;
                scene.text(x, y, &format_tick(tick), TICK_LABEL_SIZE, false, Align::Center);
            }
        }

        // y ticks, on the left panel only
        for (i, bar) in bars.iter().enumerate() {
            let y = left.to_y(i as f64);
            scene.line(vec![(left.x - TICK_LENGTH, y), (left.x, y)], SPINE_WIDTH);
            let x = left.x - TICK_LENGTH - TICK_PAD;
            scene.text(x, y, &bar.label, TICK_LABEL_SIZE, false, Align::Right);
        }

        // break marks at the inner corners
        let d = BREAK_MARK;
        for (fx, fy) in [(1.0, 0.0), (1.0, 1.0)] {
            scene.line(vec![left.fraction(fx - d, fy - d), left.fraction(fx + d, fy + d)], SPINE_WIDTH);
        }
        for (fx, fy) in [(0.0, 0.0), (0.0, 1.0)] {
            scene.line(vec![right.fraction(fx - d, fy - d), right.fraction(fx + d, fy + d)], SPINE_WIDTH);
        }

        // labels
        let center = (left.right() + right.x) / 2.0;
        let xlabel_y = left.bottom() + XAXIS_SPACE - LABEL_SIZE;
        scene.text(center, xlabel_y, &self.xlabel, LABEL_SIZE, false, Align::Center);
        scene.text(self.width / 2.0, TITLE_SPACE / 2.0, &self.title, TITLE_SIZE, true, Align::Center);

        scene
    }
}
