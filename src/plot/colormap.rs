//! Diverging blue-to-red colormap.

use serde::{Deserialize, Serialize};

/// An RGB color, with channels between 0 and 1.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Rgb { r, g, b }
    }

    /// Channels scaled to 0-255.
    pub fn to_u8(&self) -> (u8, u8, u8) {
        let scale = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Control points of the `coolwarm` colormap (Moreland's diverging map), evenly
/// spaced from 0 to 1.
const COOLWARM: [Rgb; 33] = [
    Rgb::new(0.2298057, 0.298717966, 0.753683153),
    Rgb::new(0.26623388, 0.353094838, 0.801466763),
    Rgb::new(0.30386891, 0.406535296, 0.84495867),
    Rgb::new(0.342804478, 0.458757618, 0.883725899),
    Rgb::new(0.38301334, 0.50941904, 0.917387822),
    Rgb::new(0.424369608, 0.558148092, 0.945619588),
    Rgb::new(0.46666708, 0.604562568, 0.968154911),
    Rgb::new(0.509635204, 0.648280772, 0.98478814),
    Rgb::new(0.552953156, 0.688929332, 0.995375608),
    Rgb::new(0.596262162, 0.726149107, 0.999836203),
    Rgb::new(0.639176211, 0.759599947, 0.998151185),
    Rgb::new(0.681291281, 0.788964712, 0.990363227),
    Rgb::new(0.722193294, 0.813952739, 0.976574709),
    Rgb::new(0.761464949, 0.834302879, 0.956945269),
    Rgb::new(0.798691636, 0.849786142, 0.931688648),
    Rgb::new(0.833466556, 0.860207984, 0.901068838),
    Rgb::new(0.865395197, 0.86541021, 0.865395561),
    Rgb::new(0.897787179, 0.848937047, 0.820880546),
    Rgb::new(0.924127593, 0.827384882, 0.774508472),
    Rgb::new(0.944468518, 0.800927443, 0.726736146),
    Rgb::new(0.958852946, 0.769767752, 0.678007945),
    Rgb::new(0.96732803, 0.734132809, 0.628751763),
    Rgb::new(0.969954137, 0.694266682, 0.579375448),
    Rgb::new(0.966811177, 0.650421156, 0.530263762),
    Rgb::new(0.958003065, 0.602842431, 0.481775914),
    Rgb::new(0.943660866, 0.551750968, 0.434243684),
    Rgb::new(0.923944917, 0.49730856, 0.387970225),
    Rgb::new(0.89904617, 0.439559467, 0.343229596),
    Rgb::new(0.869186849, 0.378313092, 0.300267182),
    Rgb::new(0.834620542, 0.312874446, 0.259301199),
    Rgb::new(0.795631745, 0.24128379, 0.220525627),
    Rgb::new(0.752534934, 0.157246067, 0.184115123),
    Rgb::new(0.705673158, 0.01555616, 0.150232812),
];

/// Color of the `coolwarm` colormap at `t` (clamped to 0-1).
///
/// Colors are linearly interpolated between the control points.
///
/// ## Examples
///
/// ```rust
/// use ccsp::plot::colormap::{coolwarm, Rgb};
///
/// assert_eq!(coolwarm(0.0), Rgb::new(0.2298057, 0.298717966, 0.753683153));
/// assert_eq!(coolwarm(2.0), Rgb::new(0.705673158, 0.01555616, 0.150232812));
/// ```
pub fn coolwarm(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let last = COOLWARM.len() - 1;
    let position = t * last as f64;
    let i = (position.floor() as usize).min(last);
    let f = position - i as f64;
    if i == last || f == 0.0 {
        return COOLWARM[i];
    }
    let (c0, c1) = (COOLWARM[i], COOLWARM[i + 1]);
    let mix = |a: f64, b: f64| a + (b - a) * f;
    Rgb::new(mix(c0.r, c1.r), mix(c0.g, c1.g), mix(c0.b, c1.b))
}

/// Scale values linearly between their minimum (0) and maximum (1).
///
/// If all values are equal, they map to 0.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|v| match max > min {
            true => (v - min) / (max - min),
            false => 0.0,
        })
        .collect()
}

/// `coolwarm` colors of values, normalized between their minimum and maximum.
pub fn value_colors(values: &[f64]) -> Vec<Rgb> {
    normalize(values).into_iter().map(coolwarm).collect()
}
