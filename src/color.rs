use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};

use crate::data::aggregate::Rollup;
use crate::data::model::Gender;

pub type Color = Srgb<u8>;

const CATEGORY10: [[u8; 3]; 10] = [
    [0x1f, 0x77, 0xb4],
    [0xff, 0x7f, 0x0e],
    [0x2c, 0xa0, 0x2c],
    [0xd6, 0x27, 0x28],
    [0x94, 0x67, 0xbd],
    [0x8c, 0x56, 0x4b],
    [0xe3, 0x77, 0xc2],
    [0x7f, 0x7f, 0x7f],
    [0xbc, 0xbd, 0x22],
    [0x17, 0xbe, 0xcf],
];

const BLUES6: [[u8; 3]; 6] = [
    [0xef, 0xf3, 0xff],
    [0xc6, 0xdb, 0xef],
    [0x9e, 0xca, 0xe1],
    [0x6b, 0xae, 0xd6],
    [0x31, 0x82, 0xbd],
    [0x08, 0x51, 0x9c],
];

const MALE: [u8; 3] = [0x1f, 0x77, 0xb4];
const FEMALE: [u8; 3] = [0xe3, 0x77, 0xc2];
const NO_DATA: [u8; 3] = [0xee, 0xee, 0xee];
const GRAY: [u8; 3] = [0x99, 0x99, 0x99];

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Srgb::<u8>::new(r, g, b)
}

/// `#rrggbb`.
pub fn to_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Fill for departments without births.
pub fn no_data_color() -> Color {
    rgb(NO_DATA)
}

/// The `index`-th categorical colour, cycling after ten.
pub fn category_color(index: usize) -> Color {
    rgb(CATEGORY10[index % CATEGORY10.len()])
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Srgb::<u8>::new(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: series label → Color
// ---------------------------------------------------------------------------

/// Maps series labels to colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color>,
    /// Labels in the order they were assigned, for the legend.
    order: Vec<String>,
    default_color: Color,
}

impl ColorMap {
    /// Categorical colours for a requested name list. A name takes the colour
    /// at the position of its first occurrence among the distinct names.
    pub fn categorical(names: &[String]) -> Self {
        let mut map = ColorMap::empty();
        for name in names {
            if !map.mapping.contains_key(name) {
                let color = category_color(map.order.len());
                map.insert(name.clone(), color);
            }
        }
        map
    }

    /// Fixed colours for male and female; other codes get spaced hues.
    pub fn gender<'a>(genders: impl IntoIterator<Item = &'a Gender>) -> Self {
        let mut map = ColorMap::empty();
        map.insert(Gender::Male.label().to_string(), rgb(MALE));
        map.insert(Gender::Female.label().to_string(), rgb(FEMALE));

        let mut others: Vec<&Gender> = genders
            .into_iter()
            .filter(|g| matches!(g, Gender::Other(_)))
            .collect();
        others.sort();
        others.dedup();

        let palette = generate_palette(others.len());
        for (g, c) in others.into_iter().zip(palette) {
            map.insert(g.label().to_string(), c);
        }
        map
    }

    fn empty() -> Self {
        ColorMap {
            mapping: BTreeMap::new(),
            order: Vec::new(),
            default_color: rgb(GRAY),
        }
    }

    fn insert(&mut self, label: String, color: Color) {
        if self.mapping.insert(label.clone(), color).is_none() {
            self.order.push(label);
        }
    }

    /// Look up the colour for a series label.
    pub fn color_for(&self, label: &str) -> Color {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (label → colour) in assignment order.
    pub fn legend_entries(&self) -> Vec<(String, Color)> {
        self.order
            .iter()
            .map(|label| (label.clone(), self.color_for(label)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Quantize scale for the department map
// ---------------------------------------------------------------------------

/// Splits `[min, max]` into equal steps, one per colour.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeScale {
    pub min: f64,
    pub max: f64,
    range: Vec<Color>,
}

impl QuantizeScale {
    pub fn new(min: f64, max: f64, range: Vec<Color>) -> Self {
        QuantizeScale { min, max, range }
    }

    /// Six blues over the department totals; the domain is
    /// `[min or 0, max or 1]` when a bound is missing or zero.
    ///
    /// Departments with a zero total are not in the rollup, so the minimum is
    /// the smallest positive total. Those departments take the no-data fill
    /// and never sit on the scale.
    pub fn blues_for(totals: &Rollup<String>) -> Self {
        let min = totals.min_value().filter(|v| *v > 0).unwrap_or(0);
        let max = totals.max_value().filter(|v| *v > 0).unwrap_or(1);
        QuantizeScale::new(min as f64, max as f64, BLUES6.iter().copied().map(rgb).collect())
    }

    /// Index of the colour step `value` falls in.
    pub fn step(&self, value: f64) -> usize {
        let n = self.range.len().saturating_sub(1);
        (0..n)
            .map(|i| self.min + (i + 1) as f64 * (self.max - self.min) / (n + 1) as f64)
            .filter(|threshold| *threshold <= value)
            .count()
    }

    pub fn color_for(&self, value: f64) -> Color {
        self.range
            .get(self.step(value))
            .copied()
            .unwrap_or_else(no_data_color)
    }

    /// Fill for a department: the no-data colour when it has no births.
    pub fn fill_for(&self, value: Option<u64>) -> Color {
        match value {
            Some(v) if v > 0 => self.color_for(v as f64),
            _ => no_data_color(),
        }
    }

    pub fn range(&self) -> &[Color] {
        &self.range
    }
}
