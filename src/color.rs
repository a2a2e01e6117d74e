use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// `n` visually distinct colours from evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.7, 0.5).into_color();
            let (r, g, b) = rgb.into_format::<u8>().into_components();
            Color32::from_rgb(r, g, b)
        })
        .collect()
}

/// Blend from light grey (0.0) to `full` (1.0); used by the heatmap.
pub fn shade(full: Color32, intensity: f32) -> Color32 {
    let t = intensity.clamp(0.0, 1.0);
    let base = 235.0;
    let mix = |c: u8| (base + (c as f32 - base) * t).round() as u8;
    Color32::from_rgb(mix(full.r()), mix(full.g()), mix(full.b()))
}

// ---------------------------------------------------------------------------
// Color mapping: country name → Color32
// ---------------------------------------------------------------------------

/// Stable colour per series key (country name) across all charts.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a String>) -> Self {
        let keys: Vec<&String> = keys.into_iter().collect();
        let mapping = keys
            .iter()
            .zip(generate_palette(keys.len()))
            .map(|(k, c)| ((*k).clone(), c))
            .collect();
        ColorMap { mapping }
    }

    pub fn color_for(&self, key: &str) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(Color32::GRAY)
    }
}
