use std::collections::BTreeMap;

use eframe::egui::{Response, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};
use serde::{Deserialize, Serialize};

use crate::color::ColorMap;
use crate::data::aggregate::latest_by_country;
use crate::data::model::{IndicatorRecord, IndicatorTable};

// ---------------------------------------------------------------------------
// Chart kind tag
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    #[default]
    Line,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::Bar, ChartKind::Line];

    pub fn tag(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer strategy
// ---------------------------------------------------------------------------

pub struct ChartOptions<'a> {
    /// egui id; must be unique per chart on screen.
    pub id: &'a str,
    pub y_label: &'a str,
    pub colors: &'a ColorMap,
    pub height: f32,
}

/// Draws a long-format table as one kind of chart.
pub trait ChartRenderer {
    fn render(&self, ui: &mut Ui, data: &IndicatorTable, options: &ChartOptions<'_>) -> Response;
}

/// Time series per country.
pub struct LineRenderer;

/// Latest value per country.
pub struct BarRenderer;

pub fn renderer_for(kind: ChartKind) -> Box<dyn ChartRenderer> {
    match kind {
        ChartKind::Bar => Box::new(BarRenderer),
        ChartKind::Line => Box::new(LineRenderer),
    }
}

/// (year, value) points per country, ascending by year. Missing values are
/// gaps, not zeros.
pub fn line_series(data: &IndicatorTable) -> BTreeMap<String, Vec<[f64; 2]>> {
    let mut series: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
    for rec in &data.records {
        if let Some(v) = rec.value {
            series
                .entry(rec.country_or_area.clone())
                .or_default()
                .push([rec.year as f64, v]);
        }
    }
    for points in series.values_mut() {
        points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    }
    series
}

impl ChartRenderer for LineRenderer {
    fn render(&self, ui: &mut Ui, data: &IndicatorTable, options: &ChartOptions<'_>) -> Response {
        let series = line_series(data);

        Plot::new(options.id)
            .legend(Legend::default())
            .height(options.height)
            .x_axis_label("Year")
            .y_axis_label(options.y_label)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (country, points) in series {
                    let color = options.colors.color_for(&country);
                    let points: PlotPoints = points.into();
                    plot_ui.line(Line::new(points).name(&country).color(color).width(1.5));
                }
            })
            .response
    }
}

impl ChartRenderer for BarRenderer {
    fn render(&self, ui: &mut Ui, data: &IndicatorTable, options: &ChartOptions<'_>) -> Response {
        let latest: Vec<IndicatorRecord> = latest_by_country(data);
        let names: Vec<String> = latest.iter().map(|r| r.country_or_area.clone()).collect();

        let bars: Vec<Bar> = latest
            .iter()
            .enumerate()
            .filter_map(|(i, rec)| {
                let v = rec.value?;
                Some(
                    Bar::new(i as f64, v)
                        .name(format!("{} ({})", rec.country_or_area, rec.year))
                        .fill(options.colors.color_for(&rec.country_or_area)),
                )
            })
            .collect();

        Plot::new(options.id)
            .height(options.height)
            .y_axis_label(options.y_label)
            .x_axis_formatter(move |mark, _range| {
                if mark.value.fract() != 0.0 || mark.value < 0.0 {
                    return String::new();
                }
                names.get(mark.value as usize).cloned().unwrap_or_default()
            })
            .allow_drag(true)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).width(0.7));
            })
            .response
    }
}
