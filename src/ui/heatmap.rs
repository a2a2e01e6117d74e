use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Response, Sense, Ui, Vec2};

use crate::color::shade;
use crate::data::coverage::AvailabilityGrid;

const LABEL_WIDTH: f32 = 140.0;
const HEADER_HEIGHT: f32 = 18.0;
const ROW_HEIGHT: f32 = 14.0;
const MIN_CELL_WIDTH: f32 = 8.0;
/// Reports from this year on are drawn at full intensity.
const RECENT_YEAR: i32 = 2020;

const FILLED: Color32 = Color32::from_rgb(0, 43, 127);
const EMPTY: Color32 = Color32::from_gray(245);

/// Country × year availability heatmap. Hover a cell for its value.
pub fn availability_heatmap(ui: &mut Ui, grid: &AvailabilityGrid) -> Response {
    if grid.years.is_empty() {
        return ui.label(format!("No observations of '{}' in this region.", grid.indicator_label));
    }

    let n_years = grid.years.len() as f32;
    let cell_w = ((ui.available_width() - LABEL_WIDTH) / n_years).max(MIN_CELL_WIDTH);
    let size = Vec2::new(
        LABEL_WIDTH + cell_w * n_years,
        HEADER_HEIGHT + ROW_HEIGHT * grid.countries.len() as f32,
    );
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;
    let text_color = ui.visuals().text_color();

    // Year header: label every few years so text never overlaps.
    let step = ((36.0 / cell_w).ceil() as usize).max(1);
    for (j, year) in grid.years.iter().enumerate().step_by(step) {
        let x = origin.x + LABEL_WIDTH + cell_w * (j as f32 + 0.5);
        painter.text(
            Pos2::new(x, origin.y + HEADER_HEIGHT / 2.0),
            Align2::CENTER_CENTER,
            year.to_string(),
            FontId::proportional(10.0),
            text_color,
        );
    }

    for (i, country) in grid.countries.iter().enumerate() {
        let y = origin.y + HEADER_HEIGHT + ROW_HEIGHT * i as f32;
        painter.text(
            Pos2::new(origin.x, y + ROW_HEIGHT / 2.0),
            Align2::LEFT_CENTER,
            country,
            FontId::proportional(10.0),
            text_color,
        );
        for (j, year) in grid.years.iter().enumerate() {
            let min = Pos2::new(origin.x + LABEL_WIDTH + cell_w * j as f32, y);
            let rect = Rect::from_min_size(min, Vec2::new(cell_w - 1.0, ROW_HEIGHT - 1.0));
            let fill = if grid.is_present(country, *year) {
                shade(FILLED, if *year >= RECENT_YEAR { 1.0 } else { 0.45 })
            } else {
                EMPTY
            };
            painter.rect_filled(rect, 0.0, fill);
        }
    }

    let hover = response.hover_pos().and_then(|pos| {
        let col = ((pos.x - origin.x - LABEL_WIDTH) / cell_w).floor();
        let row = ((pos.y - origin.y - HEADER_HEIGHT) / ROW_HEIGHT).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let country = grid.countries.get(row as usize)?;
        let year = *grid.years.get(col as usize)?;
        let cell = match grid.value(country, year) {
            Some(v) => format!("{country} {year}: {v:.2}"),
            None => format!("{country} {year}: no data"),
        };
        Some(format!(
            "{cell}\n{} of {} years reported",
            grid.reported_years(country),
            grid.years.len()
        ))
    });

    match hover {
        Some(text) => response.on_hover_text(text),
        None => response,
    }
}

/// One-line legend drawn under the heatmap.
pub fn heatmap_legend(ui: &mut Ui) {
    ui.horizontal(|ui| {
        for (fill, text) in [
            (shade(FILLED, 1.0), format!("reported {RECENT_YEAR} or later")),
            (shade(FILLED, 0.45), "older report".to_string()),
            (EMPTY, "missing".to_string()),
        ] {
            let (rect, _) = ui.allocate_exact_size(Vec2::splat(10.0), Sense::hover());
            ui.painter().rect_filled(rect, 0.0, fill);
            ui.label(egui::RichText::new(text).small());
        }
    });
}
