use eframe::egui::{Response, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::IndicatorTable;

/// Scrollable long-format table; missing values are shown as "–".
pub fn data_table(ui: &mut Ui, id: &str, table: &IndicatorTable) -> Response {
    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(220.0)
            .column(Column::auto().at_least(120.0))
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["Country", "ISO3", "Year", "Value", "Indicator"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, table.len(), |mut row| {
                    let rec = &table.records[row.index()];
                    row.col(|ui| {
                        ui.label(&rec.country_or_area);
                    });
                    row.col(|ui| {
                        ui.label(rec.iso3.as_deref().unwrap_or(""));
                    });
                    row.col(|ui| {
                        ui.label(rec.year.to_string());
                    });
                    row.col(|ui| {
                        ui.label(rec.value.map_or_else(|| "–".to_string(), |v| format!("{v:.2}")));
                    });
                    row.col(|ui| {
                        ui.label(&rec.indicator_label);
                    });
                });
            });
    })
    .response
}
