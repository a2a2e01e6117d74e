use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::YearRange;
use crate::data::loader;
use crate::state::AppState;
use crate::ui::plot::ChartKind;

const FILE_EXTENSIONS: [&str; 4] = ["parquet", "pq", "csv", "json"];

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(table) = state.table() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Topic ----
            ui.strong("Topic");
            let titles: Vec<String> = state.config.topics.iter().map(|t| t.title.clone()).collect();
            let current = titles.get(state.topic_index).cloned().unwrap_or_default();
            egui::ComboBox::from_id_salt("topic")
                .selected_text(current)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for (i, title) in titles.iter().enumerate() {
                        if ui.selectable_label(i == state.topic_index, title).clicked() {
                            state.set_topic(i);
                        }
                    }
                });

            if state.reference().is_some() {
                let mut restrict = state.restrict_to_region;
                let text = format!("Only {} countries", state.config.region);
                if ui.checkbox(&mut restrict, text).changed() {
                    state.set_restrict_to_region(restrict);
                }
            }
            ui.separator();

            // ---- Indicator ----
            ui.strong("Indicator");
            let indicators: Vec<String> = state.scope.indicators.iter().cloned().collect();
            let current = state.indicator.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("indicator")
                .selected_text(&current)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for label in &indicators {
                        if ui.selectable_label(current == *label, label).clicked() {
                            state.set_indicator(label);
                        }
                    }
                });

            ui.horizontal(|ui: &mut Ui| {
                for kind in ChartKind::ALL {
                    if ui.selectable_label(state.chart_kind == kind, kind.tag()).clicked() {
                        state.set_chart_kind(kind);
                    }
                }
            });
            ui.separator();

            // ---- Years ----
            if let Some((first, last)) = table.year_bounds() {
                year_range_widget(ui, state, first, last);
                ui.separator();
            }

            // ---- Countries ----
            let countries: Vec<String> = state.scope.countries.iter().cloned().collect();
            let n_selected = if state.selected_countries.is_empty() {
                countries.len()
            } else {
                state.selected_countries.len()
            };
            let header_text = format!("Countries  ({n_selected}/{})", countries.len());

            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("countries")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        state.select_all_countries();
                    }
                    for country in &countries {
                        let mut checked = state.is_country_selected(country);
                        let text = RichText::new(state.country_label(country))
                            .color(state.colors.color_for(country));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_country(country);
                        }
                    }
                });
        });
}

fn year_range_widget(ui: &mut Ui, state: &mut AppState, first: i32, last: i32) {
    ui.strong("Years");
    let mut all_years = state.year_range.is_none();
    if ui.checkbox(&mut all_years, "All years").changed() {
        let range = (!all_years).then(|| YearRange::new(first, last));
        state.set_year_range(range);
    }

    if let Some(range) = state.year_range {
        let (mut start, mut end) = (range.start, range.end);
        let changed = ui
            .horizontal(|ui: &mut Ui| {
                let a = ui.add(egui::DragValue::new(&mut start).range(first..=last));
                ui.label("to");
                let b = ui.add(egui::DragValue::new(&mut end).range(first..=last));
                a.changed() || b.changed()
            })
            .inner;
        if changed {
            state.set_year_range(Some(YearRange::new(start, end)));
        }
        if start > end {
            ui.label(RichText::new("Start year is after end year.").color(Color32::YELLOW));
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                if let Some(path) = pick_file("Open indicator table") {
                    state.open_table(&path);
                }
                ui.close_menu();
            }
            if ui.button("Open country reference…").clicked() {
                if let Some(path) = pick_file("Open country reference") {
                    state.open_reference(&path);
                }
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(!state.view.is_empty(), egui::Button::new("Export view as CSV…"))
                .clicked()
            {
                export_view(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = state.table() {
            ui.label(format!(
                "{} rows loaded, {} in view",
                table.len(),
                state.view.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_file(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &FILE_EXTENSIONS)
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file()
}

fn export_view(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export view")
        .set_file_name("indicator_view.csv")
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    if let Err(e) = loader::save_csv(&path, &state.view) {
        log::error!("Failed to export view: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}
