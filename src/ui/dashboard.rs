use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::aggregate::CORRUPTION_LOSS_LABEL;
use crate::state::AppState;
use crate::ui::heatmap::{availability_heatmap, heatmap_legend};
use crate::ui::plot::{renderer_for, ChartKind, ChartOptions};
use crate::ui::table::data_table;

const CHART_HEIGHT: f32 = 260.0;
const ACCENT: Color32 = Color32::from_rgb(0, 43, 127);

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the indicator, derived-indicator, availability and corruption
/// sections for the current selection.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if state.table().is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an indicator table to start  (File → Open data…)");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            indicator_section(ui, state);
            ui.separator();
            overview_section(ui, state);
            ui.separator();
            derived_section(ui, state);
            ui.separator();
            availability_section(ui, state);
            if !state.corruption_losses.is_empty() {
                ui.separator();
                corruption_section(ui, state);
            }
        });
}

fn section_heading(ui: &mut Ui, text: &str) {
    ui.add_space(6.0);
    ui.label(RichText::new(text).heading().color(ACCENT));
}

fn indicator_section(ui: &mut Ui, state: &AppState) {
    let label = state.indicator.as_deref().unwrap_or("No indicator selected");
    section_heading(ui, label);

    if state.view.is_empty() {
        ui.label("No data available for the current selection.");
        return;
    }

    let options = ChartOptions {
        id: "indicator_chart",
        y_label: "Value",
        colors: &state.colors,
        height: CHART_HEIGHT,
    };
    renderer_for(state.chart_kind).render(ui, &state.view, &options);

    egui::CollapsingHeader::new("Data table")
        .id_salt("indicator_table")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            data_table(ui, "indicator_rows", &state.view);
        });
}

/// Latest value per country of the selected indicator.
fn overview_section(ui: &mut Ui, state: &AppState) {
    section_heading(ui, &format!("Regional overview: {}", state.config.region));
    if state.latest_values.is_empty() {
        ui.label("No country reports the selected indicator.");
        return;
    }
    let options = ChartOptions {
        id: "overview_chart",
        y_label: state.indicator.as_deref().unwrap_or("Value"),
        colors: &state.colors,
        height: CHART_HEIGHT,
    };
    renderer_for(ChartKind::Bar).render(ui, &state.latest_values, &options);
}

fn derived_section(ui: &mut Ui, state: &AppState) {
    let derived = &state.derived;
    section_heading(ui, &state.derivation_spec.output_label);

    if derived.is_insufficient() {
        if derived.missing_labels.is_empty() {
            ui.label("No country-year has every required input for the current selection.");
        } else {
            ui.label(format!(
                "Insufficient data: no observations of {}.",
                derived.missing_labels.join(", ")
            ));
        }
        return;
    }

    let options = ChartOptions {
        id: "derived_chart",
        y_label: "%",
        colors: &state.colors,
        height: CHART_HEIGHT,
    };
    renderer_for(ChartKind::Line).render(ui, &derived.table, &options);
}

fn availability_section(ui: &mut Ui, state: &mut AppState) {
    section_heading(ui, &format!("Data availability in {}", state.config.region));

    let Some(topic) = state.topic().cloned() else {
        ui.label("No topics configured.");
        return;
    };

    match state.coverage {
        Some(pct) => ui.label(format!(
            "Current data coverage for {}: {pct}% of {} countries",
            topic.title, state.config.region
        )),
        None => ui.label("Load a country reference file to compute coverage."),
    };

    let names: Vec<String> = topic.indicators.iter().map(|i| i.name.clone()).collect();
    let current = names.get(state.gap_indicator_index).cloned().unwrap_or_default();
    egui::ComboBox::from_id_salt("gap_indicator")
        .selected_text(current)
        .show_ui(ui, |ui: &mut Ui| {
            for (i, name) in names.iter().enumerate() {
                if ui
                    .selectable_label(i == state.gap_indicator_index, name)
                    .clicked()
                {
                    state.set_gap_indicator(i);
                }
            }
        });

    egui::CollapsingHeader::new("View data availability heatmap")
        .id_salt("gap_heatmap")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            availability_heatmap(ui, &state.availability);
            heatmap_legend(ui);
        });
}

fn corruption_section(ui: &mut Ui, state: &AppState) {
    section_heading(ui, "Estimated annual corruption loss by country");
    ui.label(format!(
        "Allocated from ${:.0}B by inverted Control of Corruption scores.",
        state.config.corruption_loss_total_busd
    ));

    let options = ChartOptions {
        id: "corruption_chart",
        y_label: CORRUPTION_LOSS_LABEL,
        colors: &state.colors,
        height: CHART_HEIGHT,
    };
    renderer_for(ChartKind::Bar).render(ui, &state.corruption_losses, &options);
}
