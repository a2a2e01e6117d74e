use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::ColorMap;
use crate::config::{DashboardConfig, Topic};
use crate::data::aggregate::{allocate_by_inverted_score, latest_by_country, CONTROL_OF_CORRUPTION};
use crate::data::cache::DataCache;
use crate::data::coverage::{availability_grid, coverage_percent, AvailabilityGrid};
use crate::data::derive::{derive_indicator, Derivation, DerivationSpec};
use crate::data::filter::{filter_table, restrict_to_countries, SelectionContext, YearRange};
use crate::data::model::{IndicatorTable, ReferenceTable};
use crate::ui::plot::ChartKind;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Every setter ends with [`AppState::refresh`], which recomputes the
/// filtered view and all derived panels from the cached tables.
pub struct AppState {
    pub config: DashboardConfig,
    pub cache: DataCache,

    /// Open files; their contents live in `cache`.
    pub table_path: Option<PathBuf>,
    pub reference_path: Option<PathBuf>,

    // -- selection --
    /// Empty means every country.
    pub selected_countries: BTreeSet<String>,
    pub year_range: Option<YearRange>,
    pub indicator: Option<String>,
    /// Limit everything to the configured region (needs a reference table).
    pub restrict_to_region: bool,
    pub chart_kind: ChartKind,
    pub topic_index: usize,
    pub gap_indicator_index: usize,

    // -- recomputed by `refresh` --
    /// Region-scoped table that the selection applies to.
    pub scope: IndicatorTable,
    /// Rows for the selected indicator, countries and years.
    pub view: IndicatorTable,
    /// Latest value per country of `view`, for the regional overview.
    pub latest_values: IndicatorTable,
    pub derivation_spec: DerivationSpec,
    pub derived: Derivation,
    /// `None` until a reference table provides the country universe.
    pub coverage: Option<u32>,
    pub availability: AvailabilityGrid,
    pub corruption_losses: IndicatorTable,
    pub colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            chart_kind: config.default_chart,
            config,
            cache: DataCache::new(),
            table_path: None,
            reference_path: None,
            selected_countries: BTreeSet::new(),
            year_range: None,
            indicator: None,
            restrict_to_region: true,
            topic_index: 0,
            gap_indicator_index: 0,
            scope: IndicatorTable::default(),
            view: IndicatorTable::default(),
            latest_values: IndicatorTable::default(),
            derivation_spec: DerivationSpec::stock_market_cap_to_gdp(),
            derived: Derivation::default(),
            coverage: None,
            availability: AvailabilityGrid::default(),
            corruption_losses: IndicatorTable::default(),
            colors: ColorMap::default(),
            status_message: None,
        }
    }

    // -- loading ---------------------------------------------------------

    /// Load the configured data and reference files, if present.
    pub fn load_startup_data(&mut self) {
        let reference_path = self.config.reference_path.clone();
        if reference_path.exists() {
            self.open_reference(&reference_path);
        } else {
            log::warn!("No country reference at {}", reference_path.display());
        }

        let data_path = self.config.data_path.clone();
        if data_path.exists() {
            self.open_table(&data_path);
        } else {
            log::warn!("No indicator table at {}", data_path.display());
        }
    }

    pub fn open_table(&mut self, path: &Path) {
        match self.cache.load_table(path) {
            Ok(table) => {
                self.table_path = Some(path.to_path_buf());
                self.table_loaded(&table);
            }
            Err(e) => {
                log::error!("Failed to load indicator table: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn open_reference(&mut self, path: &Path) {
        match self.cache.load_reference(path) {
            Ok(reference) => {
                log::debug!("{} reference entries", reference.len());
                self.reference_path = Some(path.to_path_buf());
                self.status_message = None;
                self.refresh();
            }
            Err(e) => {
                log::error!("Failed to load country reference: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Drop cached copies of the open files and read them again.
    pub fn reload(&mut self) {
        if let Some(path) = self.reference_path.clone() {
            self.cache.invalidate(&path);
            self.open_reference(&path);
        }
        if let Some(path) = self.table_path.clone() {
            self.cache.invalidate(&path);
            self.open_table(&path);
        }
        // A failed re-read leaves nothing in the cache for that path.
        self.refresh();
    }

    /// The open indicator table, looked up in the cache.
    pub fn table(&self) -> Option<Arc<IndicatorTable>> {
        self.table_path.as_deref().and_then(|p| self.cache.table(p))
    }

    pub fn reference(&self) -> Option<Arc<ReferenceTable>> {
        self.reference_path.as_deref().and_then(|p| self.cache.reference(p))
    }

    /// Reset the selection for a newly opened table.
    fn table_loaded(&mut self, table: &IndicatorTable) {
        self.selected_countries.clear();
        self.year_range = None;
        self.colors = ColorMap::new(&table.countries);
        self.indicator = None;
        self.status_message = None;
        self.refresh();
        self.indicator = self.default_indicator();
        self.refresh();
    }

    /// First indicator of the current topic present in the data, otherwise
    /// the first indicator of the table.
    fn default_indicator(&self) -> Option<String> {
        self.topic()
            .and_then(|t| t.labels().find(|l| self.scope.has_indicator(l)))
            .map(str::to_string)
            .or_else(|| self.scope.indicators.first().cloned())
    }

    // -- selection -------------------------------------------------------

    pub fn topic(&self) -> Option<&Topic> {
        self.config.topics.get(self.topic_index)
    }

    /// Countries of the configured region, if a reference table is loaded.
    pub fn universe(&self) -> Option<BTreeSet<String>> {
        let reference = self.reference()?;
        let countries = reference.countries_in_region(&self.config.region);
        (!countries.is_empty()).then_some(countries)
    }

    /// The immutable filter for the current render pass.
    pub fn selection(&self) -> SelectionContext {
        let mut ctx =
            SelectionContext::default().with_countries(self.selected_countries.iter().cloned());
        if let Some(range) = self.year_range {
            ctx = ctx.with_year_range(range.start, range.end);
        }
        if let Some(label) = &self.indicator {
            ctx = ctx.with_indicator(label.clone());
        }
        ctx
    }

    /// Country name with its ISO3 code when the reference knows it.
    pub fn country_label(&self, country: &str) -> String {
        let iso3 = self
            .reference()
            .and_then(|r| r.iso3_for(country).map(str::to_string));
        match iso3 {
            Some(code) => format!("{country} ({code})"),
            None => country.to_string(),
        }
    }

    pub fn is_country_selected(&self, country: &str) -> bool {
        self.selected_countries.is_empty() || self.selected_countries.contains(country)
    }

    /// Flip one country. Selecting every country collapses back to "all".
    pub fn toggle_country(&mut self, country: &str) {
        if self.selected_countries.is_empty() {
            self.selected_countries = self.scope.countries.clone();
        }
        if !self.selected_countries.remove(country) {
            self.selected_countries.insert(country.to_string());
        }
        if self.selected_countries == self.scope.countries {
            self.selected_countries.clear();
        }
        self.refresh();
    }

    pub fn select_all_countries(&mut self) {
        self.selected_countries.clear();
        self.refresh();
    }

    pub fn set_year_range(&mut self, range: Option<YearRange>) {
        self.year_range = range;
        self.refresh();
    }

    pub fn set_indicator(&mut self, label: &str) {
        self.indicator = Some(label.to_string());
        self.refresh();
    }

    pub fn set_chart_kind(&mut self, kind: ChartKind) {
        self.chart_kind = kind;
    }

    pub fn set_topic(&mut self, index: usize) {
        if index < self.config.topics.len() {
            self.topic_index = index;
            self.gap_indicator_index = 0;
            self.refresh();
        }
    }

    pub fn set_gap_indicator(&mut self, index: usize) {
        self.gap_indicator_index = index;
        self.refresh();
    }

    pub fn set_restrict_to_region(&mut self, on: bool) {
        self.restrict_to_region = on;
        self.selected_countries.clear();
        self.refresh();
    }

    // -- derived panels --------------------------------------------------

    /// Drop everything computed from a table that is no longer loaded.
    fn clear_panels(&mut self) {
        self.scope = IndicatorTable::default();
        self.view = IndicatorTable::default();
        self.latest_values = IndicatorTable::default();
        self.derived = Derivation::default();
        self.coverage = None;
        self.availability = AvailabilityGrid::default();
        self.corruption_losses = IndicatorTable::default();
    }

    /// Recompute the view and every derived panel.
    pub fn refresh(&mut self) {
        let Some(table) = self.table() else {
            self.clear_panels();
            return;
        };
        let universe = self.universe();

        self.scope = match (&universe, self.restrict_to_region) {
            (Some(countries), true) => restrict_to_countries(&table, countries),
            _ => table.as_ref().clone(),
        };

        let selection = self.selection();
        self.view = filter_table(&self.scope, &selection);
        self.latest_values = IndicatorTable::from_records(latest_by_country(&self.view));

        // Derived panels see every indicator for the selected countries/years.
        let all_indicators = SelectionContext {
            indicator_label: None,
            ..selection
        };
        let in_selection = filter_table(&self.scope, &all_indicators);
        self.derived = derive_indicator(&in_selection, &self.derivation_spec);
        self.corruption_losses = allocate_by_inverted_score(
            &in_selection,
            CONTROL_OF_CORRUPTION,
            self.config.corruption_loss_total_busd,
        );

        let topic_labels: BTreeSet<String> = self
            .topic()
            .map(|t| t.labels().map(str::to_string).collect())
            .unwrap_or_default();
        let gap_label = self
            .topic()
            .and_then(|t| t.indicators.get(self.gap_indicator_index))
            .map(|i| i.label.clone())
            .unwrap_or_default();

        match &universe {
            Some(countries) => {
                let regional = restrict_to_countries(&table, countries);
                self.coverage = Some(coverage_percent(&regional, countries, &topic_labels));
                self.availability = availability_grid(&regional, countries, &gap_label);
            }
            None => {
                self.coverage = None;
                self.availability = availability_grid(&table, &table.countries, &gap_label);
            }
        }

        log::debug!(
            "refresh: {} rows in scope, {} in view, {} derived, coverage {:?}",
            self.scope.len(),
            self.view.len(),
            self.derived.table.len(),
            self.coverage
        );
    }
}
