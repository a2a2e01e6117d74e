use std::collections::BTreeSet;

use super::model::{IndicatorRecord, IndicatorTable};

// ---------------------------------------------------------------------------
// Selection context: which countries, years and indicator are in view
// ---------------------------------------------------------------------------

/// Inclusive year span. A span with `start > end` contains no year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        YearRange { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Immutable filter specification for one render pass.
///
/// * `selected_countries` empty → all countries
/// * `year_range` `None` → all years
/// * `indicator_label` `None` → all indicators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    pub selected_countries: BTreeSet<String>,
    pub year_range: Option<YearRange>,
    pub indicator_label: Option<String>,
}

impl SelectionContext {
    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_countries = countries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_year_range(mut self, start: i32, end: i32) -> Self {
        self.year_range = Some(YearRange::new(start, end));
        self
    }

    pub fn with_indicator(mut self, label: impl Into<String>) -> Self {
        self.indicator_label = Some(label.into());
        self
    }

    /// Whether a single record passes every active constraint.
    pub fn matches(&self, rec: &IndicatorRecord) -> bool {
        if !self.selected_countries.is_empty()
            && !self.selected_countries.contains(&rec.country_or_area)
        {
            return false;
        }
        if let Some(range) = &self.year_range {
            if !range.contains(rec.year) {
                return false;
            }
        }
        match &self.indicator_label {
            Some(label) => rec.indicator_label == *label,
            None => true,
        }
    }
}

/// Return a new table holding the rows that pass `ctx`.
///
/// Rows with a missing value are kept; rendering decides how to show them.
/// An empty input, an unknown indicator or an inverted year range all give
/// an empty table.
pub fn filter_table(table: &IndicatorTable, ctx: &SelectionContext) -> IndicatorTable {
    let records: Vec<IndicatorRecord> = table
        .records
        .iter()
        .filter(|rec| ctx.matches(rec))
        .cloned()
        .collect();
    IndicatorTable::from_records(records)
}

/// Narrow a table to a reference country universe (e.g. one region).
pub fn restrict_to_countries(table: &IndicatorTable, universe: &BTreeSet<String>) -> IndicatorTable {
    let records: Vec<IndicatorRecord> = table
        .records
        .iter()
        .filter(|rec| universe.contains(&rec.country_or_area))
        .cloned()
        .collect();
    IndicatorTable::from_records(records)
}
