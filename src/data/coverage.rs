use std::collections::{BTreeMap, BTreeSet};

use super::model::IndicatorTable;

// ---------------------------------------------------------------------------
// Coverage percentage
// ---------------------------------------------------------------------------

/// Share of `universe` with at least one non-missing value for any of
/// `relevant` labels, as a whole percentage.
///
/// Rounds half to even (12.5 → 12, 37.5 → 38). An empty universe gives 0.
/// Countries outside the universe are ignored even if present in `table`.
pub fn coverage_percent(
    table: &IndicatorTable,
    universe: &BTreeSet<String>,
    relevant: &BTreeSet<String>,
) -> u32 {
    if universe.is_empty() {
        return 0;
    }

    let reporting: BTreeSet<&str> = table
        .records
        .iter()
        .filter(|r| r.has_value())
        .filter(|r| relevant.contains(&r.indicator_label))
        .filter(|r| universe.contains(&r.country_or_area))
        .map(|r| r.country_or_area.as_str())
        .collect();

    let pct = 100.0 * reporting.len() as f64 / universe.len() as f64;
    pct.round_ties_even() as u32
}

// ---------------------------------------------------------------------------
// Availability grid: country × year presence for one indicator
// ---------------------------------------------------------------------------

/// Which (country, year) cells hold a value for one indicator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityGrid {
    pub indicator_label: String,
    /// Every universe country, sorted; countries with no data have empty rows.
    pub countries: Vec<String>,
    /// Years observed for the indicator, ascending and contiguous.
    pub years: Vec<i32>,
    present: BTreeMap<(String, i32), f64>,
}

impl AvailabilityGrid {
    pub fn is_present(&self, country: &str, year: i32) -> bool {
        self.present.contains_key(&(country.to_string(), year))
    }

    pub fn value(&self, country: &str, year: i32) -> Option<f64> {
        self.present.get(&(country.to_string(), year)).copied()
    }

    /// Number of years with data for a country.
    pub fn reported_years(&self, country: &str) -> usize {
        self.years
            .iter()
            .filter(|y| self.is_present(country, **y))
            .count()
    }
}

/// Build the availability grid of `indicator_label` over `universe`.
pub fn availability_grid(
    table: &IndicatorTable,
    universe: &BTreeSet<String>,
    indicator_label: &str,
) -> AvailabilityGrid {
    let mut present = BTreeMap::new();
    let mut first_year: Option<i32> = None;
    let mut last_year: Option<i32> = None;

    for rec in &table.records {
        if rec.indicator_label != indicator_label || !universe.contains(&rec.country_or_area) {
            continue;
        }
        first_year = Some(first_year.map_or(rec.year, |y| y.min(rec.year)));
        last_year = Some(last_year.map_or(rec.year, |y| y.max(rec.year)));
        if let Some(v) = rec.value {
            present.insert((rec.country_or_area.clone(), rec.year), v);
        }
    }

    let years = match (first_year, last_year) {
        (Some(a), Some(b)) => (a..=b).collect(),
        _ => Vec::new(),
    };

    AvailabilityGrid {
        indicator_label: indicator_label.to_string(),
        countries: universe.iter().cloned().collect(),
        years,
        present,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::IndicatorRecord;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_universe_is_zero() {
        let table = IndicatorTable::from_records(vec![IndicatorRecord::new(
            "A",
            "Tax",
            2020,
            Some(1.0),
        )]);
        assert_eq!(coverage_percent(&table, &BTreeSet::new(), &set(&["Tax"])), 0);
    }

    #[test]
    fn half_of_universe_reporting_is_fifty() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("A", "Tax", 2020, Some(1.0)),
            IndicatorRecord::new("A", "Tax", 2021, Some(2.0)),
            IndicatorRecord::new("B", "Debt", 2019, Some(3.0)),
            IndicatorRecord::new("C", "Other", 2019, Some(3.0)),
        ]);
        let pct = coverage_percent(&table, &set(&["A", "B", "C", "D"]), &set(&["Tax", "Debt"]));
        assert_eq!(pct, 50);
    }

    #[test]
    fn missing_values_do_not_count() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("A", "Tax", 2020, Some(1.0)),
            IndicatorRecord::new("B", "Tax", 2020, None),
        ]);
        assert_eq!(coverage_percent(&table, &set(&["A", "B"]), &set(&["Tax"])), 50);
    }

    #[test]
    fn countries_outside_universe_are_ignored() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("A", "Tax", 2020, Some(1.0)),
            IndicatorRecord::new("France", "Tax", 2020, Some(1.0)),
        ]);
        assert_eq!(coverage_percent(&table, &set(&["A", "B"]), &set(&["Tax"])), 50);
    }

    #[test]
    fn rounds_half_to_even() {
        let universe = set(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let one = IndicatorTable::from_records(vec![IndicatorRecord::new(
            "A",
            "Tax",
            2020,
            Some(1.0),
        )]);
        let three = IndicatorTable::from_records(vec![
            IndicatorRecord::new("A", "Tax", 2020, Some(1.0)),
            IndicatorRecord::new("B", "Tax", 2020, Some(1.0)),
            IndicatorRecord::new("C", "Tax", 2020, Some(1.0)),
        ]);
        // 12.5 and 37.5
        assert_eq!(coverage_percent(&one, &universe, &set(&["Tax"])), 12);
        assert_eq!(coverage_percent(&three, &universe, &set(&["Tax"])), 38);
    }

    #[test]
    fn grid_lists_every_country_and_fills_year_gaps() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("A", "Tax", 2018, Some(1.0)),
            IndicatorRecord::new("A", "Tax", 2021, Some(4.0)),
            IndicatorRecord::new("B", "Tax", 2019, None),
            IndicatorRecord::new("B", "Debt", 2025, Some(9.0)),
        ]);

        let grid = availability_grid(&table, &set(&["A", "B", "C"]), "Tax");

        assert_eq!(grid.countries, vec!["A", "B", "C"]);
        assert_eq!(grid.years, vec![2018, 2019, 2020, 2021]);
        assert!(grid.is_present("A", 2021));
        assert!(!grid.is_present("A", 2019));
        assert!(!grid.is_present("B", 2019));
        assert_eq!(grid.value("A", 2018), Some(1.0));
        assert_eq!(grid.reported_years("A"), 2);
        assert_eq!(grid.reported_years("C"), 0);
    }

    #[test]
    fn grid_for_unknown_indicator_is_empty() {
        let table = IndicatorTable::from_records(vec![IndicatorRecord::new(
            "A",
            "Tax",
            2020,
            Some(1.0),
        )]);
        let grid = availability_grid(&table, &set(&["A"]), "Debt");
        assert!(grid.years.is_empty());
        assert!(!grid.is_present("A", 2020));
    }
}
