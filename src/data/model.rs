use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// IndicatorRecord – one row of the long-format table
// ---------------------------------------------------------------------------

/// A single observation: one country, one indicator, one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub country_or_area: String,
    pub iso3: Option<String>,
    /// Human-readable indicator key. Many indicators share one table.
    pub indicator_label: String,
    pub year: i32,
    /// `None` when the source cell is empty or NaN.
    pub value: Option<f64>,
}

impl IndicatorRecord {
    pub fn new(country: &str, label: &str, year: i32, value: Option<f64>) -> Self {
        IndicatorRecord {
            country_or_area: country.to_string(),
            iso3: None,
            indicator_label: label.to_string(),
            year,
            value,
        }
    }

    pub fn with_iso3(mut self, iso3: &str) -> Self {
        self.iso3 = Some(iso3.to_string());
        self
    }

    /// Whether this row carries an actual observation.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

// ---------------------------------------------------------------------------
// IndicatorTable – a loaded or derived long-format table
// ---------------------------------------------------------------------------

/// Long-format indicator table with pre-computed dimension indices.
///
/// Tables are never mutated after construction; filtering and derivation
/// build new tables through [`IndicatorTable::from_records`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorTable {
    pub records: Vec<IndicatorRecord>,
    /// Sorted distinct `country_or_area` values.
    pub countries: BTreeSet<String>,
    /// Sorted distinct `indicator_label` values.
    pub indicators: BTreeSet<String>,
    /// Sorted distinct years.
    pub years: BTreeSet<i32>,
}

impl IndicatorTable {
    /// Build dimension indices from the records.
    pub fn from_records(records: Vec<IndicatorRecord>) -> Self {
        let mut countries = BTreeSet::new();
        let mut indicators = BTreeSet::new();
        let mut years = BTreeSet::new();

        for rec in &records {
            countries.insert(rec.country_or_area.clone());
            indicators.insert(rec.indicator_label.clone());
            years.insert(rec.year);
        }

        IndicatorTable {
            records,
            countries,
            indicators,
            years,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any row (with or without a value) carries this label.
    pub fn has_indicator(&self, label: &str) -> bool {
        self.indicators.contains(label)
    }

    /// Inclusive span of years present, if any.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let first = self.years.first()?;
        let last = self.years.last()?;
        Some((*first, *last))
    }
}

// ---------------------------------------------------------------------------
// ReferenceTable – country → region / ISO3 lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryReference {
    pub country_or_area: String,
    pub iso3: Option<String>,
    pub region_name: String,
}

/// Country reference data grouped by region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    pub entries: Vec<CountryReference>,
    /// region_name → countries in that region.
    pub regions: BTreeMap<String, BTreeSet<String>>,
}

impl ReferenceTable {
    pub fn from_entries(entries: Vec<CountryReference>) -> Self {
        let mut regions: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for entry in &entries {
            regions
                .entry(entry.region_name.clone())
                .or_default()
                .insert(entry.country_or_area.clone());
        }
        ReferenceTable { entries, regions }
    }

    /// Countries of a region; empty for an unknown region.
    pub fn countries_in_region(&self, region: &str) -> BTreeSet<String> {
        self.regions.get(region).cloned().unwrap_or_default()
    }

    pub fn iso3_for(&self, country: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.country_or_area == country)
            .and_then(|e| e.iso3.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_indices_cover_all_dimensions() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Kenya", "GDP", 2021, Some(1.0)),
            IndicatorRecord::new("Ghana", "GDP", 2019, None),
            IndicatorRecord::new("Kenya", "Tax", 2020, Some(2.0)),
        ]);

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.countries.iter().collect::<Vec<_>>(),
            vec!["Ghana", "Kenya"]
        );
        assert!(table.has_indicator("Tax"));
        assert!(!table.has_indicator("Debt"));
        assert_eq!(table.year_bounds(), Some((2019, 2021)));
    }

    #[test]
    fn empty_table_has_no_year_bounds() {
        let table = IndicatorTable::default();
        assert!(table.is_empty());
        assert_eq!(table.year_bounds(), None);
    }

    #[test]
    fn reference_groups_countries_by_region() {
        let reference = ReferenceTable::from_entries(vec![
            CountryReference {
                country_or_area: "Kenya".into(),
                iso3: Some("KEN".into()),
                region_name: "Africa".into(),
            },
            CountryReference {
                country_or_area: "France".into(),
                iso3: Some("FRA".into()),
                region_name: "Europe".into(),
            },
            CountryReference {
                country_or_area: "Ghana".into(),
                iso3: None,
                region_name: "Africa".into(),
            },
        ]);

        let africa = reference.countries_in_region("Africa");
        assert_eq!(africa.len(), 2);
        assert!(africa.contains("Ghana"));
        assert!(reference.countries_in_region("Oceania").is_empty());
        assert_eq!(reference.len(), 3);
        assert_eq!(reference.iso3_for("Kenya"), Some("KEN"));
        assert_eq!(reference.iso3_for("Ghana"), None);
        assert_eq!(reference.iso3_for("Atlantis"), None);
    }

    #[test]
    fn iso3_builder_sets_code() {
        let rec = IndicatorRecord::new("Kenya", "GDP", 2020, Some(1.0)).with_iso3("KEN");
        assert_eq!(rec.iso3.as_deref(), Some("KEN"));
        assert!(IndicatorRecord::new("Kenya", "GDP", 2020, None).iso3.is_none());
    }
}
