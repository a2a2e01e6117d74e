use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::model::{IndicatorRecord, IndicatorTable};

pub const GDP_CURRENT_USD: &str = "GDP (current US$)";
pub const MARKET_CAP_CURRENT_USD: &str =
    "Market capitalization of listed domestic companies (current US$)";
pub const STOCK_MARKET_CAP_TO_GDP: &str = "Stock Market Cap to GDP (%)";

// ---------------------------------------------------------------------------
// WideRow – one (country, year) pair with one column per required label
// ---------------------------------------------------------------------------

/// Wide-format view handed to a derivation formula.
///
/// Only complete rows reach a formula, so every required label resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub country_or_area: String,
    pub year: i32,
    values: BTreeMap<String, f64>,
}

impl WideRow {
    pub fn value(&self, label: &str) -> Option<f64> {
        self.values.get(label).copied()
    }
}

type Formula = Box<dyn Fn(&WideRow) -> Option<f64> + Send + Sync>;

// ---------------------------------------------------------------------------
// DerivationSpec – a named calculation over existing indicators
// ---------------------------------------------------------------------------

pub struct DerivationSpec {
    pub output_label: String,
    pub required_labels: Vec<String>,
    formula: Formula,
}

impl fmt::Debug for DerivationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivationSpec")
            .field("output_label", &self.output_label)
            .field("required_labels", &self.required_labels)
            .finish_non_exhaustive()
    }
}

impl DerivationSpec {
    pub fn new<F>(output_label: &str, required_labels: &[&str], formula: F) -> Self
    where
        F: Fn(&WideRow) -> Option<f64> + Send + Sync + 'static,
    {
        DerivationSpec {
            output_label: output_label.to_string(),
            required_labels: required_labels.iter().map(|s| s.to_string()).collect(),
            formula: Box::new(formula),
        }
    }

    /// `numerator / denominator * scale`.
    pub fn ratio(output_label: &str, numerator: &str, denominator: &str, scale: f64) -> Self {
        let num = numerator.to_string();
        let den = denominator.to_string();
        DerivationSpec::new(output_label, &[numerator, denominator], move |row| {
            Some(row.value(&num)? / row.value(&den)? * scale)
        })
    }

    /// Market capitalisation of listed companies as a percentage of GDP.
    pub fn stock_market_cap_to_gdp() -> Self {
        DerivationSpec::ratio(
            STOCK_MARKET_CAP_TO_GDP,
            MARKET_CAP_CURRENT_USD,
            GDP_CURRENT_USD,
            100.0,
        )
    }

    fn apply(&self, row: &WideRow) -> Option<f64> {
        (self.formula)(row)
    }
}

/// Result of a derivation: the long-format output plus any required labels
/// that had no rows at all in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derivation {
    pub table: IndicatorTable,
    pub missing_labels: Vec<String>,
}

impl Derivation {
    /// True when the caller should show a data-insufficiency message.
    pub fn is_insufficient(&self) -> bool {
        self.table.is_empty() || !self.missing_labels.is_empty()
    }
}

#[derive(Default)]
struct PivotCell {
    iso3: Option<String>,
    values: BTreeMap<String, Option<f64>>,
}

/// Compute a derived indicator from `table` according to `spec`.
///
/// Pivots the required labels to one row per (country, year), applies the
/// formula to complete rows only and flattens the result back to long
/// format. A pair lacking any input, or whose result is not finite, is
/// left out entirely.
pub fn derive_indicator(table: &IndicatorTable, spec: &DerivationSpec) -> Derivation {
    let required: BTreeSet<&str> = spec.required_labels.iter().map(String::as_str).collect();

    let missing_labels: Vec<String> = spec
        .required_labels
        .iter()
        .filter(|label| !table.has_indicator(label))
        .cloned()
        .collect();

    let mut pivot: BTreeMap<(String, i32), PivotCell> = BTreeMap::new();
    for rec in &table.records {
        if !required.contains(rec.indicator_label.as_str()) {
            continue;
        }
        let cell = pivot
            .entry((rec.country_or_area.clone(), rec.year))
            .or_default();
        if cell.iso3.is_none() {
            cell.iso3 = rec.iso3.clone();
        }
        let slot = cell.values.entry(rec.indicator_label.clone()).or_insert(None);
        if slot.is_none() {
            *slot = rec.value;
        } else if rec.value.is_some() {
            log::debug!(
                "duplicate observation for {} / {} / {}; keeping the first",
                rec.country_or_area,
                rec.indicator_label,
                rec.year
            );
        }
    }

    let mut records = Vec::new();
    for ((country, year), cell) in pivot {
        let complete: Option<BTreeMap<String, f64>> = spec
            .required_labels
            .iter()
            .map(|label| {
                let v = cell.values.get(label).copied().flatten()?;
                Some((label.clone(), v))
            })
            .collect();
        let Some(values) = complete else {
            continue;
        };

        let row = WideRow {
            country_or_area: country,
            year,
            values,
        };
        let Some(result) = spec.apply(&row).filter(|v| v.is_finite()) else {
            continue;
        };

        records.push(IndicatorRecord {
            country_or_area: row.country_or_area,
            iso3: cell.iso3,
            indicator_label: spec.output_label.clone(),
            year: row.year,
            value: Some(result),
        });
    }

    log::debug!(
        "derived {} rows of '{}' (missing inputs: {:?})",
        records.len(),
        spec.output_label,
        missing_labels
    );

    Derivation {
        table: IndicatorTable::from_records(records),
        missing_labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gdp_mcap_spec() -> DerivationSpec {
        DerivationSpec::ratio("Stock Market Cap to GDP (%)", "MarketCap", "GDP", 100.0)
    }

    #[test]
    fn computes_ratio_and_drops_incomplete_countries() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Kenya", "GDP", 2020, Some(100.0)),
            IndicatorRecord::new("Kenya", "MarketCap", 2020, Some(40.0)),
            IndicatorRecord::new("Nigeria", "GDP", 2020, Some(200.0)),
        ]);

        let out = derive_indicator(&table, &gdp_mcap_spec());

        assert!(out.missing_labels.is_empty());
        assert_eq!(
            out.table.records,
            vec![IndicatorRecord::new(
                "Kenya",
                "Stock Market Cap to GDP (%)",
                2020,
                Some(40.0)
            )]
        );
    }

    #[test]
    fn partial_years_are_excluded() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Kenya", "GDP", 2020, Some(100.0)),
            IndicatorRecord::new("Kenya", "MarketCap", 2020, None),
            IndicatorRecord::new("Kenya", "GDP", 2021, Some(100.0)),
            IndicatorRecord::new("Kenya", "MarketCap", 2021, Some(25.0)),
        ]);

        let out = derive_indicator(&table, &gdp_mcap_spec());

        assert_eq!(out.table.len(), 1);
        let rec = &out.table.records[0];
        assert_eq!((rec.country_or_area.as_str(), rec.year), ("Kenya", 2021));
        assert_eq!(rec.value, Some(25.0));
    }

    #[test]
    fn missing_gdp_is_never_treated_as_zero() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Kenya", "MarketCap", 2020, Some(40.0)),
        ]);

        let out = derive_indicator(&table, &gdp_mcap_spec());

        assert!(out.table.is_empty());
        assert_eq!(out.missing_labels, vec!["GDP".to_string()]);
        assert!(out.is_insufficient());
    }

    #[test]
    fn all_inputs_absent_reports_every_label() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Kenya", "Tax", 2020, Some(15.0)),
        ]);

        let out = derive_indicator(&table, &gdp_mcap_spec());

        assert!(out.table.is_empty());
        assert_eq!(
            out.missing_labels,
            vec!["MarketCap".to_string(), "GDP".to_string()]
        );
    }

    #[test]
    fn zero_denominator_is_left_out() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Chad", "GDP", 2020, Some(0.0)),
            IndicatorRecord::new("Chad", "MarketCap", 2020, Some(5.0)),
        ]);

        let out = derive_indicator(&table, &gdp_mcap_spec());
        assert!(out.table.is_empty());
        assert!(out.missing_labels.is_empty());
    }

    #[test]
    fn keeps_iso3_and_sorts_by_country_then_year() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Nigeria", "GDP", 2021, Some(50.0)).with_iso3("NGA"),
            IndicatorRecord::new("Nigeria", "MarketCap", 2021, Some(5.0)),
            IndicatorRecord::new("Kenya", "GDP", 2021, Some(10.0)),
            IndicatorRecord::new("Kenya", "MarketCap", 2021, Some(1.0)),
            IndicatorRecord::new("Kenya", "GDP", 2019, Some(10.0)),
            IndicatorRecord::new("Kenya", "MarketCap", 2019, Some(2.0)),
        ]);

        let out = derive_indicator(&table, &gdp_mcap_spec());
        let keys: Vec<(&str, i32)> = out
            .table
            .records
            .iter()
            .map(|r| (r.country_or_area.as_str(), r.year))
            .collect();
        assert_eq!(keys, vec![("Kenya", 2019), ("Kenya", 2021), ("Nigeria", 2021)]);
        assert_eq!(out.table.records[2].iso3.as_deref(), Some("NGA"));
    }

    #[test]
    fn custom_formula_sees_every_required_column() {
        let spec = DerivationSpec::new("Sum", &["A", "B", "C"], |row| {
            Some(row.value("A")? + row.value("B")? + row.value("C")?)
        });
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Togo", "A", 2020, Some(1.0)),
            IndicatorRecord::new("Togo", "B", 2020, Some(2.0)),
            IndicatorRecord::new("Togo", "C", 2020, Some(3.0)),
            IndicatorRecord::new("Togo", "D", 2020, Some(100.0)),
        ]);

        let out = derive_indicator(&table, &spec);
        assert_eq!(out.table.records[0].value, Some(6.0));
        assert_eq!(out.table.records[0].indicator_label, "Sum");
    }

    #[test]
    fn builtin_stock_market_cap_spec_uses_world_bank_labels() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Kenya", GDP_CURRENT_USD, 2020, Some(100.0)),
            IndicatorRecord::new("Kenya", MARKET_CAP_CURRENT_USD, 2020, Some(40.0)),
        ]);

        let out = derive_indicator(&table, &DerivationSpec::stock_market_cap_to_gdp());
        assert_eq!(out.table.records[0].indicator_label, STOCK_MARKET_CAP_TO_GDP);
        assert_eq!(out.table.records[0].value, Some(40.0));
    }

    #[test]
    fn duplicate_observations_keep_first_present_value() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Kenya", "GDP", 2020, None),
            IndicatorRecord::new("Kenya", "GDP", 2020, Some(100.0)),
            IndicatorRecord::new("Kenya", "GDP", 2020, Some(50.0)),
            IndicatorRecord::new("Kenya", "MarketCap", 2020, Some(25.0)),
        ]);

        let out = derive_indicator(&table, &gdp_mcap_spec());

        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.records[0].value, Some(25.0));
    }
}
