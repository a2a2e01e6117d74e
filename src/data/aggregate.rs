use std::collections::BTreeMap;

use super::model::{IndicatorRecord, IndicatorTable};

pub const CONTROL_OF_CORRUPTION: &str = "Control of Corruption";
pub const CORRUPTION_LOSS_LABEL: &str = "Estimated Corruption Loss (Billion USD)";

/// Upper bound of the WGI estimate scale (-2.5 .. 2.5).
const WGI_MAX_SCORE: f64 = 2.5;

/// Most recent non-missing observation per country, sorted by country.
pub fn latest_by_country(table: &IndicatorTable) -> Vec<IndicatorRecord> {
    let mut latest: BTreeMap<&str, &IndicatorRecord> = BTreeMap::new();
    for rec in table.records.iter().filter(|r| r.has_value()) {
        latest
            .entry(rec.country_or_area.as_str())
            .and_modify(|cur| {
                if rec.year > cur.year {
                    *cur = rec;
                }
            })
            .or_insert(rec);
    }
    latest.into_values().cloned().collect()
}

/// Split `total` across countries in proportion to their inverted
/// governance score (`2.5 - score`, floored at zero).
///
/// Each country's latest non-missing score of `indicator_label` is used.
/// Countries with no score are left out. When every inverted score is zero
/// nothing can be allocated and the result is empty.
pub fn allocate_by_inverted_score(
    table: &IndicatorTable,
    indicator_label: &str,
    total: f64,
) -> IndicatorTable {
    let scores: Vec<IndicatorRecord> = table
        .records
        .iter()
        .filter(|r| r.indicator_label == indicator_label)
        .cloned()
        .collect();
    let latest = latest_by_country(&IndicatorTable::from_records(scores));

    let weights: Vec<(IndicatorRecord, f64)> = latest
        .into_iter()
        .filter_map(|rec| {
            let score = rec.value?;
            Some((rec, (WGI_MAX_SCORE - score).max(0.0)))
        })
        .collect();
    let weight_sum: f64 = weights.iter().map(|(_, w)| w).sum();
    if weight_sum <= 0.0 {
        return IndicatorTable::default();
    }

    let records = weights
        .into_iter()
        .map(|(rec, w)| IndicatorRecord {
            indicator_label: CORRUPTION_LOSS_LABEL.to_string(),
            value: Some(total * w / weight_sum),
            ..rec
        })
        .collect();
    IndicatorTable::from_records(records)
}
