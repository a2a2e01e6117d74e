use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CountryReference, IndicatorRecord, IndicatorTable, ReferenceTable};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// A logical column and the header spellings accepted for it.
struct ColumnSpec {
    name: &'static str,
    aliases: &'static [&'static str],
    required: bool,
}

const fn column(name: &'static str, aliases: &'static [&'static str], required: bool) -> ColumnSpec {
    ColumnSpec {
        name,
        aliases,
        required,
    }
}

const TABLE_COLUMNS: [ColumnSpec; 5] = [
    column("country_or_area", &["country_or_area", "Country or Area"], true),
    column("iso3", &["iso3", "ISO-alpha3 Code"], false),
    column("indicator_label", &["indicator_label"], true),
    column("year", &["year"], true),
    column("value", &["value"], true),
];

const REFERENCE_COLUMNS: [ColumnSpec; 3] = [
    column("country_or_area", &["country_or_area", "Country or Area"], true),
    column("iso3", &["iso3", "ISO-alpha3 Code"], false),
    column("region_name", &["region_name", "Region Name"], true),
];

/// Source rows reduced to the requested columns, as trimmed non-empty text.
type RawRows = Vec<Vec<Option<String>>>;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a long-format indicator table.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – one row per observation (recommended)
/// * `.csv`             – header row with the column names below
/// * `.json`            – `[{ "country_or_area": ..., "year": ..., ... }, ...]`
///
/// Required columns: `country_or_area`, `indicator_label`, `year`, `value`.
/// `iso3` is optional. Rows lacking a country, label or year are skipped.
pub fn load_table(path: &Path) -> Result<IndicatorTable> {
    let rows = read_columns(path, &TABLE_COLUMNS)
        .with_context(|| format!("loading indicator table {}", path.display()))?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for (row_no, row) in rows.into_iter().enumerate() {
        let mut cells = row.into_iter();
        let country = cells.next().flatten();
        let iso3 = cells.next().flatten();
        let label = cells.next().flatten();
        let year = cells.next().flatten();
        let value = cells.next().flatten();

        let (Some(country), Some(label), Some(year)) = (country, label, year) else {
            skipped += 1;
            continue;
        };

        let year = parse_year(&year, row_no)?;
        let value = value.as_deref().map(|v| parse_value(v, row_no)).transpose()?.flatten();
        let mut rec = IndicatorRecord::new(&country, &label, year, value);
        if let Some(code) = iso3 {
            rec = rec.with_iso3(&code);
        }
        records.push(rec);
    }

    if skipped > 0 {
        log::warn!(
            "{}: skipped {skipped} rows without country, indicator or year",
            path.display()
        );
    }

    let table = IndicatorTable::from_records(records);
    log::info!(
        "Loaded {} rows ({} countries, {} indicators) from {}",
        table.len(),
        table.countries.len(),
        table.indicators.len(),
        path.display()
    );
    Ok(table)
}

/// Load the country reference table (country → region, ISO3).
///
/// Accepts both snake_case headers and the UN M49 spellings
/// (`Country or Area`, `ISO-alpha3 Code`, `Region Name`).
pub fn load_reference(path: &Path) -> Result<ReferenceTable> {
    let rows = read_columns(path, &REFERENCE_COLUMNS)
        .with_context(|| format!("loading country reference {}", path.display()))?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells = row.into_iter();
        let country = cells.next().flatten();
        let iso3 = cells.next().flatten();
        let region = cells.next().flatten();
        if let (Some(country_or_area), Some(region_name)) = (country, region) {
            entries.push(CountryReference {
                country_or_area,
                iso3,
                region_name,
            });
        }
    }

    let reference = ReferenceTable::from_entries(entries);
    log::info!(
        "Loaded {} reference countries in {} regions from {}",
        reference.len(),
        reference.regions.len(),
        path.display()
    );
    Ok(reference)
}

/// Write a long-format table as CSV with the canonical column names.
pub fn save_csv(path: &Path, table: &IndicatorTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for rec in &table.records {
        writer.serialize(rec).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    log::info!("Exported {} rows to {}", table.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Format readers
// ---------------------------------------------------------------------------

fn read_columns(path: &Path, columns: &[ColumnSpec]) -> Result<RawRows> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => read_parquet(path, columns),
        "csv" => read_csv(path, columns),
        "json" => read_json(path, columns),
        other => Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    }
}

/// Map each column spec to the index of the first matching header.
fn resolve_columns<'a, I>(columns: &[ColumnSpec], headers: I) -> Result<Vec<Option<usize>>, LoadError>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    columns
        .iter()
        .map(|spec| {
            let idx = headers
                .clone()
                .into_iter()
                .position(|h| spec.aliases.contains(&h.trim()));
            match idx {
                None if spec.required => Err(LoadError::MissingColumn(spec.name.to_string())),
                other => Ok(other),
            }
        })
        .collect()
}

fn clean(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn read_csv(path: &Path, columns: &[ColumnSpec]) -> Result<RawRows> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    let indices = resolve_columns(columns, headers.iter())?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(
            indices
                .iter()
                .map(|idx| idx.and_then(|i| record.get(i)).and_then(clean))
                .collect(),
        );
    }
    Ok(rows)
}

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn read_json(path: &Path, columns: &[ColumnSpec]) -> Result<RawRows> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    if let Some(first) = records.first() {
        let obj = first.as_object().context("Row 0 is not a JSON object")?;
        resolve_columns(columns, obj.keys().map(String::as_str))?;
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        rows.push(
            columns
                .iter()
                .map(|spec| {
                    spec.aliases
                        .iter()
                        .find_map(|alias| obj.get(*alias))
                        .and_then(json_to_text)
                })
                .collect(),
        );
    }
    Ok(rows)
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => clean(s),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Parquet files written by Pandas (`df.to_parquet()`) or Polars.
///
/// Every requested column is cast to UTF-8 first so dictionary-encoded
/// strings, integer or float years and float values share one path.
fn read_parquet(path: &Path, columns: &[ColumnSpec]) -> Result<RawRows> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let indices = resolve_columns(columns, schema.fields().iter().map(|f| f.name().as_str()))?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let mut text_cols: Vec<Option<ArrayRef>> = Vec::with_capacity(indices.len());
        for (spec, idx) in columns.iter().zip(&indices) {
            let col = match idx {
                Some(i) => Some(
                    cast(batch.column(*i), &DataType::Utf8)
                        .with_context(|| format!("casting '{}' to text", spec.name))?,
                ),
                None => None,
            };
            text_cols.push(col);
        }

        for row in 0..batch.num_rows() {
            rows.push(
                text_cols
                    .iter()
                    .map(|col| {
                        let strings = col.as_ref()?.as_string::<i32>();
                        if strings.is_null(row) {
                            None
                        } else {
                            clean(strings.value(row))
                        }
                    })
                    .collect(),
            );
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Years arrive as `2020` or, from float columns, `2020.0`.
fn parse_year(text: &str, row: usize) -> Result<i32, LoadError> {
    if let Ok(y) = text.parse::<i32>() {
        return Ok(y);
    }
    match text.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < i32::MAX as f64 => Ok(f as i32),
        _ => Err(LoadError::InvalidField {
            row,
            text: text.to_string(),
            expected: "year",
        }),
    }
}

/// NaN and infinities count as missing.
fn parse_value(text: &str, row: usize) -> Result<Option<f64>, LoadError> {
    let v = text.parse::<f64>().map_err(|_| LoadError::InvalidField {
        row,
        text: text.to_string(),
        expected: "number",
    })?;
    Ok(v.is_finite().then_some(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::{Builder, NamedTempFile};

    fn temp_with(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn loads_csv_with_missing_values() {
        let file = temp_with(
            ".csv",
            "indicator_label,country_or_area,year,value,iso3\n\
             GDP (current US$),Kenya,2020,100.5,KEN\n\
             GDP (current US$),Kenya,2021.0,,KEN\n\
             GDP (current US$),Ghana,2021,NaN,\n\
             GDP (current US$),,2021,3.0,\n",
        );

        let table = load_table(file.path()).expect("load csv");

        assert_eq!(table.len(), 3);
        assert_eq!(table.records[0].value, Some(100.5));
        assert_eq!(table.records[0].iso3.as_deref(), Some("KEN"));
        assert_eq!(table.records[1].year, 2021);
        assert_eq!(table.records[1].value, None);
        assert_eq!(table.records[2].value, None);
        assert_eq!(table.records[2].iso3, None);
    }

    #[test]
    fn iso3_column_is_optional() {
        let file = temp_with(
            ".csv",
            "country_or_area,indicator_label,year,value\nKenya,Tax,2020,15\n",
        );
        let table = load_table(file.path()).expect("load csv");
        assert_eq!(table.records[0].iso3, None);
        assert_eq!(table.records[0].value, Some(15.0));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let file = temp_with(".csv", "country_or_area,year,value\nKenya,2020,1\n");
        let err = load_table(file.path()).expect_err("must fail");
        match err.downcast_ref::<LoadError>() {
            Some(LoadError::MissingColumn(col)) => assert_eq!(col, "indicator_label"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_year_is_reported() {
        let file = temp_with(
            ".csv",
            "country_or_area,indicator_label,year,value\nKenya,Tax,20x0,1\n",
        );
        let err = load_table(file.path()).expect_err("must fail");
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::InvalidField { expected: "year", .. })
        ));
    }

    #[test]
    fn unsupported_extension_is_reported() {
        let file = temp_with(".xlsx", "");
        let err = load_table(file.path()).expect_err("must fail");
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn loads_json_records() {
        let file = temp_with(
            ".json",
            r#"[
                {"country_or_area": "Kenya", "iso3": "KEN", "indicator_label": "Tax", "year": 2020, "value": 15.5},
                {"country_or_area": "Benin", "iso3": null, "indicator_label": "Tax", "year": 2019.0, "value": null}
            ]"#,
        );

        let table = load_table(file.path()).expect("load json");

        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].value, Some(15.5));
        assert_eq!(table.records[1].year, 2019);
        assert_eq!(table.records[1].value, None);
    }

    #[test]
    fn loads_parquet_written_by_arrow() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("country_or_area", DataType::Utf8, false),
            Field::new("iso3", DataType::Utf8, true),
            Field::new("indicator_label", DataType::Utf8, false),
            Field::new("year", DataType::Int64, false),
            Field::new("value", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Kenya", "Nigeria"])),
                Arc::new(StringArray::from(vec![Some("KEN"), None])),
                Arc::new(StringArray::from(vec!["GDP", "GDP"])),
                Arc::new(Int64Array::from(vec![2020, 2021])),
                Arc::new(Float64Array::from(vec![Some(0.1), None])),
            ],
        )
        .expect("record batch");

        let file = Builder::new().suffix(".parquet").tempfile().expect("temp file");
        let mut writer =
            ArrowWriter::try_new(file.reopen().expect("reopen"), schema, None).expect("writer");
        writer.write(&batch).expect("write batch");
        writer.close().expect("close writer");

        let table = load_table(file.path()).expect("load parquet");

        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].iso3.as_deref(), Some("KEN"));
        assert_eq!(table.records[0].value, Some(0.1));
        assert_eq!(table.records[1].year, 2021);
        assert_eq!(table.records[1].value, None);
    }

    #[test]
    fn reference_accepts_m49_headers() {
        let file = temp_with(
            ".csv",
            "Region Name,Country or Area,ISO-alpha3 Code\n\
             Africa,Kenya,KEN\n\
             Africa,Ghana,GHA\n\
             Europe,France,FRA\n\
             ,Nowhere,XXX\n",
        );

        let reference = load_reference(file.path()).expect("load reference");

        assert_eq!(reference.len(), 3);
        assert_eq!(reference.countries_in_region("Africa").len(), 2);
        assert_eq!(reference.iso3_for("France"), Some("FRA"));
    }

    #[test]
    fn exported_csv_loads_back() {
        let table = IndicatorTable::from_records(vec![
            IndicatorRecord::new("Kenya", "Tax", 2020, Some(15.0)).with_iso3("KEN"),
            IndicatorRecord::new("Togo", "Tax", 2020, None),
        ]);
        let file = Builder::new().suffix(".csv").tempfile().expect("temp file");

        save_csv(file.path(), &table).expect("export");
        let back = load_table(file.path()).expect("reload");

        assert_eq!(back, table);
    }
}
