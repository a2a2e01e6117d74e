//! Writes a synthetic indicator table and country reference into `data/`
//! so the dashboard has something to show without the real extracts.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const FIRST_YEAR: i32 = 2005;
const LAST_YEAR: i32 = 2023;
/// Share of observations left empty so coverage gaps show up.
const MISSING_RATE: f64 = 0.18;

/// (country, iso3, region)
const COUNTRIES: &[(&str, &str, &str)] = &[
    ("Kenya", "KEN", "Africa"),
    ("Nigeria", "NGA", "Africa"),
    ("Ghana", "GHA", "Africa"),
    ("South Africa", "ZAF", "Africa"),
    ("Egypt", "EGY", "Africa"),
    ("Morocco", "MAR", "Africa"),
    ("Senegal", "SEN", "Africa"),
    ("Ethiopia", "ETH", "Africa"),
    ("Rwanda", "RWA", "Africa"),
    ("Chad", "TCD", "Africa"),
    ("France", "FRA", "Europe"),
    ("Brazil", "BRA", "Americas"),
    ("India", "IND", "Asia"),
];

/// (label, base level, yearly drift, noise)
const INDICATORS: &[(&str, f64, f64, f64)] = &[
    ("GDP (current US$)", 4.0e10, 0.05, 0.04),
    (
        "Market capitalization of listed domestic companies (current US$)",
        1.2e10,
        0.06,
        0.15,
    ),
    ("Domestic credit provided by financial sector (% of GDP)", 35.0, 0.01, 0.08),
    ("Pension fund assets to GDP (%)", 8.0, 0.03, 0.10),
    ("Tax Revenue - % of GDP - value", 15.0, 0.005, 0.05),
    ("Tax effort (ratio) [tax_eff]", 0.8, 0.0, 0.06),
    ("Tax buoyancy [by_tax]", 1.0, 0.0, 0.25),
    ("PEFA: PI-1 Aggregate expenditure out-turn", 3.0, 0.0, 0.2),
    ("PEFA: PI-2 Expenditure composition outturn", 2.5, 0.0, 0.2),
    ("Control of Corruption", -0.6, 0.0, 0.08),
    ("Rule of Law", -0.5, 0.0, 0.08),
];

/// splitmix64; deterministic so regenerated files diff cleanly.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1).
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [-1, 1).
    fn symmetric(&mut self) -> f64 {
        2.0 * self.unit() - 1.0
    }
}

#[derive(Default)]
struct Columns {
    country: Vec<String>,
    iso3: Vec<String>,
    label: Vec<String>,
    year: Vec<i32>,
    value: Vec<Option<f64>>,
}

fn generate(rng: &mut SplitMix) -> Columns {
    let mut cols = Columns::default();

    for (ci, (country, iso3, _)) in COUNTRIES.iter().enumerate() {
        // Country-specific scale so series don't overlap exactly.
        let scale = 0.4 + 0.15 * ci as f64;
        for (label, base, drift, noise) in INDICATORS {
            // Some countries never report some indicators.
            if rng.unit() < 0.1 {
                continue;
            }
            let level = if base.abs() > 10.0 { base * scale } else { *base };
            for year in FIRST_YEAR..=LAST_YEAR {
                let t = (year - FIRST_YEAR) as f64;
                let value = (rng.unit() >= MISSING_RATE).then(|| {
                    let trend = level * (1.0 + drift).powf(t);
                    trend + trend.abs() * noise * rng.symmetric()
                });
                cols.country.push(country.to_string());
                cols.iso3.push(iso3.to_string());
                cols.label.push(label.to_string());
                cols.year.push(year);
                cols.value.push(value);
            }
        }
    }
    cols
}

fn write_parquet(path: &Path, cols: Columns) -> Result<usize> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("country_or_area", DataType::Utf8, false),
        Field::new("iso3", DataType::Utf8, true),
        Field::new("indicator_label", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("value", DataType::Float64, true),
    ]));
    let rows = cols.year.len();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(cols.country)),
            Arc::new(StringArray::from(cols.iso3)),
            Arc::new(StringArray::from(cols.label)),
            Arc::new(Int32Array::from(cols.year)),
            Arc::new(Float64Array::from(cols.value)),
        ],
    )
    .context("building record batch")?;

    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(rows)
}

fn write_reference(path: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["Country or Area", "ISO-alpha3 Code", "Region Name"])?;
    for (country, iso3, region) in COUNTRIES {
        writer.write_record([*country, *iso3, *region])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = Path::new("data");
    fs::create_dir_all(out_dir).context("creating data/")?;

    let mut rng = SplitMix(42);
    let rows = write_parquet(&out_dir.join("nexus.parquet"), generate(&mut rng))?;
    write_reference(&out_dir.join("country_reference.csv"))?;

    println!(
        "Wrote {rows} observations ({} countries, {} indicators) to data/nexus.parquet",
        COUNTRIES.len(),
        INDICATORS.len()
    );
    println!("Wrote {} reference rows to data/country_reference.csv", COUNTRIES.len());
    Ok(())
}
