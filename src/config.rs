use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::CONTROL_OF_CORRUPTION;
use crate::data::derive::MARKET_CAP_CURRENT_USD;
use crate::ui::plot::ChartKind;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "NEXUS_DASHBOARD_CONFIG";

// ---------------------------------------------------------------------------
// Topic indicator groups
// ---------------------------------------------------------------------------

/// One indicator shown on a topic page: display name → dataset label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicIndicator {
    pub name: String,
    pub label: String,
}

/// A topic and the indicators whose availability defines its coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Topic {
    pub title: String,
    pub indicators: Vec<TopicIndicator>,
}

impl Topic {
    fn new(title: &str, indicators: &[(&str, &str)]) -> Self {
        Topic {
            title: title.to_string(),
            indicators: indicators
                .iter()
                .map(|(name, label)| TopicIndicator {
                    name: name.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.indicators.iter().map(|i| i.label.as_str())
    }
}

fn default_topics() -> Vec<Topic> {
    vec![
        Topic::new(
            "Topic 4.1: Public Expenditures",
            &[
                (
                    "Aggregate Expenditure Outturn (4.1.1)",
                    "PEFA: PI-1 Aggregate expenditure out-turn",
                ),
                (
                    "Expenditure Composition Outturn (4.1.2)",
                    "PEFA: PI-2 Expenditure composition outturn",
                ),
            ],
        ),
        Topic::new(
            "Topic 4.2: Budget and Tax Revenues",
            &[
                ("Tax Revenue as % of GDP (4.2.1)", "Tax Revenue - % of GDP - value"),
                ("Tax Effort Ratio (4.2.2)", "Tax effort (ratio) [tax_eff]"),
                ("Tax Buoyancy", "Tax buoyancy [by_tax]"),
            ],
        ),
        Topic::new(
            "Topic 4.3: Capital Markets",
            &[
                ("Stock Market Capitalization to GDP (4.3.1)", MARKET_CAP_CURRENT_USD),
                (
                    "Domestic Credit to GDP (4.3.2)",
                    "Domestic credit provided by financial sector (% of GDP)",
                ),
                ("Pension Fund Assets (4.3.3)", "Pension fund assets to GDP (%)"),
                (
                    "Bond Market Development",
                    "Portfolio investment, bonds (PPG + PNG) (NFL, current US$)",
                ),
            ],
        ),
        Topic::new(
            "Topic 4.4: Illicit Financial Flows",
            &[
                ("Control of Corruption", CONTROL_OF_CORRUPTION),
                ("Rule of Law", "Rule of Law"),
                ("Tax Buoyancy", "Tax Revenue - % of GDP - Buoyancy"),
            ],
        ),
    ]
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Long-format indicator table loaded at start-up.
    pub data_path: PathBuf,
    /// Country → region reference table.
    pub reference_path: PathBuf,
    /// Region used as the coverage universe.
    pub region: String,
    pub topics: Vec<Topic>,
    /// Annual corruption loss to allocate, in billion USD.
    pub corruption_loss_total_busd: f64,
    /// Chart type of the indicator panel at start-up.
    pub default_chart: ChartKind,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_path: PathBuf::from("data/nexus.parquet"),
            reference_path: PathBuf::from("data/country_reference.csv"),
            region: "Africa".to_string(),
            topics: default_topics(),
            corruption_loss_total_busd: 148.0,
            default_chart: ChartKind::Line,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config from `$NEXUS_DASHBOARD_CONFIG`, or the defaults when unset.
    /// A file that cannot be read or parsed is logged and ignored.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::from_file(Path::new(&path)) {
            Ok(cfg) => {
                log::info!("Using config {}", Path::new(&path).display());
                cfg
            }
            Err(e) => {
                log::error!("Falling back to default config: {e:#}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "region": "Asia", "corruption_loss_total_busd": 10.0, "default_chart": "bar" }}"#
        )
        .unwrap();

        let cfg = DashboardConfig::from_file(file.path()).unwrap();

        assert_eq!(cfg.region, "Asia");
        assert_eq!(cfg.default_chart, ChartKind::Bar);
        assert_eq!(cfg.corruption_loss_total_busd, 10.0);
        assert_eq!(cfg.data_path, PathBuf::from("data/nexus.parquet"));
        assert_eq!(cfg.topics.len(), 4);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "regoin": "Asia" }}"#).unwrap();
        assert!(DashboardConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn custom_topics_replace_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "topics": [ {{ "title": "Debt", "indicators": [ {{ "name": "External debt", "label": "External debt stocks (% of GNI)" }} ] }} ] }}"#
        )
        .unwrap();

        let cfg = DashboardConfig::from_file(file.path()).unwrap();

        assert_eq!(cfg.topics.len(), 1);
        assert_eq!(
            cfg.topics[0].labels().collect::<Vec<_>>(),
            vec!["External debt stocks (% of GNI)"]
        );
    }

    #[test]
    fn default_topics_have_labels() {
        let cfg = DashboardConfig::default();
        assert!(cfg.topics.iter().all(|t| !t.indicators.is_empty()));
        assert!(cfg.topics[2].labels().any(|l| l == MARKET_CAP_CURRENT_USD));
    }
}
