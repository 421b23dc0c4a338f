use crate::health::{HealthCheck, COMPLETE_TAG_COUNT};
use crate::types::{Breakdown, Measure, MetricKind, Scope, Total};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub ecdc: EcdcConfig,
    #[serde(default)]
    pub ministry: MinistryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8282
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MetadataConfig {
    /// CSV files with `name,population,latitude,longitude` columns.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    5
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct EcdcConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "default_ecdc_url")]
    pub url: String,
    #[serde(default = "default_ecdc_health")]
    pub health: Vec<HealthCheck>,
}

impl Default for EcdcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_ecdc_url(),
            health: default_ecdc_health(),
        }
    }
}

fn default_ecdc_url() -> String {
    "https://www.ecdc.europa.eu/en/geographical-distribution-2019-ncov-cases".to_string()
}

/// Tag completeness is only checked where the shipped reference data covers
/// every location; countries are not all listed.
fn default_ecdc_health() -> Vec<HealthCheck> {
    vec![HealthCheck::MinCount {
        metric: MetricKind::Scoped(Scope::World, Measure::Infected),
        min: 100,
    }]
}

#[derive(Debug, Deserialize, Clone)]
pub struct MinistryConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Base URL of the JSON-array endpoints.
    #[serde(default = "default_ministry_url")]
    pub url: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub totals: TotalsConfig,
    #[serde(default = "default_ministry_health")]
    pub health: Vec<HealthCheck>,
}

impl Default for MinistryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_ministry_url(),
            country: default_country(),
            totals: TotalsConfig::default(),
            health: default_ministry_health(),
        }
    }
}

fn default_ministry_url() -> String {
    "https://info.gesundheitsministerium.at/data".to_string()
}

fn default_country() -> String {
    "Austria".to_string()
}

fn default_ministry_health() -> Vec<HealthCheck> {
    let bezirk = MetricKind::Scoped(Scope::Bezirk, Measure::Infected);
    let province = MetricKind::Scoped(Scope::Province, Measure::Infected);
    vec![
        HealthCheck::MinCount { metric: bezirk, min: 10 },
        HealthCheck::ExactCount { metric: province, expected: 9 },
        HealthCheck::CompleteTags { metric: province, tags: COMPLETE_TAG_COUNT },
        HealthCheck::MinCount {
            metric: MetricKind::Breakdown(Breakdown::Age),
            min: 4,
        },
        HealthCheck::ExactCount {
            metric: MetricKind::Breakdown(Breakdown::Sex),
            expected: 2,
        },
        HealthCheck::Required { metric: MetricKind::Total(Total::Confirmed) },
    ]
}

/// Regexes with one capture group, matched against the free-text totals
/// page. A missing pattern means the total is not scraped.
#[derive(Debug, Deserialize, Clone)]
pub struct TotalsConfig {
    #[serde(default = "default_confirmed_pattern")]
    pub confirmed: Option<String>,
    pub tests: Option<String>,
    pub healed: Option<String>,
    pub dead: Option<String>,
    pub hospitalized: Option<String>,
    pub intensive_care: Option<String>,
}

impl Default for TotalsConfig {
    fn default() -> Self {
        Self {
            confirmed: default_confirmed_pattern(),
            tests: None,
            healed: None,
            dead: None,
            hospitalized: None,
            intensive_care: None,
        }
    }
}

fn default_confirmed_pattern() -> Option<String> {
    Some("Erkrankungen = ([0-9]+)".to_string())
}

impl TotalsConfig {
    pub fn patterns(&self) -> Vec<(Total, &str)> {
        [
            (Total::Confirmed, &self.confirmed),
            (Total::Tests, &self.tests),
            (Total::Healed, &self.healed),
            (Total::Dead, &self.dead),
            (Total::Hospitalized, &self.hospitalized),
            (Total::IntensiveCare, &self.intensive_care),
        ]
        .into_iter()
        .filter_map(|(total, pattern)| pattern.as_deref().map(|p| (total, p)))
        .collect()
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
