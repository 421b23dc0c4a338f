//! Upstream scrape sources. Each one turns its pages into [`RawRow`]s and
//! fails as a whole; partial results are never returned.

pub mod ecdc;
pub mod ministry;

use crate::config::AppConfig;
use crate::health::HealthCheck;
use crate::types::RawRow;
use anyhow::Result;
use reqwest::Client;
use thiserror::Error;

pub use ecdc::EcdcSource;
pub use ministry::MinistrySource;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Upstream unreachable, timed out or answered with an error status.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The page loaded but the expected structure is gone.
    #[error("could not find {what} at {url}")]
    StructureNotFound { url: String, what: String },

    #[error("could not decode {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ScrapeError {
    /// True when the upstream answered but changed shape.
    pub fn is_schema_drift(&self) -> bool {
        !matches!(self, ScrapeError::Transport { .. })
    }

    pub fn class(&self) -> &'static str {
        if self.is_schema_drift() {
            "schema drift"
        } else {
            "transport"
        }
    }
}

pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let transport = |source: reqwest::Error| ScrapeError::Transport {
        url: url.to_string(),
        source,
    };
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(transport)?;
    response.text().await.map_err(transport)
}

/// Count as published: every non-digit (thousands separators, spaces) is
/// dropped. Anything without digits counts as 0.
pub fn parse_count(text: &str) -> u64 {
    text.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, digit| acc.saturating_mul(10).saturating_add(digit as u64))
}

#[derive(Debug, Clone)]
pub enum Source {
    Ecdc(EcdcSource),
    Ministry(MinistrySource),
}

impl Source {
    /// Every enabled source in configuration order.
    pub fn from_config(config: &AppConfig) -> Result<Vec<Source>> {
        let mut sources = Vec::new();
        if config.ecdc.enabled {
            sources.push(Source::Ecdc(EcdcSource::new(&config.ecdc)));
        }
        if config.ministry.enabled {
            sources.push(Source::Ministry(MinistrySource::new(&config.ministry)?));
        }
        Ok(sources)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Source::Ecdc(_) => "ecdc",
            Source::Ministry(_) => "ministry",
        }
    }

    pub fn health_checks(&self) -> &[HealthCheck] {
        match self {
            Source::Ecdc(source) => &source.health,
            Source::Ministry(source) => &source.health,
        }
    }

    pub async fn fetch_rows(&self, client: &Client) -> Result<Vec<RawRow>, ScrapeError> {
        match self {
            Source::Ecdc(source) => source.fetch_rows(client).await,
            Source::Ministry(source) => source.fetch_rows(client).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_ignore_separators() {
        assert_eq!(parse_count("1,234"), 1234);
        assert_eq!(parse_count(" 12 345 "), 12345);
        assert_eq!(parse_count("1.234.567"), 1234567);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("n/a"), 0);
    }

    #[test]
    fn huge_counts_saturate() {
        assert_eq!(parse_count("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn error_classes() {
        let drift = ScrapeError::StructureNotFound {
            url: "http://x".into(),
            what: "table".into(),
        };
        assert!(drift.is_schema_drift());
        assert_eq!(drift.class(), "schema drift");
        assert_eq!(drift.to_string(), "could not find table at http://x");

        let decode = ScrapeError::Decode {
            url: "http://x".into(),
            reason: "bad".into(),
        };
        assert!(decode.is_schema_drift());
    }

    #[test]
    fn sources_follow_enabled_flags() {
        let mut config = AppConfig::default();
        let names: Vec<_> = Source::from_config(&config).unwrap().iter().map(Source::name).collect();
        assert_eq!(names, ["ecdc", "ministry"]);

        config.ecdc.enabled = false;
        let names: Vec<_> = Source::from_config(&config).unwrap().iter().map(Source::name).collect();
        assert_eq!(names, ["ministry"]);
    }

    #[test]
    fn invalid_total_pattern_is_rejected() {
        let mut config = AppConfig::default();
        config.ministry.totals.tests = Some("(unclosed".into());
        assert!(Source::from_config(&config).is_err());
    }
}
