use super::{fetch_text, parse_count, ScrapeError};
use crate::config::MinistryConfig;
use crate::health::HealthCheck;
use crate::types::{Breakdown, RawRow, RawStat, Scope, TagKey, Total};
use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const BEZIRKE: &str = "/Bezirke.js";
const BUNDESLAND: &str = "/Bundesland.js";
const AGE: &str = "/Altersverteilung.js";
const SEX: &str = "/Geschlechtsverteilung.js";
const SIMPLE_DATA: &str = "/SimpleData.js";

/// National health ministry dashboard: several small JavaScript files that
/// each assign a JSON array, plus a free-text file with the totals.
#[derive(Debug, Clone)]
pub struct MinistrySource {
    pub url: String,
    pub country: String,
    pub totals: Vec<(Total, Regex)>,
    pub health: Vec<HealthCheck>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct Entry {
    #[serde(alias = "Label")]
    pub label: String,
    #[serde(alias = "Y")]
    pub y: u64,
}

impl MinistrySource {
    pub fn new(config: &MinistryConfig) -> Result<Self> {
        let totals = config
            .totals
            .patterns()
            .into_iter()
            .map(|(total, pattern)| -> Result<(Total, Regex)> {
                let regex = Regex::new(pattern)
                    .with_context(|| format!("Invalid totals pattern for {:?}: {}", total, pattern))?;
                Ok((total, regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            totals,
            health: config.health.clone(),
        })
    }

    pub async fn fetch_rows(&self, client: &Client) -> Result<Vec<RawRow>, ScrapeError> {
        let mut rows = Vec::new();

        for entry in self.fetch_array(client, BEZIRKE).await? {
            rows.push(self.location_row(Scope::Bezirk, entry.label, entry.y));
        }
        for entry in self.fetch_array(client, BUNDESLAND).await? {
            let name = province_name(&entry.label).to_string();
            rows.push(self.location_row(Scope::Province, name, entry.y));
        }
        for (kind, endpoint) in [(Breakdown::Age, AGE), (Breakdown::Sex, SEX)] {
            for entry in self.fetch_array(client, endpoint).await? {
                rows.push(RawRow::Breakdown {
                    kind,
                    country: self.country.clone(),
                    bucket: entry.label,
                    count: entry.y,
                });
            }
        }

        let text = fetch_text(client, &self.endpoint(SIMPLE_DATA)).await?;
        rows.extend(parse_totals(&text, &self.totals));

        Ok(rows)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    async fn fetch_array(&self, client: &Client, path: &str) -> Result<Vec<Entry>, ScrapeError> {
        let url = self.endpoint(path);
        let body = fetch_text(client, &url).await?;
        parse_array(&url, &body)
    }

    fn location_row(&self, scope: Scope, location: String, infected: u64) -> RawRow {
        RawRow::Location {
            scope,
            stat: RawStat::new(location, infected, 0).with_dimension(TagKey::Country, self.country.as_str()),
        }
    }
}

/// Decodes the array literal inside a `var x = [...];` script.
pub fn parse_array(url: &str, body: &str) -> Result<Vec<Entry>, ScrapeError> {
    let (Some(start), Some(end)) = (body.find('['), body.rfind(']')) else {
        return Err(ScrapeError::StructureNotFound {
            url: url.to_string(),
            what: "array".to_string(),
        });
    };
    if end < start {
        return Err(ScrapeError::StructureNotFound {
            url: url.to_string(),
            what: "array".to_string(),
        });
    }

    serde_json::from_str(&body[start..=end]).map_err(|e| ScrapeError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Full province name for the dashboard's abbreviations. Unknown labels
/// are passed through.
pub fn province_name(label: &str) -> &str {
    match label.trim() {
        "Bgld" => "Burgenland",
        "Ktn" => "Kärnten",
        "NÖ" => "Niederösterreich",
        "OÖ" => "Oberösterreich",
        "Sbg" => "Salzburg",
        "Stmk" => "Steiermark",
        "T" => "Tirol",
        "Vbg" => "Vorarlberg",
        "W" => "Wien",
        other => other,
    }
}

/// Totals found in free text. Patterns that do not match yield nothing.
pub fn parse_totals(text: &str, patterns: &[(Total, Regex)]) -> Vec<RawRow> {
    patterns
        .iter()
        .filter_map(|(kind, regex)| {
            let Some(value) = regex.captures(text).and_then(|c| c.get(1)) else {
                debug!("Totals pattern for {:?} did not match", kind);
                return None;
            };
            Some(RawRow::Total {
                kind: *kind,
                value: parse_count(value.as_str()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;
    use tokio::net::TcpListener;

    fn dashboard(with_sex: bool) -> Router {
        let router = Router::new()
            .route(
                "/data/Bezirke.js",
                get(|| async { r#"var dpBezirke = [{"label":"Graz(Stadt)","y":120},{"label":"Innsbruck-Land","y":95}];"# }),
            )
            .route(
                "/data/Bundesland.js",
                get(|| async { r#"var dpBundesland = [{"label":"W","y":1021},{"label":"Stmk","y":430}];"# }),
            )
            .route(
                "/data/Altersverteilung.js",
                get(|| async { r#"var dpAltersverteilung = [{"label":"<5","y":7},{"label":"5-14","y":30}];"# }),
            )
            .route(
                "/data/SimpleData.js",
                get(|| async { "var Erkrankungen = 4486; var Stand = '21.03.2020';" }),
            );
        if with_sex {
            router.route(
                "/data/Geschlechtsverteilung.js",
                get(|| async { r#"var dpGeschlechtsverteilung = [{"label":"weiblich","y":48},{"label":"männlich","y":52}];"# }),
            )
        } else {
            router
        }
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/data/", addr)
    }

    fn source(url: String) -> MinistrySource {
        let mut config = MinistryConfig::default();
        config.url = url;
        MinistrySource::new(&config).unwrap()
    }

    fn client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    fn location(scope: Scope, name: &str, infected: u64) -> RawRow {
        RawRow::Location {
            scope,
            stat: RawStat::new(name, infected, 0).with_dimension(TagKey::Country, "Austria"),
        }
    }

    fn breakdown(kind: Breakdown, bucket: &str, count: u64) -> RawRow {
        RawRow::Breakdown {
            kind,
            country: "Austria".into(),
            bucket: bucket.into(),
            count,
        }
    }

    #[tokio::test]
    async fn fetches_every_endpoint_in_order() {
        let source = source(serve(dashboard(true)).await);
        let rows = source.fetch_rows(&client()).await.unwrap();

        assert_eq!(
            rows,
            [
                location(Scope::Bezirk, "Graz(Stadt)", 120),
                location(Scope::Bezirk, "Innsbruck-Land", 95),
                location(Scope::Province, "Wien", 1021),
                location(Scope::Province, "Steiermark", 430),
                breakdown(Breakdown::Age, "<5", 7),
                breakdown(Breakdown::Age, "5-14", 30),
                breakdown(Breakdown::Sex, "weiblich", 48),
                breakdown(Breakdown::Sex, "männlich", 52),
                RawRow::Total { kind: Total::Confirmed, value: 4486 },
            ]
        );
    }

    #[tokio::test]
    async fn one_missing_endpoint_fails_the_whole_source() {
        let source = source(serve(dashboard(false)).await);
        let err = source.fetch_rows(&client()).await.unwrap_err();

        match &err {
            ScrapeError::Transport { url, .. } => assert!(url.ends_with("/data/Geschlechtsverteilung.js")),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!err.is_schema_drift());
    }

    #[test]
    fn decodes_assigned_array() {
        let body = r#"var dpBundesland = [{"label":"W","y":1021},{"label":"NÖ","y":664}];"#;
        let entries = parse_array("http://x/Bundesland.js", body).unwrap();
        assert_eq!(
            entries,
            [
                Entry { label: "W".into(), y: 1021 },
                Entry { label: "NÖ".into(), y: 664 },
            ]
        );
    }

    #[test]
    fn accepts_capitalized_keys() {
        let entries = parse_array("u", r#"[{"Label":"<5","Y":7}]"#).unwrap();
        assert_eq!(entries[0].label, "<5");
        assert_eq!(entries[0].y, 7);
    }

    #[test]
    fn missing_array_is_not_found() {
        let err = parse_array("u", "var x = 3;").unwrap_err();
        assert!(matches!(err, ScrapeError::StructureNotFound { .. }));
        let err = parse_array("u", "] oops [").unwrap_err();
        assert!(matches!(err, ScrapeError::StructureNotFound { .. }));
    }

    #[test]
    fn malformed_array_is_decode_error() {
        let err = parse_array("u", "var x = [{label: 'W', y: 1}];").unwrap_err();
        assert!(matches!(err, ScrapeError::Decode { .. }));
        assert!(err.is_schema_drift());
    }

    #[test]
    fn maps_province_abbreviations() {
        assert_eq!(province_name("W"), "Wien");
        assert_eq!(province_name("OÖ"), "Oberösterreich");
        assert_eq!(province_name(" Ktn "), "Kärnten");
        assert_eq!(province_name("Tirol"), "Tirol");
    }

    #[test]
    fn extracts_configured_totals() {
        let mut config = MinistryConfig::default();
        config.totals.tests = Some(r"Testungen = ([0-9.]+)".into());
        config.totals.healed = Some(r"Genesen = ([0-9]+)".into());
        let source = MinistrySource::new(&config).unwrap();

        let text = "var Erkrankungen = 4486; var Testungen = 32.407; var Stand = '21.03.2020';";
        let rows = parse_totals(text, &source.totals);
        assert_eq!(
            rows,
            [
                RawRow::Total { kind: Total::Confirmed, value: 4486 },
                RawRow::Total { kind: Total::Tests, value: 32407 },
            ]
        );
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let mut config = MinistryConfig::default();
        config.url = "http://localhost/data/".into();
        let source = MinistrySource::new(&config).unwrap();
        assert_eq!(source.endpoint(BEZIRKE), "http://localhost/data/Bezirke.js");
    }
}
