use crate::metric_set::MetricSet;
use crate::types::MetricKind;
use serde::Deserialize;
use std::fmt;

/// Location + country + latitude + longitude.
pub const COMPLETE_TAG_COUNT: usize = 4;

fn default_tag_count() -> usize {
    COMPLETE_TAG_COUNT
}

/// One predicate of a source's health battery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum HealthCheck {
    MinCount { metric: MetricKind, min: usize },
    ExactCount { metric: MetricKind, expected: usize },
    CompleteTags {
        metric: MetricKind,
        #[serde(default = "default_tag_count")]
        tags: usize,
    },
    Required { metric: MetricKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthIssue {
    pub source: String,
    pub message: String,
}

impl HealthIssue {
    pub fn new(source: &str, message: impl Into<String>) -> Self {
        Self {
            source: source.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.message)
    }
}

/// Runs every check against `metrics` and returns all violations.
/// An empty result means healthy.
pub fn validate(source: &str, checks: &[HealthCheck], metrics: &MetricSet) -> Vec<HealthIssue> {
    let mut issues = Vec::new();
    for check in checks {
        run_check(source, check, metrics, &mut issues);
    }
    issues
}

fn run_check(source: &str, check: &HealthCheck, metrics: &MetricSet, issues: &mut Vec<HealthIssue>) {
    match *check {
        HealthCheck::MinCount { metric, min } => {
            let found = metrics.count(metric);
            if found < min {
                issues.push(HealthIssue::new(
                    source,
                    format!("Not enough {} results: {} (expected at least {})", metric, found, min),
                ));
            }
        }
        HealthCheck::ExactCount { metric, expected } => {
            let found = metrics.count(metric);
            if found != expected {
                issues.push(HealthIssue::new(
                    source,
                    format!("Unexpected number of {} results: {} (expected {})", metric, found, expected),
                ));
            }
        }
        HealthCheck::CompleteTags { metric, tags } => {
            for m in metrics.of_kind(metric).filter(|m| m.tags().len() != tags) {
                issues.push(HealthIssue::new(
                    source,
                    format!(
                        "Missing tags for {}: {} ({} of {})",
                        metric,
                        m.location().unwrap_or("<unknown>"),
                        m.tags().len(),
                        tags
                    ),
                ));
            }
        }
        HealthCheck::Required { metric } => {
            if metrics.find_metric(metric, "").is_none() {
                issues.push(HealthIssue::new(source, format!("Could not find {}", metric)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{derive_location, derive_total};
    use crate::types::{LocationMetadata, Measure, RawStat, Scope, TagKey, Total};

    const BEZIRK_INFECTED: MetricKind = MetricKind::Scoped(Scope::Bezirk, Measure::Infected);
    const CONFIRMED: MetricKind = MetricKind::Total(Total::Confirmed);

    fn battery() -> Vec<HealthCheck> {
        vec![
            HealthCheck::MinCount { metric: BEZIRK_INFECTED, min: 2 },
            HealthCheck::ExactCount { metric: BEZIRK_INFECTED, expected: 2 },
            HealthCheck::CompleteTags { metric: BEZIRK_INFECTED, tags: COMPLETE_TAG_COUNT },
            HealthCheck::Required { metric: CONFIRMED },
        ]
    }

    fn bezirk(name: &str, resolved: bool) -> Vec<crate::derive::Metric> {
        let data = LocationMetadata {
            population: 100_000,
            latitude: 47.0,
            longitude: 15.0,
        };
        let stat = RawStat::new(name, 10, 0).with_dimension(TagKey::Country, "Austria");
        derive_location(Scope::Bezirk, &stat, resolved.then_some(&data))
    }

    fn healthy_set() -> MetricSet {
        let mut set = MetricSet::new();
        set.extend(bezirk("Graz(Stadt)", true));
        set.extend(bezirk("Villach Land", true));
        set.append(derive_total(Total::Confirmed, 500));
        set
    }

    #[test]
    fn fully_populated_set_is_healthy() {
        assert!(validate("ministry", &battery(), &healthy_set()).is_empty());
    }

    #[test]
    fn missing_total_reports_exactly_one_issue() {
        let set: MetricSet = healthy_set()
            .into_iter()
            .filter(|m| m.kind() != CONFIRMED)
            .collect();
        let issues = validate("ministry", &battery(), &set);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("cov19_confirmed"));
        assert_eq!(issues[0].to_string(), "[ministry] Could not find cov19_confirmed");
    }

    #[test]
    fn collects_every_violation() {
        let mut set = MetricSet::new();
        set.extend(bezirk("Unbekannt", false));
        let issues = validate("ministry", &battery(), &set);

        // min count, exact count, incomplete tags, missing total
        assert_eq!(issues.len(), 4);
        assert!(issues[2].message.contains("Unbekannt"));
    }

    #[test]
    fn incomplete_tags_are_reported_per_metric() {
        let mut set = healthy_set();
        set.extend(bezirk("Nirgendwo", false));
        set.extend(bezirk("Anderswo", false));
        let checks = [HealthCheck::CompleteTags { metric: BEZIRK_INFECTED, tags: 4 }];
        let issues = validate("ministry", &checks, &set);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("Nirgendwo"));
        assert!(issues[1].message.contains("Anderswo"));
    }

    #[test]
    fn checks_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Battery {
            health: Vec<HealthCheck>,
        }
        let parsed: Battery = toml::from_str(
            r#"
            [[health]]
            check = "min_count"
            metric = "cov19_world_infected"
            min = 150

            [[health]]
            check = "complete_tags"
            metric = "cov19_detail_infected"

            [[health]]
            check = "required"
            metric = "cov19_confirmed"
            "#,
        )
        .unwrap();

        assert_eq!(
            parsed.health,
            vec![
                HealthCheck::MinCount {
                    metric: MetricKind::Scoped(Scope::World, Measure::Infected),
                    min: 150
                },
                HealthCheck::CompleteTags {
                    metric: MetricKind::Scoped(Scope::Province, Measure::Infected),
                    tags: 4
                },
                HealthCheck::Required { metric: CONFIRMED },
            ]
        );
    }

    #[test]
    fn unknown_metric_name_is_rejected() {
        let result: Result<HealthCheck, _> =
            toml::from_str("check = \"required\"\nmetric = \"cov19_bogus\"\n");
        assert!(result.is_err());
    }
}
