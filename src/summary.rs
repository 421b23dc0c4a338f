use crate::derive::Metric;
use crate::metric_set::MetricSet;
use crate::types::{Measure, MetricKind, Scope, TagKey, Total};
use serde::Serialize;

/// Dashboard document served as JSON.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct SummaryReport {
    pub overview: Overview,
    pub precincts: Vec<LocationSummary>,
    pub states: Vec<LocationSummary>,
    pub countries: Vec<LocationSummary>,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct Overview {
    pub tested: u64,
    pub infected: u64,
    pub healed: u64,
    pub dead: u64,
    pub hospitalized: u64,
    pub intensive_care: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LocationSummary {
    pub location: String,
    pub infected: u64,
    pub deaths: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatality_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infection_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infected_per_100k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
}

pub fn build_summary(metrics: &MetricSet) -> SummaryReport {
    let total = |kind: Total| {
        metrics
            .find_metric(MetricKind::Total(kind), "")
            .map_or(0, |m| m.value() as u64)
    };

    SummaryReport {
        overview: Overview {
            tested: total(Total::Tests),
            infected: total(Total::Confirmed),
            healed: total(Total::Healed),
            dead: total(Total::Dead),
            hospitalized: total(Total::Hospitalized),
            intensive_care: total(Total::IntensiveCare),
        },
        precincts: locations(metrics, Scope::Bezirk),
        states: locations(metrics, Scope::Province),
        countries: locations(metrics, Scope::World),
    }
}

/// One entry per infected metric of `scope`, in insertion order.
fn locations(metrics: &MetricSet, scope: Scope) -> Vec<LocationSummary> {
    let key = scope.location_key();
    metrics
        .of_kind(MetricKind::Scoped(scope, Measure::Infected))
        .filter_map(|infected| {
            let location = infected.tag(key)?;
            let measure = |measure: Measure| {
                metrics
                    .find_tagged(MetricKind::Scoped(scope, measure), key, location)
                    .map(Metric::value)
            };
            Some(LocationSummary {
                location: location.to_string(),
                infected: infected.value() as u64,
                deaths: measure(Measure::Death).map_or(0, |v| v as u64),
                fatality_rate: measure(Measure::FatalityRate),
                infection_rate: measure(Measure::InfectionRate),
                infected_per_100k: measure(Measure::InfectedPer100k),
                latitude: infected.tag(TagKey::Latitude).map(str::to_string),
                longitude: infected.tag(TagKey::Longitude).map(str::to_string),
            })
        })
        .collect()
}
