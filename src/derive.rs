//! Turns raw observations into emittable metrics.
//!
//! [`Metric`] can only be built from this module, so every metric that
//! leaves the crate went through the rate and tag rules below.

use crate::types::{Breakdown, LocationMetadata, Measure, MetricKind, RawStat, Scope, TagKey, Total};
use std::collections::BTreeMap;
use tracing::debug;

pub type Tags = BTreeMap<TagKey, String>;

const PER_100K: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    kind: MetricKind,
    tags: Tags,
    value: f64,
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn tag(&self, key: TagKey) -> Option<&str> {
        self.tags.get(&key).map(String::as_str)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value of the tag that identifies where this metric was observed.
    pub fn location(&self) -> Option<&str> {
        self.kind.location_key().and_then(|key| self.tag(key))
    }
}

/// Fixed six fractional digits, the precision of the reference data.
pub fn format_coordinate(value: f64) -> String {
    format!("{:.6}", value)
}

/// Tag set for a per-location observation: the scope's location key, the
/// stat's group dimensions and, when metadata resolved, the coordinates.
pub fn location_tags(scope: Scope, stat: &RawStat, metadata: Option<&LocationMetadata>) -> Tags {
    let location_key = scope.location_key();
    let mut tags: Tags = Tags::new();
    for (key, value) in &stat.dimensions {
        if *key == location_key {
            debug!(
                "Dropping dimension {}={} of '{}', the location takes that key",
                key, value, stat.location
            );
            continue;
        }
        tags.insert(*key, value.clone());
    }
    tags.insert(location_key, stat.location.trim().to_string());
    if let Some(data) = metadata {
        tags.insert(TagKey::Latitude, format_coordinate(data.latitude));
        tags.insert(TagKey::Longitude, format_coordinate(data.longitude));
    }
    tags
}

/// All metrics a single per-location observation yields.
///
/// Never fails: missing deaths or an unresolved location only shrinks the
/// output. The fatality rate additionally requires a known population and
/// at least one infection.
pub fn derive_location(
    scope: Scope,
    stat: &RawStat,
    metadata: Option<&LocationMetadata>,
) -> Vec<Metric> {
    let tags = location_tags(scope, stat, metadata);
    let population = metadata.map_or(0, |data| data.population);
    let scoped = |measure: Measure, value: f64| Metric {
        kind: MetricKind::Scoped(scope, measure),
        tags: tags.clone(),
        value,
    };

    let mut metrics = Vec::with_capacity(5);
    if stat.deaths > 0 {
        metrics.push(scoped(Measure::Death, stat.deaths as f64));
        if population > 0 && stat.infected > 0 {
            metrics.push(scoped(
                Measure::FatalityRate,
                stat.deaths as f64 / stat.infected as f64,
            ));
        }
    }

    metrics.push(scoped(Measure::Infected, stat.infected as f64));

    if population > 0 {
        let rate = stat.infected as f64 / population as f64;
        metrics.push(scoped(Measure::InfectionRate, rate));
        metrics.push(scoped(
            Measure::InfectedPer100k,
            stat.infected as f64 / population as f64 * PER_100K,
        ));
    }

    metrics
}

pub fn derive_breakdown(kind: Breakdown, country: &str, bucket: &str, count: u64) -> Metric {
    let mut tags = Tags::new();
    tags.insert(TagKey::Country, country.to_string());
    tags.insert(kind.bucket_key(), bucket.to_string());
    Metric {
        kind: MetricKind::Breakdown(kind),
        tags,
        value: count as f64,
    }
}

pub fn derive_total(kind: Total, value: u64) -> Metric {
    Metric {
        kind: MetricKind::Total(kind),
        tags: Tags::new(),
        value: value as f64,
    }
}
