use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Geographic granularity of a per-location observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    World,
    Province,
    Bezirk,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::World, Scope::Province, Scope::Bezirk];

    /// Tag that carries the location name for this scope.
    pub fn location_key(self) -> TagKey {
        match self {
            Scope::World => TagKey::Country,
            Scope::Province => TagKey::Province,
            Scope::Bezirk => TagKey::Bezirk,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Infected,
    Death,
    FatalityRate,
    InfectionRate,
    InfectedPer100k,
}

impl Measure {
    pub const ALL: [Measure; 5] = [
        Measure::Infected,
        Measure::Death,
        Measure::FatalityRate,
        Measure::InfectionRate,
        Measure::InfectedPer100k,
    ];
}

/// National breakdowns published as (bucket, count) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Breakdown {
    Age,
    Sex,
}

impl Breakdown {
    pub const ALL: [Breakdown; 2] = [Breakdown::Age, Breakdown::Sex];

    pub fn bucket_key(self) -> TagKey {
        match self {
            Breakdown::Age => TagKey::Group,
            Breakdown::Sex => TagKey::Sex,
        }
    }
}

/// Nation-wide totals. These carry no tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Total {
    Confirmed,
    Tests,
    Healed,
    Dead,
    Hospitalized,
    IntensiveCare,
}

impl Total {
    pub const ALL: [Total; 6] = [
        Total::Confirmed,
        Total::Tests,
        Total::Healed,
        Total::Dead,
        Total::Hospitalized,
        Total::IntensiveCare,
    ];
}

/// Every metric the exporter can emit. The wire name only exists at the
/// exposition boundary, see [`MetricKind::name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Scoped(Scope, Measure),
    Breakdown(Breakdown),
    Total(Total),
}

impl MetricKind {
    pub fn all() -> Vec<MetricKind> {
        let mut kinds = Vec::new();
        for scope in Scope::ALL {
            kinds.extend(Measure::ALL.map(|m| MetricKind::Scoped(scope, m)));
        }
        kinds.extend(Breakdown::ALL.map(MetricKind::Breakdown));
        kinds.extend(Total::ALL.map(MetricKind::Total));
        kinds
    }

    pub fn name(self) -> &'static str {
        use Measure::*;
        match self {
            MetricKind::Scoped(Scope::World, Infected) => "cov19_world_infected",
            MetricKind::Scoped(Scope::World, Death) => "cov19_world_death",
            MetricKind::Scoped(Scope::World, FatalityRate) => "cov19_world_fatality_rate",
            MetricKind::Scoped(Scope::World, InfectionRate) => "cov19_world_infection_rate",
            MetricKind::Scoped(Scope::World, InfectedPer100k) => "cov19_world_infected_per_100k",
            MetricKind::Scoped(Scope::Province, Infected) => "cov19_detail_infected",
            MetricKind::Scoped(Scope::Province, Death) => "cov19_detail_death",
            MetricKind::Scoped(Scope::Province, FatalityRate) => "cov19_detail_fatality_rate",
            MetricKind::Scoped(Scope::Province, InfectionRate) => "cov19_detail_infection_rate",
            MetricKind::Scoped(Scope::Province, InfectedPer100k) => "cov19_detail_infected_per_100k",
            MetricKind::Scoped(Scope::Bezirk, Infected) => "cov19_bezirk_infected",
            MetricKind::Scoped(Scope::Bezirk, Death) => "cov19_bezirk_death",
            MetricKind::Scoped(Scope::Bezirk, FatalityRate) => "cov19_bezirk_fatality_rate",
            MetricKind::Scoped(Scope::Bezirk, InfectionRate) => "cov19_bezirk_infection_rate",
            MetricKind::Scoped(Scope::Bezirk, InfectedPer100k) => "cov19_bezirk_infected_per_100k",
            MetricKind::Breakdown(Breakdown::Age) => "cov19_age_distribution",
            MetricKind::Breakdown(Breakdown::Sex) => "cov19_sex_distribution",
            MetricKind::Total(Total::Confirmed) => "cov19_confirmed",
            MetricKind::Total(Total::Tests) => "cov19_tests",
            MetricKind::Total(Total::Healed) => "cov19_healed",
            MetricKind::Total(Total::Dead) => "cov19_dead",
            MetricKind::Total(Total::Hospitalized) => "cov19_hospitalized",
            MetricKind::Total(Total::IntensiveCare) => "cov19_intensive_care",
        }
    }

    /// Tag naming the location a metric of this kind belongs to.
    /// Totals have none.
    pub fn location_key(self) -> Option<TagKey> {
        match self {
            MetricKind::Scoped(scope, _) => Some(scope.location_key()),
            MetricKind::Breakdown(_) => Some(TagKey::Country),
            MetricKind::Total(_) => None,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown metric name: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for MetricKind {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::all()
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

impl TryFrom<String> for MetricKind {
    type Error = UnknownMetric;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl<'de> serde::Deserialize<'de> for MetricKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        MetricKind::try_from(name).map_err(serde::de::Error::custom)
    }
}

/// The closed set of tag keys. Declaration order is rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKey {
    Bezirk,
    Province,
    Country,
    Continent,
    Group,
    Sex,
    Latitude,
    Longitude,
}

impl TagKey {
    pub fn as_str(self) -> &'static str {
        match self {
            TagKey::Bezirk => "bezirk",
            TagKey::Province => "province",
            TagKey::Country => "country",
            TagKey::Continent => "continent",
            TagKey::Group => "group",
            TagKey::Sex => "sex",
            TagKey::Latitude => "latitude",
            TagKey::Longitude => "longitude",
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One per-location observation as published upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStat {
    pub location: String,
    pub infected: u64,
    pub deaths: u64,
    pub dimensions: Vec<(TagKey, String)>,
}

impl RawStat {
    pub fn new(location: impl Into<String>, infected: u64, deaths: u64) -> Self {
        Self {
            location: location.into(),
            infected,
            deaths,
            dimensions: Vec::new(),
        }
    }

    pub fn with_dimension(mut self, key: TagKey, value: impl Into<String>) -> Self {
        self.dimensions.push((key, value.into()));
        self
    }
}

/// A row handed over by a scrape source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    Location { scope: Scope, stat: RawStat },
    Breakdown {
        kind: Breakdown,
        country: String,
        bucket: String,
        count: u64,
    },
    Total { kind: Total, value: u64 },
}

/// Reference facts for a normalized location. A population of 0 means unknown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationMetadata {
    pub population: u64,
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_parse_back() {
        for kind in MetricKind::all() {
            assert_eq!(kind.name().parse::<MetricKind>().unwrap(), kind);
        }
        assert!("cov19_nonsense".parse::<MetricKind>().is_err());
    }

    #[test]
    fn metric_names_are_unique() {
        let mut names: Vec<_> = MetricKind::all().into_iter().map(MetricKind::name).collect();
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count);
    }

    #[test]
    fn totals_have_no_location_key() {
        assert_eq!(MetricKind::Total(Total::Confirmed).location_key(), None);
        assert_eq!(
            MetricKind::Scoped(Scope::Province, Measure::Infected).location_key(),
            Some(TagKey::Province)
        );
    }
}
