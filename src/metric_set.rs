use crate::derive::Metric;
use crate::types::{MetricKind, TagKey};

/// Insertion-ordered metrics of one construction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    metrics: Vec<Metric>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }

    pub fn of_kind(&self, kind: MetricKind) -> impl Iterator<Item = &Metric> + '_ {
        self.metrics.iter().filter(move |m| m.kind() == kind)
    }

    pub fn count(&self, kind: MetricKind) -> usize {
        self.of_kind(kind).count()
    }

    /// First metric of `kind` with a tag whose `key=value` form contains
    /// `tag_fragment`. An empty fragment matches any metric of that kind,
    /// including untagged ones.
    ///
    /// Matching is by substring, so `"province=Wien"` also finds a tag
    /// `province=Wiener Neustadt` if that comes first.
    pub fn find_metric(&self, kind: MetricKind, tag_fragment: &str) -> Option<&Metric> {
        self.of_kind(kind).find(|metric| {
            tag_fragment.is_empty()
                || metric
                    .tags()
                    .iter()
                    .any(|(key, value)| format!("{}={}", key, value).contains(tag_fragment))
        })
    }

    /// First metric of `kind` whose `key` tag equals `value` exactly.
    pub fn find_tagged(&self, kind: MetricKind, key: TagKey, value: &str) -> Option<&Metric> {
        self.of_kind(kind).find(|metric| metric.tag(key) == Some(value))
    }
}

impl Extend<Metric> for MetricSet {
    fn extend<T: IntoIterator<Item = Metric>>(&mut self, iter: T) {
        self.metrics.extend(iter);
    }
}

impl FromIterator<Metric> for MetricSet {
    fn from_iter<T: IntoIterator<Item = Metric>>(iter: T) -> Self {
        Self {
            metrics: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MetricSet {
    type Item = Metric;
    type IntoIter = std::vec::IntoIter<Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.into_iter()
    }
}

impl<'a> IntoIterator for &'a MetricSet {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}
