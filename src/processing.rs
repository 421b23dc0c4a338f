use crate::data::MetadataTable;
use crate::derive::{derive_breakdown, derive_location, derive_total};
use crate::health::{self, HealthIssue};
use crate::metric_set::MetricSet;
use crate::normalize::normalize;
use crate::sources::{ScrapeError, Source};
use crate::types::RawRow;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Normalizes, joins and derives every row into a fresh metric set.
/// Rows that cannot be joined shrink the output but never abort it.
pub fn process_rows(rows: Vec<RawRow>, metadata: &MetadataTable) -> MetricSet {
    let mut metrics = MetricSet::new();
    let mut unresolved = 0usize;

    for row in rows {
        match row {
            RawRow::Location { scope, stat } => {
                let key = normalize(&stat.location);
                let data = metadata.resolve(&key);
                if data.is_none() {
                    debug!("No metadata for '{}' ({:?})", key, scope);
                    unresolved += 1;
                }
                metrics.extend(derive_location(scope, &stat, data));
            }
            RawRow::Breakdown {
                kind,
                country,
                bucket,
                count,
            } => metrics.append(derive_breakdown(kind, &country, &bucket, count)),
            RawRow::Total { kind, value } => metrics.append(derive_total(kind, value)),
        }
    }

    if unresolved > 0 {
        debug!("{} locations without metadata", unresolved);
    }
    metrics
}

/// Fetch and derive one source.
pub async fn collect(
    source: &Source,
    client: &Client,
    metadata: &MetadataTable,
) -> Result<MetricSet, ScrapeError> {
    let rows = source.fetch_rows(client).await?;
    let row_count = rows.len();
    let metrics = process_rows(rows, metadata);
    info!(
        "Source {}: {} rows -> {} metrics",
        source.name(),
        row_count,
        metrics.len()
    );
    Ok(metrics)
}

/// Health issues of an already collected source. A failed fetch becomes a
/// single issue that names the failure class.
pub fn source_health(source: &Source, collected: &Result<MetricSet, ScrapeError>) -> Vec<HealthIssue> {
    match collected {
        Ok(metrics) => health::validate(source.name(), source.health_checks(), metrics),
        Err(err) => vec![fetch_issue(source, err)],
    }
}

pub fn fetch_issue(source: &Source, err: &ScrapeError) -> HealthIssue {
    HealthIssue::new(source.name(), format!("fetch failed ({}): {}", err.class(), err))
}

/// Runs every source independently; one failing source does not affect
/// the others.
pub async fn check_all(
    sources: &[Source],
    client: &Client,
    metadata: &MetadataTable,
) -> Vec<HealthIssue> {
    let mut issues = Vec::new();
    for source in sources {
        let collected = collect(source, client, metadata).await;
        if let Err(err) = &collected {
            warn!("Source {} failed: {}", source.name(), err);
        }
        issues.extend(source_health(source, &collected));
    }
    issues
}
