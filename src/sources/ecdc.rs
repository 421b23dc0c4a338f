use super::{fetch_text, parse_count, ScrapeError};
use crate::config::EcdcConfig;
use crate::health::HealthCheck;
use crate::html;
use crate::types::{RawRow, RawStat, Scope, TagKey};
use reqwest::Client;
use tracing::debug;

/// Continental case table published by the ECDC.
///
/// Columns are continent, country, cases and deaths; the last row holds the
/// world total and is skipped.
#[derive(Debug, Clone)]
pub struct EcdcSource {
    pub url: String,
    pub health: Vec<HealthCheck>,
}

impl EcdcSource {
    pub fn new(config: &EcdcConfig) -> Self {
        Self {
            url: config.url.clone(),
            health: config.health.clone(),
        }
    }

    pub async fn fetch_rows(&self, client: &Client) -> Result<Vec<RawRow>, ScrapeError> {
        let page = fetch_text(client, &self.url).await?;
        parse_table(&self.url, &page)
    }
}

pub fn parse_table(url: &str, page: &str) -> Result<Vec<RawRow>, ScrapeError> {
    let not_found = |what: &str| ScrapeError::StructureNotFound {
        url: url.to_string(),
        what: what.to_string(),
    };

    let table = html::slice_between_ci(page, "<table", "</table>").ok_or_else(|| not_found("table"))?;
    let body = html::slice_between_ci(table, "<tbody", "</tbody>").unwrap_or(table);
    let rows = html::inner_blocks_ci(body, "tr");
    let Some((_total, rows)) = rows.split_last() else {
        return Err(not_found("table rows"));
    };

    Ok(rows.iter().filter_map(|row| parse_row(row)).collect())
}

fn parse_row(row: &str) -> Option<RawRow> {
    let cells: Vec<String> = html::inner_blocks_ci(row, "td")
        .into_iter()
        .map(|cell| html::text_content(&html::without_blocks_ci(cell, "sup")))
        .collect();
    if cells.len() < 4 {
        debug!("Skipping ECDC row with {} cells", cells.len());
        return None;
    }

    let stat = RawStat::new(cells[1].as_str(), parse_count(&cells[2]), parse_count(&cells[3]))
        .with_dimension(TagKey::Continent, cells[0].as_str());
    Some(RawRow::Location {
        scope: Scope::World,
        stat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body>
        <table class="table">
          <thead><tr><th>Continent</th><th>Country</th><th>Cases</th><th>Deaths</th></tr></thead>
          <tbody>
            <tr><td>Europe</td><td>Austria</td><td>1,018</td><td>3</td></tr>
            <tr><td>Europe</td><td><a href="#">United_Kingdom</a></td><td>2 626</td><td>104</td></tr>
            <tr><td>Asia</td><td>Nepal</td><td>1</td><td></td></tr>
            <tr><td colspan="2">Broken</td></tr>
            <tr><td></td><td>Total</td><td>214,894</td><td>8,732</td></tr>
          </tbody>
        </table>
        </body></html>"##;

    fn stats(rows: Vec<RawRow>) -> Vec<RawStat> {
        rows.into_iter()
            .map(|row| match row {
                RawRow::Location { scope: Scope::World, stat } => stat,
                other => panic!("unexpected row {:?}", other),
            })
            .collect()
    }

    #[test]
    fn parses_rows_and_skips_total() {
        let stats = stats(parse_table("http://ecdc", PAGE).unwrap());
        assert_eq!(stats.len(), 3);

        assert_eq!(
            stats[0],
            RawStat::new("Austria", 1018, 3).with_dimension(TagKey::Continent, "Europe")
        );
        assert_eq!(stats[1].location, "United_Kingdom");
        assert_eq!(stats[1].infected, 2626);
        assert_eq!(stats[1].deaths, 104);
        assert_eq!(stats[2].deaths, 0);
    }

    #[test]
    fn footnote_markers_do_not_leak_into_counts() {
        let page = "<table><tr><td>Europe</td><td>Italy<sup>1</sup></td>\
                    <td>1<sup>2</sup></td><td>35<SUP>*</SUP></td></tr>\
                    <tr><td></td><td>Total</td><td>1</td><td>35</td></tr></table>";
        let stats = stats(parse_table("http://ecdc", page).unwrap());
        assert_eq!(
            stats,
            [RawStat::new("Italy", 1, 35).with_dimension(TagKey::Continent, "Europe")]
        );
    }

    #[test]
    fn missing_table_is_schema_drift() {
        let err = parse_table("http://ecdc", "<html><p>maintenance</p></html>").unwrap_err();
        assert!(err.is_schema_drift());
        assert!(err.to_string().contains("table"));
    }

    #[test]
    fn empty_table_is_schema_drift() {
        let err = parse_table("http://ecdc", "<table><tbody></tbody></table>").unwrap_err();
        assert!(matches!(err, ScrapeError::StructureNotFound { .. }));
    }
}
