use crate::normalize::normalize;
use crate::types::LocationMetadata;
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Read-only reference table keyed by normalized location name.
///
/// Built once at startup and shared between requests; nothing mutates it
/// afterwards.
#[derive(Debug, Default, Clone)]
pub struct MetadataTable {
    entries: HashMap<String, LocationMetadata>,
}

impl MetadataTable {
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut table = MetadataTable::default();
        for path in paths {
            let added = table.load_csv(path)?;
            info!("Loaded {} metadata entries from {:?}", added, path);
        }
        Ok(table)
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, LocationMetadata)>,
        S: AsRef<str>,
    {
        let mut table = MetadataTable::default();
        for (name, data) in entries {
            table.insert(name.as_ref(), data);
        }
        table
    }

    /// Exact match on an already normalized name. Absence is a normal outcome.
    pub fn resolve(&self, normalized_location: &str) -> Option<&LocationMetadata> {
        self.entries.get(normalized_location)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: &str, data: LocationMetadata) -> bool {
        let key = normalize(name);
        if key.is_empty() {
            return false;
        }
        if self.entries.contains_key(&key) {
            warn!("Duplicate metadata entry for '{}', keeping the first one", key);
            return false;
        }
        self.entries.insert(key, data);
        true
    }

    fn load_csv(&mut self, path: &Path) -> Result<usize> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open metadata file: {:?}", path))?;
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let headers = rdr.headers()?.clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow!("Column '{}' not found in {:?}", name, path))
        };
        let name_idx = column("name")?;
        let population_idx = column("population")?;
        let lat_idx = column("latitude")?;
        let long_idx = column("longitude")?;

        let mut added = 0;
        for (line, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("Malformed record in {:?}", path))?;
            let name = record.get(name_idx).unwrap_or("");

            let population = match record.get(population_idx).unwrap_or("") {
                "" => 0,
                raw => raw.parse::<u64>().with_context(|| {
                    format!("Invalid population '{}' on line {} of {:?}", raw, line + 2, path)
                })?,
            };
            let coordinate = |idx: usize| -> Result<f64> {
                let raw = record.get(idx).unwrap_or("");
                raw.parse::<f64>().with_context(|| {
                    format!("Invalid coordinate '{}' on line {} of {:?}", raw, line + 2, path)
                })
            };

            let data = LocationMetadata {
                population,
                latitude: coordinate(lat_idx)?,
                longitude: coordinate(long_idx)?,
            };
            if self.insert(name, data) {
                added += 1;
            }
        }

        Ok(added)
    }
}
