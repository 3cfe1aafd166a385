// src/population.rs
use serde::Deserialize;
use std::{collections::HashMap, fs::File, io::Read, path::Path};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::table::Granularity;

/// Population (millions) assumed for a region that has no entry.
pub const FALLBACK_POPULATION_MILLIONS: f64 = 1.0;

const BUNDLED: &str = include_str!("../data/population.csv");

#[derive(Debug, Deserialize)]
struct PopulationRecord {
    country: String,
    population: f64,
    parent: String,
}

/// Immutable region → population (millions) lookup, split by parent group so
/// that a name reused across catalogs ("Georgia") resolves per catalog.
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    by_parent: HashMap<String, HashMap<String, f64>>,
}

impl PopulationTable {
    /// Parse a `country,population,parent` CSV.
    pub fn from_reader<R: Read>(source_name: &str, rdr: R) -> Result<Self> {
        let mut by_parent: HashMap<String, HashMap<String, f64>> = HashMap::new();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);
        for record in reader.deserialize::<PopulationRecord>() {
            let record = record.map_err(|err| Error::Csv {
                source_name: source_name.to_string(),
                err,
            })?;
            by_parent
                .entry(record.parent)
                .or_default()
                .insert(record.country, record.population);
        }
        debug!(
            source = source_name,
            groups = by_parent.len(),
            "loaded population table"
        );
        Ok(Self { by_parent })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| Error::Io {
            path: path.display().to_string(),
            err,
        })?;
        Self::from_reader(&path.display().to_string(), file)
    }

    /// The 2020 estimates shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_reader("bundled population.csv", BUNDLED.as_bytes())
    }

    pub fn get(&self, granularity: Granularity, region: &str) -> Option<f64> {
        self.by_parent
            .get(granularity.population_parent())
            .and_then(|m| m.get(region))
            .copied()
    }

    /// Population in millions, or [`FALLBACK_POPULATION_MILLIONS`] with a warning.
    pub fn millions_or_fallback(&self, granularity: Granularity, region: &str) -> f64 {
        match self.get(granularity, region) {
            Some(p) => p,
            None => {
                warn!(
                    region,
                    %granularity,
                    "no population entry, assuming {}m",
                    FALLBACK_POPULATION_MILLIONS
                );
                FALLBACK_POPULATION_MILLIONS
            }
        }
    }
}
