// src/table.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which of the three published counts a table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    Confirmed,
    Deaths,
    Recovered,
}

impl Series {
    pub const ALL: [Series; 3] = [Series::Confirmed, Series::Deaths, Series::Recovered];

    pub fn as_str(&self) -> &'static str {
        match self {
            Series::Confirmed => "confirmed",
            Series::Deaths => "deaths",
            Series::Recovered => "recovered",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Country-level or US state-level aggregation. The two catalogs never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    World,
    UsState,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::World => "world",
            Granularity::UsState => "us_state",
        }
    }

    /// Key of the population table's `parent` column for this catalog.
    pub fn population_parent(&self) -> &'static str {
        match self {
            Granularity::World => "World",
            Granularity::UsState => "US",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One region of a wide table: a value per date column.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub name: String,
    pub lat: f64,
    pub long: f64,
    pub values: Vec<f64>,
}

/// Rows = regions, columns = dates (ascending). Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub granularity: Granularity,
    pub series: Series,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    pub fn row(&self, name: &str) -> Option<&WideRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn region_names(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.name.clone()).collect()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Sum of one date column over every row.
    pub fn column_sum(&self, idx: usize) -> f64 {
        self.rows.iter().map(|r| r.values[idx]).sum()
    }
}

/// The three aligned series of one granularity, shared with the cache.
#[derive(Debug, Clone)]
pub struct SeriesBundle {
    pub confirmed: Arc<WideTable>,
    pub deaths: Arc<WideTable>,
    pub recovered: Arc<WideTable>,
}

impl SeriesBundle {
    pub fn granularity(&self) -> Granularity {
        self.confirmed.granularity
    }

    pub fn get(&self, series: Series) -> &WideTable {
        match series {
            Series::Confirmed => self.confirmed.as_ref(),
            Series::Deaths => self.deaths.as_ref(),
            Series::Recovered => self.recovered.as_ref(),
        }
    }
}

/// A melted single series: one row per (region, date).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRow {
    pub date: NaiveDate,
    pub region: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRow {
    pub date: NaiveDate,
    pub region: String,
    pub confirmed: f64,
    pub deaths: f64,
    pub recovered: f64,
    /// `confirmed - deaths - recovered`; may be negative on noisy upstream data.
    pub active: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FatalityRow {
    pub date: NaiveDate,
    pub region: String,
    /// Percent. NaN or infinite when `confirmed` is zero.
    pub frate: f64,
    pub deaths: f64,
    pub confirmed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Per100kRow {
    pub region: String,
    /// Population in millions.
    pub inhabitants: f64,
    pub per100k: f64,
    pub total_cases: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaRow {
    pub date: NaiveDate,
    pub region: String,
    pub active: f64,
}
