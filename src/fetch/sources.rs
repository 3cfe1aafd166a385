// src/fetch/sources.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::table::{Granularity, Series};

/// Default upstream folder holding the three time-series files.
pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/";

/// Published file name of one series. The same file feeds both granularities.
pub fn file_name(series: Series) -> &'static str {
    match series {
        Series::Confirmed => "time_series_19-covid-Confirmed.csv",
        Series::Deaths => "time_series_19-covid-Deaths.csv",
        Series::Recovered => "time_series_19-covid-Recovered.csv",
    }
}

/// Identity of a cached wide table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId {
    pub series: Series,
    pub granularity: Granularity,
}

impl SourceId {
    pub fn new(series: Series, granularity: Granularity) -> Self {
        Self {
            series,
            granularity,
        }
    }

    /// The confirmed/deaths/recovered triple of one granularity.
    pub fn bundle(granularity: Granularity) -> [SourceId; 3] {
        Series::ALL.map(|s| SourceId::new(s, granularity))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.granularity, self.series)
    }
}
