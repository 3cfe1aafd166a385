// src/load/mod.rs
pub mod date_parser;
pub mod normalize;
pub mod raw;

pub use date_parser::{format_header_date, parse_header_date};
pub use normalize::normalize;
pub use raw::{parse_raw_table, RawRow, RawTable};

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fetch::sources::SourceId;
use crate::table::{SeriesBundle, WideTable};

/// Parse one fetched CSV body and aggregate it to the source's granularity.
pub fn load_wide_table(source: SourceId, text: &str) -> Result<WideTable> {
    let name = source.to_string();
    let raw = parse_raw_table(&name, text)?;
    Ok(normalize(&raw, source.granularity, source.series))
}

/// Check that the three series share one date axis and assemble them.
pub fn align_bundle(
    confirmed: Arc<WideTable>,
    deaths: Arc<WideTable>,
    recovered: Arc<WideTable>,
) -> Result<SeriesBundle> {
    for other in [&deaths, &recovered] {
        if other.dates != confirmed.dates || other.granularity != confirmed.granularity {
            return Err(Error::MisalignedSeries(
                confirmed.series.to_string(),
                other.series.to_string(),
            ));
        }
    }
    Ok(SeriesBundle {
        confirmed,
        deaths,
        recovered,
    })
}
