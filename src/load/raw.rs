// src/load/raw.rs
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::{debug, trace};

use super::date_parser::parse_header_date;
use crate::error::{Error, Result};

pub const PROVINCE_COLUMN: &str = "Province/State";
pub const COUNTRY_COLUMN: &str = "Country/Region";
pub const LAT_COLUMN: &str = "Lat";
pub const LONG_COLUMN: &str = "Long";

const FIXED_COLUMNS: [&str; 4] = [PROVINCE_COLUMN, COUNTRY_COLUMN, LAT_COLUMN, LONG_COLUMN];

/// One line of the upstream feed, before any grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Empty when the feed leaves the subdivision blank.
    pub province: String,
    pub country: String,
    pub lat: f64,
    pub long: f64,
    pub values: Vec<f64>,
}

/// A feed as published: fixed leading columns, then one column per date.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Ascending, regardless of the column order in the file.
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<RawRow>,
}

/// Parse the text of one time-series CSV.
///
/// The four fixed columns must be present by name; every other column must be an
/// `M/D/YY` date. Empty numeric cells count as zero, anything else unparsable is an error.
#[tracing::instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn parse_raw_table(source_name: &str, text: &str) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(text.as_bytes()));

    let headers = rdr
        .headers()
        .map_err(|err| Error::Csv {
            source_name: source_name.to_string(),
            err,
        })?
        .clone();

    let position = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn {
                source_name: source_name.to_string(),
                column: name.to_string(),
            })
    };
    let fixed = [
        position(PROVINCE_COLUMN)?,
        position(COUNTRY_COLUMN)?,
        position(LAT_COLUMN)?,
        position(LONG_COLUMN)?,
    ];

    // (csv index, date), sorted by date so the table comes out ascending
    let mut date_columns = Vec::with_capacity(headers.len().saturating_sub(FIXED_COLUMNS.len()));
    for (idx, header) in headers.iter().enumerate() {
        if fixed.contains(&idx) {
            continue;
        }
        let date = parse_header_date(header).ok_or_else(|| Error::InvalidDate {
            source_name: source_name.to_string(),
            header: header.to_string(),
        })?;
        date_columns.push((idx, date));
    }
    date_columns.sort_by_key(|(_, d)| *d);
    // `3/1/20` and `03/01/20` name the same day
    if let Some(pair) = date_columns.windows(2).find(|w| w[0].1 == w[1].1) {
        return Err(Error::InvalidDate {
            source_name: source_name.to_string(),
            header: headers.get(pair[1].0).unwrap_or("").to_string(),
        });
    }
    debug!(dates = date_columns.len(), "parsed date headers");

    let mut rows = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|err| Error::Csv {
            source_name: source_name.to_string(),
            err,
        })?;
        let text_at = |idx: usize| record.get(idx).unwrap_or("");
        let number_at = |idx: usize| -> Result<f64> {
            parse_number(text_at(idx)).ok_or_else(|| Error::InvalidNumber {
                source_name: source_name.to_string(),
                row: row_idx + 1,
                column: headers.get(idx).unwrap_or("").to_string(),
                value: text_at(idx).to_string(),
            })
        };

        let values = date_columns
            .iter()
            .map(|(idx, _)| number_at(*idx))
            .collect::<Result<Vec<f64>>>()?;

        rows.push(RawRow {
            province: text_at(fixed[0]).to_string(),
            country: text_at(fixed[1]).to_string(),
            lat: number_at(fixed[2])?,
            long: number_at(fixed[3])?,
            values,
        });
    }
    trace!(rows = rows.len(), "parsed feed rows");

    Ok(RawTable {
        dates: date_columns.into_iter().map(|(_, d)| d).collect(),
        rows,
    })
}

fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim().trim_matches('"');
    if cell.is_empty() {
        return Some(0.0);
    }
    cell.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const FEED: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20
,Germany,51.0,9.0,0,1,4
\"Los Angeles, CA\",US,34.05,-118.24,1,1,2
Washington,US,47.4,-121.49,,2,3
";

    #[test]
    fn parses_fixed_and_date_columns() -> Result<()> {
        let table = parse_raw_table("confirmed", FEED)?;
        assert_eq!(table.dates.len(), 3);
        assert_eq!(table.dates[0], NaiveDate::from_ymd_opt(2020, 1, 22).unwrap());
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].province, "");
        assert_eq!(table.rows[0].country, "Germany");
        assert_eq!(table.rows[1].province, "Los Angeles, CA");
        // empty cell counts as zero
        assert_eq!(table.rows[2].values, vec![0.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn sorts_out_of_order_dates() -> Result<()> {
        let feed = "Province/State,Country/Region,Lat,Long,1/23/20,1/22/20\n,Chad,0,0,5,3\n";
        let table = parse_raw_table("confirmed", feed)?;
        assert!(table.dates[0] < table.dates[1]);
        assert_eq!(table.rows[0].values, vec![3.0, 5.0]);
        Ok(())
    }

    #[test]
    fn missing_fixed_column_fails() {
        let feed = "Province/State,Country,Lat,Long,1/22/20\n,Chad,0,0,1\n";
        let err = parse_raw_table("deaths", feed).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == COUNTRY_COLUMN));
    }

    #[test]
    fn bad_number_fails() {
        let feed = "Province/State,Country/Region,Lat,Long,1/22/20\n,Chad,0,0,n/a\n";
        let err = parse_raw_table("deaths", feed).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { row: 1, .. }));
    }

    #[test]
    fn repeated_date_fails() {
        let feed = "Province/State,Country/Region,Lat,Long,3/1/20,03/01/20\n,Chad,0,0,1,1\n";
        let err = parse_raw_table("deaths", feed).unwrap_err();
        assert!(matches!(err, Error::InvalidDate { .. }));

        let feed = "Province/State,Country/Region,Lat,Long,3/1/20,3/2/20,3/1/20\n,Chad,0,0,1,2,3\n";
        let err = parse_raw_table("deaths", feed).unwrap_err();
        assert!(matches!(err, Error::InvalidDate { ref header, .. } if header == "3/1/20"));
    }

    #[test]
    fn unexpected_header_fails() {
        let feed = "Province/State,Country/Region,Lat,Long,FIPS,1/22/20\n,Chad,0,0,1,1\n";
        let err = parse_raw_table("deaths", feed).unwrap_err();
        assert!(matches!(err, Error::InvalidDate { ref header, .. } if header == "FIPS"));
    }
}
