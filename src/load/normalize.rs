// src/load/normalize.rs
use std::collections::HashMap;
use tracing::debug;

use super::raw::{RawRow, RawTable};
use crate::table::{Granularity, Series, WideRow, WideTable};

/// Country used to pick US state rows.
pub const US_COUNTRY: &str = "US";

/// Cruise-ship pseudo regions carry this in their subdivision name.
const CRUISE_SHIP_MARKER: &str = "Princess";

/// City/county rows are written as `"City, ST"`; they double count their state.
fn is_city_level(row: &RawRow) -> bool {
    row.province.contains(',')
}

fn keep_row(row: &RawRow, granularity: Granularity) -> bool {
    if is_city_level(row) {
        return false;
    }
    match granularity {
        Granularity::World => true,
        Granularity::UsState => {
            row.country == US_COUNTRY
                && !row.province.is_empty()
                && !row.province.contains(CRUISE_SHIP_MARKER)
        }
    }
}

fn group_key(row: &RawRow, granularity: Granularity) -> &str {
    match granularity {
        Granularity::World => &row.country,
        Granularity::UsState => &row.province,
    }
}

/// Restrict to top-level rows and sum every date column per country or state.
///
/// Groups appear in order of their first row in the feed. Coordinates of a group are
/// the mean of its members.
pub fn normalize(raw: &RawTable, granularity: Granularity, series: Series) -> WideTable {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<WideRow> = Vec::new();
    let mut members: Vec<usize> = Vec::new();
    let mut dropped = 0usize;

    for row in &raw.rows {
        if !keep_row(row, granularity) {
            dropped += 1;
            continue;
        }
        let key = group_key(row, granularity);
        match index.get(key) {
            Some(&i) => {
                let acc = &mut rows[i];
                for (sum, v) in acc.values.iter_mut().zip(&row.values) {
                    *sum += v;
                }
                acc.lat += row.lat;
                acc.long += row.long;
                members[i] += 1;
            }
            None => {
                index.insert(key, rows.len());
                rows.push(WideRow {
                    name: key.to_string(),
                    lat: row.lat,
                    long: row.long,
                    values: row.values.clone(),
                });
                members.push(1);
            }
        }
    }

    for (row, n) in rows.iter_mut().zip(&members) {
        row.lat /= *n as f64;
        row.long /= *n as f64;
    }

    debug!(
        %granularity,
        %series,
        kept = rows.len(),
        dropped,
        "normalized feed"
    );

    WideTable {
        granularity,
        series,
        dates: raw.dates.clone(),
        rows,
    }
}
