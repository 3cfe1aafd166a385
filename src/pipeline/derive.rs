// src/pipeline/derive.rs
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::population::PopulationTable;
use crate::table::{CaseRow, FatalityRow, Granularity, LongRow, Per100kRow};

fn index_by_key(rows: &[LongRow]) -> HashMap<(&str, NaiveDate), f64> {
    rows.iter()
        .map(|r| ((r.region.as_str(), r.date), r.value))
        .collect()
}

/// Inner join of the three melted series on (region, date), deriving
/// `active = confirmed - deaths - recovered`. Row order follows `confirmed`.
pub fn join_cases(confirmed: &[LongRow], deaths: &[LongRow], recovered: &[LongRow]) -> Vec<CaseRow> {
    let deaths = index_by_key(deaths);
    let recovered = index_by_key(recovered);
    confirmed
        .iter()
        .filter_map(|c| {
            let key = (c.region.as_str(), c.date);
            let d = *deaths.get(&key)?;
            let r = *recovered.get(&key)?;
            Some(CaseRow {
                date: c.date,
                region: c.region.clone(),
                confirmed: c.value,
                deaths: d,
                recovered: r,
                active: c.value - d - r,
            })
        })
        .collect()
}

/// `deaths / confirmed * 100` per (region, date). Zero confirmed yields NaN
/// or infinity, which is passed through untouched.
pub fn fatality_rate(confirmed: &[LongRow], deaths: &[LongRow]) -> Vec<FatalityRow> {
    let deaths = index_by_key(deaths);
    confirmed
        .iter()
        .filter_map(|c| {
            let d = *deaths.get(&(c.region.as_str(), c.date))?;
            Some(FatalityRow {
                date: c.date,
                region: c.region.clone(),
                frate: d / c.value * 100.0,
                deaths: d,
                confirmed: c.value,
            })
        })
        .collect()
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

/// Cases per 100k inhabitants on the latest date present in `confirmed`.
///
/// Sorted descending; equal values keep their input order. Regions without a
/// population entry are computed against one million.
pub fn per_100k(
    confirmed: &[LongRow],
    population: &PopulationTable,
    granularity: Granularity,
) -> Vec<Per100kRow> {
    let Some(latest) = confirmed.iter().map(|r| r.date).max() else {
        return Vec::new();
    };

    let mut out: Vec<Per100kRow> = confirmed
        .iter()
        .filter(|r| r.date == latest)
        .map(|r| {
            let inhabitants = population.millions_or_fallback(granularity, &r.region);
            Per100kRow {
                region: r.region.clone(),
                inhabitants,
                per100k: r.value / (inhabitants * 1_000_000.0) * 100_000.0,
                total_cases: r.value.round(),
            }
        })
        .collect();

    // stable: ties keep source order
    out.sort_by(|a, b| b.per100k.total_cmp(&a.per100k));
    for row in &mut out {
        row.per100k = round_to(row.per100k, 2);
    }
    out
}
