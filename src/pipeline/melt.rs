// src/pipeline/melt.rs
use std::collections::HashSet;

use crate::table::{LongRow, WideRow, WideTable};

/// Rows of `table` whose name is in `regions`, in the table's own order.
pub fn select_rows<'a>(table: &'a WideTable, regions: &HashSet<String>) -> Vec<&'a WideRow> {
    table
        .rows
        .iter()
        .filter(|r| regions.contains(&r.name))
        .collect()
}

/// Un-pivot the selected regions into one row per (region, date).
///
/// Output is date-major: every selected region for the first date, then the next date.
pub fn melt(table: &WideTable, regions: &HashSet<String>) -> Vec<LongRow> {
    let rows = select_rows(table, regions);
    let mut out = Vec::with_capacity(rows.len() * table.dates.len());
    for (idx, date) in table.dates.iter().enumerate() {
        for row in &rows {
            out.push(LongRow {
                date: *date,
                region: row.name.clone(),
                value: row.values[idx],
            });
        }
    }
    out
}

/// Melt a single region; empty when the region is unknown.
pub fn melt_region(table: &WideTable, region: &str) -> Vec<LongRow> {
    let regions = HashSet::from([region.to_string()]);
    melt(table, &regions)
}
