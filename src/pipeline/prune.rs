// src/pipeline/prune.rs
use std::sync::Arc;
use tracing::debug;

use crate::table::{SeriesBundle, WideRow, WideTable};

/// Indices of date columns whose confirmed total, over every region of the
/// table, is non-zero. Computed on the whole table so it does not move when
/// the selection changes.
pub fn active_date_columns(confirmed: &WideTable) -> Vec<usize> {
    (0..confirmed.dates.len())
        .filter(|&idx| confirmed.column_sum(idx) != 0.0)
        .collect()
}

/// Copy of `table` restricted to the given date columns.
pub fn keep_date_columns(table: &WideTable, keep: &[usize]) -> WideTable {
    WideTable {
        granularity: table.granularity,
        series: table.series,
        dates: keep.iter().map(|&i| table.dates[i]).collect(),
        rows: table
            .rows
            .iter()
            .map(|r| WideRow {
                name: r.name.clone(),
                lat: r.lat,
                long: r.long,
                values: keep.iter().map(|&i| r.values[i]).collect(),
            })
            .collect(),
    }
}

/// Drop the dates with no confirmed cases anywhere from all three series.
/// The cached bundle is left untouched.
pub fn prune_zero_dates(bundle: &SeriesBundle) -> SeriesBundle {
    let keep = active_date_columns(&bundle.confirmed);
    debug!(
        kept = keep.len(),
        dropped = bundle.confirmed.dates.len() - keep.len(),
        "pruned zero-case dates"
    );
    SeriesBundle {
        confirmed: Arc::new(keep_date_columns(&bundle.confirmed, &keep)),
        deaths: Arc::new(keep_date_columns(&bundle.deaths, &keep)),
        recovered: Arc::new(keep_date_columns(&bundle.recovered, &keep)),
    }
}
