// src/pipeline/framing.rs
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::table::{CaseRow, DeltaRow, FatalityRow, LongRow};

/// Added to every confirmed count on a log axis, where zero is not plottable.
pub const LOG_EPSILON: f64 = 1e-5;

/// Lower bound of the log axis.
pub const LOG_AXIS_FLOOR: f64 = 10.0;

/// Log-scale series only keep dates strictly after this one.
pub fn default_log_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 2, 16).expect("valid literal date")
}

/// Rows keyed by a date, so one cutoff filter serves every output table.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for LongRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for FatalityRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for CaseRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

pub fn after_cutoff<T: Dated>(rows: Vec<T>, cutoff: NaiveDate) -> Vec<T> {
    rows.into_iter().filter(|r| r.date() > cutoff).collect()
}

pub fn add_epsilon(rows: &mut [LongRow], epsilon: f64) {
    for row in rows {
        row.value += epsilon;
    }
}

/// `[floor, max(confirmed)]` for a log-scaled count axis; the upper bound is
/// truncated to an integer and never below the floor.
pub fn log_axis_domain(confirmed: &[LongRow]) -> (f64, f64) {
    let max = confirmed
        .iter()
        .map(|r| r.value)
        .fold(f64::NEG_INFINITY, f64::max);
    (LOG_AXIS_FLOOR, max.trunc().max(LOG_AXIS_FLOOR))
}

/// Daily change of `active` per region, negatives clamped to zero.
///
/// The first date of each region has no predecessor and yields no row. Input
/// order need not be sorted; output is grouped by region (first appearance),
/// ascending by date within a region.
pub fn daily_new_active(cases: &[CaseRow]) -> Vec<DeltaRow> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_region: HashMap<&str, Vec<(NaiveDate, f64)>> = HashMap::new();
    for row in cases {
        by_region
            .entry(row.region.as_str())
            .or_insert_with(|| {
                order.push(row.region.as_str());
                Vec::new()
            })
            .push((row.date, row.active));
    }

    let mut out = Vec::with_capacity(cases.len());
    for region in order {
        let mut series = by_region.remove(region).unwrap_or_default();
        series.sort_by_key(|(d, _)| *d);
        for pair in series.windows(2) {
            let ((_, prev), (date, cur)) = (pair[0], pair[1]);
            out.push(DeltaRow {
                date,
                region: region.to_string(),
                active: (cur - prev).max(0.0),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::day;

    fn cases(region: &str, active: &[f64]) -> Vec<CaseRow> {
        active
            .iter()
            .enumerate()
            .map(|(i, a)| CaseRow {
                date: day(i),
                region: region.to_string(),
                confirmed: *a,
                deaths: 0.0,
                recovered: 0.0,
                active: *a,
            })
            .collect()
    }

    #[test]
    fn increasing_series_is_not_clamped() {
        let deltas = daily_new_active(&cases("A", &[10.0, 19.0, 38.0]));
        let values: Vec<f64> = deltas.iter().map(|d| d.active).collect();
        assert_eq!(values, vec![9.0, 19.0]);
        assert_eq!(deltas[0].date, day(1));
        assert!(values.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn decrease_is_clamped_to_zero() {
        let deltas = daily_new_active(&cases("A", &[5.0, 8.0, 6.0, 7.0]));
        let values: Vec<f64> = deltas.iter().map(|d| d.active).collect();
        assert_eq!(values, vec![3.0, 0.0, 1.0]);
    }

    #[test]
    fn regions_are_differenced_independently() {
        let mut rows = cases("A", &[1.0, 2.0]);
        rows.extend(cases("B", &[100.0, 150.0]));
        let deltas = daily_new_active(&rows);
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].region, "A");
        assert_eq!(deltas[0].active, 1.0);
        assert_eq!(deltas[1].region, "B");
        assert_eq!(deltas[1].active, 50.0);
    }

    #[test]
    fn cutoff_is_exclusive() {
        let cutoff = default_log_cutoff();
        let rows = vec![
            LongRow {
                date: cutoff,
                region: "A".into(),
                value: 0.0,
            },
            LongRow {
                date: cutoff.succ_opt().unwrap(),
                region: "A".into(),
                value: 3.0,
            },
        ];
        let mut kept = after_cutoff(rows, cutoff);
        assert_eq!(kept.len(), 1);

        add_epsilon(&mut kept, LOG_EPSILON);
        assert_eq!(kept[0].value, 3.0 + LOG_EPSILON);
        assert_eq!(log_axis_domain(&kept), (10.0, 10.0));
    }

    #[test]
    fn log_domain_tracks_maximum() {
        let rows = vec![LongRow {
            date: day(0),
            region: "A".into(),
            value: 1234.00001,
        }];
        assert_eq!(log_axis_domain(&rows), (10.0, 1234.0));
    }
}
