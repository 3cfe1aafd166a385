// src/export/arrow.rs

use arrow::{
    array::{ArrayRef, Date32Array, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema as ArrowSchema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::table::{CaseRow, DeltaRow, FatalityRow, LongRow, Per100kRow};

/// An output row type with a fixed Arrow layout.
pub trait ArrowRow: Sized {
    fn schema() -> ArrowSchema;
    /// One array per schema field, in schema order.
    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef>;
}

pub fn to_record_batch<R: ArrowRow>(rows: &[R]) -> Result<RecordBatch, ArrowError> {
    RecordBatch::try_new(Arc::new(R::schema()), R::to_arrays(rows))
}

fn days_since_epoch(d: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (d - epoch).num_days() as i32
}

fn date_field() -> Field {
    Field::new("date", DataType::Date32, false)
}
fn region_field() -> Field {
    Field::new("region", DataType::Utf8, false)
}
fn value_field(name: &str) -> Field {
    Field::new(name, DataType::Float64, false)
}

fn dates<R>(rows: &[R], f: impl Fn(&R) -> NaiveDate) -> ArrayRef {
    Arc::new(Date32Array::from_iter_values(
        rows.iter().map(|r| days_since_epoch(f(r))),
    ))
}
fn strings<R>(rows: &[R], f: impl Fn(&R) -> &str) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
}
fn floats<R>(rows: &[R], f: impl Fn(&R) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(rows.iter().map(f)))
}

impl ArrowRow for LongRow {
    fn schema() -> ArrowSchema {
        ArrowSchema::new(vec![date_field(), region_field(), value_field("value")])
    }

    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            dates(rows, |r| r.date),
            strings(rows, |r| r.region.as_str()),
            floats(rows, |r| r.value),
        ]
    }
}

impl ArrowRow for FatalityRow {
    fn schema() -> ArrowSchema {
        ArrowSchema::new(vec![
            date_field(),
            region_field(),
            value_field("frate"),
            value_field("deaths"),
            value_field("confirmed"),
        ])
    }

    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            dates(rows, |r| r.date),
            strings(rows, |r| r.region.as_str()),
            floats(rows, |r| r.frate),
            floats(rows, |r| r.deaths),
            floats(rows, |r| r.confirmed),
        ]
    }
}

impl ArrowRow for Per100kRow {
    fn schema() -> ArrowSchema {
        ArrowSchema::new(vec![
            region_field(),
            value_field("inhabitants"),
            value_field("per100k"),
            value_field("total_cases"),
        ])
    }

    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            strings(rows, |r| r.region.as_str()),
            floats(rows, |r| r.inhabitants),
            floats(rows, |r| r.per100k),
            floats(rows, |r| r.total_cases),
        ]
    }
}

impl ArrowRow for CaseRow {
    fn schema() -> ArrowSchema {
        ArrowSchema::new(vec![
            date_field(),
            region_field(),
            value_field("confirmed"),
            value_field("deaths"),
            value_field("recovered"),
            value_field("active"),
        ])
    }

    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            dates(rows, |r| r.date),
            strings(rows, |r| r.region.as_str()),
            floats(rows, |r| r.confirmed),
            floats(rows, |r| r.deaths),
            floats(rows, |r| r.recovered),
            floats(rows, |r| r.active),
        ]
    }
}

impl ArrowRow for DeltaRow {
    fn schema() -> ArrowSchema {
        ArrowSchema::new(vec![date_field(), region_field(), value_field("active")])
    }

    fn to_arrays(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            dates(rows, |r| r.date),
            strings(rows, |r| r.region.as_str()),
            floats(rows, |r| r.active),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use arrow::array::Array;

    #[test]
    fn fatality_batch_keeps_non_finite_values() -> Result<()> {
        let d = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let rows = vec![FatalityRow {
            date: d,
            region: "A".into(),
            frate: f64::NAN,
            deaths: 0.0,
            confirmed: 0.0,
        }];
        let batch = to_record_batch(&rows)?;
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 5);

        let frate = batch
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("frate is Float64");
        assert!(frate.value(0).is_nan());
        assert_eq!(frate.null_count(), 0);

        let date = batch
            .column(0)
            .as_any()
            .downcast_ref::<Date32Array>()
            .expect("date is Date32");
        assert_eq!(date.value(0), 18322);
        Ok(())
    }

    #[test]
    fn melted_rows_use_a_series_neutral_column() -> Result<()> {
        let rows = vec![LongRow {
            date: NaiveDate::from_ymd_opt(2020, 3, 2).unwrap(),
            region: "A".into(),
            value: 3.0,
        }];
        let batch = to_record_batch(&rows)?;
        let names: Vec<_> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, vec!["date", "region", "value"]);
        Ok(())
    }

    #[test]
    fn empty_rows_build_an_empty_batch() -> Result<()> {
        let batch = to_record_batch::<DeltaRow>(&[])?;
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.schema().field(2).name(), "active");
        Ok(())
    }
}
