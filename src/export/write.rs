// src/export/write.rs
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

use super::arrow::{to_record_batch, ArrowRow};
use crate::view::{Detail, DetailSeries, Overview};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Parquet,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer
        .write(batch)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn write_json<R: Serialize>(rows: &[R], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    // NaN and infinite rates come out as null
    serde_json::to_writer_pretty(&mut out, rows).context("serializing rows")?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Write one output table as `<dir>/<name>.<ext>` and return its path.
pub fn write_table<R: ArrowRow + Serialize>(
    rows: &[R],
    dir: &Path,
    name: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.{}", name, format.extension()));
    match format {
        OutputFormat::Parquet => write_parquet(&to_record_batch(rows)?, &path)?,
        OutputFormat::Csv => write_csv(&to_record_batch(rows)?, &path)?,
        OutputFormat::Json => write_json(rows, &path)?,
    }
    info!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(path)
}

/// Write the cases, fatality-rate and per-100k tables of an overview.
pub fn write_overview(
    overview: &Overview,
    dir: &Path,
    prefix: &str,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    Ok(vec![
        write_table(&overview.cases, dir, &format!("{}_cases", prefix), format)?,
        write_table(&overview.fatality, dir, &format!("{}_fatality", prefix), format)?,
        write_table(&overview.per100k, dir, &format!("{}_per100k", prefix), format)?,
    ])
}

pub fn write_detail(
    detail: &Detail,
    dir: &Path,
    prefix: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    match &detail.series {
        DetailSeries::Cumulative(rows) => {
            write_table(rows, dir, &format!("{}_cumulative", prefix), format)
        }
        DetailSeries::NewCases(rows) => {
            write_table(rows, dir, &format!("{}_new_cases", prefix), format)
        }
    }
}
