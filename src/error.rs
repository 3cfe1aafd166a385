// src/error.rs

use thiserror::Error;

/// Failures that abort a render.
#[derive(Debug, Error)]
pub enum Error {
    #[error("fetching {source_name}: {message}")]
    SourceFetch { source_name: String, message: String },

    #[error("{source_name}: missing column `{column}`")]
    MissingColumn { source_name: String, column: String },

    #[error("{source_name}: date header `{header}` is not M/D/YY")]
    InvalidDate { source_name: String, header: String },

    #[error("{source_name}: row {row}, column `{column}`: `{value}` is not a number")]
    InvalidNumber {
        source_name: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{0} and {1} do not share the same date columns")]
    MisalignedSeries(String, String),

    #[error("{source_name}: {err}")]
    Csv {
        source_name: String,
        #[source]
        err: csv::Error,
    },

    #[error("no view named `{0}`")]
    UnknownView(String),

    #[error("parsing config {path}: {err}")]
    Config {
        path: String,
        #[source]
        err: serde_yaml::Error,
    },

    #[error("reading {path}: {err}")]
    Io {
        path: String,
        #[source]
        err: std::io::Error,
    },
}

impl Error {
    /// True for every variant that stems from the upstream feeds
    /// (network or schema), as opposed to local setup.
    pub fn is_data_fetch(&self) -> bool {
        !matches!(
            self,
            Error::Io { .. } | Error::Config { .. } | Error::UnknownView(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
