//! Error types shared across the rater.
//!
//! Nothing in scoring, aggregation or caching fails; these errors describe
//! input problems that callers log and recover from.

use thiserror::Error;

/// A present-but-unusable value in an optional numeric or timestamp column.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("malformed value for {field}: {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("non-finite value for {field}")]
    NonFinite { field: &'static str },

    #[error("value for {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("value for {field} is not valid UTF-8: {value:?}")]
    Encoding { field: &'static str, value: String },
}

/// Failure to read one registry export.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}
