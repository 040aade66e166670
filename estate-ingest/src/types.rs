use estate_core::{Diagnostic, Transaction};
use thiserror::Error;

/// Failures that stop ingestion of a single file.
///
/// Everything recoverable is reported as a [`Diagnostic`] instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{file}: required column `{field}` not found")]
    UnrecognizedColumnShape { file: String, field: &'static str },
    #[error("{file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("{file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid statement pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Output of one reader over one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub transactions: Vec<Transaction>,
    pub diagnostics: Vec<Diagnostic>,
}
