//! Non-fatal findings raised while ingesting statements or building reports.
//!
//! Diagnostics are data: they travel with the output so a caller can show a
//! data-quality banner. None of them stop processing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warning")]
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    #[error("{file}: skipped row {row}: {reason}")]
    MalformedRow {
        file: String,
        row: usize,
        reason: String,
    },
    #[error("{file}: skipped page {page} line {line}: {reason}")]
    MalformedLine {
        file: String,
        /// 1-based; `line` counts from the top of this page
        page: usize,
        line: usize,
        reason: String,
    },
    #[error("{file}: no transaction lines found")]
    PdfExtractionEmpty { file: String },
    #[error("{file}: no statement period header, assuming base year {year}")]
    AmbiguousYearFallback { file: String, year: i32 },
    #[error("assets {assets} do not equal liabilities {liabilities} plus equity {equity}")]
    ConsistencyMismatch {
        assets: Decimal,
        liabilities: Decimal,
        equity: Decimal,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::PdfExtractionEmpty { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}
