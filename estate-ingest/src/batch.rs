//! Multi-file ingestion: every file is read independently and the results
//! are concatenated. A structural failure in one file never blocks the others.

use std::path::Path;

use estate_core::{Diagnostic, Transaction};
use tracing::warn;

use crate::parsers::csv_statement::StatementReader;
use crate::parsers::pdf_text::PdfStatementParser;
use crate::types::{IngestError, Ingested};

/// Page separator used by `pdftotext` and friends
pub const PAGE_BREAK: char = '\x0c';

/// One uploaded statement, already loaded into memory.
///
/// CSV data stays as raw bytes so an undecodable row is skipped by the reader
/// instead of rejecting the whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementInput {
    Csv { name: String, data: Vec<u8> },
    PdfText { name: String, pages: Vec<String> },
}

impl StatementInput {
    pub fn name(&self) -> &str {
        match self {
            StatementInput::Csv { name, .. } | StatementInput::PdfText { name, .. } => name,
        }
    }

    /// Load a file, choosing the reader by extension: `.csv` is a bank
    /// export, anything else is treated as extracted PDF text with pages
    /// separated by form feeds.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = std::fs::read(path).map_err(|source| IngestError::Io {
            file: name.clone(),
            source,
        })?;

        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Ok(StatementInput::Csv { name, data })
        } else {
            let text = String::from_utf8_lossy(&data);
            let pages = text.split(PAGE_BREAK).map(str::to_string).collect();
            Ok(StatementInput::PdfText { name, pages })
        }
    }
}

/// Read a single statement with the matching reader.
pub fn ingest_one(input: &StatementInput, pdf: &PdfStatementParser) -> Result<Ingested, IngestError> {
    match input {
        StatementInput::Csv { name, data } => StatementReader::new(name.as_str()).read(data.as_slice()),
        StatementInput::PdfText { name, pages } => Ok(pdf.parse_pages(name, pages.as_slice())),
    }
}

/// Concatenated result of ingesting several files
#[derive(Debug, Default)]
pub struct Batch {
    pub transactions: Vec<Transaction>,
    pub diagnostics: Vec<Diagnostic>,
    /// Files that could not be ingested at all
    pub failures: Vec<IngestError>,
}

impl Batch {
    pub fn merge(&mut self, outcome: Result<Ingested, IngestError>) {
        match outcome {
            Ok(ingested) => {
                self.transactions.extend(ingested.transactions);
                self.diagnostics.extend(ingested.diagnostics);
            }
            Err(e) => {
                warn!(error = %e, "statement rejected");
                self.failures.push(e);
            }
        }
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count() + self.failures.len()
    }
}

/// Sequential batch ingestion. Order of the output is the order of `inputs`,
/// though nothing downstream depends on it.
pub fn ingest_batch(inputs: &[StatementInput], pdf: &PdfStatementParser) -> Batch {
    let mut batch = Batch::default();
    for input in inputs {
        batch.merge(ingest_one(input, pdf));
    }
    batch
}
