//! estate-ingest: turns CSV exports and extracted PDF statement text into
//! canonical transactions.

pub mod batch;
pub mod parsers;
pub mod types;

pub use batch::{ingest_batch, ingest_one, Batch, StatementInput};
pub use parsers::csv_statement::{canonical_column, StatementReader, COLUMN_ALIASES};
pub use parsers::pdf_text::{infer_year, PdfConfig, PdfStatementParser};
pub use types::{IngestError, Ingested};
