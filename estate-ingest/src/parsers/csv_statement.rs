//! Bank CSV export reader (Starling / NatWest style).
//!
//! Expected header (any order, extra columns ignored):
//!   Date,Counter Party,Reference,Type,Amount (GBP),Balance (GBP),Spending Category,Notes
//!
//! Dates are day-first (`15/08/2022`). Rows that cannot be read are skipped
//! with a `MalformedRow` diagnostic; a file without a date or amount column
//! is rejected as a whole.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use estate_core::{Diagnostic, Provenance, Source, Transaction};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::types::{IngestError, Ingested};

pub const DATE: &str = "Date";
pub const AMOUNT: &str = "Amount";
pub const COUNTER_PARTY: &str = "Counter Party";
pub const REFERENCE: &str = "Reference";
pub const NOTES: &str = "Notes";
pub const CATEGORY: &str = "Category";
pub const BALANCE: &str = "Balance";

/// Alternate header -> canonical header.
pub const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("Amount (GBP)", AMOUNT),
    ("Spending Category", CATEGORY),
    ("Balance (GBP)", BALANCE),
    ("Counterparty", COUNTER_PARTY),
    ("Transaction Date", DATE),
];

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Map a raw header onto its canonical name. Unknown headers come back trimmed
/// but otherwise untouched.
pub fn canonical_column(header: &str) -> &str {
    let header = header.trim();
    for (alias, canonical) in COLUMN_ALIASES {
        if header.eq_ignore_ascii_case(alias) {
            return canonical;
        }
    }
    for canonical in [DATE, AMOUNT, COUNTER_PARTY, REFERENCE, NOTES, CATEGORY, BALANCE] {
        if header.eq_ignore_ascii_case(canonical) {
            return canonical;
        }
    }
    header
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    amount: usize,
    counterparty: Option<usize>,
    reference: Option<usize>,
    notes: Option<usize>,
    category: Option<usize>,
    balance: Option<usize>,
}

impl Columns {
    fn resolve(file: &str, headers: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| headers.iter().position(|h| canonical_column(h) == name);
        let required = |field: &'static str| {
            find(field).ok_or_else(|| IngestError::UnrecognizedColumnShape {
                file: file.to_string(),
                field,
            })
        };

        Ok(Self {
            date: required(DATE)?,
            amount: required(AMOUNT)?,
            counterparty: find(COUNTER_PARTY),
            reference: find(REFERENCE),
            notes: find(NOTES),
            category: find(CATEGORY),
            balance: find(BALANCE),
        })
    }
}

/// Parse `-1,234.50`, `£12.00` or `- £3.10` into a two-place decimal.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '£' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok().map(|d| d.round_dp(2))
}

fn optional(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads one CSV export into canonical transactions tagged `Source::Csv`.
#[derive(Debug, Clone)]
pub struct StatementReader {
    file: String,
}

impl StatementReader {
    /// `file` is the label used in diagnostics and provenance
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }

    pub fn read_path(path: impl AsRef<Path>) -> Result<Ingested, IngestError> {
        let path = path.as_ref();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
            file: label.clone(),
            source,
        })?;
        StatementReader::new(label).read(file)
    }

    pub fn read<R: Read>(&self, input: R) -> Result<Ingested, IngestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = rdr.headers().map_err(|source| self.csv_error(source))?.clone();
        let columns = Columns::resolve(&self.file, &headers)?;

        let mut out = Ingested::default();

        for (idx, result) in rdr.records().enumerate() {
            // header is row 1
            let row = idx + 2;
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    self.skip(&mut out, row, format!("unreadable row: {e}"));
                    continue;
                }
            };

            if record.iter().all(|field| field.trim().is_empty()) {
                debug!(file = %self.file, row, "blank row");
                continue;
            }

            match self.parse_row(&record, columns) {
                Ok(txn) => out.transactions.push(txn),
                Err(reason) => self.skip(&mut out, row, reason),
            }
        }

        info!(
            file = %self.file,
            transactions = out.transactions.len(),
            skipped = out.diagnostics.len(),
            "read CSV statement"
        );
        Ok(out)
    }

    fn parse_row(&self, record: &StringRecord, columns: Columns) -> Result<Transaction, String> {
        let date_raw = record.get(columns.date).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(date_raw, DATE_FORMAT)
            .map_err(|_| format!("unparseable date `{date_raw}`"))?;

        let amount_raw = record.get(columns.amount).unwrap_or("").trim();
        let amount = parse_amount(amount_raw).ok_or_else(|| format!("unparseable amount `{amount_raw}`"))?;

        let counterparty = optional(record, columns.counterparty).unwrap_or_default();
        let mut txn = Transaction::new(date, counterparty, amount, Source::Csv)
            .with_provenance(Provenance::new(&self.file));
        txn.reference = optional(record, columns.reference);
        txn.notes = optional(record, columns.notes);
        txn.bank_category = optional(record, columns.category);
        txn.balance = optional(record, columns.balance).and_then(|b| parse_amount(&b));

        Ok(txn)
    }

    fn skip(&self, out: &mut Ingested, row: usize, reason: String) {
        warn!(file = %self.file, row, %reason, "skipping malformed row");
        out.diagnostics.push(Diagnostic::MalformedRow {
            file: self.file.clone(),
            row,
            reason,
        });
    }

    fn csv_error(&self, source: csv::Error) -> IngestError {
        IngestError::Csv {
            file: self.file.clone(),
            source,
        }
    }
}
