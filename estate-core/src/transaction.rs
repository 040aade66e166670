//! Canonical transaction record shared by every statement reader.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which reader produced a transaction. Audit only, never used by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "pdf")]
    Pdf,
}

/// Where a transaction came from and what the reader had to assume about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// File label the reader was given (usually the file name)
    pub file: String,
    /// Set when the statement carried no period header and the configured
    /// default year was used to resolve the date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumed_year: Option<i32>,
}

impl Provenance {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            assumed_year: None,
        }
    }
}

/// A single bank movement in GBP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Payee or payer as printed by the bank
    pub counterparty: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// Positive = money in, negative = money out
    pub amount: Decimal,
    /// Running balance after this movement, when the export carries one
    pub balance: Option<Decimal>,
    /// The bank's own spending category (CSV exports only)
    pub bank_category: Option<String>,
    pub source: Source,
    pub provenance: Provenance,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        counterparty: impl Into<String>,
        amount: Decimal,
        source: Source,
    ) -> Self {
        Self {
            date,
            counterparty: counterparty.into(),
            reference: None,
            notes: None,
            amount,
            balance: None,
            bank_category: None,
            source,
            provenance: Provenance::default(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Counterparty, reference and notes joined by single spaces.
    pub fn evidence_text(&self) -> String {
        self.joined(&[&self.reference, &self.notes])
    }

    /// Counterparty and reference only; free-text notes are left out.
    pub fn party_text(&self) -> String {
        self.joined(&[&self.reference])
    }

    fn joined(&self, extra: &[&Option<String>]) -> String {
        let mut text = self.counterparty.trim().to_string();
        for part in extra.iter().copied().flatten() {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(part);
        }
        text
    }

    /// Returns true if money came in
    pub fn is_income(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn abs_amount(&self) -> Decimal {
        self.amount.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 14).unwrap()
    }

    #[test]
    fn test_evidence_text_joins_present_parts() {
        let txn = Transaction::new(date(), " Octopus Energy ", Decimal::new(-4512, 2), Source::Csv)
            .with_reference("DD 1234")
            .with_notes("  ");
        assert_eq!(txn.evidence_text(), "Octopus Energy DD 1234");
    }

    #[test]
    fn test_party_text_leaves_out_notes() {
        let txn = Transaction::new(date(), "Client account", Decimal::new(-900000, 2), Source::Csv)
            .with_reference("Completion")
            .with_notes("JMW to confirm");
        assert_eq!(txn.party_text(), "Client account Completion");
        assert_eq!(txn.evidence_text(), "Client account Completion JMW to confirm");
    }

    #[test]
    fn test_evidence_text_without_counterparty() {
        let txn = Transaction::new(date(), "", Decimal::new(100, 0), Source::Pdf).with_notes("rent flat 2");
        assert_eq!(txn.evidence_text(), "rent flat 2");
    }

    #[test]
    fn test_income_is_strictly_positive() {
        let zero = Transaction::new(date(), "x", Decimal::ZERO, Source::Csv);
        let paid = Transaction::new(date(), "x", Decimal::new(-1, 2), Source::Csv);
        let received = Transaction::new(date(), "x", Decimal::new(1, 2), Source::Csv);
        assert!(!zero.is_income());
        assert!(!paid.is_income());
        assert!(received.is_income());
        assert_eq!(paid.abs_amount(), Decimal::new(1, 2));
    }

    #[test]
    fn test_serializes_source_lowercase() {
        let txn = Transaction::new(date(), "x", Decimal::new(1050, 2), Source::Pdf);
        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["source"], "pdf");
        assert_eq!(json["date"], "2023-03-14");
        assert!(json["provenance"].get("assumed_year").is_none());
    }
}
