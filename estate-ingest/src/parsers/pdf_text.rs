//! Statement parser for text already extracted from PDF pages.
//!
//! Expected text after PDF-to-text:
//!   Your statement From 01/07/2022 to 30/06/2023
//!   15 Aug   Rent Flat 2 J Tenant                        £850.00
//!   3 Feb    British Gas refund of £12.00 applied       -£64.20
//!
//! Rows only carry day and month. The year comes from the statement period
//! header: July to December belong to the header year, January to June to
//! the year after.

use std::str::FromStr;

use chrono::NaiveDate;
use estate_core::{Diagnostic, Provenance, Source, Transaction};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{IngestError, Ingested};

/// First month (inclusive) that still belongs to the statement's base year
const FISCAL_BOUNDARY_MONTH: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Base year used when no `From DD/MM/YYYY` header is present
    pub default_year: i32,
    /// Lines containing any of these (case-insensitive) are not transactions
    pub skip_phrases: Vec<String>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            default_year: 2024,
            skip_phrases: [
                "BALANCE BROUGHT FORWARD",
                "BALANCE CARRIED FORWARD",
                "OPENING BALANCE",
                "CLOSING BALANCE",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Year of a `month` row on a statement whose period starts in `base_year`.
pub fn infer_year(base_year: i32, month: u32) -> i32 {
    if month >= FISCAL_BOUNDARY_MONTH {
        base_year
    } else {
        base_year + 1
    }
}

fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[derive(Debug, Clone)]
pub struct PdfStatementParser {
    config: PdfConfig,
    period_re: Regex,
    line_re: Regex,
    amount_re: Regex,
}

impl PdfStatementParser {
    pub fn new(config: PdfConfig) -> Result<Self, IngestError> {
        let period_re = Regex::new(r"From\s+(?P<day>\d{1,2})/(?P<month>\d{1,2})/(?P<year>\d{4})")?;
        let line_re = Regex::new(concat!(
            r"^\s*(?P<day>\d{1,2})\s+",
            r"(?i:(?P<month>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?",
            r"|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?)\s+",
            r"(?P<rest>.+?)\s*$"
        ))?;
        // Rightmost match on a line is the amount; earlier ones belong to the description.
        let amount_re = Regex::new(r"(?P<sign>-\s?)?£(?P<value>(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})\b")?;

        Ok(Self {
            config,
            period_re,
            line_re,
            amount_re,
        })
    }

    /// Year captured from the first `From DD/MM/YYYY` header, if any
    pub fn base_year(&self, text: &str) -> Option<i32> {
        let caps = self.period_re.captures(text)?;
        caps["year"].parse().ok()
    }

    /// Parse every page of one statement. Never fails: bad lines are skipped
    /// and reported as diagnostics.
    pub fn parse_pages<S: AsRef<str>>(&self, file: &str, pages: &[S]) -> Ingested {
        let full_text = pages.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n");
        let mut out = Ingested::default();

        let mut provenance = Provenance::new(file);
        let base_year = match self.base_year(&full_text) {
            Some(year) => year,
            None => {
                let year = self.config.default_year;
                warn!(file, year, "no statement period header, using default year");
                out.diagnostics.push(Diagnostic::AmbiguousYearFallback {
                    file: file.to_string(),
                    year,
                });
                provenance.assumed_year = Some(year);
                year
            }
        };

        for (page_idx, page) in pages.iter().enumerate() {
            let page_no = page_idx + 1;
            for (idx, line) in page.as_ref().lines().enumerate() {
                if let Some(txn) = self.parse_line(file, page_no, idx + 1, line, base_year, &mut out.diagnostics) {
                    out.transactions.push(txn.with_provenance(provenance.clone()));
                }
            }
        }

        if out.transactions.is_empty() {
            info!(file, "no transaction lines found");
            out.diagnostics.push(Diagnostic::PdfExtractionEmpty {
                file: file.to_string(),
            });
        } else {
            info!(file, base_year, transactions = out.transactions.len(), "parsed PDF statement text");
        }

        out
    }

    /// One transaction line, or `None` when the line is not one. Impossible
    /// dates are recorded in `diagnostics`.
    fn parse_line(
        &self,
        file: &str,
        page: usize,
        line_no: usize,
        line: &str,
        base_year: i32,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Transaction> {
        let caps = self.line_re.captures(line)?;
        let rest = &caps["rest"];
        let amount_caps = self.amount_re.captures_iter(rest).last()?;
        if self.is_skipped(rest) {
            debug!(file, page, line = line_no, "skipping balance line");
            return None;
        }

        let month = month_number(&caps["month"])?;
        let day = caps["day"].parse::<u32>().ok()?;
        let year = infer_year(base_year, month);
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            let reason = format!("no such date {} {} {}", day, &caps["month"], year);
            warn!(file, page, line = line_no, %reason, "skipping statement line");
            diagnostics.push(Diagnostic::MalformedLine {
                file: file.to_string(),
                page,
                line: line_no,
                reason,
            });
            return None;
        };

        let value = amount_caps["value"].replace(',', "");
        let mut amount = Decimal::from_str(&value).ok()?;
        if amount_caps.name("sign").is_some() {
            amount = -amount;
        }

        let amount_match = amount_caps.get(0)?;
        let description = rest[..amount_match.start()].trim();
        Some(Transaction::new(date, description, amount, Source::Pdf))
    }

    fn is_skipped(&self, rest: &str) -> bool {
        let upper = rest.to_uppercase();
        self.config
            .skip_phrases
            .iter()
            .any(|p| !p.trim().is_empty() && upper.contains(&p.trim().to_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PdfStatementParser {
        PdfStatementParser::new(PdfConfig::default()).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_infer_year_boundary() {
        assert_eq!(infer_year(2022, 7), 2022);
        assert_eq!(infer_year(2022, 12), 2022);
        assert_eq!(infer_year(2022, 1), 2023);
        assert_eq!(infer_year(2022, 6), 2023);
    }

    #[test]
    fn test_year_inference_from_header() {
        let page = "\
Business Account  From 01/07/2022 to 30/06/2023
15 Aug  Rent Flat 2 J Tenant   £850.00
3 Feb   Octopus Energy   -£64.20
";
        let out = parser().parse_pages("stmt.pdf", &[page]);
        assert_eq!(out.transactions.len(), 2);
        assert!(out.diagnostics.is_empty());

        assert_eq!(out.transactions[0].date, ymd(2022, 8, 15));
        assert_eq!(out.transactions[0].counterparty, "Rent Flat 2 J Tenant");
        assert_eq!(out.transactions[0].amount, Decimal::new(85000, 2));
        assert_eq!(out.transactions[0].source, Source::Pdf);
        assert_eq!(out.transactions[0].provenance.assumed_year, None);

        assert_eq!(out.transactions[1].date, ymd(2023, 2, 3));
        assert_eq!(out.transactions[1].amount, Decimal::new(-6420, 2));
    }

    #[test]
    fn test_impossible_date_skips_only_that_line() {
        let page = "From 01/07/2022\n31 Feb  Broken line  -£10.00\n20 Sep  Screwfix  -£42.10\n";
        let out = parser().parse_pages("stmt.pdf", &[page]);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].date, ymd(2022, 9, 20));
        assert!(matches!(
            &out.diagnostics[..],
            [Diagnostic::MalformedLine { page: 1, line: 2, .. }]
        ));
    }

    #[test]
    fn test_rightmost_amount_wins() {
        let page = "From 01/07/2022\n12 Oct  Refund of £20.00 from deposit  £1,120.50\n";
        let out = parser().parse_pages("stmt.pdf", &[page]);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].amount, Decimal::new(112050, 2));
        assert_eq!(out.transactions[0].counterparty, "Refund of £20.00 from deposit");
    }

    #[test]
    fn test_thousands_separator_and_spaced_sign() {
        let page = "From 01/07/2023\n2 Jan  JMW Solicitors completion - £12,345.67\n";
        let out = parser().parse_pages("stmt.pdf", &[page]);
        assert_eq!(out.transactions[0].amount, Decimal::new(-1234567, 2));
        assert_eq!(out.transactions[0].date, ymd(2024, 1, 2));
        assert_eq!(out.transactions[0].counterparty, "JMW Solicitors completion");
    }

    #[test]
    fn test_missing_header_falls_back_to_default_year() {
        let cfg = PdfConfig {
            default_year: 2021,
            ..PdfConfig::default()
        };
        let out = PdfStatementParser::new(cfg).unwrap().parse_pages("nohdr.pdf", &["9 Nov  Aviva  -£30.00"]);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].date, ymd(2021, 11, 9));
        assert_eq!(out.transactions[0].provenance.assumed_year, Some(2021));
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::AmbiguousYearFallback { file: "nohdr.pdf".into(), year: 2021 }]
        );
    }

    #[test]
    fn test_header_on_later_page_applies_to_all_pages() {
        let pages = ["14 Mar  Council Tax  -£120.00", "Statement period From 06/04/2023 to 05/04/2024"];
        let out = parser().parse_pages("stmt.pdf", &pages);
        assert_eq!(out.transactions[0].date, ymd(2024, 3, 14));
    }

    #[test]
    fn test_no_matches_is_informational() {
        let out = parser().parse_pages("cover.pdf", &["From 01/07/2022\nThank you for banking with us"]);
        assert!(out.transactions.is_empty());
        assert_eq!(out.diagnostics, vec![Diagnostic::PdfExtractionEmpty { file: "cover.pdf".into() }]);
    }

    #[test]
    fn test_balance_lines_and_amountless_lines_ignored() {
        let page = "\
From 01/07/2022
1 Jul  Balance brought forward  £1,000.00
4 Jul  Standing order reference only
5 Jul  Paragon mortgage  -£410.00
";
        let out = parser().parse_pages("stmt.pdf", &[page]);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].counterparty, "Paragon mortgage");
    }

    #[test]
    fn test_bad_line_numbered_within_its_page() {
        let pages = ["From 01/07/2022\n20 Sep  Screwfix  -£42.10", "Page 2\n31 Jun  Broken  -£1.00"];
        let out = parser().parse_pages("stmt.pdf", &pages);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(
            out.diagnostics[0].to_string(),
            "stmt.pdf: skipped page 2 line 2: no such date 31 Jun 2023"
        );
    }

    #[test]
    fn test_words_starting_with_a_month_are_not_dates() {
        let page = "From 01/07/2022\n15 Mayfair Lettings  £50.00\n3 Octopus Energy  -£20.00\n";
        let out = parser().parse_pages("stmt.pdf", &[page]);
        assert!(out.transactions.is_empty());
        assert_eq!(out.diagnostics, vec![Diagnostic::PdfExtractionEmpty { file: "stmt.pdf".into() }]);
    }

    #[test]
    fn test_full_month_names_accepted() {
        let page = "From 01/07/2022\n30 September  Royal Mail  -£2.85\n1 Sept.  Water  -£9.00\n2 June  Aviva  -£3.00\n";
        let out = parser().parse_pages("stmt.pdf", &[page]);
        let dates: Vec<NaiveDate> = out.transactions.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![ymd(2022, 9, 30), ymd(2022, 9, 1), ymd(2023, 6, 2)]);
    }
}
