//! Ingest -> classify -> aggregate over one uploaded batch.
//!
//! Every run recomputes from scratch; nothing is carried between runs.

use estate_core::{ClassifiedTransaction, Diagnostic, RuleConfig};
use estate_ingest::{Batch, IngestError};
use tracing::info;

use crate::classifier::classify_batch;
use crate::ledger::{transaction_log, LedgerAggregator, LedgerReport, Scope};

#[derive(Debug)]
pub struct Pipeline {
    pub classified: Vec<ClassifiedTransaction>,
    /// Reader diagnostics (skipped rows, year fallbacks, empty extractions)
    pub diagnostics: Vec<Diagnostic>,
    /// Files rejected outright
    pub failures: Vec<IngestError>,
    aggregator: LedgerAggregator,
}

impl Pipeline {
    pub fn from_batch(batch: Batch, rules: &RuleConfig) -> Self {
        let Batch {
            transactions,
            diagnostics,
            failures,
        } = batch;

        let classified = classify_batch(transactions, rules);
        info!(
            transactions = classified.len(),
            diagnostics = diagnostics.len(),
            failures = failures.len(),
            "classified batch"
        );

        Self {
            classified,
            diagnostics,
            failures,
            aggregator: LedgerAggregator::from_rules(rules),
        }
    }

    pub fn report(&self, scope: &Scope) -> LedgerReport {
        self.aggregator.report(&self.classified, scope)
    }

    pub fn reports_by_property(&self) -> Vec<LedgerReport> {
        self.aggregator.report_by_property(&self.classified)
    }

    pub fn log(&self, scope: &Scope) -> Vec<&ClassifiedTransaction> {
        transaction_log(&self.classified, scope)
    }

    /// Informational findings, e.g. a statement with no transaction lines
    pub fn notices(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| !d.is_warning())
            .map(ToString::to_string)
            .collect()
    }

    /// Warnings raised while reading files, including rejected files
    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| d.is_warning())
            .map(ToString::to_string)
            .chain(self.failures.iter().map(ToString::to_string))
            .collect()
    }
}
