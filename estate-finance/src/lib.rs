//! estate-finance: deterministic accounting classification and ledger reports

pub mod classifier;
pub mod ledger;
pub mod pipeline;

pub use classifier::{classify, classify_batch, tag_property};
pub use ledger::{
    properties, transaction_log, BalanceSheet, Headline, LedgerAggregator, LedgerReport, PnlLine,
    ProfitAndLoss, Scope,
};
pub use pipeline::Pipeline;
