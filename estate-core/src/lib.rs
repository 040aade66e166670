//! estate-core: canonical transaction model, classification types, diagnostics
//! and the rule configuration shared by the ingest and finance crates.

pub mod classification;
pub mod diagnostics;
pub mod rules;
pub mod transaction;

pub use classification::{AccountType, Classification, ClassifiedTransaction};
pub use diagnostics::{Diagnostic, Severity};
pub use rules::{ConfigError, IncomeRule, KeywordRule, Labels, PropertyRule, RuleConfig, RULES_VERSION};
pub use transaction::{Provenance, Source, Transaction};
