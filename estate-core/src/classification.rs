//! Accounting classification attached to a transaction by the rule engine.

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Closed set of account types a transaction can land in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
    #[serde(rename = "fixed-asset")]
    FixedAsset,
    #[serde(rename = "liability")]
    Liability,
}

impl AccountType {
    /// True for the two types that flow through the profit and loss account
    pub fn is_profit_and_loss(&self) -> bool {
        matches!(self, AccountType::Income | AccountType::Expense)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Income => "Income",
            AccountType::Expense => "Expense",
            AccountType::FixedAsset => "Fixed Asset",
            AccountType::Liability => "Liability",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub property: String,
    pub account_type: AccountType,
    /// Statutory category label
    pub category: String,
    /// Only present for income
    pub income_subtype: Option<String>,
}

/// A transaction together with its write-once classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    pub transaction: Transaction,
    pub classification: Classification,
}

impl ClassifiedTransaction {
    pub fn new(transaction: Transaction, classification: Classification) -> Self {
        Self {
            transaction,
            classification,
        }
    }

    pub fn account_type(&self) -> AccountType {
        self.classification.account_type
    }

    pub fn category(&self) -> &str {
        &self.classification.category
    }

    pub fn property(&self) -> &str {
        &self.classification.property
    }
}
