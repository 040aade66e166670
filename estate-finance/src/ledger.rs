//! Profit and loss and balance sheet summaries over a classified batch.
//!
//! Aggregation never re-runs classification and never depends on the order
//! of the batch. The accounting identity is checked and, when it does not
//! hold, reported as a diagnostic on the report rather than an error.

use std::collections::{BTreeMap, BTreeSet};

use estate_core::{AccountType, ClassifiedTransaction, Diagnostic, RuleConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which part of the portfolio a report covers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    Portfolio,
    Property(String),
}

impl Scope {
    pub fn includes(&self, txn: &ClassifiedTransaction) -> bool {
        match self {
            Scope::Portfolio => true,
            Scope::Property(id) => txn.property() == id.as_str(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Scope::Portfolio => "Portfolio",
            Scope::Property(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlLine {
    pub account_type: AccountType,
    pub category: String,
    pub amount: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    /// Income lines first, then expenses, each alphabetical by category
    pub lines: Vec<PnlLine>,
    pub total_income: Decimal,
    /// Negative: expenses keep their sign
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub fixed_assets: Decimal,
    /// Net movement of the bank balance over the batch
    pub current_cash: Decimal,
    pub total_assets: Decimal,
    pub liabilities: Decimal,
    pub capital_contributions: Decimal,
    pub retained_earnings: Decimal,
    pub equity: Decimal,
    /// Bank-reported balance on the latest-dated row that carried one.
    /// Informational, not part of the identity.
    pub reported_closing_balance: Option<Decimal>,
    /// Assets == Liabilities + Equity
    pub balanced: bool,
}

/// Summary figures shown above the statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub total_revenue: Decimal,
    pub net_operating_profit: Decimal,
    pub capitalized_assets: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub scope: Scope,
    pub transaction_count: usize,
    pub profit_and_loss: ProfitAndLoss,
    pub balance_sheet: BalanceSheet,
    pub headline: Headline,
    /// Data-quality findings, e.g. a failed consistency check
    pub diagnostics: Vec<Diagnostic>,
}

impl LedgerReport {
    pub fn is_consistent(&self) -> bool {
        self.balance_sheet.balanced
    }
}

/// Builds reports from a classified batch.
#[derive(Debug, Clone)]
pub struct LedgerAggregator {
    capital_contribution_subtype: String,
}

impl LedgerAggregator {
    /// `capital_contribution_subtype` is the income sub-type treated as capital put in by owners
    pub fn new(capital_contribution_subtype: impl Into<String>) -> Self {
        Self {
            capital_contribution_subtype: capital_contribution_subtype.into(),
        }
    }

    pub fn from_rules(rules: &RuleConfig) -> Self {
        Self::new(rules.labels.capital_contribution_subtype.clone())
    }

    pub fn report(&self, batch: &[ClassifiedTransaction], scope: &Scope) -> LedgerReport {
        let in_scope: Vec<&ClassifiedTransaction> = batch.iter().filter(|t| scope.includes(t)).collect();

        let profit_and_loss = profit_and_loss(&in_scope);
        let balance_sheet = self.balance_sheet(&in_scope, profit_and_loss.net_profit);

        let mut diagnostics = Vec::new();
        if !balance_sheet.balanced {
            let diagnostic = Diagnostic::ConsistencyMismatch {
                assets: balance_sheet.total_assets,
                liabilities: balance_sheet.liabilities,
                equity: balance_sheet.equity,
            };
            warn!(scope = scope.label(), %diagnostic, "balance sheet does not balance");
            diagnostics.push(diagnostic);
        }

        let headline = Headline {
            total_revenue: profit_and_loss.total_income,
            net_operating_profit: profit_and_loss.net_profit,
            capitalized_assets: balance_sheet.fixed_assets,
        };

        LedgerReport {
            scope: scope.clone(),
            transaction_count: in_scope.len(),
            profit_and_loss,
            balance_sheet,
            headline,
            diagnostics,
        }
    }

    /// One report per property present in the batch, in property order.
    pub fn report_by_property(&self, batch: &[ClassifiedTransaction]) -> Vec<LedgerReport> {
        properties(batch)
            .into_iter()
            .map(|id| self.report(batch, &Scope::Property(id)))
            .collect()
    }

    fn balance_sheet(&self, txns: &[&ClassifiedTransaction], net_profit: Decimal) -> BalanceSheet {
        let mut fixed_assets = Decimal::ZERO;
        let mut liabilities = Decimal::ZERO;
        let mut current_cash = Decimal::ZERO;
        let mut capital_contributions = Decimal::ZERO;

        for t in txns {
            let amount = t.transaction.amount;
            current_cash += amount;
            match t.account_type() {
                AccountType::FixedAsset => fixed_assets += amount.abs(),
                AccountType::Liability => liabilities += amount.abs(),
                AccountType::Income => {
                    if t.classification.income_subtype.as_deref() == Some(self.capital_contribution_subtype.as_str()) {
                        capital_contributions += amount;
                    }
                }
                AccountType::Expense => {}
            }
        }

        let retained_earnings = net_profit - capital_contributions;
        let equity = retained_earnings + capital_contributions;
        let total_assets = fixed_assets + current_cash;

        // max_by_key keeps the last of equal dates, i.e. the export's own row order
        let reported_closing_balance = txns
            .iter()
            .filter(|t| t.transaction.balance.is_some())
            .max_by_key(|t| t.transaction.date)
            .and_then(|t| t.transaction.balance);

        BalanceSheet {
            fixed_assets,
            current_cash,
            total_assets,
            liabilities,
            capital_contributions,
            retained_earnings,
            equity,
            reported_closing_balance,
            balanced: total_assets == liabilities + equity,
        }
    }
}

fn profit_and_loss(txns: &[&ClassifiedTransaction]) -> ProfitAndLoss {
    let mut groups: BTreeMap<(AccountType, &str), (Decimal, usize)> = BTreeMap::new();
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;

    for t in txns.iter().filter(|t| t.account_type().is_profit_and_loss()) {
        let account_type = t.account_type();
        let amount = t.transaction.amount;
        if account_type == AccountType::Income {
            total_income += amount;
        } else {
            total_expenses += amount;
        }
        let entry = groups.entry((account_type, t.category())).or_insert((Decimal::ZERO, 0));
        entry.0 += amount;
        entry.1 += 1;
    }

    let lines = groups
        .into_iter()
        .map(|((account_type, category), (amount, transaction_count))| PnlLine {
            account_type,
            category: category.to_string(),
            amount,
            transaction_count,
        })
        .collect();

    ProfitAndLoss {
        lines,
        total_income,
        total_expenses,
        net_profit: total_income + total_expenses,
    }
}

/// Distinct property identifiers in the batch, sorted
pub fn properties(batch: &[ClassifiedTransaction]) -> Vec<String> {
    batch
        .iter()
        .map(|t| t.property().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Transactions in scope, newest first. Ties break on counterparty then amount
/// so the log is identical however the batch was ordered.
pub fn transaction_log<'a>(batch: &'a [ClassifiedTransaction], scope: &Scope) -> Vec<&'a ClassifiedTransaction> {
    let mut log: Vec<&ClassifiedTransaction> = batch.iter().filter(|t| scope.includes(t)).collect();
    log.sort_by(|a, b| {
        b.transaction
            .date
            .cmp(&a.transaction.date)
            .then_with(|| a.transaction.counterparty.cmp(&b.transaction.counterparty))
            .then_with(|| a.transaction.amount.cmp(&b.transaction.amount))
    });
    log
}
