//! Deterministic accounting classification of canonical transactions.
//!
//! Evaluation order (first match wins):
//!   1. amount > 0            -> Income, with an income sub-type
//!   2. solicitor keywords + amount above capitalization threshold -> FixedAsset
//!   3. director keywords + amount above materiality threshold     -> Liability
//!   4. ordered statutory expense table                            -> Expense
//!   5. fallback                                                   -> Expense / sundry
//!
//! Income sub-types walk the configured table, then the director capital
//! injection check (director keywords and materiality threshold, the same
//! settings as step 3), then default to standard rent.
//!
//! Capitalization only reads counterparty and reference; everything else
//! reads notes as well. Property tagging is independent of all of the above
//! and only looks at text. Every input gets exactly one account type and
//! category.

use estate_core::{AccountType, Classification, ClassifiedTransaction, RuleConfig, Transaction};
use estate_core::rules::contains_any;
use tracing::debug;

/// Classify a single transaction. Pure: no state survives the call.
pub fn classify(txn: &Transaction, rules: &RuleConfig) -> Classification {
    let text = txn.evidence_text().to_uppercase();
    let property = tag_property(&text, rules);
    let labels = &rules.labels;
    let magnitude = txn.abs_amount();
    let director_material = || contains_any(&text, &rules.director_keywords) && magnitude > rules.director_loan_threshold;

    // Income: sign is the only discriminator
    if txn.is_income() {
        let subtype = rules
            .income_subtypes
            .iter()
            .find(|rule| rule.matches(&text, txn.amount))
            .map(|rule| rule.label.clone())
            .or_else(|| director_material().then(|| labels.capital_contribution_subtype.clone()))
            .unwrap_or_else(|| labels.default_income_subtype.clone());
        return Classification {
            property,
            account_type: AccountType::Income,
            category: labels.income_category.clone(),
            income_subtype: Some(subtype),
        };
    }

    // Acquisition legal costs go to the balance sheet
    let party = txn.party_text().to_uppercase();
    if contains_any(&party, &rules.capitalization_keywords) && magnitude > rules.capitalization_threshold {
        debug!(counterparty = %txn.counterparty, amount = %txn.amount, "capitalized");
        return cat(property, AccountType::FixedAsset, &labels.capitalization_category);
    }

    if director_material() {
        debug!(counterparty = %txn.counterparty, amount = %txn.amount, "director loan movement");
        return cat(property, AccountType::Liability, &labels.director_loan_category);
    }

    if let Some(rule) = rules.expense_categories.iter().find(|rule| rule.matches(&text)) {
        return cat(property, AccountType::Expense, &rule.label);
    }

    // Fallback
    cat(property, AccountType::Expense, &labels.fallback_category)
}

/// First configured property whose keywords appear in `text` (upper-cased).
pub fn tag_property(text: &str, rules: &RuleConfig) -> String {
    rules
        .properties
        .iter()
        .find(|p| p.matches(text))
        .map(|p| p.id.clone())
        .unwrap_or_else(|| rules.labels.unallocated_property.clone())
}

/// Classify a whole batch. Transactions are independent of each other, so
/// the output order simply follows the input.
pub fn classify_batch(transactions: Vec<Transaction>, rules: &RuleConfig) -> Vec<ClassifiedTransaction> {
    transactions
        .into_iter()
        .map(|txn| {
            let classification = classify(&txn, rules);
            ClassifiedTransaction::new(txn, classification)
        })
        .collect()
}

fn cat(property: String, account_type: AccountType, category: &str) -> Classification {
    Classification {
        property,
        account_type,
        category: category.to_string(),
        income_subtype: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use estate_core::{PropertyRule, Source};
    use rust_decimal::Decimal;

    fn txn(counterparty: &str, amount: Decimal) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(2022, 9, 1).unwrap(), counterparty, amount, Source::Csv)
    }

    fn gbp(pounds: i64) -> Decimal {
        Decimal::new(pounds * 100, 2)
    }

    fn rules() -> RuleConfig {
        let mut rules = RuleConfig::default();
        rules.director_keywords = vec!["A PATEL".to_string()];
        rules.properties = vec![
            PropertyRule::new("14 Elm Road", &["ELM ROAD", "ELM RD"]),
            PropertyRule::new("Flat 2 Mill Court", &["MILL COURT", "MILL CT"]),
        ];
        rules
    }

    #[test]
    fn test_positive_amount_is_standard_rent() {
        let c = classify(&txn("J Tenant", gbp(850)), &rules());
        assert_eq!(c.account_type, AccountType::Income);
        assert_eq!(c.category, "Rental Income");
        assert_eq!(c.income_subtype.as_deref(), Some("Standard Rent"));
    }

    #[test]
    fn test_income_subtypes_in_order() {
        let rules = rules();
        let settlement = txn("Court settlement deposit", gbp(2000));
        assert_eq!(classify(&settlement, &rules).income_subtype.as_deref(), Some("Legal Settlement"));

        let deposit = txn("DPS deposit release", gbp(900));
        assert_eq!(classify(&deposit, &rules).income_subtype.as_deref(), Some("Tenant Deposit"));

        let company = txn("Acme Relocation Ltd", gbp(1500));
        assert_eq!(classify(&company, &rules).income_subtype.as_deref(), Some("Company Let"));
    }

    #[test]
    fn test_director_injection_needs_materiality() {
        let rules = rules();
        let big = classify(&txn("A Patel", gbp(20000)), &rules);
        assert_eq!(big.income_subtype.as_deref(), Some("Director Capital Injection"));
        assert_eq!(big.account_type, AccountType::Income);

        let small = classify(&txn("A Patel", gbp(50)), &rules);
        assert_eq!(small.income_subtype.as_deref(), Some("Standard Rent"));
    }

    #[test]
    fn test_capitalization_boundary_is_strict() {
        let rules = rules();
        let at = classify(&txn("JMW Solicitors", gbp(-5000)), &rules);
        assert_eq!(at.account_type, AccountType::Expense);

        let above = classify(&txn("JMW Solicitors", gbp(-5001)), &rules);
        assert_eq!(above.account_type, AccountType::FixedAsset);
        assert_eq!(above.category, "Property Acquisition & Legal");
        assert_eq!(above.income_subtype, None);
    }

    #[test]
    fn test_director_loan_boundary_is_strict() {
        let rules = rules();
        let at = classify(&txn("A Patel", gbp(-1000)), &rules);
        assert_eq!(at.account_type, AccountType::Expense);

        let above = classify(&txn("A Patel", Decimal::new(-100001, 2)), &rules);
        assert_eq!(above.account_type, AccountType::Liability);

        let injection_at = classify(&txn("A Patel", gbp(1000)), &rules);
        assert_eq!(injection_at.income_subtype.as_deref(), Some("Standard Rent"));
        let injection_above = classify(&txn("A Patel", Decimal::new(100001, 2)), &rules);
        assert_eq!(injection_above.income_subtype.as_deref(), Some("Director Capital Injection"));
    }

    #[test]
    fn test_director_settings_from_toml_cover_both_directions() {
        let rules: RuleConfig = toml::from_str(
            r#"
director_keywords = ["J BLOGGS"]
director_loan_threshold = "2500.00"
"#,
        )
        .unwrap();

        let paid_in = classify(&txn("J Bloggs", gbp(3000)), &rules);
        assert_eq!(paid_in.income_subtype.as_deref(), Some("Director Capital Injection"));
        let paid_out = classify(&txn("J Bloggs", gbp(-3000)), &rules);
        assert_eq!(paid_out.account_type, AccountType::Liability);

        let below = classify(&txn("J Bloggs", gbp(2000)), &rules);
        assert_eq!(below.income_subtype.as_deref(), Some("Standard Rent"));
        // the default keyword no longer applies once overridden
        let old_keyword = classify(&txn("Director", gbp(3000)), &rules);
        assert_eq!(old_keyword.income_subtype.as_deref(), Some("Standard Rent"));
    }

    #[test]
    fn test_solicitor_in_notes_is_not_capitalized() {
        let t = txn("Aviva", gbp(-9000)).with_notes("claim handled by JMW");
        let c = classify(&t, &rules());
        assert_eq!(c.account_type, AccountType::Expense);
        assert_eq!(c.category, "Insurance");
    }

    #[test]
    fn test_solicitor_keyword_in_reference() {
        let t = txn("Client account", gbp(-65000)).with_reference("WTB completion funds");
        assert_eq!(classify(&t, &rules()).account_type, AccountType::FixedAsset);
    }

    #[test]
    fn test_director_loan_rule() {
        let rules = rules();
        let repay = classify(&txn("A Patel", gbp(-2500)), &rules);
        assert_eq!(repay.account_type, AccountType::Liability);
        assert_eq!(repay.category, "Director Loan Account");

        let expenses = classify(&txn("A Patel", gbp(-40)), &rules);
        assert_eq!(expenses.account_type, AccountType::Expense);
        assert_eq!(expenses.category, "Sundry / Other Allowable Expenses");
    }

    #[test]
    fn test_statutory_table_first_match_wins() {
        let rules = rules();
        let cases = [
            ("Paragon Mortgages", "Loan Interest & Other Financial Costs"),
            ("Screwfix Direct", "Repairs & Maintenance"),
            ("HomeLet", "Insurance"),
            ("British Gas", "Rent, Rates, Power & Utilities"),
            ("Payroll run", "Wages & Staff Costs"),
            ("Rightmove", "Admin, Professional & Marketing Fees"),
            ("Post Office", "Bank, Credit Card & Post Office Charges"),
            // repairs precede utilities
            ("Boiler repair British Gas", "Repairs & Maintenance"),
        ];
        for (counterparty, expected) in cases {
            let c = classify(&txn(counterparty, gbp(-100)), &rules);
            assert_eq!(c.account_type, AccountType::Expense, "{counterparty}");
            assert_eq!(c.category, expected, "{counterparty}");
        }
    }

    #[test]
    fn test_small_solicitor_fee_is_ordinary_expense() {
        let c = classify(&txn("Smith Solicitors", gbp(-300)), &rules());
        assert_eq!(c.account_type, AccountType::Expense);
        assert_eq!(c.category, "Sundry / Other Allowable Expenses");
    }

    #[test]
    fn test_zero_amount_is_expense() {
        let c = classify(&txn("", Decimal::ZERO), &rules());
        assert_eq!(c.account_type, AccountType::Expense);
        assert_eq!(c.income_subtype, None);
    }

    #[test]
    fn test_property_tagging_priority_and_default() {
        let rules = rules();
        let both = txn("Mill Court service", gbp(-80)).with_notes("also Elm Road");
        assert_eq!(classify(&both, &rules).property, "14 Elm Road");

        let notes_only = txn("Screwfix", gbp(-20)).with_notes("mill ct bathroom");
        assert_eq!(classify(&notes_only, &rules).property, "Flat 2 Mill Court");

        assert_eq!(classify(&txn("Aviva", gbp(-20)), &rules).property, "General/Unallocated");
    }

    #[test]
    fn test_property_independent_of_amount() {
        let rules = rules();
        let income = classify(&txn("Rent Elm Rd", gbp(900)), &rules);
        let expense = classify(&txn("Rent Elm Rd", gbp(-900)), &rules);
        assert_eq!(income.property, expense.property);
    }

    #[test]
    fn test_totality_and_sign_consistency() {
        let rules = rules();
        let names = ["", "JMW", "A Patel", "British Gas", "zzz", "DPS deposit", "Elm Road"];
        let amounts = [gbp(-10000), gbp(-5000), gbp(-1), Decimal::ZERO, Decimal::new(1, 2), gbp(7000)];
        for name in names {
            for amount in amounts {
                let t = txn(name, amount);
                let c = classify(&t, &rules);
                assert!(!c.category.is_empty());
                assert_eq!(c.account_type == AccountType::Income, amount > Decimal::ZERO);
                assert_eq!(c.income_subtype.is_some(), c.account_type == AccountType::Income);
                assert_eq!(c, classify(&t, &rules));
            }
        }
    }

    #[test]
    fn test_classify_batch_preserves_transactions() {
        let batch = vec![txn("J Tenant", gbp(850)), txn("Aviva", gbp(-30))];
        let out = classify_batch(batch.clone(), &rules());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].transaction, batch[0]);
        assert_eq!(out[1].account_type(), AccountType::Expense);
        assert_eq!(out[1].category(), "Insurance");
    }
}
