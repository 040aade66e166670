//! Classification rules as data.
//!
//! Every keyword set, threshold and label the classifier uses lives here so
//! the taxonomy can change without touching the evaluation order. Ordered
//! tables are plain `Vec`s: the first matching entry wins.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version understood by this build
pub const RULES_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported rules version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("{field} must not be negative (got {value})")]
    NegativeThreshold { field: &'static str, value: Decimal },
    #[error("label `{field}` must not be empty")]
    EmptyLabel { field: &'static str },
    #[error("{table} entry #{index} has no label")]
    UnlabelledEntry { table: &'static str, index: usize },
}

/// An ordered (keywords -> label) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// `haystack` must already be upper-cased.
    pub fn matches(&self, haystack: &str) -> bool {
        contains_any(haystack, &self.keywords)
    }
}

/// Income sub-type rule. `min_amount` adds a strict materiality floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeRule {
    pub label: String,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<Decimal>,
}

impl IncomeRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            min_amount: None,
        }
    }

    pub fn with_min_amount(mut self, min_amount: Decimal) -> Self {
        self.min_amount = Some(min_amount);
        self
    }

    pub fn matches(&self, haystack: &str, amount: Decimal) -> bool {
        let material = self.min_amount.is_none_or(|floor| amount.abs() > floor);
        material && contains_any(haystack, &self.keywords)
    }
}

/// A known property and the text fragments that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRule {
    pub id: String,
    pub keywords: Vec<String>,
}

impl PropertyRule {
    pub fn new(id: &str, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        contains_any(haystack, &self.keywords)
    }
}

/// Fixed labels the engine emits outside the keyword tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub unallocated_property: String,
    pub fallback_category: String,
    pub income_category: String,
    pub default_income_subtype: String,
    pub capitalization_category: String,
    pub director_loan_category: String,
    /// Income sub-type counted as a capital contribution on the balance sheet
    pub capital_contribution_subtype: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            unallocated_property: "General/Unallocated".to_string(),
            fallback_category: "Sundry / Other Allowable Expenses".to_string(),
            income_category: "Rental Income".to_string(),
            default_income_subtype: "Standard Rent".to_string(),
            capitalization_category: "Property Acquisition & Legal".to_string(),
            director_loan_category: "Director Loan Account".to_string(),
            capital_contribution_subtype: "Director Capital Injection".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub version: u32,
    /// Solicitor spend strictly above this is capitalized
    pub capitalization_threshold: Decimal,
    /// Director-named movements strictly above this are material. Applies to
    /// money in (capital injection) and money out (director loan) alike.
    pub director_loan_threshold: Decimal,
    pub capitalization_keywords: Vec<String>,
    pub director_keywords: Vec<String>,
    pub labels: Labels,
    /// Checked before the director capital injection sub-type
    pub income_subtypes: Vec<IncomeRule>,
    pub expense_categories: Vec<KeywordRule>,
    pub properties: Vec<PropertyRule>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            version: RULES_VERSION,
            capitalization_threshold: Decimal::new(500_000, 2),
            director_loan_threshold: Decimal::new(100_000, 2),
            capitalization_keywords: ["JMW", "WTB", "SOLICITOR", "CONVEYANC"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            director_keywords: vec!["DIRECTOR".to_string(), "DIR LOAN".to_string()],
            labels: Labels::default(),
            income_subtypes: vec![
                IncomeRule::new("Legal Settlement", &["SETTLEMENT", "COMPENSATION", "DAMAGES"]),
                IncomeRule::new("Tenant Deposit", &["DEPOSIT", "DPS", "TDS", "MYDEPOSITS"]),
                IncomeRule::new("Company Let", &["LTD", "LIMITED", "PLC", "LLP", "HOUSING ASSOC"]),
            ],
            expense_categories: vec![
                KeywordRule::new(
                    "Loan Interest & Other Financial Costs",
                    &["MORTGAGE", "INTEREST", "LOAN", "PARAGON", "KENT RELIANCE", "PRECISE"],
                ),
                KeywordRule::new(
                    "Repairs & Maintenance",
                    &["REPAIR", "MAINTENANCE", "PLUMB", "ELECTRICIAN", "SCREWFIX", "TOOLSTATION", "B&Q", "WICKES", "BOILER"],
                ),
                KeywordRule::new(
                    "Insurance",
                    &["INSURANCE", "INSURE", "AVIVA", "DIRECT LINE", "HOMELET"],
                ),
                KeywordRule::new(
                    "Rent, Rates, Power & Utilities",
                    &["BRITISH GAS", "OCTOPUS", "EDF", "E.ON", "WATER", "COUNCIL TAX", "ELECTRIC", "BROADBAND"],
                ),
                KeywordRule::new(
                    "Wages & Staff Costs",
                    &["PAYROLL", "WAGES", "SALARY", "PAYE"],
                ),
                KeywordRule::new(
                    "Admin, Professional & Marketing Fees",
                    &["ACCOUNTANT", "ACCOUNTANCY", "COMPANIES HOUSE", "RIGHTMOVE", "ZOOPLA", "OPENRENT", "ADVERT", "SOFTWARE", "LETTING AGENT", "XERO"],
                ),
                KeywordRule::new(
                    "Bank, Credit Card & Post Office Charges",
                    &["BANK CHARGE", "SERVICE CHARGE", "ACCOUNT FEE", "POST OFFICE", "ROYAL MAIL"],
                ),
            ],
            properties: Vec::new(),
        }
    }
}

impl RuleConfig {
    /// Reject configurations the engine cannot evaluate faithfully.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != RULES_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                expected: RULES_VERSION,
            });
        }

        for (field, value) in [
            ("capitalization_threshold", self.capitalization_threshold),
            ("director_loan_threshold", self.director_loan_threshold),
        ] {
            if value < Decimal::ZERO {
                return Err(ConfigError::NegativeThreshold { field, value });
            }
        }

        let labels = &self.labels;
        for (field, value) in [
            ("unallocated_property", &labels.unallocated_property),
            ("fallback_category", &labels.fallback_category),
            ("income_category", &labels.income_category),
            ("default_income_subtype", &labels.default_income_subtype),
            ("capitalization_category", &labels.capitalization_category),
            ("director_loan_category", &labels.director_loan_category),
            ("capital_contribution_subtype", &labels.capital_contribution_subtype),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyLabel { field });
            }
        }

        let tables = [
            ("income_subtypes", self.income_subtypes.iter().map(|r| r.label.as_str()).collect::<Vec<_>>()),
            ("expense_categories", self.expense_categories.iter().map(|r| r.label.as_str()).collect()),
            ("properties", self.properties.iter().map(|r| r.id.as_str()).collect()),
        ];
        for (table, labels) in tables {
            if let Some(index) = labels.iter().position(|l| l.trim().is_empty()) {
                return Err(ConfigError::UnlabelledEntry { table, index });
            }
        }

        Ok(())
    }
}

/// Substring test against an upper-cased `haystack`. Keywords are upper-cased
/// here, so config files may use any case. Blank keywords never match.
pub fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| {
        let k = k.trim();
        !k.is_empty() && haystack.contains(&k.to_uppercase())
    })
}
