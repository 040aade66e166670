//! Plain-text rendering of reports for the terminal.

use estate_core::ClassifiedTransaction;
use estate_finance::LedgerReport;
use rust_decimal::Decimal;

/// `-1234.5` -> `-£1,234.50`
pub fn fmt_gbp(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, pence) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}£{grouped}.{pence}")
}

pub fn print_report(report: &LedgerReport) {
    println!(
        "# {} ({} transactions)\n",
        report.scope.label(),
        report.transaction_count
    );

    let h = &report.headline;
    println!("Total revenue:        {:>14}", fmt_gbp(h.total_revenue));
    println!("Net operating profit: {:>14}", fmt_gbp(h.net_operating_profit));
    println!("Capitalized assets:   {:>14}\n", fmt_gbp(h.capitalized_assets));

    println!("## Profit & Loss\n");
    let pnl = &report.profit_and_loss;
    for line in &pnl.lines {
        println!(
            "  {:<8} {:<42} {:>14}  ({})",
            line.account_type.label(),
            line.category,
            fmt_gbp(line.amount),
            line.transaction_count
        );
    }
    println!("  {:<51} {:>14}", "Total income", fmt_gbp(pnl.total_income));
    println!("  {:<51} {:>14}", "Total expenses", fmt_gbp(pnl.total_expenses));
    println!("  {:<51} {:>14}\n", "Net profit", fmt_gbp(pnl.net_profit));

    println!("## Balance Sheet\n");
    let bs = &report.balance_sheet;
    let rows = [
        ("Fixed assets (properties)", bs.fixed_assets),
        ("Current cash at bank", bs.current_cash),
        ("Total assets", bs.total_assets),
        ("Liabilities", bs.liabilities),
        ("Capital contributions", bs.capital_contributions),
        ("Retained earnings", bs.retained_earnings),
        ("Equity", bs.equity),
    ];
    for (label, value) in rows {
        println!("  {:<51} {:>14}", label, fmt_gbp(value));
    }
    if let Some(balance) = bs.reported_closing_balance {
        println!("  {:<51} {:>14}", "Bank-reported closing balance", fmt_gbp(balance));
    }
    println!(
        "\n  Assets = Liabilities + Equity: {}\n",
        if bs.balanced { "yes" } else { "NO" }
    );

    for d in &report.diagnostics {
        println!("  ! {d}");
    }
}

pub fn print_log(log: &[&ClassifiedTransaction]) {
    for t in log {
        let txn = &t.transaction;
        let c = &t.classification;
        let subtype = c.income_subtype.as_deref().map(|s| format!(" / {s}")).unwrap_or_default();
        println!(
            "{}  {:>12}  {:<36} {:<10} {}{}  [{}]",
            txn.date,
            fmt_gbp(txn.amount),
            truncate(&txn.counterparty, 36),
            c.account_type.label(),
            c.category,
            subtype,
            c.property
        );
    }
}

pub fn print_warnings(warnings: &[String]) {
    print_section("Data quality warnings", warnings);
}

pub fn print_notices(notices: &[String]) {
    print_section("Notes", notices);
}

fn print_section(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("## {title}\n");
    for item in items {
        println!("- {item}");
    }
    println!();
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
