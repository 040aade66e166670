use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use estate_core::{ClassifiedTransaction, Diagnostic};
use estate_finance::{LedgerReport, Pipeline, Scope};
use estate_ingest::{ingest_one, Batch, PdfStatementParser, StatementInput};
use serde::Serialize;
use std::io::stderr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

mod config;
mod render;

use config::{init_config, load_config, Config, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "estate",
    version,
    about = "Classify bank statements and build property accounts"
)]
struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level: error, warn, info, debug, trace (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Profit & loss and balance sheet from CSV exports and PDF statement text
    Report {
        /// Statement files: `.csv` exports or extracted PDF text (pages split by form feed)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Only report on this property
        #[arg(long, conflicts_with = "by_property")]
        property: Option<String>,

        /// One report per property
        #[arg(long)]
        by_property: bool,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Classified transaction log, newest first
    Log {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        property: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration to --config
    InitConfig,
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    reports: &'a [LedgerReport],
    warnings: &'a [String],
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct LogOutput<'a> {
    transactions: &'a [&'a ClassifiedTransaction],
    warnings: &'a [String],
    diagnostics: &'a [Diagnostic],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::InitConfig => init_config(&cli.config)?,

        Command::Report {
            files,
            property,
            by_property,
            json,
        } => {
            let (cfg, pdf) = prepare(&cli.config, cli.log_level.as_deref())?;
            let pipeline = run_pipeline(&files, pdf, &cfg.rules).await?;
            let reports = if by_property {
                pipeline.reports_by_property()
            } else {
                vec![pipeline.report(&scope(property))]
            };
            let warnings = pipeline.warnings();

            if json {
                println!("{}", report_json(&pipeline, &reports)?);
            } else {
                render::print_warnings(&warnings);
                render::print_notices(&pipeline.notices());
                for report in &reports {
                    render::print_report(report);
                }
            }
        }

        Command::Log {
            files,
            property,
            json,
        } => {
            let (cfg, pdf) = prepare(&cli.config, cli.log_level.as_deref())?;
            let pipeline = run_pipeline(&files, pdf, &cfg.rules).await?;
            let log = pipeline.log(&scope(property));
            let warnings = pipeline.warnings();

            if json {
                println!("{}", log_json(&pipeline, &log)?);
            } else {
                render::print_warnings(&warnings);
                render::print_notices(&pipeline.notices());
                render::print_log(&log);
            }
        }
    }

    Ok(())
}

/// Load config, install logging and build the statement parser.
fn prepare(config_path: &Path, log_level: Option<&str>) -> Result<(Config, PdfStatementParser)> {
    let cfg = load_config(config_path)?;
    setup_logging(parse_log_level(log_level.unwrap_or(&cfg.logging.level)));
    let pdf = PdfStatementParser::new(cfg.pdf.clone()).context("building statement parser")?;
    Ok((cfg, pdf))
}

/// Reports plus every warning and diagnostic from the run
fn report_json(pipeline: &Pipeline, reports: &[LedgerReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ReportOutput {
        reports,
        warnings: &pipeline.warnings(),
        diagnostics: &pipeline.diagnostics,
    })
}

fn log_json(pipeline: &Pipeline, log: &[&ClassifiedTransaction]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&LogOutput {
        transactions: log,
        warnings: &pipeline.warnings(),
        diagnostics: &pipeline.diagnostics,
    })
}

fn scope(property: Option<String>) -> Scope {
    property.map(Scope::Property).unwrap_or_default()
}

/// Read every file on the blocking pool, then classify the merged batch.
async fn run_pipeline(
    files: &[PathBuf],
    pdf: PdfStatementParser,
    rules: &estate_core::RuleConfig,
) -> Result<Pipeline> {
    let pdf = Arc::new(pdf);
    let mut workers = JoinSet::new();

    for (idx, path) in files.iter().cloned().enumerate() {
        let pdf = Arc::clone(&pdf);
        workers.spawn_blocking(move || {
            let outcome = StatementInput::from_path(&path).and_then(|input| ingest_one(&input, &pdf));
            (idx, outcome)
        });
    }

    let mut outcomes = Vec::with_capacity(files.len());
    while let Some(joined) = workers.join_next().await {
        outcomes.push(joined.context("statement worker panicked")?);
    }
    // keep diagnostics in command-line order
    outcomes.sort_by_key(|(idx, _)| *idx);

    let mut batch = Batch::default();
    for (_, outcome) in outcomes {
        batch.merge(outcome);
    }

    if batch.failures.len() == files.len() {
        bail!("no statement could be read: {}", batch.failures[0]);
    }

    info!(files = files.len(), transactions = batch.transactions.len(), "ingested statements");
    Ok(Pipeline::from_batch(batch, rules))
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'warn'", level);
            LevelFilter::WARN
        }
    }
}

fn setup_logging(level: LevelFilter) {
    // stdout carries the report; logs go to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry().with(terminal_log).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_core::RuleConfig;
    use estate_ingest::{ingest_batch, IngestError, PdfConfig};
    use serde_json::Value;

    fn pipeline() -> Pipeline {
        let pdf = PdfStatementParser::new(PdfConfig::default()).unwrap();
        let inputs = vec![
            StatementInput::Csv {
                name: "starling.csv".into(),
                data: "Date,Counter Party,Amount\n01/08/2022,Tenant,900.00\nbad,Nobody,-1.00\n".into(),
            },
            StatementInput::Csv {
                name: "broken.csv".into(),
                data: "Date,Counter Party\n01/08/2022,x\n".into(),
            },
            StatementInput::PdfText {
                name: "cover.txt".into(),
                pages: vec!["From 01/07/2022\nNothing to see here".into()],
            },
        ];
        let batch = ingest_batch(&inputs, &pdf);
        assert!(matches!(batch.failures[..], [IngestError::UnrecognizedColumnShape { .. }]));
        Pipeline::from_batch(batch, &RuleConfig::default())
    }

    #[test]
    fn test_log_json_carries_warnings_and_diagnostics() {
        let pipeline = pipeline();
        let log = pipeline.log(&Scope::Portfolio);
        let json: Value = serde_json::from_str(&log_json(&pipeline, &log).unwrap()).unwrap();

        assert_eq!(json["transactions"].as_array().unwrap().len(), 1);
        let warnings = json["warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].as_str().unwrap().starts_with("broken.csv"));

        let kinds: Vec<&str> = json["diagnostics"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["MalformedRow", "PdfExtractionEmpty"]);
    }

    #[test]
    fn test_report_json_includes_informational_diagnostics() {
        let pipeline = pipeline();
        let reports = vec![pipeline.report(&Scope::Portfolio)];
        let json: Value = serde_json::from_str(&report_json(&pipeline, &reports).unwrap()).unwrap();

        assert_eq!(json["reports"].as_array().unwrap().len(), 1);
        assert_eq!(json["diagnostics"][1]["kind"], "PdfExtractionEmpty");
        assert_eq!(json["diagnostics"][1]["file"], "cover.txt");
        assert_eq!(pipeline.notices(), vec!["cover.txt: no transaction lines found".to_string()]);
    }
}
