use std::fmt::Display;
use std::io::Write;

use serde::Serialize;
use tickerlens_core::{format_date, FinancialRecord, PortfolioReport, ValidationOutcome};

use crate::cli::OutputFormat;
use crate::error::CliError;

const MISSING: &str = "N/A";

pub fn render_report<W: Write>(
    out: &mut W,
    report: &PortfolioReport,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, report, pretty),
        OutputFormat::Table => render_report_table(out, report),
    }
}

pub fn render_validation<W: Write>(
    out: &mut W,
    outcome: &ValidationOutcome,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, outcome, pretty),
        OutputFormat::Table => {
            let valid: Vec<&str> = outcome.valid.iter().map(|s| s.as_str()).collect();
            writeln!(out, "valid   : {}", list_or_missing(&valid))?;
            writeln!(out, "rejected: {}", list_or_missing(&outcome.rejected))?;
            Ok(())
        }
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{payload}")?;
    Ok(())
}

fn render_report_table<W: Write>(out: &mut W, report: &PortfolioReport) -> Result<(), CliError> {
    writeln!(out, "as_of: {}", format_date(report.as_of))?;

    for entry in &report.records {
        writeln!(out)?;
        writeln!(out, "{}", entry.ticker)?;
        for (label, value) in record_rows(&entry.record) {
            writeln!(out, "  {label:<24}: {value}")?;
        }
    }

    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "failures:")?;
        for failure in &report.failures {
            writeln!(out, "  - {}: {} ({})", failure.ticker, failure.message, failure.code)?;
        }
    }

    Ok(())
}

fn record_rows(record: &FinancialRecord) -> [(&'static str, String); 8] {
    [
        ("Current Price", decimal(record.current_price)),
        ("Volume", or_missing(record.volume)),
        ("Market Cap", record.market_cap.map_or_else(missing, |v| format!("{v:.0}"))),
        ("Beta (5Y Monthly)", decimal(record.beta)),
        ("PE Ratio (TTM)", decimal(record.trailing_pe)),
        ("EPS (TTM)", decimal(record.trailing_eps)),
        (
            "Next Earning Call Date",
            record.next_earnings_date.map_or_else(missing, format_date),
        ),
        ("P/B Ratio", decimal(record.price_to_book)),
    ]
}

fn missing() -> String {
    MISSING.to_owned()
}

fn or_missing<T: Display>(value: Option<T>) -> String {
    value.map_or_else(missing, |v| v.to_string())
}

fn decimal(value: Option<f64>) -> String {
    value.map_or_else(missing, |v| format!("{v:.2}"))
}

fn list_or_missing<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return missing();
    }
    items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}
