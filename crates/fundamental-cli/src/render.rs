use analysis_core::{FundamentalReport, ReportRow};
use std::fmt::Write;

const INDICATOR_WIDTH: usize = 25;
const VALUE_WIDTH: usize = 12;
const INTERPRETATION_WIDTH: usize = 40;

pub const UNAVAILABLE_MESSAGE: &str = "Unable to retrieve financial data.";

pub fn banner(symbol: &str) -> String {
    format!("\nFundamental Analysis - {}\n", symbol.to_uppercase())
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", v),
        None => "None".to_string(),
    }
}

fn format_row(row: &ReportRow) -> String {
    format!(
        "{:<iw$} {:>vw$} {:<tw$}",
        row.indicator,
        format_value(row.value),
        row.interpretation,
        iw = INDICATOR_WIDTH,
        vw = VALUE_WIDTH,
        tw = INTERPRETATION_WIDTH,
    )
}

/// Indicator / Value / Interpretation table followed by the recommendation.
pub fn table(report: &FundamentalReport) -> String {
    let mut out = String::new();
    let header = format!(
        "{:^iw$} {:^vw$} {:^tw$}",
        "Indicator",
        "Value",
        "Interpretation",
        iw = INDICATOR_WIDTH,
        vw = VALUE_WIDTH,
        tw = INTERPRETATION_WIDTH,
    );
    let _ = writeln!(out, "{}", header.trim_end());
    for row in report.rows() {
        let _ = writeln!(out, "{}", format_row(&row).trim_end());
    }
    let _ = writeln!(out, "\nFinal Recommendation:");
    let _ = writeln!(out, "{}", report.recommendation.message());
    out
}

/// Score terms, one per line, with the clamped total.
pub fn explanation(report: &FundamentalReport) -> String {
    let mut out = String::from("\nScore breakdown:\n");
    if report.contributions.is_empty() {
        out.push_str("  (no scoring rule applied)\n");
    }
    for term in &report.contributions {
        let _ = writeln!(out, "  {:+5.1}  {}", term.points, term.rule);
    }
    let _ = writeln!(out, "  Total (clamped to 0-20): {}", report.score);
    out
}
