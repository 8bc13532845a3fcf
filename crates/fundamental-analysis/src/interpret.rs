use analysis_core::{InterpretationSet, RatioSet};

pub const DATA_UNAVAILABLE: &str = "Data unavailable";

/// A ratio counts only when present and non-zero; a zero reads the same
/// as a missing value here.
fn truthy(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

fn label(
    value: Option<f64>,
    favorable: impl Fn(f64) -> bool,
    yes: &'static str,
    no: &'static str,
) -> &'static str {
    match truthy(value) {
        Some(v) if favorable(v) => yes,
        _ => no,
    }
}

fn available(value: Option<f64>, yes: &'static str) -> &'static str {
    label(value, |_| true, yes, DATA_UNAVAILABLE)
}

/// Map every ratio to its fixed label.
///
/// Two-sided ratios have no "unavailable" branch: a missing value takes the
/// unfavorable label.
pub fn interpret(ratios: &RatioSet) -> InterpretationSet {
    InterpretationSet {
        eps: available(ratios.eps, "Consistent earnings"),
        pe: label(ratios.pe, |v| v < 20.0, "Reasonable valuation (<20)", "Potentially overvalued"),
        pb: label(ratios.pb, |v| v < 5.0, "Undervalued (<5)", "Overvalued"),
        roe: label(ratios.roe, |v| v > 0.15, "Strong profitability (>15%)", "Weak profitability"),
        roa: label(ratios.roa, |v| v > 0.05, "Efficient use of assets (>5%)", "Low efficiency"),
        ebitda_bn: available(ratios.ebitda_bn, "Healthy operating margin"),
        debt_to_ebitda: label(ratios.debt_to_ebitda, |v| v < 3.0, "Controlled leverage (<3)", "High leverage"),
        current_ratio: label(ratios.current_ratio, |v| v > 1.5, "Safe liquidity (>1.5)", "Fragile liquidity"),
        fcf_bn: available(ratios.fcf_bn, "Positive FCF"),
        eps_growth: label(ratios.eps_growth, |v| v > 5.0, "Healthy earnings growth (>5%)", "Low EPS growth"),
        revenue_growth: label(ratios.revenue_growth, |v| v > 10.0, "Strong revenue momentum (>10%)", "Low revenue growth"),
        fcf_growth: label(ratios.fcf_growth, |v| v > 10.0, "Strong FCF expansion (>10%)", "Weak FCF growth"),
    }
}
