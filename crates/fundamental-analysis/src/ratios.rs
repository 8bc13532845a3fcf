use analysis_core::{EquityLines, LineSeries, RatioSet, RawFinancials};
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;

const BILLION: f64 = 1e9;

/// Round to 2 decimal places, ties to even.
///
/// Goes through `Decimal` so that values such as 0.125 round on their
/// decimal representation. Non-finite inputs have no decimal form and
/// come back as `None`.
pub fn round2(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
}

/// `numerator / denominator`, absent when either side is missing or the
/// denominator is zero.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => round2(n / d),
        _ => None,
    }
}

/// Period-over-period growth in percent.
///
/// Missing values are dropped first. A leading trailing-twelve-months entry
/// is skipped only when two fiscal values remain behind it; otherwise the
/// first two values are compared as they are.
pub fn growth(series: &LineSeries) -> Option<f64> {
    let values = series.present();
    if values.len() < 2 {
        return None;
    }

    let (latest, previous) = if values[0].period.is_trailing() && values.len() > 2 {
        (values[1].value?, values[2].value?)
    } else {
        (values[0].value?, values[1].value?)
    };

    if previous == 0.0 {
        return None;
    }
    round2((latest - previous) / previous * 100.0)
}

/// First equity line present, in reporting priority order.
pub fn resolve_equity(lines: &EquityLines) -> Option<f64> {
    lines.candidates().into_iter().flatten().next()
}

/// `price / (equity / shares)`; every operand must be present and non-zero.
pub fn price_to_book(price: Option<f64>, equity: Option<f64>, shares: Option<f64>) -> Option<f64> {
    let price = price.filter(|p| *p != 0.0)?;
    let equity = equity.filter(|e| *e != 0.0)?;
    let shares = shares.filter(|s| *s != 0.0)?;
    round2(price / (equity / shares))
}

/// `price / eps`. A zero price counts as no price.
pub fn price_to_earnings(price: Option<f64>, eps: Option<f64>) -> Option<f64> {
    ratio(price.filter(|p| *p != 0.0), eps)
}

pub fn compute(raw: &RawFinancials) -> RatioSet {
    let equity = resolve_equity(&raw.equity);

    RatioSet {
        eps: raw.diluted_eps.and_then(round2),
        pe: price_to_earnings(raw.current_price, raw.diluted_eps),
        pb: price_to_book(raw.current_price, equity, raw.shares_outstanding),
        roe: ratio(raw.net_income, equity),
        roa: ratio(raw.net_income, raw.total_assets),
        ebitda_bn: raw.ebitda.and_then(|e| round2(e / BILLION)),
        debt_to_ebitda: ratio(raw.total_debt, raw.ebitda),
        current_ratio: ratio(raw.current_assets, raw.current_liabilities),
        fcf_bn: raw.free_cash_flow.and_then(|f| round2(f / BILLION)),
        eps_growth: growth(&raw.eps_history),
        revenue_growth: growth(&raw.revenue_history),
        fcf_growth: growth(&raw.fcf_history),
    }
}
