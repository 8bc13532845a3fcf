use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reporting period of a single statement value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// Trailing-twelve-months aggregate, not a fiscal period
    Trailing,
    /// Fiscal period ending on the given date
    Fiscal(NaiveDate),
}

impl Period {
    pub fn is_trailing(&self) -> bool {
        matches!(self, Period::Trailing)
    }
}

/// One value of a statement line item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    pub period: Period,
    pub value: Option<f64>,
}

impl PeriodValue {
    pub fn fiscal(date: NaiveDate, value: Option<f64>) -> Self {
        Self { period: Period::Fiscal(date), value }
    }

    pub fn trailing(value: Option<f64>) -> Self {
        Self { period: Period::Trailing, value }
    }
}

/// Values of one line item, most recent first.
///
/// A trailing-twelve-months entry, when reported, sits at the front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSeries(pub Vec<PeriodValue>);

impl LineSeries {
    pub fn new(values: Vec<PeriodValue>) -> Self {
        Self(values)
    }

    /// Value of the first (most recent) column, absent if that column is empty.
    pub fn latest(&self) -> Option<f64> {
        self.0.first().and_then(|v| v.value)
    }

    /// Entries that carry a value, order preserved.
    pub fn present(&self) -> Vec<PeriodValue> {
        self.0.iter().filter(|v| v.value.is_some()).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementKind {
    Income,
    BalanceSheet,
    CashFlow,
}

/// A financial statement: line items keyed by normalized name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    lines: BTreeMap<String, LineSeries>,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self { kind, lines: BTreeMap::new() }
    }

    /// Line names are compared with all whitespace removed, so
    /// "Total Revenue" and "TotalRevenue" address the same row.
    pub fn normalize_key(name: &str) -> String {
        name.trim().chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn insert(&mut self, name: &str, series: LineSeries) {
        self.lines.insert(Self::normalize_key(name), series);
    }

    pub fn line(&self, name: &str) -> Option<&LineSeries> {
        self.lines.get(&Self::normalize_key(name))
    }

    /// Latest value of a line, absent if the line is missing.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.line(name).and_then(LineSeries::latest)
    }

    /// Full series of a line, empty if the line is missing.
    pub fn series(&self, name: &str) -> LineSeries {
        self.line(name).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_names(&self) -> impl Iterator<Item = &str> {
        self.lines.keys().map(String::as_str)
    }
}

/// Balance sheet lines that may carry shareholders' equity, depending on
/// how the company reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityLines {
    pub total_stockholders_equity: Option<f64>,
    pub stockholders_equity: Option<f64>,
    pub common_stock_equity: Option<f64>,
    pub total_equity_gross_minority_interest: Option<f64>,
}

impl EquityLines {
    /// Balance sheet line names, in resolution priority order.
    pub const LINE_NAMES: [&'static str; 4] = [
        "TotalStockholdersEquity",
        "StockholdersEquity",
        "CommonStockEquity",
        "TotalEquityGrossMinorityInterest",
    ];

    /// Candidates in priority order.
    pub fn candidates(&self) -> [Option<f64>; 4] {
        [
            self.total_stockholders_equity,
            self.stockholders_equity,
            self.common_stock_equity,
            self.total_equity_gross_minority_interest,
        ]
    }

    pub fn from_balance_sheet(balance: &Statement) -> Self {
        let [total, stockholders, common, gross] = Self::LINE_NAMES;
        Self {
            total_stockholders_equity: balance.latest(total),
            stockholders_equity: balance.latest(stockholders),
            common_stock_equity: balance.latest(common),
            total_equity_gross_minority_interest: balance.latest(gross),
        }
    }
}

/// Snapshot of the statement fields the scorer reads for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFinancials {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub diluted_eps: Option<f64>,
    pub total_revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub ebitda: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_debt: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub equity: EquityLines,
    pub revenue_history: LineSeries,
    pub eps_history: LineSeries,
    pub fcf_history: LineSeries,
}

impl RawFinancials {
    /// Sentinel for "nothing could be retrieved".
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty(&self.symbol)
    }

    pub fn from_statements(
        symbol: &str,
        income: &Statement,
        balance: &Statement,
        cash_flow: &Statement,
        current_price: Option<f64>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            current_price,
            diluted_eps: income.latest("DilutedEPS"),
            total_revenue: income.latest("TotalRevenue"),
            net_income: income.latest("NetIncome"),
            ebitda: income.latest("EBITDA"),
            total_assets: balance.latest("TotalAssets"),
            total_debt: balance.latest("TotalDebt"),
            current_assets: balance.latest("CurrentAssets"),
            current_liabilities: balance.latest("CurrentLiabilities"),
            free_cash_flow: cash_flow.latest("FreeCashFlow"),
            shares_outstanding: balance.latest("OrdinarySharesNumber"),
            equity: EquityLines::from_balance_sheet(balance),
            revenue_history: income.series("TotalRevenue"),
            eps_history: income.series("DilutedEPS"),
            fcf_history: cash_flow.series("FreeCashFlow"),
        }
    }
}

/// The fixed set of ratios reported for a ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ratio {
    Eps,
    PriceToEarnings,
    PriceToBook,
    ReturnOnEquity,
    ReturnOnAssets,
    EbitdaBillions,
    DebtToEbitda,
    CurrentRatio,
    FreeCashFlowBillions,
    EpsGrowth,
    RevenueGrowth,
    FcfGrowth,
}

impl Ratio {
    pub const ALL: [Ratio; 12] = [
        Ratio::Eps,
        Ratio::PriceToEarnings,
        Ratio::PriceToBook,
        Ratio::ReturnOnEquity,
        Ratio::ReturnOnAssets,
        Ratio::EbitdaBillions,
        Ratio::DebtToEbitda,
        Ratio::CurrentRatio,
        Ratio::FreeCashFlowBillions,
        Ratio::EpsGrowth,
        Ratio::RevenueGrowth,
        Ratio::FcfGrowth,
    ];

    /// Human-readable indicator name
    pub fn label(&self) -> &'static str {
        match self {
            Ratio::Eps => "EPS",
            Ratio::PriceToEarnings => "P/E",
            Ratio::PriceToBook => "P/B",
            Ratio::ReturnOnEquity => "ROE",
            Ratio::ReturnOnAssets => "ROA",
            Ratio::EbitdaBillions => "EBITDA (bn)",
            Ratio::DebtToEbitda => "Debt/EBITDA",
            Ratio::CurrentRatio => "Current Ratio",
            Ratio::FreeCashFlowBillions => "Free Cash Flow (bn)",
            Ratio::EpsGrowth => "EPS Growth (%)",
            Ratio::RevenueGrowth => "Revenue Growth (%)",
            Ratio::FcfGrowth => "FCF Growth (%)",
        }
    }
}

/// Computed ratios. Growth values are percentages; all values are rounded
/// to 2 decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    pub eps: Option<f64>,
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub ebitda_bn: Option<f64>,
    pub debt_to_ebitda: Option<f64>,
    pub current_ratio: Option<f64>,
    pub fcf_bn: Option<f64>,
    pub eps_growth: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub fcf_growth: Option<f64>,
}

impl RatioSet {
    pub fn get(&self, ratio: Ratio) -> Option<f64> {
        match ratio {
            Ratio::Eps => self.eps,
            Ratio::PriceToEarnings => self.pe,
            Ratio::PriceToBook => self.pb,
            Ratio::ReturnOnEquity => self.roe,
            Ratio::ReturnOnAssets => self.roa,
            Ratio::EbitdaBillions => self.ebitda_bn,
            Ratio::DebtToEbitda => self.debt_to_ebitda,
            Ratio::CurrentRatio => self.current_ratio,
            Ratio::FreeCashFlowBillions => self.fcf_bn,
            Ratio::EpsGrowth => self.eps_growth,
            Ratio::RevenueGrowth => self.revenue_growth,
            Ratio::FcfGrowth => self.fcf_growth,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ratio, Option<f64>)> + '_ {
        Ratio::ALL.into_iter().map(move |r| (r, self.get(r)))
    }

    pub fn present_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// One fixed label per ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterpretationSet {
    pub eps: &'static str,
    pub pe: &'static str,
    pub pb: &'static str,
    pub roe: &'static str,
    pub roa: &'static str,
    pub ebitda_bn: &'static str,
    pub debt_to_ebitda: &'static str,
    pub current_ratio: &'static str,
    pub fcf_bn: &'static str,
    pub eps_growth: &'static str,
    pub revenue_growth: &'static str,
    pub fcf_growth: &'static str,
}

impl InterpretationSet {
    pub fn get(&self, ratio: Ratio) -> &'static str {
        match ratio {
            Ratio::Eps => self.eps,
            Ratio::PriceToEarnings => self.pe,
            Ratio::PriceToBook => self.pb,
            Ratio::ReturnOnEquity => self.roe,
            Ratio::ReturnOnAssets => self.roa,
            Ratio::EbitdaBillions => self.ebitda_bn,
            Ratio::DebtToEbitda => self.debt_to_ebitda,
            Ratio::CurrentRatio => self.current_ratio,
            Ratio::FreeCashFlowBillions => self.fcf_bn,
            Ratio::EpsGrowth => self.eps_growth,
            Ratio::RevenueGrowth => self.revenue_growth,
            Ratio::FcfGrowth => self.fcf_growth,
        }
    }
}

/// Heuristic investment score, always within [0, 20]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct InvestmentScore(f64);

impl InvestmentScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 20.0;

    /// Clamp a raw point total into the score range.
    pub fn clamped(total: f64) -> Self {
        Self(total.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for InvestmentScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/20", self.0)
    }
}

/// A single non-zero term of the score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreContribution {
    pub rule: &'static str,
    pub points: f64,
}

/// Qualitative verdict derived from the score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    HighQuality,
    Solid,
    Average,
    Risky,
}

impl Recommendation {
    pub fn from_score(score: InvestmentScore) -> Self {
        match score.value() {
            s if s >= 16.0 => Recommendation::HighQuality,
            s if s >= 12.0 => Recommendation::Solid,
            s if s >= 8.0 => Recommendation::Average,
            _ => Recommendation::Risky,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::HighQuality => "High-quality stock with strong profitability and growth.",
            Recommendation::Solid => "Solid fundamentals, but monitor valuation or debt.",
            Recommendation::Average => "Average performance with potential red flags.",
            Recommendation::Risky => "Risky profile: weak fundamentals or poor growth.",
        }
    }
}

/// Full output of a fundamental evaluation
#[derive(Debug, Clone, Serialize)]
pub struct FundamentalReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub ratios: RatioSet,
    pub interpretations: InterpretationSet,
    pub score: InvestmentScore,
    pub contributions: Vec<ScoreContribution>,
    pub recommendation: Recommendation,
}

/// One rendered line of the report table
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub indicator: &'static str,
    pub value: Option<f64>,
    pub interpretation: String,
}

impl FundamentalReport {
    /// Table rows: one per ratio, then the investment score.
    pub fn rows(&self) -> Vec<ReportRow> {
        let mut rows: Vec<ReportRow> = self
            .ratios
            .iter()
            .map(|(ratio, value)| ReportRow {
                indicator: ratio.label(),
                value,
                interpretation: self.interpretations.get(ratio).to_string(),
            })
            .collect();
        rows.push(ReportRow {
            indicator: "Investment Score",
            value: Some(self.score.value()),
            interpretation: self.score.to_string(),
        });
        rows
    }
}
