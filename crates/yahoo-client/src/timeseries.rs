use analysis_core::{AnalysisError, LineSeries, Period, PeriodValue, Statement, StatementKind};
use chrono::NaiveDate;
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// Line items requested from the fundamentals-timeseries endpoint
pub const LINE_ITEMS: &[(&str, StatementKind)] = &[
    ("TotalRevenue", StatementKind::Income),
    ("DilutedEPS", StatementKind::Income),
    ("NetIncome", StatementKind::Income),
    ("EBITDA", StatementKind::Income),
    ("TotalAssets", StatementKind::BalanceSheet),
    ("TotalDebt", StatementKind::BalanceSheet),
    ("CurrentAssets", StatementKind::BalanceSheet),
    ("CurrentLiabilities", StatementKind::BalanceSheet),
    ("TotalStockholdersEquity", StatementKind::BalanceSheet),
    ("StockholdersEquity", StatementKind::BalanceSheet),
    ("CommonStockEquity", StatementKind::BalanceSheet),
    ("TotalEquityGrossMinorityInterest", StatementKind::BalanceSheet),
    ("OrdinarySharesNumber", StatementKind::BalanceSheet),
    ("FreeCashFlow", StatementKind::CashFlow),
];

const ANNUAL_PREFIX: &str = "annual";
const TRAILING_PREFIX: &str = "trailing";

/// Comma-separated `type` query parameter. Balance sheet lines have no
/// trailing variant.
pub fn type_param(include_trailing: bool) -> String {
    let mut types = Vec::new();
    for (line, kind) in LINE_ITEMS {
        types.push(format!("{}{}", ANNUAL_PREFIX, line));
        if include_trailing && *kind != StatementKind::BalanceSheet {
            types.push(format!("{}{}", TRAILING_PREFIX, line));
        }
    }
    types.join(",")
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Vec<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesEntry {
    as_of_date: String,
    #[serde(default)]
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: Option<f64>,
}

/// The three statements, in income / balance sheet / cash flow order
#[derive(Debug, Clone)]
pub struct Statements {
    pub income: Statement,
    pub balance_sheet: Statement,
    pub cash_flow: Statement,
}

impl Statements {
    pub fn is_empty(&self) -> bool {
        self.income.is_empty() && self.balance_sheet.is_empty() && self.cash_flow.is_empty()
    }
}

type Columns = BTreeMap<String, BTreeMap<ColumnKey, Option<f64>>>;

/// Column ordering: trailing first, then fiscal periods newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ColumnKey {
    Trailing,
    Fiscal(Reverse<NaiveDate>),
}

impl ColumnKey {
    fn period(&self) -> Period {
        match self {
            ColumnKey::Trailing => Period::Trailing,
            ColumnKey::Fiscal(Reverse(date)) => Period::Fiscal(*date),
        }
    }
}

fn statement_kind(line: &str) -> Option<StatementKind> {
    LINE_ITEMS
        .iter()
        .find(|(name, _)| *name == line)
        .map(|(_, kind)| *kind)
}

/// Split `annualTotalRevenue` into (is_trailing, "TotalRevenue").
fn split_type(type_name: &str) -> Option<(bool, &str)> {
    if let Some(line) = type_name.strip_prefix(ANNUAL_PREFIX) {
        Some((false, line))
    } else {
        type_name.strip_prefix(TRAILING_PREFIX).map(|line| (true, line))
    }
}

/// Parse a fundamentals-timeseries payload into statements.
///
/// Every line of a statement is aligned on the statement's full set of
/// columns, so a line that was not reported for the newest period has an
/// empty first column rather than an older value.
pub fn parse_timeseries(body: &str) -> Result<Statements, AnalysisError> {
    let response: TimeseriesResponse = serde_json::from_str(body)
        .map_err(|e| AnalysisError::InvalidData(format!("timeseries payload: {}", e)))?;

    if let Some(error) = response.timeseries.error.filter(|e| !e.is_null()) {
        return Err(AnalysisError::ApiError(format!("timeseries error: {}", error)));
    }

    let mut per_kind: BTreeMap<StatementKind, Columns> = BTreeMap::new();

    for result in &response.timeseries.result {
        let Some(type_name) = result
            .get("meta")
            .and_then(|m| m.get("type"))
            .and_then(|t| t.as_array())
            .and_then(|t| t.first())
            .and_then(|t| t.as_str())
        else {
            continue;
        };
        let Some((trailing, line)) = split_type(type_name) else {
            continue;
        };
        let Some(kind) = statement_kind(line) else {
            tracing::debug!("Ignoring unrequested timeseries type {}", type_name);
            continue;
        };
        let Some(raw_entries) = result.get(type_name) else {
            continue;
        };

        let entries: Vec<Option<TimeseriesEntry>> = serde_json::from_value(raw_entries.clone())
            .map_err(|e| AnalysisError::InvalidData(format!("{}: {}", type_name, e)))?;

        let columns = per_kind
            .entry(kind)
            .or_default()
            .entry(line.to_string())
            .or_default();

        let mut latest_trailing: Option<(NaiveDate, Option<f64>)> = None;
        for entry in entries.into_iter().flatten() {
            let date = match NaiveDate::parse_from_str(&entry.as_of_date, "%Y-%m-%d") {
                Ok(date) => date,
                Err(e) => {
                    tracing::warn!("Skipping {} entry with bad date {:?}: {}", type_name, entry.as_of_date, e);
                    continue;
                }
            };
            let value = entry.reported_value.and_then(|v| v.raw).filter(|v| v.is_finite());
            if trailing {
                if latest_trailing.map_or(true, |(d, _)| date > d) {
                    latest_trailing = Some((date, value));
                }
            } else {
                columns.insert(ColumnKey::Fiscal(Reverse(date)), value);
            }
        }
        if let Some((_, value)) = latest_trailing {
            columns.insert(ColumnKey::Trailing, value);
        }
    }

    let mut build = |kind: StatementKind| {
        let columns = per_kind.remove(&kind).unwrap_or_default();
        aligned_statement(kind, columns)
    };

    Ok(Statements {
        income: build(StatementKind::Income),
        balance_sheet: build(StatementKind::BalanceSheet),
        cash_flow: build(StatementKind::CashFlow),
    })
}

fn aligned_statement(kind: StatementKind, lines: Columns) -> Statement {
    let all_columns: BTreeSet<ColumnKey> = lines
        .values()
        .flat_map(|cols| cols.keys().copied())
        .collect();

    let mut statement = Statement::new(kind);
    for (line, values) in lines {
        if values.is_empty() {
            continue;
        }
        let series = all_columns
            .iter()
            .map(|col| PeriodValue {
                period: col.period(),
                value: values.get(col).copied().flatten(),
            })
            .collect();
        statement.insert(&line, LineSeries::new(series));
    }
    statement
}

/// Last non-null close of a chart payload, falling back to the quoted
/// regular market price.
pub fn parse_chart_close(body: &str) -> Option<f64> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let result = json
        .get("chart")?
        .get("result")?
        .as_array()?
        .first()?;

    let last_close = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|q| q.first())
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .and_then(|closes| closes.iter().rev().find_map(|c| c.as_f64()));

    last_close.or_else(|| {
        result
            .get("meta")
            .and_then(|m| m.get("regularMarketPrice"))
            .and_then(|p| p.as_f64())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
      "timeseries": {
        "result": [
          {
            "meta": {"symbol": ["NVDA"], "type": ["annualTotalRevenue"]},
            "timestamp": [1643587200, 1675123200, 1706659200],
            "annualTotalRevenue": [
              {"asOfDate": "2022-01-31", "periodType": "12M", "currencyCode": "USD", "reportedValue": {"raw": 26914000000.0, "fmt": "26.91B"}},
              {"asOfDate": "2023-01-31", "periodType": "12M", "currencyCode": "USD", "reportedValue": {"raw": 26974000000.0, "fmt": "26.97B"}},
              null,
              {"asOfDate": "2024-01-31", "periodType": "12M", "currencyCode": "USD", "reportedValue": {"raw": 60922000000.0, "fmt": "60.92B"}}
            ]
          },
          {
            "meta": {"symbol": ["NVDA"], "type": ["trailingTotalRevenue"]},
            "timestamp": [1714435200],
            "trailingTotalRevenue": [
              {"asOfDate": "2024-04-30", "periodType": "TTM", "currencyCode": "USD", "reportedValue": {"raw": 79774000000.0, "fmt": "79.77B"}}
            ]
          },
          {
            "meta": {"symbol": ["NVDA"], "type": ["annualNetIncome"]},
            "timestamp": [1675123200],
            "annualNetIncome": [
              {"asOfDate": "2023-01-31", "periodType": "12M", "currencyCode": "USD", "reportedValue": {"raw": 4368000000.0, "fmt": "4.37B"}}
            ]
          },
          {
            "meta": {"symbol": ["NVDA"], "type": ["annualStockholdersEquity"]},
            "timestamp": [1706659200],
            "annualStockholdersEquity": [
              {"asOfDate": "2024-01-31", "periodType": "12M", "currencyCode": "USD", "reportedValue": {"raw": 42978000000.0, "fmt": "42.98B"}}
            ]
          },
          {
            "meta": {"symbol": ["NVDA"], "type": ["annualFreeCashFlow"]}
          }
        ],
        "error": null
      }
    }"#;

    #[test]
    fn test_type_param() {
        let annual_only = type_param(false);
        assert!(annual_only.contains("annualTotalRevenue"));
        assert!(!annual_only.contains("trailing"));

        let with_trailing = type_param(true);
        assert!(with_trailing.contains("trailingFreeCashFlow"));
        assert!(!with_trailing.contains("trailingTotalAssets"));
    }

    #[test]
    fn test_parse_orders_newest_first_with_trailing_in_front() {
        let statements = parse_timeseries(PAYLOAD).unwrap();
        let revenue = statements.income.line("TotalRevenue").unwrap();

        assert_eq!(revenue.len(), 4);
        assert_eq!(revenue.0[0].period, Period::Trailing);
        assert_eq!(revenue.0[0].value, Some(79_774_000_000.0));
        assert_eq!(
            revenue.0[1].period,
            Period::Fiscal(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert_eq!(revenue.0[3].value, Some(26_914_000_000.0));
    }

    #[test]
    fn test_parse_aligns_lines_on_statement_columns() {
        let statements = parse_timeseries(PAYLOAD).unwrap();
        let net_income = statements.income.line("NetIncome").unwrap();

        // trailing + 3 fiscal columns, only fiscal 2023 reported
        assert_eq!(net_income.len(), 4);
        assert_eq!(net_income.latest(), None);
        assert_eq!(net_income.present().len(), 1);
    }

    #[test]
    fn test_parse_splits_statements() {
        let statements = parse_timeseries(PAYLOAD).unwrap();
        assert_eq!(statements.balance_sheet.latest("StockholdersEquity"), Some(42_978_000_000.0));
        assert!(statements.cash_flow.is_empty());
        assert!(!statements.is_empty());
    }

    #[test]
    fn test_parse_reports_api_error() {
        let body = r#"{"timeseries": {"result": [], "error": {"code": "Not Found"}}}"#;
        assert!(matches!(parse_timeseries(body), Err(AnalysisError::ApiError(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_timeseries("<html>"), Err(AnalysisError::InvalidData(_))));
    }

    #[test]
    fn test_parse_chart_close() {
        let body = r#"{"chart": {"result": [{
            "meta": {"regularMarketPrice": 181.5},
            "timestamp": [1, 2, 3],
            "indicators": {"quote": [{"close": [178.2, 180.9, null]}]}
        }], "error": null}}"#;
        assert_eq!(parse_chart_close(body), Some(180.9));
    }

    #[test]
    fn test_parse_chart_close_falls_back_to_meta() {
        let body = r#"{"chart": {"result": [{
            "meta": {"regularMarketPrice": 181.5},
            "indicators": {"quote": [{}]}
        }], "error": null}}"#;
        assert_eq!(parse_chart_close(body), Some(181.5));

        let missing = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        assert_eq!(parse_chart_close(missing), None);
    }
}
