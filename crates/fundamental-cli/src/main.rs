//! fundamental-analysis: fetch one ticker's statements from Yahoo Finance,
//! compute valuation and profitability ratios, and print an investment score.
//!
//! Usage:
//!   cargo run -p fundamental-cli -- NVDA
//!   cargo run -p fundamental-cli -- AAPL --ttm --explain
//!   cargo run -p fundamental-cli -- MSFT --json

use analysis_core::{FinancialsProvider, FundamentalScorer, RawFinancials};
use anyhow::Result;
use clap::Parser;
use fundamental_analysis::FundamentalAnalysisEngine;
use yahoo_client::YahooClient;

mod config;
mod render;

use config::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    config::init_logging();

    let client = YahooClient::new(cli.yahoo_config());
    let engine = FundamentalAnalysisEngine::new();

    let output = run(&cli, &client, &engine).await?;
    print!("{}", output);
    Ok(())
}

/// Fetch, score and render. A failed fetch is reported as unavailable data,
/// never as an error.
async fn run(
    cli: &Cli,
    provider: &dyn FinancialsProvider,
    scorer: &dyn FundamentalScorer,
) -> Result<String> {
    let symbol = cli.symbol();
    tracing::info!("Analyzing {}", symbol);

    let raw = match provider.fetch_financials(&symbol).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Data retrieval error for {}: {}", symbol, e);
            RawFinancials::empty(&symbol)
        }
    };

    let mut out = String::new();
    if !cli.json {
        out.push_str(&render::banner(&symbol));
        out.push('\n');
    }

    if raw.is_empty() {
        if cli.json {
            out.push_str(&serde_json::to_string_pretty(&serde_json::json!({
                "symbol": symbol,
                "error": render::UNAVAILABLE_MESSAGE,
            }))?);
            out.push('\n');
        } else {
            out.push_str(render::UNAVAILABLE_MESSAGE);
            out.push('\n');
        }
        return Ok(out);
    }

    let report = scorer.evaluate(&raw);
    tracing::info!(
        "{}: score {} ({:?})",
        symbol,
        report.score,
        report.recommendation
    );

    if cli.json {
        out.push_str(&serde_json::to_string_pretty(&report)?);
        out.push('\n');
    } else {
        out.push_str(&render::table(&report));
        if cli.explain {
            out.push_str(&render::explanation(&report));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::AnalysisError;
    use async_trait::async_trait;

    struct StaticProvider(Option<RawFinancials>);

    #[async_trait]
    impl FinancialsProvider for StaticProvider {
        async fn fetch_financials(&self, symbol: &str) -> Result<RawFinancials, AnalysisError> {
            self.0
                .clone()
                .ok_or_else(|| AnalysisError::ApiError(format!("no data for {}", symbol)))
        }
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["fundamental-analysis"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn snapshot() -> RawFinancials {
        RawFinancials {
            current_price: Some(50.0),
            diluted_eps: Some(5.0),
            net_income: Some(20.0),
            total_assets: Some(100.0),
            ..RawFinancials::empty("ACME")
        }
    }

    #[tokio::test]
    async fn test_fetch_error_reports_unavailable() {
        let provider = StaticProvider(None);
        let out = run(&cli(&["ACME"]), &provider, &FundamentalAnalysisEngine::new())
            .await
            .unwrap();
        assert!(out.contains("Fundamental Analysis - ACME"));
        assert!(out.contains("Unable to retrieve financial data."));
        assert!(!out.contains("Final Recommendation"));
    }

    #[tokio::test]
    async fn test_table_output() {
        let provider = StaticProvider(Some(snapshot()));
        let out = run(&cli(&["acme", "--explain"]), &provider, &FundamentalAnalysisEngine::new())
            .await
            .unwrap();
        assert!(out.contains("Reasonable valuation (<20)"));
        assert!(out.contains("Efficient use of assets (>5%)"));
        assert!(out.contains("Score breakdown:"));
        assert!(out.contains("3/20"));
    }

    #[tokio::test]
    async fn test_json_output() {
        let provider = StaticProvider(Some(snapshot()));
        let out = run(&cli(&["ACME", "--json"]), &provider, &FundamentalAnalysisEngine::new())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["symbol"], "ACME");
        assert_eq!(json["ratios"]["pe"], 10.0);
        assert_eq!(json["ratios"]["roa"], 0.2);
        assert_eq!(json["score"], 3.0);
        assert_eq!(json["recommendation"], "Risky");
        assert_eq!(json["interpretations"]["roa"], "Efficient use of assets (>5%)");
    }
}
