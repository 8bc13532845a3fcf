use async_trait::async_trait;
use crate::{AnalysisError, FundamentalReport, RawFinancials};

/// Source of statement snapshots for a ticker
#[async_trait]
pub trait FinancialsProvider: Send + Sync {
    async fn fetch_financials(&self, symbol: &str) -> Result<RawFinancials, AnalysisError>;
}

/// Turns a snapshot into ratios, labels, score and recommendation.
///
/// Implementations never fail: missing inputs surface as absent ratios.
pub trait FundamentalScorer: Send + Sync {
    fn evaluate(&self, raw: &RawFinancials) -> FundamentalReport;
}
