use analysis_core::{FundamentalReport, FundamentalScorer, RawFinancials};
use chrono::Utc;

pub mod interpret;
pub mod ratios;
pub mod scoring;


pub use interpret::interpret;
pub use ratios::compute;
pub use scoring::{contributions, recommend, score};

/// Chains ratio computation, interpretation and scoring for one snapshot.
pub struct FundamentalAnalysisEngine;

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, raw: &RawFinancials) -> FundamentalReport {
        let ratios = compute(raw);
        tracing::debug!(
            symbol = %raw.symbol,
            present = ratios.present_count(),
            "Computed ratios: {:?}",
            ratios
        );

        let interpretations = interpret(&ratios);
        let contributions = contributions(&ratios);
        let score = score(&ratios);
        let recommendation = recommend(score);

        tracing::debug!(
            symbol = %raw.symbol,
            score = score.value(),
            terms = contributions.len(),
            "Scored {:?}",
            recommendation
        );

        FundamentalReport {
            symbol: raw.symbol.clone(),
            generated_at: Utc::now(),
            ratios,
            interpretations,
            score,
            contributions,
            recommendation,
        }
    }
}

impl FundamentalScorer for FundamentalAnalysisEngine {
    fn evaluate(&self, raw: &RawFinancials) -> FundamentalReport {
        self.analyze(raw)
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
