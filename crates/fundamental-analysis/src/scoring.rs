use analysis_core::{InvestmentScore, RatioSet, Recommendation, ScoreContribution};

/// Growth rate above which a metric counts toward the synergy bonus
const SYNERGY_THRESHOLD: f64 = 20.0;

fn above(value: Option<f64>, threshold: f64) -> bool {
    value.map_or(false, |v| v > threshold)
}

fn below(value: Option<f64>, threshold: f64) -> bool {
    value.map_or(false, |v| v < threshold)
}

/// Non-zero terms of the score, in rule order.
pub fn contributions(ratios: &RatioSet) -> Vec<ScoreContribution> {
    let mut terms: Vec<(&'static str, f64)> = Vec::new();

    if let Some(pe) = ratios.pe {
        if pe < 20.0 {
            terms.push(("P/E below 20", 1.5));
        } else if pe > 30.0 {
            terms.push(("P/E above 30", -1.0));
        }
    }

    if let Some(pb) = ratios.pb {
        if pb < 5.0 {
            terms.push(("P/B below 5", 1.5));
        } else if pb > 10.0 {
            terms.push(("P/B above 10", -1.0));
        }
    }

    if above(ratios.roe, 0.15) {
        terms.push(("ROE above 15%", 2.5));
    }
    if above(ratios.roa, 0.05) {
        terms.push(("ROA above 5%", 1.5));
    }

    // 3 <= x <= 5 scores nothing
    if let Some(leverage) = ratios.debt_to_ebitda {
        if leverage < 1.0 {
            terms.push(("Debt/EBITDA below 1", 1.0));
        } else if leverage < 3.0 {
            terms.push(("Debt/EBITDA below 3", 2.0));
        } else if leverage > 5.0 {
            terms.push(("Debt/EBITDA above 5", -2.0));
        }
    }

    if above(ratios.current_ratio, 1.5) {
        terms.push(("Current ratio above 1.5", 1.0));
    }
    if above(ratios.fcf_bn, 0.0) {
        terms.push(("Positive free cash flow", 2.0));
    }

    if above(ratios.eps_growth, 5.0) {
        terms.push(("EPS growth above 5%", 3.0));
    }
    if above(ratios.revenue_growth, 10.0) {
        terms.push(("Revenue growth above 10%", 3.0));
    }
    if above(ratios.fcf_growth, 15.0) {
        terms.push(("FCF growth above 15%", 2.0));
    }

    if below(ratios.eps, 0.0) {
        terms.push(("Negative EPS", -2.0));
    }

    let strong_growth = [ratios.eps_growth, ratios.revenue_growth, ratios.fcf_growth]
        .into_iter()
        .filter(|g| above(*g, SYNERGY_THRESHOLD))
        .count();
    if strong_growth >= 2 {
        terms.push(("Growth synergy", 1.0));
    }

    if below(ratios.revenue_growth, 0.0) && below(ratios.fcf_growth, 0.0) {
        terms.push(("Revenue and FCF both declining", -2.0));
    }

    terms
        .into_iter()
        .map(|(rule, points)| ScoreContribution { rule, points })
        .collect()
}

/// Weighted point total clamped to [0, 20].
pub fn score(ratios: &RatioSet) -> InvestmentScore {
    let total: f64 = contributions(ratios).iter().map(|c| c.points).sum();
    InvestmentScore::clamped(total)
}

pub fn recommend(score: InvestmentScore) -> Recommendation {
    Recommendation::from_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn points_for(ratios: &RatioSet, rule: &str) -> Option<f64> {
        contributions(ratios)
            .into_iter()
            .find(|c| c.rule == rule)
            .map(|c| c.points)
    }

    #[test]
    fn test_empty_scores_zero() {
        let ratios = RatioSet::default();
        assert!(contributions(&ratios).is_empty());
        assert_eq!(score(&ratios).value(), 0.0);
        assert_eq!(recommend(score(&ratios)), Recommendation::Risky);
    }

    #[test]
    fn test_valuation_tiers() {
        let cheap = RatioSet { pe: Some(12.0), pb: Some(3.0), ..RatioSet::default() };
        assert_relative_eq!(score(&cheap).value(), 3.0);

        let fair = RatioSet { pe: Some(25.0), pb: Some(7.0), ..RatioSet::default() };
        assert!(contributions(&fair).is_empty());

        let rich = RatioSet { pe: Some(45.0), pb: Some(12.0), ..RatioSet::default() };
        assert_eq!(points_for(&rich, "P/E above 30"), Some(-1.0));
        assert_eq!(points_for(&rich, "P/B above 10"), Some(-1.0));
        assert_eq!(score(&rich).value(), 0.0);
    }

    #[test]
    fn test_zero_valuation_still_scores() {
        let ratios = RatioSet { pe: Some(0.0), debt_to_ebitda: Some(0.0), ..RatioSet::default() };
        assert_eq!(points_for(&ratios, "P/E below 20"), Some(1.5));
        assert_eq!(points_for(&ratios, "Debt/EBITDA below 1"), Some(1.0));
    }

    #[test]
    fn test_leverage_tiers() {
        let tier = |x: f64| {
            let ratios = RatioSet { debt_to_ebitda: Some(x), ..RatioSet::default() };
            contributions(&ratios).iter().map(|c| c.points).sum::<f64>()
        };
        assert_eq!(tier(0.5), 1.0);
        assert_eq!(tier(1.0), 2.0);
        assert_eq!(tier(2.5), 2.0);
        assert_eq!(tier(3.0), 0.0);
        assert_eq!(tier(5.0), 0.0);
        assert_eq!(tier(6.0), -2.0);
    }

    #[test]
    fn test_fcf_growth_scores_above_fifteen_only() {
        let moderate = RatioSet { fcf_growth: Some(12.0), ..RatioSet::default() };
        assert_eq!(points_for(&moderate, "FCF growth above 15%"), None);

        let strong = RatioSet { fcf_growth: Some(16.0), ..RatioSet::default() };
        assert_eq!(points_for(&strong, "FCF growth above 15%"), Some(2.0));
    }

    #[test]
    fn test_negative_eps_penalty() {
        let ratios = RatioSet { eps: Some(-0.4), ..RatioSet::default() };
        assert_eq!(points_for(&ratios, "Negative EPS"), Some(-2.0));
        assert_eq!(score(&ratios).value(), 0.0);
    }

    #[test]
    fn test_growth_synergy_applied_once() {
        let ratios = RatioSet {
            eps_growth: Some(25.0),
            revenue_growth: Some(25.0),
            fcf_growth: Some(25.0),
            ..RatioSet::default()
        };
        let synergy: Vec<_> = contributions(&ratios)
            .into_iter()
            .filter(|c| c.rule == "Growth synergy")
            .collect();
        assert_eq!(synergy.len(), 1);
        assert_eq!(synergy[0].points, 1.0);
        // 3 + 3 + 2 + 1
        assert_relative_eq!(score(&ratios).value(), 9.0);
    }

    #[test]
    fn test_growth_synergy_needs_two_metrics() {
        let ratios = RatioSet {
            eps_growth: Some(25.0),
            revenue_growth: Some(15.0),
            ..RatioSet::default()
        };
        assert_eq!(points_for(&ratios, "Growth synergy"), None);
    }

    #[test]
    fn test_double_decline_penalty() {
        let ratios = RatioSet {
            revenue_growth: Some(-5.0),
            fcf_growth: Some(-5.0),
            pe: Some(10.0),
            pb: Some(1.0),
            ..RatioSet::default()
        };
        assert_eq!(points_for(&ratios, "Revenue and FCF both declining"), Some(-2.0));
        assert_relative_eq!(score(&ratios).value(), 1.0);

        let one_sided = RatioSet { revenue_growth: Some(-5.0), ..RatioSet::default() };
        assert_eq!(points_for(&one_sided, "Revenue and FCF both declining"), None);
    }

    #[test]
    fn test_maximum_profile_recommendation() {
        let ratios = RatioSet {
            eps: Some(5.0),
            pe: Some(15.0),
            pb: Some(3.0),
            roe: Some(0.3),
            roa: Some(0.12),
            ebitda_bn: Some(50.0),
            debt_to_ebitda: Some(2.0),
            current_ratio: Some(2.5),
            fcf_bn: Some(30.0),
            eps_growth: Some(40.0),
            revenue_growth: Some(35.0),
            fcf_growth: Some(30.0),
        };
        // 1.5 + 1.5 + 2.5 + 1.5 + 2 + 1 + 2 + 3 + 3 + 2 + 1
        assert_relative_eq!(score(&ratios).value(), 20.0);
        assert_eq!(recommend(score(&ratios)), Recommendation::HighQuality);
    }
}
