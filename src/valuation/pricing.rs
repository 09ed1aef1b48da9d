//! Transfer pricing: combines DCF, risk and returns into one recommended price
//!
//! The recommended price is never below the surrender value plus the
//! configured minimum margin; a seller is always offered more than the issuer
//! would pay on surrender.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::cashflows::DcfResult;
use super::returns::{IrrAnalysis, ReturnAnalyzer};
use super::risk::RiskResult;
use crate::assumptions::MarketAssumptions;
use crate::error::Result;
use crate::policy::PolicyRecord;

/// Buyer recommendation derived from the platform-adjusted IRR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationTier {
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

impl RecommendationTier {
    /// IRR breakpoints, checked top-down; first match wins
    pub const BREAKPOINTS: [(f64, RecommendationTier); 3] = [
        (0.08, RecommendationTier::StrongBuy),
        (0.06, RecommendationTier::Buy),
        (0.04, RecommendationTier::Hold),
    ];

    pub fn from_irr(platform_adjusted_irr: f64) -> Self {
        Self::BREAKPOINTS
            .iter()
            .find(|(threshold, _)| platform_adjusted_irr >= *threshold)
            .map(|(_, tier)| *tier)
            .unwrap_or(RecommendationTier::Sell)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationTier::StrongBuy => "strong-buy",
            RecommendationTier::Buy => "buy",
            RecommendationTier::Hold => "hold",
            RecommendationTier::Sell => "sell",
        }
    }
}

/// Candidate price before return analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub surrender_value: f64,
    /// surrender_value * (1 + minimum_profit_margin)
    pub price_floor: f64,
    pub dcf_value: f64,
    pub risk_adjusted_value: f64,
    pub market_premium: f64,
    pub gross_value: f64,
    pub platform_fee_rate: f64,
    pub platform_fees: f64,
    pub net_value_to_buyer: f64,
    pub recommended_price: f64,
    /// True when the floor, not the buyer's net value, set the price
    pub floor_binding: bool,
}

/// Complete valuation of one policy; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub policy_id: Option<String>,
    pub currency: String,
    pub valuation_date: NaiveDate,

    pub recommended_price: f64,
    pub surrender_value: f64,
    pub dcf_value: f64,
    pub risk_adjusted_value: f64,
    pub market_premium: f64,
    pub platform_fees: f64,
    pub net_value_to_buyer: f64,
    /// recommended_price - surrender_value
    pub profit_above_surrender: f64,
    pub floor_binding: bool,

    pub risk_profile: RiskResult,
    pub irr_analysis: IrrAnalysis,

    /// Mean of DCF confidence and the risk profile's lower confidence bound
    pub confidence_score: f64,
    pub recommendation_tier: RecommendationTier,

    /// Full projection, kept for audit
    pub cash_flows: DcfResult,
}

/// Pricing policy of the marketplace
pub struct PricingEngine;

impl PricingEngine {
    /// Compute the candidate price from projection and risk output
    pub fn quote(
        policy: &PolicyRecord,
        dcf: &DcfResult,
        risk: &RiskResult,
        assumptions: &MarketAssumptions,
    ) -> PriceQuote {
        let surrender_value = policy.accumulated_amount * (1.0 - assumptions.surrender_discount);
        let price_floor = surrender_value * (1.0 + assumptions.minimum_profit_margin);

        let risk_adjusted_value = dcf.present_value * (1.0 - risk.composite_score);
        let market_premium = risk_adjusted_value * assumptions.liquidity_premium;
        let gross_value = risk_adjusted_value + market_premium;
        let platform_fee_rate = assumptions.total_platform_fee_rate(policy.concierge_help);
        let platform_fees = gross_value * platform_fee_rate;
        let net_value_to_buyer = gross_value - platform_fees;

        let floor_binding = net_value_to_buyer < price_floor;
        let recommended_price = price_floor.max(net_value_to_buyer);

        if floor_binding {
            log::warn!(
                "net value {:.2} below floor {:.2}, pricing at floor",
                net_value_to_buyer,
                price_floor
            );
        }

        PriceQuote {
            surrender_value,
            price_floor,
            dcf_value: dcf.present_value,
            risk_adjusted_value,
            market_premium,
            gross_value,
            platform_fee_rate,
            platform_fees,
            net_value_to_buyer,
            recommended_price,
            floor_binding,
        }
    }

    /// Assemble the final result once returns have been analysed at the quoted price
    pub fn finalize(
        policy: &PolicyRecord,
        valuation_date: NaiveDate,
        dcf: DcfResult,
        risk: RiskResult,
        quote: PriceQuote,
        irr: IrrAnalysis,
    ) -> ValuationResult {
        let confidence_score = (dcf.confidence + risk.confidence_interval.lower) / 2.0;
        let recommendation_tier = RecommendationTier::from_irr(irr.platform_adjusted_irr);

        ValuationResult {
            policy_id: policy.policy_id.clone(),
            currency: policy.currency.clone(),
            valuation_date,
            recommended_price: quote.recommended_price,
            surrender_value: quote.surrender_value,
            dcf_value: quote.dcf_value,
            risk_adjusted_value: quote.risk_adjusted_value,
            market_premium: quote.market_premium,
            platform_fees: quote.platform_fees,
            net_value_to_buyer: quote.net_value_to_buyer,
            profit_above_surrender: quote.recommended_price - quote.surrender_value,
            floor_binding: quote.floor_binding,
            risk_profile: risk,
            irr_analysis: irr,
            confidence_score,
            recommendation_tier,
            cash_flows: dcf,
        }
    }

    /// Quote, analyse returns at the quoted price, and finalize
    pub fn price(
        policy: &PolicyRecord,
        valuation_date: NaiveDate,
        dcf: DcfResult,
        risk: RiskResult,
        assumptions: &MarketAssumptions,
    ) -> Result<ValuationResult> {
        let quote = Self::quote(policy, &dcf, &risk, assumptions);
        let irr = ReturnAnalyzer::analyze(policy, &dcf, quote.recommended_price, assumptions)?;
        Ok(Self::finalize(policy, valuation_date, dcf, risk, quote, irr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Insurer, PolicyTerm, PolicyType};
    use crate::valuation::{CashFlowProjector, RiskProfiler};
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn as_of() -> NaiveDate {
        date(2025, 1, 1)
    }

    fn endowment() -> PolicyRecord {
        PolicyRecord::new(
            PolicyType::Endowment,
            Insurer::from_name("AIA Hong Kong"),
            50_000.0,
            8,
            PolicyTerm::Years(25),
            520_000.0,
            date(2016, 3, 15),
        )
    }

    fn inputs(policy: &PolicyRecord, assumptions: &MarketAssumptions) -> (DcfResult, RiskResult) {
        let dcf = CashFlowProjector::new(as_of()).project(policy, assumptions).unwrap();
        let risk = RiskProfiler::new(as_of()).assess(policy, assumptions);
        (dcf, risk)
    }

    #[test]
    fn test_tier_breakpoints() {
        assert_eq!(RecommendationTier::from_irr(0.12), RecommendationTier::StrongBuy);
        assert_eq!(RecommendationTier::from_irr(0.08), RecommendationTier::StrongBuy);
        assert_eq!(RecommendationTier::from_irr(0.0799), RecommendationTier::Buy);
        assert_eq!(RecommendationTier::from_irr(0.06), RecommendationTier::Buy);
        assert_eq!(RecommendationTier::from_irr(0.04), RecommendationTier::Hold);
        assert_eq!(RecommendationTier::from_irr(0.0399), RecommendationTier::Sell);
        assert_eq!(RecommendationTier::from_irr(-0.05), RecommendationTier::Sell);
    }

    #[test]
    fn test_quote_components() {
        let assumptions = MarketAssumptions::default();
        let policy = endowment();
        let (dcf, risk) = inputs(&policy, &assumptions);
        let quote = PricingEngine::quote(&policy, &dcf, &risk, &assumptions);

        assert_relative_eq!(quote.surrender_value, 442_000.0, max_relative = 1e-12);
        assert_relative_eq!(quote.price_floor, 486_200.0, max_relative = 1e-12);
        assert_relative_eq!(quote.risk_adjusted_value, dcf.present_value * (1.0 - risk.composite_score));
        assert_relative_eq!(quote.market_premium, quote.risk_adjusted_value * 0.02);
        assert_relative_eq!(quote.platform_fees, quote.gross_value * 0.025, max_relative = 1e-12);
        assert_relative_eq!(quote.net_value_to_buyer, 497_771.63, max_relative = 1e-6);
        assert!(!quote.floor_binding);
        assert_eq!(quote.recommended_price, quote.net_value_to_buyer);
    }

    #[test]
    fn test_floor_binds_when_net_value_is_low() {
        let assumptions = MarketAssumptions {
            minimum_profit_margin: 0.25,
            ..Default::default()
        };
        let policy = endowment();
        let (dcf, risk) = inputs(&policy, &assumptions);
        let quote = PricingEngine::quote(&policy, &dcf, &risk, &assumptions);

        assert!(quote.floor_binding);
        assert_eq!(quote.recommended_price, quote.price_floor);
        assert!(quote.recommended_price > quote.surrender_value);
    }

    #[test]
    fn test_higher_risk_lowers_risk_adjusted_value() {
        let assumptions = MarketAssumptions::default();
        let policy = endowment();
        let (dcf, risk) = inputs(&policy, &assumptions);
        let mut riskier = risk.clone();
        riskier.composite_score += 0.1;

        let base = PricingEngine::quote(&policy, &dcf, &risk, &assumptions);
        let stressed = PricingEngine::quote(&policy, &dcf, &riskier, &assumptions);
        assert!(stressed.risk_adjusted_value < base.risk_adjusted_value);
    }

    #[test]
    fn test_price_populates_result() {
        let assumptions = MarketAssumptions::default();
        let policy = endowment();
        let (dcf, risk) = inputs(&policy, &assumptions);
        let lower_bound = risk.confidence_interval.lower;
        let result = PricingEngine::price(&policy, as_of(), dcf, risk, &assumptions).unwrap();

        assert_eq!(result.irr_analysis.target_price, result.recommended_price);
        assert_relative_eq!(
            result.profit_above_surrender,
            result.recommended_price - result.surrender_value
        );
        assert_relative_eq!(result.confidence_score, (0.85 + lower_bound) / 2.0);
        assert_eq!(
            result.recommendation_tier,
            RecommendationTier::from_irr(result.irr_analysis.platform_adjusted_irr)
        );
        assert_eq!(result.valuation_date, as_of());
        assert_eq!(result.currency, "USD");
    }

    #[test]
    fn test_tier_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&RecommendationTier::StrongBuy).unwrap(),
            "\"strong-buy\""
        );
    }
}
