//! Policy valuation engine
//!
//! Stages, leaves first:
//! - [`CashFlowProjector`]: risk-adjusted discount rate and DCF of remaining cash flows
//! - [`RiskProfiler`]: composite risk score and grade
//! - [`ReturnAnalyzer`]: holder and buyer IRRs at a candidate price
//! - [`PricingEngine`]: recommended price under the surrender-value floor
//! - [`ValuationOrchestrator`]: runs the stages with progress and cancellation

mod cashflows;
mod irr;
mod listing;
mod orchestrator;
mod pricing;
mod returns;
mod risk;

pub use cashflows::{growth_rate, CashFlowProjector, CashflowYear, DcfResult, ANNUAL_BONUS_RATE, DCF_CONFIDENCE};
pub use irr::{npv_at_rate, solve_irr};
pub use listing::{quote_listing, ListingQuote};
pub use orchestrator::{
    CancellationToken, LogObserver, ProgressEvent, ProgressObserver, ValuationOrchestrator,
    ValuationOutcome, ValuationStage,
};
pub use pricing::{PriceQuote, PricingEngine, RecommendationTier, ValuationResult};
pub use returns::{IrrAnalysis, ReturnAnalyzer, ATTRACTIVENESS_HURDLE};
pub use risk::{ConfidenceInterval, RiskFactors, RiskGrade, RiskProfiler, RiskResult, RiskWeights, RISK_WEIGHTS};

use chrono::NaiveDate;

use crate::assumptions::MarketAssumptions;
use crate::error::Result;
use crate::policy::PolicyRecord;

/// Value a policy as of today, with default assumptions when none are given
pub fn valuate(policy: &PolicyRecord, assumptions: Option<&MarketAssumptions>) -> Result<ValuationResult> {
    valuate_as_of(policy, assumptions, chrono::Local::now().date_naive())
}

/// Value a policy as of a fixed date; identical inputs give identical results
pub fn valuate_as_of(
    policy: &PolicyRecord,
    assumptions: Option<&MarketAssumptions>,
    as_of: NaiveDate,
) -> Result<ValuationResult> {
    let assumptions = assumptions.cloned().unwrap_or_default();
    ValuationOrchestrator::new(policy.clone(), assumptions, as_of)
        .run()
        .into_result()
}
