//! Return analysis for the original holder and a prospective buyer

use serde::{Deserialize, Serialize};

use super::cashflows::DcfResult;
use super::irr::solve_irr;
use crate::assumptions::MarketAssumptions;
use crate::error::{Result, ValuationError};
use crate::policy::PolicyRecord;

/// Return above the risk-free rate a buyer needs before a deal is flagged attractive
pub const ATTRACTIVENESS_HURDLE: f64 = 0.02;

/// IRR metrics at a candidate price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrAnalysis {
    /// Price the analysis was run at
    pub target_price: f64,

    /// Growth rate of the holder's premiums into the maturity value;
    /// None when no premiums have been paid
    pub original_irr: Option<f64>,

    /// Buyer's annualised return from price to maturity value
    pub buyer_irr: f64,

    /// Buyer's return after the fee stack is taken from the maturity value
    pub platform_adjusted_irr: f64,

    /// platform_adjusted_irr - risk-free rate
    pub excess_return: f64,

    /// excess_return / market volatility
    pub sharpe_ratio: f64,

    /// IRR of the full buyer schedule (price, bonuses, maturity)
    pub cashflow_irr: Option<f64>,

    /// Advisory only; never blocks a valuation
    pub is_attractive: bool,
}

/// Computes return metrics at a given price
pub struct ReturnAnalyzer;

impl ReturnAnalyzer {
    pub fn analyze(
        policy: &PolicyRecord,
        dcf: &DcfResult,
        target_price: f64,
        assumptions: &MarketAssumptions,
    ) -> Result<IrrAnalysis> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(ValuationError::InvalidPrice { price: target_price });
        }

        let total_term = policy.total_term.years_or(assumptions.lifetime_horizon_years).max(1);
        let remaining = f64::from(dcf.remaining_years.max(1));
        let maturity_value = dcf.maturity_value;
        let fee_rate = assumptions.total_platform_fee_rate(policy.concierge_help);

        let original_irr = (dcf.total_investment > 0.0)
            .then(|| annualized_growth(dcf.total_investment, maturity_value, f64::from(total_term)));
        let buyer_irr = annualized_growth(target_price, maturity_value, remaining);
        let platform_adjusted_irr =
            annualized_growth(target_price, maturity_value * (1.0 - fee_rate), remaining);

        let excess_return = platform_adjusted_irr - assumptions.risk_free_rate;
        let sharpe_ratio = excess_return / assumptions.market_volatility;
        let is_attractive = platform_adjusted_irr > assumptions.risk_free_rate + ATTRACTIVENESS_HURDLE;

        let mut schedule = Vec::with_capacity(dcf.schedule.len() + 1);
        schedule.push(-target_price);
        schedule.extend(dcf.schedule.iter().map(|row| row.cash_flow));
        let cashflow_irr = solve_irr(&schedule);

        log::debug!(
            "returns at {:.2}: buyer {:.4}, platform-adjusted {:.4}, attractive {}",
            target_price,
            buyer_irr,
            platform_adjusted_irr,
            is_attractive
        );

        Ok(IrrAnalysis {
            target_price,
            original_irr,
            buyer_irr,
            platform_adjusted_irr,
            excess_return,
            sharpe_ratio,
            cashflow_irr,
            is_attractive,
        })
    }
}

/// (end / start)^(1/years) - 1
fn annualized_growth(start: f64, end: f64, years: f64) -> f64 {
    (end / start).powf(1.0 / years) - 1.0
}
