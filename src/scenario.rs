//! Scenario runner for batch and sensitivity valuations
//!
//! Holds one set of base assumptions and a valuation date, then values many
//! policies or many assumption variants without reloading anything.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assumptions::MarketAssumptions;
use crate::error::Result;
use crate::policy::PolicyRecord;
use crate::valuation::{valuate_as_of, ValuationResult};

/// A single assumption to move in a sensitivity run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionShift {
    RiskFreeRate,
    SurrenderDiscount,
    LiquidityPremium,
    PlatformFeeRate,
    MarketVolatility,
    MinimumProfitMargin,
}

impl AssumptionShift {
    /// Copy of `base` with this assumption replaced by `value`
    pub fn apply(&self, base: &MarketAssumptions, value: f64) -> MarketAssumptions {
        let mut shifted = base.clone();
        match self {
            AssumptionShift::RiskFreeRate => shifted.risk_free_rate = value,
            AssumptionShift::SurrenderDiscount => shifted.surrender_discount = value,
            AssumptionShift::LiquidityPremium => shifted.liquidity_premium = value,
            AssumptionShift::PlatformFeeRate => shifted.platform_fee_rate = value,
            AssumptionShift::MarketVolatility => shifted.market_volatility = value,
            AssumptionShift::MinimumProfitMargin => shifted.minimum_profit_margin = value,
        }
        shifted
    }
}

/// One point of a sensitivity sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityPoint {
    pub shift: AssumptionShift,
    pub value: f64,
    pub result: std::result::Result<ValuationResult, crate::error::ErrorReport>,
}

/// Pre-loaded runner for repeated valuations
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(as_of);
/// let sweep = runner.sensitivity(&policy, AssumptionShift::RiskFreeRate, &[0.03, 0.045, 0.06]);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_assumptions: MarketAssumptions,
    as_of: NaiveDate,
}

impl ScenarioRunner {
    /// Runner with default assumptions
    pub fn new(as_of: NaiveDate) -> Self {
        Self::with_assumptions(MarketAssumptions::default(), as_of)
    }

    pub fn with_assumptions(assumptions: MarketAssumptions, as_of: NaiveDate) -> Self {
        Self {
            base_assumptions: assumptions,
            as_of,
        }
    }

    /// Value one policy under the base assumptions
    pub fn run(&self, policy: &PolicyRecord) -> Result<ValuationResult> {
        valuate_as_of(policy, Some(&self.base_assumptions), self.as_of)
    }

    /// Value many policies in parallel; results keep input order
    pub fn run_batch(&self, policies: &[PolicyRecord]) -> Vec<Result<ValuationResult>> {
        policies.par_iter().map(|policy| self.run(policy)).collect()
    }

    /// Value one policy under several complete assumption sets
    pub fn run_scenarios(
        &self,
        policy: &PolicyRecord,
        scenarios: &[MarketAssumptions],
    ) -> Vec<Result<ValuationResult>> {
        scenarios
            .par_iter()
            .map(|assumptions| valuate_as_of(policy, Some(assumptions), self.as_of))
            .collect()
    }

    /// Sweep one assumption across `values`, holding the rest at base
    pub fn sensitivity(
        &self,
        policy: &PolicyRecord,
        shift: AssumptionShift,
        values: &[f64],
    ) -> Vec<SensitivityPoint> {
        values
            .par_iter()
            .map(|&value| {
                let assumptions = shift.apply(&self.base_assumptions, value);
                let result = valuate_as_of(policy, Some(&assumptions), self.as_of)
                    .map_err(|e| e.report());
                SensitivityPoint { shift, value, result }
            })
            .collect()
    }

    pub fn assumptions(&self) -> &MarketAssumptions {
        &self.base_assumptions
    }
}
