//! Composite risk scoring
//!
//! Five factors (issuer, product, time to maturity, premium concentration and
//! market volatility) blend into a score in [0, 1] with fixed weights.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assumptions::{company_risk, policy_type_risk, MarketAssumptions};
use crate::policy::PolicyRecord;

/// Factor weights of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub company: f64,
    pub policy: f64,
    pub time: f64,
    pub concentration: f64,
    pub market: f64,
}

impl RiskWeights {
    pub fn total(&self) -> f64 {
        self.company + self.policy + self.time + self.concentration + self.market
    }
}

/// Weights must sum to 1.0
pub const RISK_WEIGHTS: RiskWeights = RiskWeights {
    company: 0.30,
    policy: 0.25,
    time: 0.20,
    concentration: 0.10,
    market: 0.15,
};

/// Time risk never falls below this
pub const TIME_RISK_FLOOR: f64 = 0.05;
/// Time risk of a policy maturing now
pub const TIME_RISK_CEILING: f64 = 0.40;
/// Years of remaining term that remove all time risk above the floor
pub const TIME_RISK_NORMALIZER: f64 = 50.0;

/// Annual premium at which concentration risk reaches 1.0 (before the cap)
pub const CONCENTRATION_SCALE: f64 = 500_000.0;
pub const CONCENTRATION_CAP: f64 = 0.30;

/// Letter grade of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskGrade {
    A,
    B,
    C,
    D,
}

impl RiskGrade {
    /// Upper bounds are exclusive: 0.20 is a B, not an A
    pub fn from_score(score: f64) -> Self {
        if score < 0.20 {
            RiskGrade::A
        } else if score < 0.30 {
            RiskGrade::B
        } else if score < 0.40 {
            RiskGrade::C
        } else {
            RiskGrade::D
        }
    }
}

/// Individual factor scores before weighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub company: f64,
    pub policy: f64,
    pub time: f64,
    pub concentration: f64,
    pub market: f64,
}

impl RiskFactors {
    pub fn composite(&self, weights: &RiskWeights) -> f64 {
        self.company * weights.company
            + self.policy * weights.policy
            + self.time * weights.time
            + self.concentration * weights.concentration
            + self.market * weights.market
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Both bounds narrow as risk rises, the lower one faster
    pub fn for_score(score: f64) -> Self {
        Self {
            lower: 0.90 - 0.5 * score,
            upper: 0.98 - 0.2 * score,
        }
    }
}

/// Output of a risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub composite_score: f64,
    pub grade: RiskGrade,
    pub factors: RiskFactors,
    /// Suggested haircut: half the composite score
    pub recommended_discount: f64,
    pub confidence_interval: ConfidenceInterval,
    /// True when issuer or product fell back to the default risk entry
    pub used_default_weights: bool,
}

/// Scores policy risk; pure and infallible on validated input
#[derive(Debug, Clone, Copy)]
pub struct RiskProfiler {
    as_of: NaiveDate,
}

impl RiskProfiler {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    pub fn time_risk(years_to_maturity: f64) -> f64 {
        (TIME_RISK_CEILING - years_to_maturity / TIME_RISK_NORMALIZER).max(TIME_RISK_FLOOR)
    }

    pub fn concentration_risk(annual_premium: f64) -> f64 {
        (annual_premium.abs() / CONCENTRATION_SCALE).min(CONCENTRATION_CAP)
    }

    pub fn assess(&self, policy: &PolicyRecord, assumptions: &MarketAssumptions) -> RiskResult {
        let used_default_weights = !policy.company.is_known() || !policy.policy_type.is_known();
        if !policy.company.is_known() {
            log::warn!("unlisted insurer {:?}, using default risk weight", policy.company.name());
        }
        if !policy.policy_type.is_known() {
            log::warn!("unlisted policy type {:?}, using default risk profile", policy.policy_type.as_str());
        }

        let years_to_maturity = policy
            .remaining_years(self.as_of, assumptions.lifetime_horizon_years)
            .max(1) as f64;

        let factors = RiskFactors {
            company: company_risk(&policy.company).risk_weight,
            policy: policy_type_risk(&policy.policy_type).mean_score(),
            time: Self::time_risk(years_to_maturity),
            concentration: Self::concentration_risk(policy.annual_premium),
            market: assumptions.market_volatility,
        };

        let composite_score = factors.composite(&RISK_WEIGHTS);
        let grade = RiskGrade::from_score(composite_score);

        log::debug!("risk: score {:.4}, grade {:?}, factors {:?}", composite_score, grade, factors);

        RiskResult {
            composite_score,
            grade,
            factors,
            recommended_discount: composite_score * 0.5,
            confidence_interval: ConfidenceInterval::for_score(composite_score),
            used_default_weights,
        }
    }
}
