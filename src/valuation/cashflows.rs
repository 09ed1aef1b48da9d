//! Discounted cash-flow projection of a policy's remaining life

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assumptions::{company_risk, policy_type_risk, MarketAssumptions};
use crate::error::{Result, ValuationError};
use crate::policy::{PolicyRecord, MAX_PROJECTION_YEARS};

/// Long-run growth floor of the cash value
pub const BASE_GROWTH_RATE: f64 = 0.03;

/// Extra growth in early projection years, decaying with time
pub const GROWTH_DECAY_AMPLITUDE: f64 = 0.02;

/// Years over which the extra growth decays by a factor of e
pub const GROWTH_DECAY_CONSTANT: f64 = 10.0;

/// Annual bonus paid out as a fraction of the accumulated value
pub const ANNUAL_BONUS_RATE: f64 = 0.02;

/// Confidence attached to every DCF projection
pub const DCF_CONFIDENCE: f64 = 0.85;

/// Growth rate applied in projection year `year` (1-indexed)
pub fn growth_rate(year: u32) -> f64 {
    BASE_GROWTH_RATE + GROWTH_DECAY_AMPLITUDE * (-f64::from(year) / GROWTH_DECAY_CONSTANT).exp()
}

/// One year of the projected schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowYear {
    /// Projection year (1-indexed)
    pub year: u32,
    pub growth_rate: f64,
    /// Cash value at the end of the year
    pub accumulated_value: f64,
    /// Bonus, or the maturity value in the final year
    pub cash_flow: f64,
    pub discount_factor: f64,
    pub present_value: f64,
}

/// Result of a DCF projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfResult {
    pub present_value: f64,

    /// Premiums paid to date
    pub total_investment: f64,

    /// present_value - total_investment
    pub net_present_value: f64,

    /// present_value / total_investment; None when nothing has been paid yet
    pub dcf_ratio: Option<f64>,

    /// Cash value at the end of the projection
    pub maturity_value: f64,

    pub discount_rate: f64,

    /// Projection length in years
    pub remaining_years: u32,

    pub confidence: f64,

    /// Year-by-year schedule
    pub schedule: Vec<CashflowYear>,
}

/// Projects remaining cash flows and discounts them at a risk-adjusted rate
#[derive(Debug, Clone, Copy)]
pub struct CashFlowProjector {
    as_of: NaiveDate,
}

impl CashFlowProjector {
    /// Create a projector valuing as of the given date
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    /// Risk-free rate plus issuer and product spreads
    pub fn discount_rate(policy: &PolicyRecord, assumptions: &MarketAssumptions) -> f64 {
        assumptions.risk_free_rate
            + company_risk(&policy.company).discount_premium
            + policy_type_risk(&policy.policy_type).discount_premium
    }

    /// Run the projection for a single policy
    pub fn project(&self, policy: &PolicyRecord, assumptions: &MarketAssumptions) -> Result<DcfResult> {
        policy.validate(self.as_of)?;

        let remaining = policy.remaining_years(self.as_of, assumptions.lifetime_horizon_years);
        if remaining < 1 {
            return Err(ValuationError::invalid_policy(
                "total_term",
                format!(
                    "policy matured {} year(s) before {}",
                    -remaining, self.as_of
                ),
            ));
        }
        let remaining_years = u32::try_from(remaining)
            .ok()
            .filter(|years| *years <= MAX_PROJECTION_YEARS)
            .ok_or_else(|| {
                ValuationError::invalid_policy(
                    "total_term",
                    format!("{} remaining years exceeds the {}-year maximum", remaining, MAX_PROJECTION_YEARS),
                )
            })?;

        let discount_rate = Self::discount_rate(policy, assumptions);
        let mut accumulated_value = policy.accumulated_amount;
        let mut schedule = Vec::with_capacity(remaining_years as usize);

        for year in 1..=remaining_years {
            let growth = growth_rate(year);
            accumulated_value *= 1.0 + growth;

            let cash_flow = if year == remaining_years {
                accumulated_value
            } else {
                accumulated_value * ANNUAL_BONUS_RATE
            };
            let discount_factor = 1.0 / (1.0 + discount_rate).powi(year as i32);

            schedule.push(CashflowYear {
                year,
                growth_rate: growth,
                accumulated_value,
                cash_flow,
                discount_factor,
                present_value: cash_flow * discount_factor,
            });
        }

        let present_value: f64 = schedule.iter().map(|row| row.present_value).sum();
        let total_investment = policy.total_investment();
        let dcf_ratio = (total_investment > 0.0).then(|| present_value / total_investment);

        log::debug!(
            "DCF: {} years at {:.4}, PV {:.2}, maturity {:.2}",
            remaining_years,
            discount_rate,
            present_value,
            accumulated_value
        );

        Ok(DcfResult {
            present_value,
            total_investment,
            net_present_value: present_value - total_investment,
            dcf_ratio,
            maturity_value: accumulated_value,
            discount_rate,
            remaining_years,
            confidence: DCF_CONFIDENCE,
            schedule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Insurer, PolicyTerm, PolicyType};
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
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

    fn projector() -> CashFlowProjector {
        CashFlowProjector::new(date(2025, 1, 1))
    }

    #[test]
    fn test_growth_decays_toward_floor() {
        assert!(growth_rate(1) > growth_rate(10));
        assert!(growth_rate(10) > growth_rate(40));
        assert!(growth_rate(200) > BASE_GROWTH_RATE);
        assert_relative_eq!(growth_rate(200), BASE_GROWTH_RATE, epsilon = 1e-9);
    }

    #[test]
    fn test_discount_rate_stacks_spreads() {
        let rate = CashFlowProjector::discount_rate(&endowment(), &MarketAssumptions::default());
        assert_relative_eq!(rate, 0.055, epsilon = 1e-12);

        let mut unknown = endowment();
        unknown.company = Insurer::from_name("Acme Assurance");
        unknown.policy_type = PolicyType::from_name("annuity");
        let rate = CashFlowProjector::discount_rate(&unknown, &MarketAssumptions::default());
        assert_relative_eq!(rate, 0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_schedule() {
        let result = projector().project(&endowment(), &MarketAssumptions::default()).unwrap();

        assert_eq!(result.remaining_years, 16);
        assert_eq!(result.schedule.len(), 16);
        assert_eq!(result.total_investment, 400_000.0);
        assert_eq!(result.confidence, DCF_CONFIDENCE);

        // Bonus years pay a fraction, the final year pays the full value
        let first = &result.schedule[0];
        assert_relative_eq!(first.cash_flow, first.accumulated_value * ANNUAL_BONUS_RATE);
        let last = result.schedule.last().unwrap();
        assert_eq!(last.cash_flow, result.maturity_value);

        let summed: f64 = result.schedule.iter().map(|r| r.present_value).sum();
        assert_relative_eq!(summed, result.present_value);
        assert_relative_eq!(result.present_value, 551_846.22, max_relative = 1e-6);
        assert_relative_eq!(result.maturity_value, 966_142.96, max_relative = 1e-6);
        assert_relative_eq!(result.dcf_ratio.unwrap(), 551_846.22 / 400_000.0, max_relative = 1e-6);
        assert_relative_eq!(result.net_present_value, result.present_value - 400_000.0);
    }

    #[test]
    fn test_higher_risk_free_rate_lowers_present_value() {
        let low = projector().project(&endowment(), &MarketAssumptions::default()).unwrap();
        let high_rates = MarketAssumptions {
            risk_free_rate: 0.055,
            ..Default::default()
        };
        let high = projector().project(&endowment(), &high_rates).unwrap();
        assert!(high.present_value < low.present_value);
        assert_eq!(high.maturity_value, low.maturity_value);
    }

    #[test]
    fn test_matured_policy_is_rejected() {
        let err = CashFlowProjector::new(date(2041, 6, 1))
            .project(&endowment(), &MarketAssumptions::default())
            .unwrap_err();
        assert_eq!(err.field(), "total_term");

        // Final year of the term still projects one year
        let last_year = CashFlowProjector::new(date(2040, 6, 1))
            .project(&endowment(), &MarketAssumptions::default())
            .unwrap();
        assert_eq!(last_year.remaining_years, 1);
        assert_eq!(last_year.schedule[0].cash_flow, last_year.maturity_value);
    }

    #[test]
    fn test_lifetime_policy_uses_horizon() {
        let mut policy = endowment();
        policy.total_term = PolicyTerm::Lifetime;
        let assumptions = MarketAssumptions {
            lifetime_horizon_years: 40,
            ..Default::default()
        };
        let result = projector().project(&policy, &assumptions).unwrap();
        assert_eq!(result.remaining_years, 31);
        assert!(result.present_value.is_finite());
    }

    #[test]
    fn test_zero_paid_years_has_no_ratio() {
        let mut policy = endowment();
        policy.paid_years = 0;
        let result = projector().project(&policy, &MarketAssumptions::default()).unwrap();
        assert_eq!(result.total_investment, 0.0);
        assert_eq!(result.dcf_ratio, None);
        assert_eq!(result.net_present_value, result.present_value);
    }

    #[test]
    fn test_oversized_horizon_is_rejected_before_allocating() {
        let mut policy = endowment();
        policy.total_term = PolicyTerm::Lifetime;
        let assumptions = MarketAssumptions {
            lifetime_horizon_years: u32::MAX,
            ..Default::default()
        };
        let err = projector().project(&policy, &assumptions).unwrap_err();
        assert_eq!(err.field(), "total_term");
    }

    #[test]
    fn test_invalid_premium_fails() {
        let mut policy = endowment();
        policy.annual_premium = -10.0;
        let err = projector().project(&policy, &MarketAssumptions::default()).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidPolicy { .. }));
        assert_eq!(err.field(), "annual_premium");
    }
}
