//! Market assumptions and risk lookup tables

mod tables;
pub mod loader;

pub use tables::{company_risk, policy_type_risk, CompanyRisk, PolicyTypeRisk};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};
use crate::policy::MAX_PROJECTION_YEARS;

/// Process-wide market assumptions, immutable for the duration of a valuation
///
/// Every field has a default, so a JSON override only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketAssumptions {
    /// Base of every discount rate
    pub risk_free_rate: f64,

    /// Corporate borrowing rate (reported for comparison)
    pub corporate_borrowing_rate: f64,

    /// Expected annual inflation
    pub inflation_rate: f64,

    /// Average return of the insurance savings market
    pub insurance_market_return: f64,

    /// Haircut an issuer applies to the cash value on early surrender
    pub surrender_discount: f64,

    /// Premium paid for a liquid secondary market, applied to risk-adjusted value
    pub liquidity_premium: f64,

    /// Current market volatility index
    pub market_volatility: f64,

    /// Marketplace fee on gross transaction value
    pub platform_fee_rate: f64,

    /// Escrow/custody fee, always stacked on the platform fee
    pub escrow_fee_rate: f64,

    /// Concierge handling fee, stacked only when the seller asked for it
    pub concierge_fee_rate: f64,

    /// Floor on the recommended price, as a margin over surrender value
    pub minimum_profit_margin: f64,

    /// Horizon used in place of the term for whole-of-life policies
    pub lifetime_horizon_years: u32,
}

impl Default for MarketAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            corporate_borrowing_rate: 0.065,
            inflation_rate: 0.025,
            insurance_market_return: 0.055,
            surrender_discount: 0.15,
            liquidity_premium: 0.02,
            market_volatility: 0.18,
            platform_fee_rate: 0.02,
            escrow_fee_rate: 0.005,
            concierge_fee_rate: 0.01,
            minimum_profit_margin: 0.10,
            lifetime_horizon_years: 30,
        }
    }
}

impl MarketAssumptions {
    /// Total fee deducted from gross value for a transaction
    pub fn total_platform_fee_rate(&self, concierge: bool) -> f64 {
        let concierge_fee = if concierge { self.concierge_fee_rate } else { 0.0 };
        self.platform_fee_rate + self.escrow_fee_rate + concierge_fee
    }

    /// Reject out-of-range values before any stage runs
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("risk_free_rate", self.risk_free_rate),
            ("corporate_borrowing_rate", self.corporate_borrowing_rate),
            ("insurance_market_return", self.insurance_market_return),
            ("liquidity_premium", self.liquidity_premium),
        ];
        for (field, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(ValuationError::configuration(
                    field,
                    format!("must be a non-negative rate, got {}", value),
                ));
            }
        }

        // Deflation is allowed, but not below -100%
        if !self.inflation_rate.is_finite() || self.inflation_rate <= -1.0 {
            return Err(ValuationError::configuration(
                "inflation_rate",
                format!("must be greater than -1, got {}", self.inflation_rate),
            ));
        }

        let fractions = [
            ("surrender_discount", self.surrender_discount),
            ("platform_fee_rate", self.platform_fee_rate),
            ("escrow_fee_rate", self.escrow_fee_rate),
            ("concierge_fee_rate", self.concierge_fee_rate),
        ];
        for (field, value) in fractions {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(ValuationError::configuration(
                    field,
                    format!("must be a fraction in [0, 1), got {}", value),
                ));
            }
        }

        // A zero margin would let the price floor sit on the surrender value
        if !self.minimum_profit_margin.is_finite()
            || self.minimum_profit_margin <= 0.0
            || self.minimum_profit_margin >= 1.0
        {
            return Err(ValuationError::configuration(
                "minimum_profit_margin",
                format!("must be in (0, 1), got {}", self.minimum_profit_margin),
            ));
        }

        if !self.market_volatility.is_finite()
            || self.market_volatility <= 0.0
            || self.market_volatility > 1.0
        {
            return Err(ValuationError::configuration(
                "market_volatility",
                format!("must be in (0, 1], got {}", self.market_volatility),
            ));
        }

        if self.total_platform_fee_rate(true) >= 1.0 {
            return Err(ValuationError::configuration(
                "platform_fee_rate",
                "stacked fees consume the whole transaction value",
            ));
        }

        if self.lifetime_horizon_years == 0 || self.lifetime_horizon_years > MAX_PROJECTION_YEARS {
            return Err(ValuationError::configuration(
                "lifetime_horizon_years",
                format!(
                    "must be between 1 and {} years, got {}",
                    MAX_PROJECTION_YEARS, self.lifetime_horizon_years
                ),
            ));
        }

        Ok(())
    }
}
