//! Issuer and product risk tables
//!
//! Lookups are total: every `Other` arm maps to the default entry, so an
//! unlisted issuer or product never fails a valuation.

use serde::{Deserialize, Serialize};

use crate::policy::{Insurer, PolicyType};

/// Issuer credit standing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompanyRisk {
    /// Risk factor fed into the composite score
    pub risk_weight: f64,
    /// Spread added to the discount rate
    pub discount_premium: f64,
}

/// Product-family risk sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyTypeRisk {
    pub liquidity: f64,
    pub volatility: f64,
    pub credit: f64,
    /// Spread added to the discount rate
    pub discount_premium: f64,
}

impl PolicyTypeRisk {
    /// Policy risk component: mean of the three sub-scores
    pub fn mean_score(&self) -> f64 {
        (self.liquidity + self.volatility + self.credit) / 3.0
    }
}

pub fn company_risk(insurer: &Insurer) -> CompanyRisk {
    let (risk_weight, discount_premium) = match insurer {
        Insurer::Aia => (0.05, 0.005),
        Insurer::HsbcLife => (0.05, 0.005),
        Insurer::Prudential => (0.06, 0.006),
        Insurer::GreatEastern => (0.06, 0.006),
        Insurer::SunLife => (0.06, 0.006),
        Insurer::Manulife => (0.07, 0.007),
        Insurer::Axa => (0.07, 0.007),
        Insurer::Fwd => (0.10, 0.010),
        Insurer::Other(_) => (0.15, 0.020),
    };
    CompanyRisk {
        risk_weight,
        discount_premium,
    }
}

pub fn policy_type_risk(policy_type: &PolicyType) -> PolicyTypeRisk {
    let (liquidity, volatility, credit, discount_premium) = match policy_type {
        PolicyType::Endowment => (0.15, 0.10, 0.05, 0.005),
        PolicyType::Life => (0.20, 0.10, 0.06, 0.010),
        PolicyType::Universal => (0.20, 0.25, 0.08, 0.012),
        PolicyType::CriticalIllness => (0.25, 0.15, 0.08, 0.015),
        PolicyType::Term => (0.40, 0.05, 0.06, 0.020),
        PolicyType::Other(_) => (0.30, 0.25, 0.15, 0.025),
    };
    PolicyTypeRisk {
        liquidity,
        volatility,
        credit,
        discount_premium,
    }
}
