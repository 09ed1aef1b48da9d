//! Policy record structures consumed by the valuation engine

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ValuationError};

/// Product family of the policy being offered
///
/// Unlisted product names are kept in `Other` and valued with the default
/// risk profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyType {
    Endowment,
    CriticalIllness,
    Life,
    Universal,
    Term,
    Other(String),
}

impl PolicyType {
    /// Parse a free-text product family name
    pub fn from_name(name: &str) -> Self {
        let key = name.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "endowment" | "savings" => PolicyType::Endowment,
            "critical_illness" | "ci" => PolicyType::CriticalIllness,
            "life" | "whole_life" => PolicyType::Life,
            "universal" | "universal_life" => PolicyType::Universal,
            "term" | "term_life" => PolicyType::Term,
            _ => PolicyType::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PolicyType::Endowment => "endowment",
            PolicyType::CriticalIllness => "critical_illness",
            PolicyType::Life => "life",
            PolicyType::Universal => "universal",
            PolicyType::Term => "term",
            PolicyType::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PolicyType::Other(_))
    }
}

impl From<String> for PolicyType {
    fn from(name: String) -> Self {
        PolicyType::from_name(&name)
    }
}

impl From<PolicyType> for String {
    fn from(policy_type: PolicyType) -> Self {
        policy_type.as_str().to_string()
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issuing insurer, matched by brand
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Insurer {
    Aia,
    Prudential,
    Manulife,
    Axa,
    HsbcLife,
    SunLife,
    GreatEastern,
    Fwd,
    Other(String),
}

impl Insurer {
    /// Match a free-text issuer name ("AIA Hong Kong", "Prudential Singapore", ...)
    /// against the known brands
    pub fn from_name(name: &str) -> Self {
        let key = name.trim().to_ascii_lowercase();
        let brands: [(&str, Insurer); 8] = [
            ("aia", Insurer::Aia),
            ("prudential", Insurer::Prudential),
            ("manulife", Insurer::Manulife),
            ("axa", Insurer::Axa),
            ("hsbc", Insurer::HsbcLife),
            ("sun life", Insurer::SunLife),
            ("great eastern", Insurer::GreatEastern),
            ("fwd", Insurer::Fwd),
        ];

        brands
            .into_iter()
            .find(|(prefix, _)| {
                key == *prefix || key.starts_with(&format!("{} ", prefix))
            })
            .map(|(_, insurer)| insurer)
            .unwrap_or_else(|| Insurer::Other(name.trim().to_string()))
    }

    pub fn name(&self) -> &str {
        match self {
            Insurer::Aia => "AIA",
            Insurer::Prudential => "Prudential",
            Insurer::Manulife => "Manulife",
            Insurer::Axa => "AXA",
            Insurer::HsbcLife => "HSBC Life",
            Insurer::SunLife => "Sun Life",
            Insurer::GreatEastern => "Great Eastern",
            Insurer::Fwd => "FWD",
            Insurer::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Insurer::Other(_))
    }
}

impl From<String> for Insurer {
    fn from(name: String) -> Self {
        Insurer::from_name(&name)
    }
}

impl From<Insurer> for String {
    fn from(insurer: Insurer) -> Self {
        insurer.name().to_string()
    }
}

impl fmt::Display for Insurer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Premium term of the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTerm", into = "RawTerm")]
pub enum PolicyTerm {
    /// Fixed number of years
    Years(u32),
    /// Whole-of-life cover; valued over the configured lifetime horizon
    Lifetime,
}

impl PolicyTerm {
    /// Parse "25", "Lifetime", "lifetime" ...
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("lifetime") {
            return Ok(PolicyTerm::Lifetime);
        }
        trimmed
            .parse::<u32>()
            .map(PolicyTerm::Years)
            .map_err(|_| format!("expected a number of years or \"lifetime\", got {:?}", text))
    }

    /// Term in years, substituting `lifetime_horizon` for whole-of-life cover
    pub fn years_or(&self, lifetime_horizon: u32) -> u32 {
        match self {
            PolicyTerm::Years(years) => *years,
            PolicyTerm::Lifetime => lifetime_horizon,
        }
    }
}

impl fmt::Display for PolicyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyTerm::Years(years) => write!(f, "{}", years),
            PolicyTerm::Lifetime => f.write_str("lifetime"),
        }
    }
}

/// Wire form of a term: a bare number or a string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTerm {
    Years(u32),
    Text(String),
}

impl TryFrom<RawTerm> for PolicyTerm {
    type Error = String;

    fn try_from(raw: RawTerm) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawTerm::Years(years) => Ok(PolicyTerm::Years(years)),
            RawTerm::Text(text) => PolicyTerm::parse(&text),
        }
    }
}

impl From<PolicyTerm> for RawTerm {
    fn from(term: PolicyTerm) -> Self {
        match term {
            PolicyTerm::Years(years) => RawTerm::Years(years),
            PolicyTerm::Lifetime => RawTerm::Text("lifetime".to_string()),
        }
    }
}

/// Longest term or lifetime horizon the engine will project
pub const MAX_PROJECTION_YEARS: u32 = 150;

fn default_currency() -> String {
    "USD".to_string()
}

/// An in-force policy offered for transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Issuer's policy number, if supplied
    #[serde(default)]
    pub policy_id: Option<String>,

    /// Product family
    pub policy_type: PolicyType,

    /// Issuing insurer
    pub company: Insurer,

    /// Issuer name as entered ("AIA Hong Kong"); `company` keeps only the brand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// Marketing name of the product
    #[serde(default)]
    pub product_name: Option<String>,

    /// Annual premium in policy currency
    pub annual_premium: f64,

    /// Years of premium paid to date
    pub paid_years: u32,

    /// Premium term
    pub total_term: PolicyTerm,

    /// Current cash value held in the policy
    pub accumulated_amount: f64,

    /// Date the policy began
    pub join_date: NaiveDate,

    /// Policy currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Seller asked for concierge handling (adds the concierge fee to the stack)
    #[serde(default)]
    pub concierge_help: bool,
}

impl PolicyRecord {
    /// Create a policy with the required fields; optional fields take defaults
    pub fn new(
        policy_type: PolicyType,
        company: Insurer,
        annual_premium: f64,
        paid_years: u32,
        total_term: PolicyTerm,
        accumulated_amount: f64,
        join_date: NaiveDate,
    ) -> Self {
        Self {
            policy_id: None,
            policy_type,
            company,
            company_name: None,
            product_name: None,
            annual_premium,
            paid_years,
            total_term,
            accumulated_amount,
            join_date,
            currency: default_currency(),
            concierge_help: false,
        }
    }

    /// Whole calendar years between the join year and the valuation year
    pub fn years_elapsed(&self, as_of: NaiveDate) -> i64 {
        i64::from(as_of.year()) - i64::from(self.join_date.year())
    }

    /// Years left until maturity
    ///
    /// Fixed terms may come back below 1 for matured policies; the projector
    /// rejects those. Lifetime terms run to the horizon and never drop below 1.
    pub fn remaining_years(&self, as_of: NaiveDate, lifetime_horizon: u32) -> i64 {
        let elapsed = self.years_elapsed(as_of);
        match self.total_term {
            PolicyTerm::Years(years) => i64::from(years) - elapsed,
            PolicyTerm::Lifetime => (i64::from(lifetime_horizon) - elapsed).max(1),
        }
    }

    /// Issuer name for display, falling back to the brand
    pub fn issuer_name(&self) -> &str {
        self.company_name.as_deref().unwrap_or_else(|| self.company.name())
    }

    /// Premiums paid to date
    pub fn total_investment(&self) -> f64 {
        self.annual_premium * f64::from(self.paid_years)
    }

    /// Check the fields the engine relies on
    pub fn validate(&self, as_of: NaiveDate) -> Result<()> {
        if !self.annual_premium.is_finite() || self.annual_premium <= 0.0 {
            return Err(ValuationError::invalid_policy(
                "annual_premium",
                format!("must be a positive amount, got {}", self.annual_premium),
            ));
        }
        if !self.accumulated_amount.is_finite() || self.accumulated_amount <= 0.0 {
            return Err(ValuationError::invalid_policy(
                "accumulated_amount",
                format!("must be a positive amount, got {}", self.accumulated_amount),
            ));
        }
        if let PolicyTerm::Years(years) = self.total_term {
            if years == 0 {
                return Err(ValuationError::invalid_policy(
                    "total_term",
                    "term must be at least one year",
                ));
            }
            if years > MAX_PROJECTION_YEARS {
                return Err(ValuationError::invalid_policy(
                    "total_term",
                    format!("{}-year term exceeds the {}-year maximum", years, MAX_PROJECTION_YEARS),
                ));
            }
            if self.paid_years > years {
                return Err(ValuationError::invalid_policy(
                    "paid_years",
                    format!("{} paid years exceeds the {}-year term", self.paid_years, years),
                ));
            }
        }
        if self.join_date > as_of {
            return Err(ValuationError::invalid_policy(
                "join_date",
                format!("{} is after the valuation date {}", self.join_date, as_of),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_insurer_brand_matching() {
        assert_eq!(Insurer::from_name("AIA Hong Kong"), Insurer::Aia);
        assert_eq!(Insurer::from_name("  prudential hong kong"), Insurer::Prudential);
        assert_eq!(Insurer::from_name("Sun Life"), Insurer::SunLife);
        assert_eq!(
            Insurer::from_name("Aiax Mutual"),
            Insurer::Other("Aiax Mutual".to_string())
        );
    }

    #[test]
    fn test_issuer_name_survives_serialization() {
        let mut policy = endowment();
        assert_eq!(policy.issuer_name(), "AIA");
        policy.company_name = Some("AIA Hong Kong".to_string());

        let json = serde_json::to_string(&policy).unwrap();
        let restored: PolicyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.company, Insurer::Aia);
        assert_eq!(restored.issuer_name(), "AIA Hong Kong");
        assert_eq!(restored, policy);
    }

    #[test]
    fn test_policy_type_parsing() {
        assert_eq!(PolicyType::from_name("critical_illness"), PolicyType::CriticalIllness);
        assert_eq!(PolicyType::from_name("Critical Illness"), PolicyType::CriticalIllness);
        assert_eq!(PolicyType::from_name("term-life"), PolicyType::Term);
        assert!(!PolicyType::from_name("annuity").is_known());
    }

    #[test]
    fn test_policy_timing() {
        let policy = endowment();
        let as_of = date(2025, 1, 1);
        assert_eq!(policy.years_elapsed(as_of), 9);
        assert_eq!(policy.remaining_years(as_of, 30), 16);
        assert_eq!(policy.total_investment(), 400_000.0);

        // Past nominal term
        assert_eq!(policy.remaining_years(date(2045, 6, 1), 30), -4);
    }

    #[test]
    fn test_lifetime_remaining_never_below_one() {
        let mut policy = endowment();
        policy.total_term = PolicyTerm::Lifetime;
        assert_eq!(policy.remaining_years(date(2025, 1, 1), 30), 21);
        assert_eq!(policy.remaining_years(date(2090, 1, 1), 30), 1);
    }

    #[test]
    fn test_term_serde_accepts_number_and_lifetime() {
        let years: PolicyTerm = serde_json::from_str("25").unwrap();
        assert_eq!(years, PolicyTerm::Years(25));
        let lifetime: PolicyTerm = serde_json::from_str("\"Lifetime\"").unwrap();
        assert_eq!(lifetime, PolicyTerm::Lifetime);
        let text: PolicyTerm = serde_json::from_str("\"20\"").unwrap();
        assert_eq!(text, PolicyTerm::Years(20));
        assert!(serde_json::from_str::<PolicyTerm>("\"forever\"").is_err());
        assert_eq!(serde_json::to_string(&PolicyTerm::Lifetime).unwrap(), "\"lifetime\"");
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let as_of = date(2025, 1, 1);
        assert!(endowment().validate(as_of).is_ok());

        let mut policy = endowment();
        policy.annual_premium = 0.0;
        assert_eq!(policy.validate(as_of).unwrap_err().field(), "annual_premium");

        let mut policy = endowment();
        policy.accumulated_amount = f64::NAN;
        assert_eq!(policy.validate(as_of).unwrap_err().field(), "accumulated_amount");

        let mut policy = endowment();
        policy.paid_years = 26;
        assert_eq!(policy.validate(as_of).unwrap_err().field(), "paid_years");

        let mut policy = endowment();
        policy.join_date = date(2026, 1, 1);
        assert_eq!(policy.validate(as_of).unwrap_err().field(), "join_date");
    }

    #[test]
    fn test_validate_rejects_unbounded_term() {
        let as_of = date(2025, 1, 1);
        let mut policy = endowment();
        policy.total_term = PolicyTerm::Years(u32::MAX);
        assert_eq!(policy.validate(as_of).unwrap_err().field(), "total_term");

        policy.total_term = PolicyTerm::Years(MAX_PROJECTION_YEARS);
        assert!(policy.validate(as_of).is_ok());
        policy.total_term = PolicyTerm::Years(MAX_PROJECTION_YEARS + 1);
        assert!(policy.validate(as_of).is_err());
    }
}
