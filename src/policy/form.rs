//! Raw seller intake form
//!
//! The intake collaborator (listing form, document extraction) hands the
//! engine strings. Conversion fails fast on blank or non-numeric fields
//! instead of coercing them.

use chrono::NaiveDate;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::data::{Insurer, PolicyRecord, PolicyTerm, PolicyType};
use crate::error::{Result, ValuationError};

/// String-typed listing form, field names as the front end sends them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyForm {
    pub policy_type: String,
    pub company: String,
    /// Used when `company` is "other"
    pub custom_company: String,
    pub product_name: String,
    pub annual_premium: String,
    pub paid_years: String,
    pub total_term: String,
    pub accumulated_amount: String,
    pub join_date: String,
    pub asking_price: String,
    pub currency: String,
    pub policy_number: String,
    /// Checkbox; blank means unchecked
    #[serde(deserialize_with = "deserialize_checkbox")]
    pub concierge_help: bool,
}

impl PolicyForm {
    /// Parse and validate into a policy record
    pub fn into_record(self) -> Result<PolicyRecord> {
        let policy_type = required("policy_type", &self.policy_type)?;
        let company = if self.company.trim().eq_ignore_ascii_case("other") {
            required("custom_company", &self.custom_company)?
        } else {
            required("company", &self.company)?
        };

        let annual_premium = parse_amount("annual_premium", &self.annual_premium)?;
        let accumulated_amount = parse_amount("accumulated_amount", &self.accumulated_amount)?;
        let paid_years = required("paid_years", &self.paid_years)?
            .parse::<u32>()
            .map_err(|_| {
                ValuationError::invalid_policy(
                    "paid_years",
                    format!("expected a whole number of years, got {:?}", self.paid_years),
                )
            })?;
        let total_term = PolicyTerm::parse(required("total_term", &self.total_term)?)
            .map_err(|detail| ValuationError::invalid_policy("total_term", detail))?;
        let join_date = NaiveDate::parse_from_str(required("join_date", &self.join_date)?, "%Y-%m-%d")
            .map_err(|e| {
                ValuationError::invalid_policy(
                    "join_date",
                    format!("expected YYYY-MM-DD, got {:?} ({})", self.join_date, e),
                )
            })?;

        let mut record = PolicyRecord::new(
            PolicyType::from_name(policy_type),
            Insurer::from_name(company),
            annual_premium,
            paid_years,
            total_term,
            accumulated_amount,
            join_date,
        );
        record.company_name = Some(company.to_string());
        record.policy_id = optional(&self.policy_number);
        record.product_name = optional(&self.product_name);
        if let Some(currency) = optional(&self.currency) {
            record.currency = currency.to_ascii_uppercase();
        }
        record.concierge_help = self.concierge_help;
        Ok(record)
    }

    /// Seller's asking price, if one was entered
    pub fn asking_price(&self) -> Result<Option<f64>> {
        if self.asking_price.trim().is_empty() {
            return Ok(None);
        }
        parse_amount("asking_price", &self.asking_price).map(Some)
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValuationError::invalid_policy(field, "required field is missing"))
    } else {
        Ok(trimmed)
    }
}

/// Accepts JSON booleans and the text a form or spreadsheet produces:
/// "", "true"/"false", "yes"/"no", "1"/"0", "on"/"off"
fn deserialize_checkbox<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct CheckboxVisitor;

    impl<'de> Visitor<'de> for CheckboxVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean, yes/no, 1/0 or a blank cell")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<bool, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Unsigned(value), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Signed(value), &self)),
            }
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<bool, E> {
            match value.trim().to_ascii_lowercase().as_str() {
                "" | "false" | "no" | "n" | "0" | "off" => Ok(false),
                "true" | "yes" | "y" | "1" | "on" => Ok(true),
                _ => Err(E::invalid_value(de::Unexpected::Str(value), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<bool, E> {
            Ok(false)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(CheckboxVisitor)
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Monetary amount; thousands separators allowed
fn parse_amount(field: &str, value: &str) -> Result<f64> {
    let cleaned: String = required(field, value)?
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    let amount = cleaned.parse::<f64>().map_err(|_| {
        ValuationError::invalid_policy(field, format!("expected a number, got {:?}", value))
    })?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValuationError::invalid_policy(
            field,
            format!("must be a positive amount, got {}", value.trim()),
        ));
    }
    Ok(amount)
}
