//! AWS Lambda handler for single-policy valuations
//!
//! Accepts `{ policy, assumptions?, asOf?, askingPrice? }` and returns the
//! valuation, or a structured error body naming the kind and field.
//!
//! Direct invocations and Lambda Function URLs are both supported: a Function
//! URL event carries the same payload as a JSON string in `body`.

use chrono::NaiveDate;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use policy_valuation::valuation::{quote_listing, valuate_as_of, ListingQuote};
use policy_valuation::{ErrorReport, MarketAssumptions, PolicyForm, PolicyRecord, ValuationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// camelCase keys that only the raw listing form uses
const FORM_KEYS: [&str; 5] = ["policyType", "annualPremium", "paidYears", "accumulatedAmount", "joinDate"];

/// Why the `policy` object could not become a record
#[derive(Debug)]
enum PolicyInputError {
    /// Typed record that failed to deserialize
    Record(serde_json::Error),
    /// Listing form whose fields failed validation
    Form(ErrorReport),
}

/// Listing forms are recognised by their camelCase keys; anything else must be
/// a typed record, and its own deserialization error is reported
fn parse_policy(policy: Value) -> Result<PolicyRecord, PolicyInputError> {
    let is_form = policy
        .as_object()
        .is_some_and(|fields| FORM_KEYS.iter().any(|key| fields.contains_key(*key)));

    if is_form {
        let form: PolicyForm = serde_json::from_value(policy).map_err(PolicyInputError::Record)?;
        form.into_record().map_err(|err| PolicyInputError::Form(err.report()))
    } else {
        serde_json::from_value(policy).map_err(PolicyInputError::Record)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValuationRequest {
    /// Typed `PolicyRecord` (snake_case) or raw listing form (camelCase)
    policy: Value,

    /// Overrides for any subset of market assumptions
    #[serde(default)]
    assumptions: Option<MarketAssumptions>,

    /// Valuation date (defaults to today)
    #[serde(default)]
    as_of: Option<NaiveDate>,

    #[serde(default)]
    asking_price: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValuationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    valuation: Option<ValuationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    listing: Option<ListingQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_error: Option<String>,
    execution_time_ms: u64,
}

impl ValuationResponse {
    fn failed(error: ErrorReport, start: Instant) -> Self {
        Self {
            valuation: None,
            listing: None,
            error: Some(error),
            request_error: None,
            execution_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn bad_request(message: String, start: Instant) -> Self {
        Self {
            valuation: None,
            listing: None,
            error: None,
            request_error: Some(message),
            execution_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Unwrap a Function URL event to its JSON body; pass direct payloads through
fn payload(event: Value) -> Result<Value, serde_json::Error> {
    match event.get("body").and_then(Value::as_str) {
        Some(body) if event.get("requestContext").is_some() => serde_json::from_str(body),
        _ => Ok(event),
    }
}

fn value_request(request: ValuationRequest, start: Instant) -> ValuationResponse {
    let policy = match parse_policy(request.policy) {
        Ok(record) => record,
        Err(PolicyInputError::Form(report)) => return ValuationResponse::failed(report, start),
        Err(PolicyInputError::Record(err)) => {
            return ValuationResponse::bad_request(format!("invalid policy record: {}", err), start)
        }
    };
    let assumptions = request.assumptions.unwrap_or_default();
    let as_of = request
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let valuation = match valuate_as_of(&policy, Some(&assumptions), as_of) {
        Ok(valuation) => valuation,
        Err(err) => {
            log::warn!("valuation failed: {}", err);
            return ValuationResponse::failed(err.report(), start);
        }
    };

    let listing = match request.asking_price {
        Some(price) => match quote_listing(&policy, &valuation, price, &assumptions) {
            Ok(quote) => Some(quote),
            Err(err) => return ValuationResponse::failed(err.report(), start),
        },
        None => None,
    };

    ValuationResponse {
        valuation: Some(valuation),
        listing,
        error: None,
        request_error: None,
        execution_time_ms: start.elapsed().as_millis() as u64,
    }
}

async fn handler(event: LambdaEvent<Value>) -> Result<ValuationResponse, Error> {
    let start = Instant::now();
    let (event, _context) = event.into_parts();

    let request = payload(event).and_then(serde_json::from_value::<ValuationRequest>);
    let response = match request {
        Ok(request) => value_request(request, start),
        Err(err) => ValuationResponse::bad_request(format!("invalid request: {}", err), start),
    };

    log::info!(
        "valuation request handled in {} ms (ok: {})",
        response.execution_time_ms,
        response.valuation.is_some()
    );
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endowment_payload() -> Value {
        json!({
            "policy": {
                "policy_type": "endowment",
                "company": "AIA",
                "annual_premium": 50000.0,
                "paid_years": 8,
                "total_term": 25,
                "accumulated_amount": 520000.0,
                "join_date": "2016-03-15"
            },
            "asOf": "2025-01-01",
            "askingPrice": 500000.0
        })
    }

    #[test]
    fn test_direct_payload_values_policy() {
        let request: ValuationRequest = serde_json::from_value(endowment_payload()).unwrap();
        let response = value_request(request, Instant::now());
        assert!(response.error.is_none());
        let valuation = response.valuation.unwrap();
        assert!(valuation.recommended_price > valuation.surrender_value);
        assert!(response.listing.is_some());
    }

    #[test]
    fn test_function_url_body_is_unwrapped() {
        let event = json!({
            "requestContext": { "http": { "method": "POST" } },
            "body": endowment_payload().to_string()
        });
        let request: ValuationRequest = serde_json::from_value(payload(event).unwrap()).unwrap();
        assert_eq!(request.as_of, NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn test_form_policy_error_is_structured() {
        let request: ValuationRequest = serde_json::from_value(json!({
            "policy": { "policyType": "endowment", "company": "AIA", "annualPremium": "abc" }
        }))
        .unwrap();
        let response = value_request(request, Instant::now());
        let error = response.error.unwrap();
        assert_eq!(error.field, "annual_premium");
    }

    #[test]
    fn test_record_error_is_not_masked_by_form() {
        let mut payload = endowment_payload();
        payload["policy"]["join_date"] = json!("15/03/2016");
        let request: ValuationRequest = serde_json::from_value(payload).unwrap();
        let response = value_request(request, Instant::now());

        assert!(response.error.is_none());
        let message = response.request_error.unwrap();
        assert!(message.starts_with("invalid policy record"), "{}", message);
        assert!(!message.contains("policy_type"), "{}", message);

        let mut payload = endowment_payload();
        payload["policy"].as_object_mut().unwrap().remove("paid_years");
        let request: ValuationRequest = serde_json::from_value(payload).unwrap();
        let message = value_request(request, Instant::now()).request_error.unwrap();
        assert!(message.contains("paid_years"), "{}", message);
    }
}
