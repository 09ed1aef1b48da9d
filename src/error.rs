//! Error taxonomy for the valuation engine
//!
//! Every failure carries a kind, the offending field and a readable detail so
//! the application layer can present it without parsing strings.

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the valuation pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// Structurally invalid or already-matured policy
    #[error("invalid policy: {field} - {detail}")]
    InvalidPolicy { field: String, detail: String },

    /// Non-positive candidate price passed into return analysis
    #[error("invalid price: {price} must be positive")]
    InvalidPrice { price: f64 },

    /// Market assumptions with out-of-range values
    #[error("invalid configuration: {field} - {detail}")]
    Configuration { field: String, detail: String },

    /// Cancellation arrived between stages; no partial result exists
    #[error("valuation cancelled after {stage}")]
    Cancelled { stage: String },
}

impl ValuationError {
    pub fn invalid_policy(field: &str, detail: impl Into<String>) -> Self {
        ValuationError::InvalidPolicy {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    pub fn configuration(field: &str, detail: impl Into<String>) -> Self {
        ValuationError::Configuration {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValuationError::InvalidPolicy { .. } => ErrorKind::InvalidPolicy,
            ValuationError::InvalidPrice { .. } => ErrorKind::InvalidPrice,
            ValuationError::Configuration { .. } => ErrorKind::Configuration,
            ValuationError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Name of the input field that caused the failure
    pub fn field(&self) -> &str {
        match self {
            ValuationError::InvalidPolicy { field, .. } => field,
            ValuationError::InvalidPrice { .. } => "target_price",
            ValuationError::Configuration { field, .. } => field,
            ValuationError::Cancelled { .. } => "cancellation",
        }
    }

    /// Structured form for callers that serialise errors (CLI `--json`, Lambda)
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            field: self.field().to_string(),
            detail: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPolicy,
    InvalidPrice,
    Configuration,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidPolicy => "invalid_policy",
            ErrorKind::InvalidPrice => "invalid_price",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Serializable error payload (kind + field + detail)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub field: String,
    pub detail: String,
}

/// Failures while reading listings or assumption files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A listing row parsed but failed policy validation
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: ValuationError,
    },

    #[error(transparent)]
    Valuation(#[from] ValuationError),
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, ValuationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_report_carries_kind_and_field() {
        let err = ValuationError::invalid_policy("annual_premium", "must be positive");
        let report = err.report();
        assert_eq!(report.kind, ErrorKind::InvalidPolicy);
        assert_eq!(report.field, "annual_premium");
        assert_eq!(report.detail, "invalid policy: annual_premium - must be positive");
    }

    #[test]
    fn test_invalid_price_field() {
        let err = ValuationError::InvalidPrice { price: -1.0 };
        assert_eq!(err.kind(), ErrorKind::InvalidPrice);
        assert_eq!(err.field(), "target_price");
    }
}
