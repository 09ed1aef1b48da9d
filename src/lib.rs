//! Policy Valuation - pricing engine for secondary-market policy transfers
//!
//! This library provides:
//! - Policy records and seller intake parsing (form fields, CSV listings)
//! - Market assumptions with issuer and product risk tables
//! - Discounted cash-flow projection, risk profiling and IRR analysis
//! - Recommended transfer pricing with a surrender-value floor
//! - A staged valuation orchestrator with progress and cancellation
//! - Batch and sensitivity scenario runs

pub mod error;
pub mod policy;
pub mod assumptions;
pub mod valuation;
pub mod scenario;

// Re-export commonly used types
pub use error::{ErrorKind, ErrorReport, LoadError, ValuationError};
pub use policy::{Insurer, PolicyForm, PolicyRecord, PolicyTerm, PolicyType};
pub use assumptions::MarketAssumptions;
pub use valuation::{valuate, valuate_as_of, ValuationOrchestrator, ValuationResult};
pub use scenario::{AssumptionShift, ScenarioRunner};
