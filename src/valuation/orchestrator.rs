//! Staged valuation pipeline
//!
//! ```text
//! Idle -> ProjectingCashFlows -> AssessingRisk -> Pricing -> AnalyzingReturns -> Complete
//!   any stage -> Failed | Cancelled
//! ```
//!
//! Projection and risk assessment share no data and run together on the
//! rayon pool; pricing and return analysis follow in order. An orchestrator
//! is consumed by `run`, so each instance yields exactly one outcome.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::cashflows::CashFlowProjector;
use super::pricing::{PricingEngine, ValuationResult};
use super::returns::ReturnAnalyzer;
use super::risk::RiskProfiler;
use crate::assumptions::MarketAssumptions;
use crate::error::ValuationError;
use crate::policy::PolicyRecord;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationStage {
    Idle,
    ProjectingCashFlows,
    AssessingRisk,
    Pricing,
    AnalyzingReturns,
    Complete,
    Failed,
    Cancelled,
}

impl ValuationStage {
    /// Fraction of the pipeline finished on entering this stage
    pub fn completion(&self) -> f64 {
        match self {
            ValuationStage::Idle | ValuationStage::ProjectingCashFlows => 0.0,
            ValuationStage::AssessingRisk => 0.25,
            ValuationStage::Pricing => 0.5,
            ValuationStage::AnalyzingReturns => 0.75,
            ValuationStage::Complete => 1.0,
            // Terminal failures report the progress reached so far instead
            ValuationStage::Failed | ValuationStage::Cancelled => 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValuationStage::Idle => "idle",
            ValuationStage::ProjectingCashFlows => "projecting_cash_flows",
            ValuationStage::AssessingRisk => "assessing_risk",
            ValuationStage::Pricing => "pricing",
            ValuationStage::AnalyzingReturns => "analyzing_returns",
            ValuationStage::Complete => "complete",
            ValuationStage::Failed => "failed",
            ValuationStage::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ValuationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Emitted on every state transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: ValuationStage,
    pub fraction: f64,
}

/// Receives progress events; how they are displayed is up to the caller
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Writes progress to the log at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        log::debug!("valuation {} ({:.0}%)", event.stage, event.fraction * 100.0);
    }
}

/// Cooperative cancellation flag, checked between stages
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal outcome of one orchestrator run
#[derive(Debug, Clone, PartialEq)]
pub enum ValuationOutcome {
    Complete(Box<ValuationResult>),
    /// `stage` is where the error surfaced; the error is preserved unchanged
    Failed {
        stage: ValuationStage,
        error: ValuationError,
    },
    /// `stage` is the last stage entered before cancellation was observed
    Cancelled { stage: ValuationStage },
}

impl ValuationOutcome {
    pub fn terminal_stage(&self) -> ValuationStage {
        match self {
            ValuationOutcome::Complete(_) => ValuationStage::Complete,
            ValuationOutcome::Failed { .. } => ValuationStage::Failed,
            ValuationOutcome::Cancelled { .. } => ValuationStage::Cancelled,
        }
    }

    pub fn into_result(self) -> Result<ValuationResult, ValuationError> {
        match self {
            ValuationOutcome::Complete(result) => Ok(*result),
            ValuationOutcome::Failed { error, .. } => Err(error),
            ValuationOutcome::Cancelled { stage } => Err(ValuationError::Cancelled {
                stage: stage.name().to_string(),
            }),
        }
    }
}

/// Runs one policy through the valuation stages
pub struct ValuationOrchestrator {
    policy: PolicyRecord,
    assumptions: MarketAssumptions,
    as_of: NaiveDate,
    stage: ValuationStage,
    observer: Box<dyn ProgressObserver>,
    cancellation: Option<CancellationToken>,
}

impl ValuationOrchestrator {
    pub fn new(policy: PolicyRecord, assumptions: MarketAssumptions, as_of: NaiveDate) -> Self {
        Self {
            policy,
            assumptions,
            as_of,
            stage: ValuationStage::Idle,
            observer: Box::new(LogObserver),
            cancellation: None,
        }
    }

    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn stage(&self) -> ValuationStage {
        self.stage
    }

    /// Run every stage to a terminal outcome
    pub fn run(mut self) -> ValuationOutcome {
        if let Err(error) = self.assumptions.validate() {
            return self.fail(error);
        }

        if !self.advance(ValuationStage::ProjectingCashFlows) {
            return self.cancel();
        }
        let projector = CashFlowProjector::new(self.as_of);
        let profiler = RiskProfiler::new(self.as_of);
        let (projection, risk) = rayon::join(
            || projector.project(&self.policy, &self.assumptions),
            || profiler.assess(&self.policy, &self.assumptions),
        );
        let dcf = match projection {
            Ok(dcf) => dcf,
            Err(error) => return self.fail(error),
        };

        if !self.advance(ValuationStage::AssessingRisk) {
            return self.cancel();
        }
        log::debug!("risk grade {:?} ({:.4})", risk.grade, risk.composite_score);

        if !self.advance(ValuationStage::Pricing) {
            return self.cancel();
        }
        let quote = PricingEngine::quote(&self.policy, &dcf, &risk, &self.assumptions);

        if !self.advance(ValuationStage::AnalyzingReturns) {
            return self.cancel();
        }
        let irr = match ReturnAnalyzer::analyze(&self.policy, &dcf, quote.recommended_price, &self.assumptions) {
            Ok(irr) => irr,
            Err(error) => return self.fail(error),
        };

        let result = PricingEngine::finalize(&self.policy, self.as_of, dcf, risk, quote, irr);
        self.transition(ValuationStage::Complete, 1.0);

        log::info!(
            "valued {} {} policy from {}: price {:.2} {}, grade {:?}, {}",
            result.policy_id.as_deref().unwrap_or("unnumbered"),
            self.policy.policy_type,
            self.policy.issuer_name(),
            result.recommended_price,
            result.currency,
            result.risk_profile.grade,
            result.recommendation_tier.as_str()
        );

        ValuationOutcome::Complete(Box::new(result))
    }

    /// Enter `next` unless cancellation has been requested
    fn advance(&mut self, next: ValuationStage) -> bool {
        if self.cancellation.as_ref().is_some_and(|token| token.is_cancelled()) {
            return false;
        }
        self.transition(next, next.completion());
        true
    }

    fn transition(&mut self, next: ValuationStage, fraction: f64) {
        self.stage = next;
        self.observer.on_progress(&ProgressEvent { stage: next, fraction });
    }

    fn fail(mut self, error: ValuationError) -> ValuationOutcome {
        let stage = self.stage;
        log::warn!("valuation failed during {}: {}", stage, error);
        self.transition(ValuationStage::Failed, stage.completion());
        ValuationOutcome::Failed { stage, error }
    }

    fn cancel(mut self) -> ValuationOutcome {
        let stage = self.stage;
        log::info!("valuation cancelled after {}", stage);
        self.transition(ValuationStage::Cancelled, stage.completion());
        ValuationOutcome::Cancelled { stage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Insurer, PolicyTerm, PolicyType};
    use std::sync::Mutex;

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

    fn recording() -> (Arc<Mutex<Vec<ProgressEvent>>>, impl ProgressObserver + 'static) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let observer = move |event: &ProgressEvent| sink.lock().unwrap().push(*event);
        (events, observer)
    }

    #[test]
    fn test_stages_run_in_order() {
        let (events, observer) = recording();
        let orchestrator =
            ValuationOrchestrator::new(endowment(), MarketAssumptions::default(), date(2025, 1, 1))
                .with_observer(observer);
        assert_eq!(orchestrator.stage(), ValuationStage::Idle);

        let outcome = orchestrator.run();
        assert_eq!(outcome.terminal_stage(), ValuationStage::Complete);

        let stages: Vec<_> = events.lock().unwrap().iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                ValuationStage::ProjectingCashFlows,
                ValuationStage::AssessingRisk,
                ValuationStage::Pricing,
                ValuationStage::AnalyzingReturns,
                ValuationStage::Complete,
            ]
        );
        let fractions: Vec<_> = events.lock().unwrap().iter().map(|e| e.fraction).collect();
        assert!(fractions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(fractions.last(), Some(&1.0));
    }

    #[test]
    fn test_projection_failure_preserves_error() {
        let (events, observer) = recording();
        let outcome = ValuationOrchestrator::new(endowment(), MarketAssumptions::default(), date(2045, 1, 1))
            .with_observer(observer)
            .run();

        match outcome {
            ValuationOutcome::Failed { stage, error } => {
                assert_eq!(stage, ValuationStage::ProjectingCashFlows);
                assert_eq!(error.field(), "total_term");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        let stages: Vec<_> = events.lock().unwrap().iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![ValuationStage::ProjectingCashFlows, ValuationStage::Failed]);
    }

    #[test]
    fn test_bad_configuration_fails_from_idle() {
        let assumptions = MarketAssumptions {
            surrender_discount: -0.1,
            ..Default::default()
        };
        let outcome = ValuationOrchestrator::new(endowment(), assumptions, date(2025, 1, 1)).run();
        match outcome {
            ValuationOutcome::Failed { stage, error } => {
                assert_eq!(stage, ValuationStage::Idle);
                assert!(matches!(error, ValuationError::Configuration { .. }));
            }
            other => panic!("expected configuration failure, got {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_between_stages() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let observer = move |event: &ProgressEvent| {
            sink.lock().unwrap().push(event.stage);
            if event.stage == ValuationStage::Pricing {
                trigger.cancel();
            }
        };

        let outcome = ValuationOrchestrator::new(endowment(), MarketAssumptions::default(), date(2025, 1, 1))
            .with_observer(observer)
            .with_cancellation(token)
            .run();

        assert_eq!(outcome, ValuationOutcome::Cancelled { stage: ValuationStage::Pricing });
        let stages = events.lock().unwrap().clone();
        assert!(!stages.contains(&ValuationStage::AnalyzingReturns));
        assert_eq!(stages.last(), Some(&ValuationStage::Cancelled));

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err, ValuationError::Cancelled { stage: "pricing".to_string() });
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = ValuationOrchestrator::new(endowment(), MarketAssumptions::default(), date(2025, 1, 1))
            .with_cancellation(token)
            .run();
        assert_eq!(outcome, ValuationOutcome::Cancelled { stage: ValuationStage::Idle });
    }
}
