//! Core engine — the gate → classify → ladder → audit pipeline.

pub mod correlation;
pub mod gate;
pub mod ladder;
pub mod tier;
pub mod weight;

use std::sync::Arc;
use tracing::{info, warn};

use crate::audit::{AuditRecord, AuditSink};
use crate::config::EngineConfig;
use crate::types::{Diagnostic, Leg, ReasonCode, SelectionRequest, SelectionResult};
use anyhow::Result;

use self::tier::ClassifiedLeg;

/// The selection engine.
///
/// Each call runs as an independent computation over an immutable input
/// snapshot; the engine holds no per-request state, so a single
/// instance is safely shared across concurrent request handlers.
pub struct ParlayArchitect {
    config: Arc<EngineConfig>,
}

impl ParlayArchitect {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Run a selection. Pure computation: no I/O, always terminates,
    /// and every outcome is either `Accepted` or `Rejected` with a
    /// diagnostic — never a panic on bad-but-well-formed input.
    pub fn select(&self, request: &SelectionRequest, candidates: &[Leg]) -> SelectionResult {
        self.run(request, candidates).0
    }

    /// Run a selection and build the audit record for this invocation.
    pub fn select_with_audit(
        &self,
        request: &SelectionRequest,
        candidates: &[Leg],
    ) -> (SelectionResult, AuditRecord) {
        let (result, diagnostic) = self.run(request, candidates);
        let record = AuditRecord::build(request, &result, &diagnostic);
        (result, record)
    }

    /// Run a selection and deliver the audit record to the sink.
    ///
    /// The write happens strictly after the pure computation; a sink
    /// failure is surfaced to the caller but the selection result is
    /// already final at that point.
    pub async fn select_and_record(
        &self,
        request: &SelectionRequest,
        candidates: &[Leg],
        sink: &dyn AuditSink,
    ) -> Result<SelectionResult> {
        let (result, record) = self.select_with_audit(request, candidates);
        sink.record(&record).await?;
        Ok(result)
    }

    fn run(&self, request: &SelectionRequest, candidates: &[Leg]) -> (SelectionResult, Diagnostic) {
        let rules = match self.config.rules_for(request.profile) {
            Some(rules) => rules,
            None => {
                warn!(profile = %request.profile, "No RuleSet configured for profile");
                let (_, diagnostic) = self.snapshot(candidates, false);
                return (
                    SelectionResult::Rejected {
                        reason: ReasonCode::InvalidRequest,
                        diagnostic: diagnostic.clone(),
                    },
                    diagnostic,
                );
            }
        };

        let include_exotics = request.include_exotics.unwrap_or(rules.include_exotics);

        if request.leg_count == 0 {
            warn!("Rejecting request for zero legs");
            let (_, diagnostic) = self.snapshot(candidates, include_exotics);
            return (
                SelectionResult::Rejected {
                    reason: ReasonCode::InvalidRequest,
                    diagnostic: diagnostic.clone(),
                },
                diagnostic,
            );
        }

        let (pool, diagnostic) = self.snapshot(candidates, include_exotics);
        info!(%request, %diagnostic, "Selection pool prepared");

        let result = ladder::execute(&pool, rules, request, &diagnostic);
        (result, diagnostic)
    }

    /// Gate and classify the pool, producing the pre-ladder snapshot.
    fn snapshot(
        &self,
        candidates: &[Leg],
        include_exotics: bool,
    ) -> (Vec<ClassifiedLeg>, Diagnostic) {
        let total_candidates = candidates.len() as u32;
        let outcome = gate::partition(candidates.to_vec(), include_exotics);
        let pool = tier::classify_all(outcome.eligible, &self.config.thresholds);

        let mut diagnostic = Diagnostic {
            total_candidates,
            eligible_total: pool.len() as u32,
            blocked: outcome.blocked,
            ..Diagnostic::default()
        };
        for classified in &pool {
            diagnostic.eligible_by_tier.bump(classified.tier);
            if classified.leg.entity_key.is_none() {
                diagnostic.correlation_unchecked += 1;
            }
        }

        (pool, diagnostic)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
