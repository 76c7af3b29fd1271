//! End-to-end selection scenarios.
//!
//! Drives the full intake → gate → classify → ladder → audit pipeline
//! with deterministic in-memory pools, covering the acceptance and
//! rejection paths a production caller would see.

use std::sync::Arc;

use parlay_architect::audit::MemorySink;
use parlay_architect::config::EngineConfig;
use parlay_architect::engine::ParlayArchitect;
use parlay_architect::intake;
use parlay_architect::types::{
    Leg, MarketCategory, ReasonCode, RiskProfile, SelectionRequest, SelectionResult,
    SignalStrength, Volatility,
};

fn engine() -> ParlayArchitect {
    ParlayArchitect::new(Arc::new(EngineConfig::default()))
}

fn make_leg(id: &str, entity: &str, signal: SignalStrength, confidence: f64) -> Leg {
    Leg {
        id: id.to_string(),
        entity_key: Some(entity.to_string()),
        signal,
        confidence,
        volatility: Volatility::Low,
        category: MarketCategory::Spread,
        data_complete: true,
        market_verified: true,
    }
}

/// Ten clean legs with a healthy tier mix.
fn healthy_pool() -> Vec<Leg> {
    (0..10)
        .map(|i| {
            let signal = if i < 4 {
                SignalStrength::Strong
            } else {
                SignalStrength::Medium
            };
            make_leg(&format!("l{i:02}"), &format!("e{i}"), signal, 0.75)
        })
        .collect()
}

#[test]
fn healthy_pool_accepted_at_step_zero() {
    let request = SelectionRequest::new(4, RiskProfile::Balanced);
    match engine().select(&request, &healthy_pool()) {
        SelectionResult::Accepted {
            legs,
            relaxation_step,
            aggregate_weight,
            ..
        } => {
            assert_eq!(legs.len(), 4);
            assert_eq!(relaxation_step, 0);
            assert!(aggregate_weight > 0.0);
        }
        other => panic!("Expected acceptance, got {other}"),
    }
}

#[test]
fn undersized_pool_rejected_before_ladder() {
    let pool = healthy_pool().into_iter().take(2).collect::<Vec<_>>();
    let request = SelectionRequest::new(4, RiskProfile::Balanced);
    match engine().select(&request, &pool) {
        SelectionResult::Rejected { reason, diagnostic } => {
            assert_eq!(reason, ReasonCode::InsufficientPool);
            assert_eq!(diagnostic.eligible_total, 2);
            assert_eq!(diagnostic.total_candidates, 2);
        }
        other => panic!("Expected rejection, got {other}"),
    }
}

#[test]
fn single_entity_pool_exhausts_ladder() {
    let pool: Vec<Leg> = (0..20)
        .map(|i| {
            make_leg(
                &format!("l{i:02}"),
                "same-game",
                SignalStrength::Strong,
                0.80,
            )
        })
        .collect();
    let request = SelectionRequest::new(3, RiskProfile::Balanced);
    match engine().select(&request, &pool) {
        SelectionResult::Rejected { reason, diagnostic } => {
            assert_eq!(reason, ReasonCode::NoValidSelection);
            assert_eq!(diagnostic.eligible_total, 20);
        }
        other => panic!("Expected rejection, got {other}"),
    }
}

#[test]
fn single_entity_pool_accepted_when_correlation_bypassed() {
    let pool: Vec<Leg> = (0..20)
        .map(|i| {
            make_leg(
                &format!("l{i:02}"),
                "same-game",
                SignalStrength::Strong,
                0.80,
            )
        })
        .collect();
    let mut request = SelectionRequest::new(3, RiskProfile::Balanced);
    request.allow_same_entity = true;
    match engine().select(&request, &pool) {
        SelectionResult::Accepted {
            legs,
            relaxation_step,
            ..
        } => {
            assert_eq!(legs.len(), 3);
            assert_eq!(relaxation_step, 0);
        }
        other => panic!("Expected acceptance, got {other}"),
    }
}

#[test]
fn all_weak_pool_needs_step_four() {
    let pool: Vec<Leg> = (0..8)
        .map(|i| {
            make_leg(
                &format!("l{i:02}"),
                &format!("e{i}"),
                SignalStrength::Weak,
                0.70,
            )
        })
        .collect();
    let request = SelectionRequest::new(4, RiskProfile::Balanced);
    match engine().select(&request, &pool) {
        SelectionResult::Accepted {
            relaxation_step,
            rules_applied,
            ..
        } => {
            assert_eq!(relaxation_step, 4);
            assert!(rules_applied.allow_weak);
        }
        other => panic!("Expected step-4 acceptance, got {other}"),
    }
}

#[test]
fn hard_gated_legs_never_appear_in_selection() {
    let mut pool = healthy_pool();
    // Poison the best-looking legs with gate failures.
    pool[0].data_complete = false;
    pool[1].market_verified = false;
    pool[2].data_complete = false;
    pool[2].market_verified = false;

    let request = SelectionRequest::new(4, RiskProfile::Balanced);
    match engine().select(&request, &pool) {
        SelectionResult::Accepted { legs, .. } => {
            for leg in &legs {
                assert!(leg.passes_hard_gates(), "gated leg selected: {leg}");
            }
        }
        other => panic!("Expected acceptance from remaining clean legs, got {other}"),
    }
}

#[test]
fn rejection_diagnostic_counts_blocked_causes() {
    let mut pool: Vec<Leg> = (0..4)
        .map(|i| {
            make_leg(
                &format!("l{i:02}"),
                &format!("e{i}"),
                SignalStrength::Strong,
                0.8,
            )
        })
        .collect();
    pool[0].data_complete = false;
    pool[1].market_verified = false;
    pool[2].data_complete = false;
    pool[2].market_verified = false;
    pool[3].category = MarketCategory::Exotic;

    let request = SelectionRequest::new(3, RiskProfile::Balanced);
    match engine().select(&request, &pool) {
        SelectionResult::Rejected { reason, diagnostic } => {
            assert_eq!(reason, ReasonCode::InsufficientPool);
            assert_eq!(diagnostic.eligible_total, 0);
            assert_eq!(diagnostic.blocked.gate_a, 1);
            assert_eq!(diagnostic.blocked.gate_b, 1);
            assert_eq!(diagnostic.blocked.both, 1);
            assert_eq!(diagnostic.blocked.category_excluded, 1);
            assert_eq!(
                diagnostic.eligible_total,
                diagnostic.eligible_by_tier.total()
            );
        }
        other => panic!("Expected rejection, got {other}"),
    }
}

#[test]
fn identical_inputs_yield_byte_identical_results() {
    let pool = healthy_pool();
    let mut request = SelectionRequest::new(4, RiskProfile::Balanced);
    request.seed = 7;

    let engine = engine();
    let first = serde_json::to_vec(&engine.select(&request, &pool)).unwrap();
    for _ in 0..10 {
        let again = serde_json::to_vec(&engine.select(&request, &pool)).unwrap();
        assert_eq!(first, again);
    }
}

#[test]
fn result_serializes_with_status_discriminator() {
    let request = SelectionRequest::new(4, RiskProfile::Balanced);
    let accepted = serde_json::to_value(engine().select(&request, &healthy_pool())).unwrap();
    assert_eq!(accepted["status"], "ACCEPTED");

    let rejected =
        serde_json::to_value(engine().select(&SelectionRequest::new(40, RiskProfile::Balanced), &healthy_pool()))
            .unwrap();
    assert_eq!(rejected["status"], "REJECTED");
}

#[test]
fn intake_feeds_engine_end_to_end() {
    let batch = serde_json::json!([
        {"id": "l01", "entity_key": "g1", "signal": "strong", "confidence": 0.85,
         "volatility": "low", "category": "spread", "data_complete": true, "market_verified": true},
        {"id": "l02", "entity_key": "g2", "signal": "strong", "confidence": 0.80,
         "volatility": "low", "category": "ml", "data_complete": true, "market_verified": true},
        {"id": "l03", "entity_key": "g3", "signal": "medium", "confidence": 0.75,
         "volatility": "medium", "category": "total", "data_complete": true, "market_verified": true},
        {"id": "l04", "entity_key": "g4", "signal": "medium", "confidence": 0.70,
         "volatility": "low", "category": "spread", "data_complete": true, "market_verified": true},
        {"id": "garbage", "confidence": 3.0}
    ]);
    let report = intake::from_json(&batch).unwrap();
    assert_eq!(report.malformed, 1);
    assert_eq!(report.legs.len(), 4);

    let request = SelectionRequest::new(3, RiskProfile::Balanced);
    let result = engine().select(&request, &report.legs);
    assert!(result.is_accepted());
}

#[tokio::test]
async fn every_invocation_writes_one_audit_record() {
    let engine = engine();
    let sink = MemorySink::new();

    // Success.
    engine
        .select_and_record(
            &SelectionRequest::new(4, RiskProfile::Balanced),
            &healthy_pool(),
            &sink,
        )
        .await
        .unwrap();
    // Failure.
    engine
        .select_and_record(
            &SelectionRequest::new(40, RiskProfile::Balanced),
            &healthy_pool(),
            &sink,
        )
        .await
        .unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert!(records[0].accepted);
    assert!(records[0].fingerprint.is_some());
    assert!(!records[1].accepted);
    assert_eq!(records[1].reason, Some(ReasonCode::InsufficientPool));
    assert!(records[1].fingerprint.is_none());
}

#[tokio::test]
async fn same_selection_fingerprints_identically_across_requests() {
    let engine = engine();
    let sink = MemorySink::new();
    let pool = healthy_pool();
    let request = SelectionRequest::new(4, RiskProfile::Balanced);

    engine.select_and_record(&request, &pool, &sink).await.unwrap();
    engine.select_and_record(&request, &pool, &sink).await.unwrap();

    let records = sink.records();
    assert_eq!(records[0].fingerprint, records[1].fingerprint);
    assert_ne!(records[0].id, records[1].id);
}
