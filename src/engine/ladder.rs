//! Fallback ladder executor — the core selection algorithm.
//!
//! Runs a bounded search over a fixed sequence of relaxation steps,
//! each loosening exactly one constraint relative to the previous one.
//! Within a step, assembly is a deterministic greedy pass over the
//! eligible pool in (tier desc, score desc, seeded jitter, id asc)
//! order. The correlation guard and the hard gates are never relaxed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use tracing::{debug, info};

use super::correlation::CorrelationGuard;
use super::tier::ClassifiedLeg;
use super::weight;
use crate::rules::{RelaxedRules, RuleSet, LADDER_STEPS};
use crate::types::{
    Diagnostic, Leg, ReasonCode, SelectionRequest, SelectionResult, Tier, Volatility,
};

/// One pool entry, scored and ready for ordering.
struct Candidate<'a> {
    leg: &'a Leg,
    tier: Tier,
    score: f64,
    /// Seed-derived tie-break value for legs with identical (tier, score).
    jitter: u64,
}

/// Run the ladder over the eligible pool.
///
/// `diagnostic` is the pre-ladder snapshot; it is returned unchanged on
/// rejection so failure reports reflect the true starting state, not
/// partial relaxation.
pub fn execute(
    pool: &[ClassifiedLeg],
    rules: &RuleSet,
    request: &SelectionRequest,
    diagnostic: &Diagnostic,
) -> SelectionResult {
    // Not enough candidates regardless of rules: skip the ladder.
    if pool.len() < request.leg_count {
        info!(
            eligible = pool.len(),
            requested = request.leg_count,
            "Pool smaller than requested parlay size"
        );
        return SelectionResult::Rejected {
            reason: ReasonCode::InsufficientPool,
            diagnostic: diagnostic.clone(),
        };
    }

    let candidates = rank_pool(pool, request.seed);

    for step in 0..LADDER_STEPS {
        let relaxed = RelaxedRules::at_step(rules, step);
        debug!(%relaxed, "Attempting ladder step");

        if let Some((legs, aggregate_weight)) = assemble(&candidates, &relaxed, request) {
            info!(
                step,
                weight = aggregate_weight,
                legs = legs.len(),
                "Selection accepted"
            );
            return SelectionResult::Accepted {
                legs,
                aggregate_weight,
                relaxation_step: step,
                rules_applied: relaxed,
            };
        }
    }

    info!(eligible = pool.len(), "Ladder exhausted without a valid selection");
    SelectionResult::Rejected {
        reason: ReasonCode::NoValidSelection,
        diagnostic: diagnostic.clone(),
    }
}

/// Order the pool for greedy assembly.
///
/// Jitter is drawn from a generator seeded by the request, over the
/// pool in ascending-id order, so identical (pool, seed) always yields
/// identical jitter assignments. Id ascending remains the final
/// tie-break after the jitter.
fn rank_pool(pool: &[ClassifiedLeg], seed: u64) -> Vec<Candidate<'_>> {
    let mut candidates: Vec<Candidate<'_>> = pool
        .iter()
        .map(|c| Candidate {
            leg: &c.leg,
            tier: c.tier,
            score: weight::leg_score(c.tier, c.leg.confidence),
            jitter: 0,
        })
        .collect();

    candidates.sort_by(|a, b| a.leg.id.cmp(&b.leg.id));
    let mut rng = StdRng::seed_from_u64(seed);
    for candidate in &mut candidates {
        candidate.jitter = rng.gen();
    }

    candidates.sort_by(|a, b| {
        b.tier
            .cmp(&a.tier)
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
            .then_with(|| a.jitter.cmp(&b.jitter))
            .then_with(|| a.leg.id.cmp(&b.leg.id))
    });

    candidates
}

/// Greedily assemble exactly N legs under a step's constraints.
///
/// Because candidates arrive tier-first, the greedy pass maximises
/// tier counts subject to the guard and the volatility cap; the step
/// then accepts only if the soft tier minimums and the weight floor
/// are met.
fn assemble(
    candidates: &[Candidate<'_>],
    relaxed: &RelaxedRules,
    request: &SelectionRequest,
) -> Option<(Vec<Leg>, f64)> {
    let mut guard = CorrelationGuard::new(request.allow_same_entity);
    let mut high_vol_used: u8 = 0;
    let mut strong_count: u8 = 0;
    let mut moderate_count: u8 = 0;
    let mut selected: Vec<(&Leg, f64)> = Vec::with_capacity(request.leg_count);

    for candidate in candidates {
        if selected.len() == request.leg_count {
            break;
        }
        if candidate.tier == Tier::Weak && !relaxed.allow_weak {
            continue;
        }
        if candidate.leg.volatility == Volatility::High
            && high_vol_used >= relaxed.max_high_volatility
        {
            continue;
        }
        if !guard.try_admit(candidate.leg) {
            continue;
        }

        if candidate.leg.volatility == Volatility::High {
            high_vol_used += 1;
        }
        match candidate.tier {
            Tier::Strong => strong_count += 1,
            Tier::Moderate => moderate_count += 1,
            Tier::Weak => {}
        }
        selected.push((candidate.leg, candidate.score));
    }

    if selected.len() < request.leg_count {
        return None;
    }

    // Soft tier minimums: enough STRONG legs, and enough
    // MODERATE-or-stronger legs beyond the STRONG minimum.
    if strong_count < relaxed.min_strong {
        return None;
    }
    if (strong_count + moderate_count) < relaxed.min_strong + relaxed.min_moderate {
        return None;
    }

    let scored: Vec<(String, f64)> = selected
        .iter()
        .map(|(leg, score)| (leg.id.clone(), *score))
        .collect();
    let aggregate_weight = weight::aggregate(&scored);

    if aggregate_weight < relaxed.min_aggregate_weight {
        debug!(
            aggregate_weight,
            floor = relaxed.min_aggregate_weight,
            step = relaxed.step,
            "Assembled parlay below weight floor"
        );
        return None;
    }

    let legs = selected.into_iter().map(|(leg, _)| leg.clone()).collect();
    Some((legs, aggregate_weight))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
