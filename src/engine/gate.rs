//! Eligibility gate.
//!
//! Applies the hard pass/fail filters before anything else sees the
//! pool: data-integrity (Gate-A), market-validity (Gate-B), and the
//! optional exotic-category exclusion. These checks are never relaxed
//! by the fallback ladder.

use tracing::debug;

use crate::types::{BlockedCounts, Leg, MarketCategory};

/// Result of partitioning the candidate pool.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub eligible: Vec<Leg>,
    pub blocked: BlockedCounts,
}

/// Partition candidates into eligible and ineligible legs, tallying
/// the exclusion cause for every dropped leg. Legs failing both gates
/// are counted jointly so correlated upstream failures stand out.
pub fn partition(candidates: Vec<Leg>, include_exotics: bool) -> GateOutcome {
    let mut eligible = Vec::with_capacity(candidates.len());
    let mut blocked = BlockedCounts::default();

    for leg in candidates {
        match (leg.data_complete, leg.market_verified) {
            (false, false) => {
                debug!(leg_id = %leg.id, "Blocked: both hard gates failed");
                blocked.both += 1;
                continue;
            }
            (false, true) => {
                debug!(leg_id = %leg.id, "Blocked: incomplete data");
                blocked.gate_a += 1;
                continue;
            }
            (true, false) => {
                debug!(leg_id = %leg.id, "Blocked: market not verified");
                blocked.gate_b += 1;
                continue;
            }
            (true, true) => {}
        }

        if leg.category == MarketCategory::Exotic && !include_exotics {
            debug!(leg_id = %leg.id, "Blocked: exotic category not included");
            blocked.category_excluded += 1;
            continue;
        }

        eligible.push(leg);
    }

    GateOutcome { eligible, blocked }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
