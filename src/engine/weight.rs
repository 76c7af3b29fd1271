//! Weight/scoring engine.
//!
//! Computes per-leg scores and the aggregate parlay weight used for
//! ranking and acceptance. Aggregation sums legs in ascending-id order
//! so the result is bit-identical across runs regardless of how the
//! pool was ordered on the way in.

use crate::types::Tier;

/// Base weight per tier. STRONG is weighted most heavily; confidence
/// adds up to one unit on top, so tiers occupy adjoining score bands
/// (STRONG 3..4, MODERATE 2..3, WEAK 1..2).
pub fn tier_base(tier: Tier) -> f64 {
    match tier {
        Tier::Strong => 3.0,
        Tier::Moderate => 2.0,
        Tier::Weak => 1.0,
    }
}

/// Score for a single leg.
pub fn leg_score(tier: Tier, confidence: f64) -> f64 {
    tier_base(tier) + confidence.clamp(0.0, 1.0)
}

/// Aggregate weight of a selection: the sum of per-leg scores, taken
/// in ascending-id order. The explicit ordering removes any floating
/// non-determinism from unordered aggregation.
pub fn aggregate(scored: &[(String, f64)]) -> f64 {
    let mut ordered: Vec<&(String, f64)> = scored.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0));
    ordered.iter().map(|(_, score)| score).sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
