//! Tier classification.
//!
//! Maps raw leg signals to the derived STRONG/MODERATE/WEAK tier.
//! Classification is a pure function of the leg and the configured
//! per-category thresholds, so it is fully reproducible per request.

use tracing::debug;

use crate::config::TierThresholds;
use crate::types::{Leg, SignalStrength, Tier};

/// A leg together with its derived tier, produced once per request.
#[derive(Debug, Clone)]
pub struct ClassifiedLeg {
    pub leg: Leg,
    pub tier: Tier,
}

/// Classify a single leg.
///
/// Strong signals map directly to STRONG. Medium signals are promoted
/// to MODERATE when confidence meets the category's cutoff; this
/// promotion is what keeps the upper tiers populated — without it only
/// the rare already-strong signals would ever reach them. Weak and
/// undecided signals map to WEAK.
pub fn classify(leg: &Leg, thresholds: &TierThresholds) -> Tier {
    match leg.signal {
        SignalStrength::Strong => Tier::Strong,
        SignalStrength::Medium => {
            let cutoff = thresholds.for_category(leg.category);
            if leg.confidence >= cutoff {
                Tier::Moderate
            } else {
                debug!(
                    leg_id = %leg.id,
                    confidence = leg.confidence,
                    cutoff,
                    category = %leg.category,
                    "Medium signal below promotion cutoff"
                );
                Tier::Weak
            }
        }
        SignalStrength::Weak | SignalStrength::Unknown => Tier::Weak,
    }
}

/// Classify every leg in the eligible pool.
pub fn classify_all(legs: Vec<Leg>, thresholds: &TierThresholds) -> Vec<ClassifiedLeg> {
    legs.into_iter()
        .map(|leg| {
            let tier = classify(&leg, thresholds);
            ClassifiedLeg { leg, tier }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
