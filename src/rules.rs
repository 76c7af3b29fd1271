//! Profile rule engine.
//!
//! Holds the per-profile selection thresholds (minimum aggregate weight,
//! soft tier minimums, volatility cap) and derives the progressively
//! relaxed constraint sets used by the fallback ladder.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Number of relaxation steps in the fallback ladder (steps 0..=5).
pub const LADDER_STEPS: u8 = 6;

/// Weight reduction applied from step 1 onward.
pub const WEIGHT_RELAX_FIRST: f64 = 1.5;

/// Additional, larger weight reduction applied at step 5.
pub const WEIGHT_RELAX_SECOND: f64 = 3.0;

/// Per-profile selection thresholds. Static configuration: loaded once
/// at startup, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Minimum aggregate parlay weight to accept a selection.
    pub min_aggregate_weight: f64,
    /// Soft minimum number of STRONG legs.
    pub min_strong: u8,
    /// Soft minimum number of additional MODERATE-or-stronger legs
    /// beyond the STRONG minimum.
    pub min_moderate: u8,
    /// Maximum number of HIGH-volatility legs.
    pub max_high_volatility: u8,
    /// Whether WEAK-tier legs may be selected at all before step 4.
    pub allow_weak: bool,
    /// Default for exotic-category inclusion when the request does not
    /// say either way.
    pub include_exotics: bool,
}

impl RuleSet {
    /// Built-in default for a profile. Used by tests and as a template
    /// for the shipped config file.
    pub fn default_for(profile: crate::types::RiskProfile) -> Self {
        use crate::types::RiskProfile::*;
        match profile {
            Conservative => RuleSet {
                min_aggregate_weight: 8.0,
                min_strong: 2,
                min_moderate: 1,
                max_high_volatility: 0,
                allow_weak: false,
                include_exotics: false,
            },
            Balanced => RuleSet {
                min_aggregate_weight: 6.0,
                min_strong: 1,
                min_moderate: 1,
                max_high_volatility: 1,
                allow_weak: false,
                include_exotics: false,
            },
            Aggressive => RuleSet {
                min_aggregate_weight: 4.0,
                min_strong: 0,
                min_moderate: 1,
                max_high_volatility: 2,
                allow_weak: true,
                include_exotics: true,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Relaxation
// ---------------------------------------------------------------------------

/// Constraints actually in force at a given ladder step.
///
/// Steps are cumulative: each one loosens exactly one constraint
/// relative to the previous step, so a selection achievable at step K
/// is achievable at any later step.
///
/// ```text
/// Step 0: full RuleSet as configured
/// Step 1: minimum aggregate weight lowered by WEIGHT_RELAX_FIRST
/// Step 2: one additional HIGH-volatility leg permitted
/// Step 3: soft tier minimums lowered by one unit each
/// Step 4: WEAK-tier legs permitted
/// Step 5: minimum aggregate weight lowered by WEIGHT_RELAX_SECOND more
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxedRules {
    pub step: u8,
    pub min_aggregate_weight: f64,
    pub min_strong: u8,
    pub min_moderate: u8,
    pub max_high_volatility: u8,
    pub allow_weak: bool,
}

impl RelaxedRules {
    /// Derive the constraint set in force at `step` from the configured
    /// RuleSet. Hard gates and the correlation guard are not represented
    /// here because they are never relaxed.
    pub fn at_step(rules: &RuleSet, step: u8) -> Self {
        debug_assert!(step < LADDER_STEPS);

        let mut relaxed = RelaxedRules {
            step,
            min_aggregate_weight: rules.min_aggregate_weight,
            min_strong: rules.min_strong,
            min_moderate: rules.min_moderate,
            max_high_volatility: rules.max_high_volatility,
            allow_weak: rules.allow_weak,
        };

        if step >= 1 {
            relaxed.min_aggregate_weight -= WEIGHT_RELAX_FIRST;
        }
        if step >= 2 {
            relaxed.max_high_volatility = relaxed.max_high_volatility.saturating_add(1);
        }
        if step >= 3 {
            relaxed.min_strong = relaxed.min_strong.saturating_sub(1);
            relaxed.min_moderate = relaxed.min_moderate.saturating_sub(1);
        }
        if step >= 4 {
            relaxed.allow_weak = true;
        }
        if step >= 5 {
            relaxed.min_aggregate_weight -= WEIGHT_RELAX_SECOND;
        }

        relaxed
    }
}

impl fmt::Display for RelaxedRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step={} min_weight={:.2} min_strong={} min_moderate={} max_high_vol={} allow_weak={}",
            self.step,
            self.min_aggregate_weight,
            self.min_strong,
            self.min_moderate,
            self.max_high_volatility,
            self.allow_weak,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
