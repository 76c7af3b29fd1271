//! Correlation guard.
//!
//! Enforces the same-entity exclusion rule: at most one leg per
//! distinct entity key in a single parlay. Unlike the soft tier and
//! weight constraints, this rule is never relaxed by the ladder.

use std::collections::HashSet;
use tracing::warn;

use crate::types::Leg;

/// Tracks entity keys used by an in-progress selection.
pub struct CorrelationGuard {
    allow_same_entity: bool,
    seen: HashSet<String>,
}

impl CorrelationGuard {
    pub fn new(allow_same_entity: bool) -> Self {
        Self {
            allow_same_entity,
            seen: HashSet::new(),
        }
    }

    /// Admit the leg if it does not collide with an already-selected
    /// entity, registering its key on success.
    ///
    /// Legs without an entity key are treated as always-unique so a
    /// missing key never causes a false rejection; the warning is a
    /// data-quality signal for upstream. The engine separately reports
    /// these legs in the `correlation_unchecked` diagnostic count.
    pub fn try_admit(&mut self, leg: &Leg) -> bool {
        if self.allow_same_entity {
            return true;
        }

        match &leg.entity_key {
            Some(key) => {
                if self.seen.contains(key) {
                    return false;
                }
                self.seen.insert(key.clone());
                true
            }
            None => {
                warn!(leg_id = %leg.id, "Leg has no entity key; correlation unchecked");
                true
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
