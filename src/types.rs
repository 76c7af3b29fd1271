//! Shared types for the Parlay Architect.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that intake, rules, and engine
//! modules can depend on them without circular references.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rules::RelaxedRules;

// ---------------------------------------------------------------------------
// Leg
// ---------------------------------------------------------------------------

/// A single candidate item eligible for inclusion in a parlay.
///
/// Constructed fresh per request at the intake boundary and immutable
/// for the duration of a selection attempt. Persistence is the audit
/// collaborator's job; the engine never stores legs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    /// Unique identifier, stable across requests.
    pub id: String,
    /// Grouping key for same-entity exclusion (e.g. the underlying
    /// player or game). May be absent; absence is logged and counted,
    /// never silently ignored.
    pub entity_key: Option<String>,
    /// Upstream categorical quality state.
    pub signal: SignalStrength,
    /// Upstream confidence in the signal (0.0–1.0).
    pub confidence: f64,
    pub volatility: Volatility,
    pub category: MarketCategory,
    /// Gate-A: upstream data for this leg is complete and consistent.
    pub data_complete: bool,
    /// Gate-B: the underlying market is verified as open and priceable.
    pub market_verified: bool,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} conf={:.0}% vol={} (A={} B={})",
            self.id,
            self.category,
            self.signal,
            self.confidence * 100.0,
            self.volatility,
            self.data_complete,
            self.market_verified,
        )
    }
}

impl Leg {
    /// Whether both hard gates pass. Legs failing either gate are
    /// excluded at every relaxation step.
    pub fn passes_hard_gates(&self) -> bool {
        self.data_complete && self.market_verified
    }

    /// Helper to build a test leg with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: &str) -> Self {
        Leg {
            id: id.to_string(),
            entity_key: Some(format!("entity-{id}")),
            signal: SignalStrength::Medium,
            confidence: 0.70,
            volatility: Volatility::Medium,
            category: MarketCategory::Spread,
            data_complete: true,
            market_verified: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Upstream categorical quality state for a leg.
///
/// `Unknown` covers any fallback or undecided upstream state; the
/// classifier maps it to the weakest tier rather than rejecting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalStrength {
    Strong,
    Medium,
    Weak,
    Unknown,
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStrength::Strong => write!(f, "STRONG"),
            SignalStrength::Medium => write!(f, "MEDIUM"),
            SignalStrength::Weak => write!(f, "WEAK"),
            SignalStrength::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl std::str::FromStr for SignalStrength {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strong" => Ok(SignalStrength::Strong),
            "medium" | "moderate" => Ok(SignalStrength::Medium),
            "weak" => Ok(SignalStrength::Weak),
            "unknown" | "undecided" | "pending" => Ok(SignalStrength::Unknown),
            _ => Err(anyhow::anyhow!("Unknown signal strength: {s}")),
        }
    }
}

/// Discrete volatility classification, ordered LOW < MEDIUM < HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Volatility {
    Low,
    Medium,
    High,
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volatility::Low => write!(f, "LOW"),
            Volatility::Medium => write!(f, "MEDIUM"),
            Volatility::High => write!(f, "HIGH"),
        }
    }
}

impl std::str::FromStr for Volatility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Volatility::Low),
            "medium" | "mid" => Ok(Volatility::Medium),
            "high" => Ok(Volatility::High),
            _ => Err(anyhow::anyhow!("Unknown volatility class: {s}")),
        }
    }
}

/// Market category a leg belongs to. Exotic markets (derivatives,
/// proposition chains) are excluded by default and opted in per
/// request or per profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCategory {
    Moneyline,
    Spread,
    Total,
    PlayerProp,
    Exotic,
}

impl MarketCategory {
    /// All known categories (useful for iteration).
    pub const ALL: &'static [MarketCategory] = &[
        MarketCategory::Moneyline,
        MarketCategory::Spread,
        MarketCategory::Total,
        MarketCategory::PlayerProp,
        MarketCategory::Exotic,
    ];
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketCategory::Moneyline => write!(f, "Moneyline"),
            MarketCategory::Spread => write!(f, "Spread"),
            MarketCategory::Total => write!(f, "Total"),
            MarketCategory::PlayerProp => write!(f, "PlayerProp"),
            MarketCategory::Exotic => write!(f, "Exotic"),
        }
    }
}

impl std::str::FromStr for MarketCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "moneyline" | "ml" | "h2h" => Ok(MarketCategory::Moneyline),
            "spread" | "handicap" => Ok(MarketCategory::Spread),
            "total" | "totals" | "over_under" => Ok(MarketCategory::Total),
            "player_prop" | "playerprop" | "prop" => Ok(MarketCategory::PlayerProp),
            "exotic" | "derivative" | "same_game" => Ok(MarketCategory::Exotic),
            _ => Err(anyhow::anyhow!("Unknown market category: {s}")),
        }
    }
}

/// Derived quality tier, ordered WEAK < MODERATE < STRONG.
///
/// Never supplied by upstream; computed once per request by the
/// classifier as a pure function of the leg and configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Weak,
    Moderate,
    Strong,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Weak => write!(f, "WEAK"),
            Tier::Moderate => write!(f, "MODERATE"),
            Tier::Strong => write!(f, "STRONG"),
        }
    }
}

/// Named risk profile. Closed set; each entry maps to a RuleSet in
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskProfile {
    Conservative,
    Balanced,
    Aggressive,
}

impl RiskProfile {
    /// Configuration table key for this profile.
    pub fn key(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Balanced => "balanced",
            RiskProfile::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for RiskProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conservative" => Ok(RiskProfile::Conservative),
            "balanced" => Ok(RiskProfile::Balanced),
            "aggressive" => Ok(RiskProfile::Aggressive),
            _ => Err(anyhow::anyhow!("Unknown risk profile: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Immutable selection request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// Desired number of legs (N).
    pub leg_count: usize,
    pub profile: RiskProfile,
    /// Bypass the same-entity correlation guard entirely.
    pub allow_same_entity: bool,
    /// Include exotic-category legs. None falls back to the profile's
    /// configured default.
    pub include_exotics: Option<bool>,
    /// Deterministic randomness source for tie-breaking. Identical
    /// (pool, rules, N, seed) must always yield an identical result.
    pub seed: u64,
}

impl SelectionRequest {
    pub fn new(leg_count: usize, profile: RiskProfile) -> Self {
        Self {
            leg_count,
            profile,
            allow_same_entity: false,
            include_exotics: None,
            seed: 0,
        }
    }
}

impl fmt::Display for SelectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N={} profile={} same_entity={} exotics={:?} seed={}",
            self.leg_count, self.profile, self.allow_same_entity, self.include_exotics, self.seed,
        )
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Terminal outcome of a selection request. Exactly one variant is ever
/// populated; the engine never returns a partial selection disguised as
/// success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum SelectionResult {
    #[serde(rename = "ACCEPTED")]
    Accepted {
        /// Exactly N legs, in final selection order.
        legs: Vec<Leg>,
        aggregate_weight: f64,
        /// Ladder step at which the selection was accepted (0 = no
        /// relaxation needed).
        relaxation_step: u8,
        /// Snapshot of the constraints actually applied.
        rules_applied: RelaxedRules,
    },
    #[serde(rename = "REJECTED")]
    Rejected {
        reason: ReasonCode,
        diagnostic: Diagnostic,
    },
}

impl SelectionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SelectionResult::Accepted { .. })
    }
}

impl fmt::Display for SelectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionResult::Accepted {
                legs,
                aggregate_weight,
                relaxation_step,
                ..
            } => write!(
                f,
                "ACCEPTED {} legs weight={:.2} step={}",
                legs.len(),
                aggregate_weight,
                relaxation_step,
            ),
            SelectionResult::Rejected { reason, diagnostic } => write!(
                f,
                "REJECTED {} ({} eligible of {})",
                reason, diagnostic.eligible_total, diagnostic.total_candidates,
            ),
        }
    }
}

/// Exhaustive failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Fewer eligible legs than requested.
    InsufficientPool,
    /// Ladder exhausted without meeting any step's acceptance criteria.
    NoValidSelection,
    /// N == 0 or no configuration for the requested profile.
    InvalidRequest,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::InsufficientPool => write!(f, "INSUFFICIENT_POOL"),
            ReasonCode::NoValidSelection => write!(f, "NO_VALID_SELECTION"),
            ReasonCode::InvalidRequest => write!(f, "INVALID_REQUEST"),
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Eligible-leg counts per derived tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub strong: u32,
    pub moderate: u32,
    pub weak: u32,
}

impl TierCounts {
    pub fn total(&self) -> u32 {
        self.strong + self.moderate + self.weak
    }

    pub fn bump(&mut self, tier: Tier) {
        match tier {
            Tier::Strong => self.strong += 1,
            Tier::Moderate => self.moderate += 1,
            Tier::Weak => self.weak += 1,
        }
    }
}

impl fmt::Display for TierCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S={} M={} W={}", self.strong, self.moderate, self.weak)
    }
}

/// Ineligible-leg counts by exclusion cause. Both gates failing is
/// tracked jointly so correlated upstream failures are visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedCounts {
    pub gate_a: u32,
    pub gate_b: u32,
    pub both: u32,
    pub category_excluded: u32,
}

impl BlockedCounts {
    pub fn total(&self) -> u32 {
        self.gate_a + self.gate_b + self.both + self.category_excluded
    }
}

/// Snapshot of the pool state taken after gating and classification,
/// before the ladder runs. Attached to every rejection and to every
/// audit record, so diagnostics reflect the true starting state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub total_candidates: u32,
    pub eligible_total: u32,
    pub eligible_by_tier: TierCounts,
    pub blocked: BlockedCounts,
    /// Eligible legs with no entity key. The guard treats them as
    /// always-unique, so their correlation risk is unchecked.
    pub correlation_unchecked: u32,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidates={} eligible={} [{}] blocked={} unchecked={}",
            self.total_candidates,
            self.eligible_total,
            self.eligible_by_tier,
            self.blocked.total(),
            self.correlation_unchecked,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the Parlay Architect.
#[derive(Debug, thiserror::Error)]
pub enum ArchitectError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Intake error: {0}")]
    Intake(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
