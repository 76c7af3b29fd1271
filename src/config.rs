//! Configuration loading from TOML.
//!
//! Deserializes per-category tier-promotion thresholds and the named
//! RuleSet table into strongly-typed structs. Load errors are fatal at
//! process start; after that the configuration is an immutable snapshot.
//!
//! Expected shape:
//!
//! ```toml
//! [thresholds]
//! moneyline = 0.55
//! spread = 0.60
//! total = 0.60
//! player_prop = 0.65
//! exotic = 0.75
//!
//! [profiles.balanced]
//! min_aggregate_weight = 6.0
//! min_strong = 1
//! min_moderate = 1
//! max_high_volatility = 1
//! allow_weak = false
//! include_exotics = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::rules::RuleSet;
use crate::types::{ArchitectError, MarketCategory, RiskProfile};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub thresholds: TierThresholds,
    /// RuleSet table keyed by profile name. A request for a profile
    /// absent from this table is rejected as INVALID_REQUEST.
    pub profiles: HashMap<String, RuleSet>,
}

/// Confidence cutoff for promoting a MEDIUM-signal leg to MODERATE,
/// per market category. Noisier categories carry higher cutoffs.
#[derive(Debug, Clone, Deserialize)]
pub struct TierThresholds {
    pub moneyline: f64,
    pub spread: f64,
    pub total: f64,
    pub player_prop: f64,
    pub exotic: f64,
}

impl TierThresholds {
    pub fn for_category(&self, category: MarketCategory) -> f64 {
        match category {
            MarketCategory::Moneyline => self.moneyline,
            MarketCategory::Spread => self.spread,
            MarketCategory::Total => self.total,
            MarketCategory::PlayerProp => self.player_prop,
            MarketCategory::Exotic => self.exotic,
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            moneyline: 0.55,
            spread: 0.60,
            total: 0.60,
            player_prop: 0.65,
            exotic: 0.75,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        for profile in [
            RiskProfile::Conservative,
            RiskProfile::Balanced,
            RiskProfile::Aggressive,
        ] {
            profiles.insert(profile.key().to_string(), RuleSet::default_for(profile));
        }
        Self {
            thresholds: TierThresholds::default(),
            profiles,
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file. Fail fast:
    /// any validation error here should abort process start.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: EngineConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        info!(path, profiles = config.profiles.len(), "Engine configuration loaded");
        Ok(config)
    }

    /// Validate threshold and RuleSet ranges.
    pub fn validate(&self) -> Result<(), ArchitectError> {
        for category in MarketCategory::ALL {
            let t = self.thresholds.for_category(*category);
            if !(t > 0.0 && t <= 1.0) {
                return Err(ArchitectError::Config(format!(
                    "Tier threshold for {category} out of range (0, 1]: {t}"
                )));
            }
        }
        if self.profiles.is_empty() {
            return Err(ArchitectError::Config("Profile table is empty".to_string()));
        }
        for (name, rules) in &self.profiles {
            if rules.min_aggregate_weight < 0.0 {
                return Err(ArchitectError::Config(format!(
                    "Profile {name}: min_aggregate_weight must be non-negative"
                )));
            }
        }
        Ok(())
    }

    /// RuleSet for the requested profile, if configured.
    pub fn rules_for(&self, profile: RiskProfile) -> Option<&RuleSet> {
        self.profiles.get(profile.key())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Holder for the active configuration snapshot.
///
/// Readers clone an `Arc` to the current snapshot and are unaffected by
/// a concurrent `replace`; a replace swaps the whole snapshot at once,
/// never a partial update.
pub struct ConfigStore {
    inner: RwLock<Arc<EngineConfig>>,
}

impl ConfigStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: RwLock::new(Arc::new(config)),
        }
    }

    /// The current snapshot. Cheap; safe to call per request.
    pub fn current(&self) -> Arc<EngineConfig> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Atomically replace the active snapshot. The new configuration is
    /// validated before the swap so a bad reload leaves the old
    /// snapshot in place.
    pub fn replace(&self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(config);
        info!("Engine configuration snapshot replaced");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.rules_for(RiskProfile::Balanced).is_some());
        assert!(config.rules_for(RiskProfile::Conservative).is_some());
        assert!(config.rules_for(RiskProfile::Aggressive).is_some());
    }

    #[test]
    fn test_thresholds_per_category() {
        let thresholds = TierThresholds::default();
        // Exotic markets are the noisiest, so their cutoff is highest.
        assert!(thresholds.for_category(MarketCategory::Exotic)
            > thresholds.for_category(MarketCategory::Moneyline));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = EngineConfig::default();
        config.thresholds.spread = 0.0;
        assert!(config.validate().is_err());

        config.thresholds.spread = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_profiles() {
        let mut config = EngineConfig::default();
        config.profiles.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut config = EngineConfig::default();
        config
            .profiles
            .get_mut("balanced")
            .unwrap()
            .min_aggregate_weight = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_from_toml() {
        let toml_str = r#"
            [thresholds]
            moneyline = 0.50
            spread = 0.55
            total = 0.55
            player_prop = 0.60
            exotic = 0.70

            [profiles.balanced]
            min_aggregate_weight = 5.5
            min_strong = 1
            min_moderate = 1
            max_high_volatility = 1
            allow_weak = false
            include_exotics = false
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.thresholds.moneyline, 0.50);
        let rules = config.rules_for(RiskProfile::Balanced).unwrap();
        assert_eq!(rules.min_aggregate_weight, 5.5);
        // Profiles not present in the file are simply missing.
        assert!(config.rules_for(RiskProfile::Aggressive).is_none());
    }

    #[test]
    fn test_store_replace_is_whole_snapshot() {
        let store = ConfigStore::new(EngineConfig::default());
        let before = store.current();

        let mut next = EngineConfig::default();
        next.thresholds.spread = 0.45;
        store.replace(next).unwrap();

        let after = store.current();
        assert_eq!(before.thresholds.spread, 0.60); // old snapshot untouched
        assert_eq!(after.thresholds.spread, 0.45);
    }

    #[test]
    fn test_store_replace_rejects_invalid() {
        let store = ConfigStore::new(EngineConfig::default());
        let mut bad = EngineConfig::default();
        bad.thresholds.total = 2.0;
        assert!(store.replace(bad).is_err());
        // Old snapshot still active.
        assert_eq!(store.current().thresholds.total, 0.60);
    }
}
