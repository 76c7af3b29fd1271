//! Intake boundary for upstream leg records.
//!
//! Upstream scoring feeds arrive loosely typed. This module converts
//! them into the immutable `Leg` type before anything reaches the
//! engine, quarantining malformed records with explicit counts rather
//! than crashing inside the core algorithm.

use serde::Deserialize;
use tracing::warn;

use crate::types::{ArchitectError, Leg, MarketCategory, SignalStrength, Volatility};

/// A leg record as upstream sends it. Every field is optional so a
/// partial record deserializes instead of failing the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLeg {
    pub id: Option<String>,
    pub entity_key: Option<String>,
    pub signal: Option<String>,
    pub confidence: Option<f64>,
    pub volatility: Option<String>,
    pub category: Option<String>,
    pub data_complete: Option<bool>,
    pub market_verified: Option<bool>,
}

/// Outcome of converting one upstream batch.
#[derive(Debug, Clone, Default)]
pub struct IntakeReport {
    pub legs: Vec<Leg>,
    /// Records dropped for missing or out-of-range required fields.
    pub malformed: u32,
    /// Accepted legs that arrived without an entity key.
    pub missing_entity_key: u32,
}

/// Convert a batch of upstream records into validated legs.
///
/// Required: `id`, `confidence` in [0,1], parseable `volatility` and
/// `category`. A missing or unrecognised signal becomes `Unknown`
/// (classified WEAK downstream). Missing gate flags default to failing:
/// integrity we cannot confirm is integrity we do not have.
pub fn convert(batch: Vec<RawLeg>) -> IntakeReport {
    let mut report = IntakeReport::default();

    for raw in batch {
        match convert_one(&raw) {
            Some(leg) => {
                if leg.entity_key.is_none() {
                    warn!(leg_id = %leg.id, "Upstream leg missing entity key");
                    report.missing_entity_key += 1;
                }
                report.legs.push(leg);
            }
            None => {
                warn!(?raw, "Quarantined malformed upstream leg record");
                report.malformed += 1;
            }
        }
    }

    report
}

/// Parse a JSON array of upstream records.
pub fn from_json(value: &serde_json::Value) -> Result<IntakeReport, ArchitectError> {
    let batch: Vec<RawLeg> = serde_json::from_value(value.clone())
        .map_err(|e| ArchitectError::Intake(format!("Upstream batch is not a leg array: {e}")))?;
    Ok(convert(batch))
}

fn convert_one(raw: &RawLeg) -> Option<Leg> {
    let id = raw.id.clone().filter(|s| !s.is_empty())?;

    let confidence = raw.confidence?;
    if !(0.0..=1.0).contains(&confidence) || confidence.is_nan() {
        return None;
    }

    let volatility: Volatility = raw.volatility.as_deref()?.parse().ok()?;
    let category: MarketCategory = raw.category.as_deref()?.parse().ok()?;

    let signal = raw
        .signal
        .as_deref()
        .and_then(|s| s.parse::<SignalStrength>().ok())
        .unwrap_or(SignalStrength::Unknown);

    Some(Leg {
        id,
        entity_key: raw.entity_key.clone().filter(|s| !s.is_empty()),
        signal,
        confidence,
        volatility,
        category,
        data_complete: raw.data_complete.unwrap_or(false),
        market_verified: raw.market_verified.unwrap_or(false),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
