//! Result and audit building.
//!
//! Every invocation — success or failure — produces exactly one audit
//! record carrying the request parameters, the pre-ladder diagnostic
//! snapshot, the ladder outcome, and a content-derived fingerprint of
//! the selected leg ids. Records are write-once: the engine delivers
//! them to an `AuditSink` and never reads them back.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::types::{Diagnostic, ReasonCode, SelectionRequest, SelectionResult};

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// How far the fallback ladder got for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderOutcome {
    /// Accepted at this relaxation step.
    Accepted { step: u8 },
    /// All steps attempted, none produced a valid selection.
    Exhausted,
    /// Rejected before the ladder ran (insufficient pool or invalid
    /// request).
    NotRun,
}

/// One write-once audit record per selection invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub request: SelectionRequest,
    pub accepted: bool,
    pub reason: Option<ReasonCode>,
    pub ladder: LadderOutcome,
    pub diagnostic: Diagnostic,
    pub leg_ids: Vec<String>,
    pub aggregate_weight: Option<f64>,
    /// SHA-256 over the sorted selected leg ids. Lets the storage
    /// collaborator detect duplicate or near-duplicate selections
    /// across requests; not used by the core for correctness.
    pub fingerprint: Option<String>,
}

impl AuditRecord {
    /// Build the record for a terminal result plus the pre-ladder
    /// diagnostic snapshot.
    pub fn build(
        request: &SelectionRequest,
        result: &SelectionResult,
        diagnostic: &Diagnostic,
    ) -> Self {
        let (accepted, reason, ladder, leg_ids, aggregate_weight) = match result {
            SelectionResult::Accepted {
                legs,
                aggregate_weight,
                relaxation_step,
                ..
            } => (
                true,
                None,
                LadderOutcome::Accepted {
                    step: *relaxation_step,
                },
                legs.iter().map(|l| l.id.clone()).collect::<Vec<_>>(),
                Some(*aggregate_weight),
            ),
            SelectionResult::Rejected { reason, .. } => {
                let ladder = match reason {
                    ReasonCode::NoValidSelection => LadderOutcome::Exhausted,
                    ReasonCode::InsufficientPool | ReasonCode::InvalidRequest => {
                        LadderOutcome::NotRun
                    }
                };
                (false, Some(*reason), ladder, Vec::new(), None)
            }
        };

        let fingerprint = if accepted {
            Some(fingerprint(&leg_ids))
        } else {
            None
        };

        AuditRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            request: request.clone(),
            accepted,
            reason,
            ladder,
            diagnostic: diagnostic.clone(),
            leg_ids,
            aggregate_weight,
            fingerprint,
        }
    }
}

/// Content-derived fingerprint of a selection: SHA-256 over the leg
/// ids in sorted order, so the same set of legs always fingerprints
/// identically regardless of selection order.
pub fn fingerprint(leg_ids: &[String]) -> String {
    let mut sorted: Vec<&String> = leg_ids.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for id in sorted {
        hasher.update(id.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Write-only destination for audit records.
///
/// Implementors persist records for the analytics collaborator; the
/// engine only ever appends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<()>;
}

/// In-memory sink for tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}

/// Append-only JSON-lines file sink.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AuditSink for JsonlSink {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        use tokio::io::AsyncWriteExt;

        let mut line = serde_json::to_string(record)
            .context("Failed to serialise audit record")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open audit log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append audit record to {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("Failed to flush audit log {}", self.path.display()))?;

        debug!(record_id = %record.id, path = %self.path.display(), "Audit record written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
