// saga/src/journal.rs

//! The intent journal: an append-only log of step phases per saga run.
//!
//! A saga with a journal attached writes a `Started` entry before a step's
//! handlers execute and a terminal entry once the step resolves. After a
//! crash, `resolve_step` over a saga's history tells a recovery process
//! whether a step never ran, was interrupted mid-flight, or finished.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentPhase {
  Started,
  Completed,
  Failed,
  Skipped,
  Halted,
}

impl IntentPhase {
  pub fn as_str(self) -> &'static str {
    match self {
      IntentPhase::Started => "started",
      IntentPhase::Completed => "completed",
      IntentPhase::Failed => "failed",
      IntentPhase::Skipped => "skipped",
      IntentPhase::Halted => "halted",
    }
  }
}

impl fmt::Display for IntentPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for IntentPhase {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "started" => Ok(IntentPhase::Started),
      "completed" => Ok(IntentPhase::Completed),
      "failed" => Ok(IntentPhase::Failed),
      "skipped" => Ok(IntentPhase::Skipped),
      "halted" => Ok(IntentPhase::Halted),
      other => Err(anyhow::anyhow!("unknown intent phase '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentEntry {
  pub saga_id: String,
  pub step: String,
  pub phase: IntentPhase,
  /// Free-form payload. `Completed` entries carry the step annotator's
  /// output, `Failed` entries the error text.
  pub detail: Option<String>,
  pub recorded_at: DateTime<Utc>,
}

impl IntentEntry {
  pub fn new(saga_id: &str, step: &str, phase: IntentPhase, detail: Option<String>) -> Self {
    Self {
      saga_id: saga_id.to_string(),
      step: step.to_string(),
      phase,
      detail,
      recorded_at: Utc::now(),
    }
  }
}

/// Durable storage for intent entries.
#[async_trait]
pub trait IntentJournal: Send + Sync {
  /// Appends one entry. Entries for a saga must come back from `history` in
  /// the order they were recorded.
  async fn record(&self, entry: IntentEntry) -> anyhow::Result<()>;

  /// Every entry recorded for `saga_id`, oldest first.
  async fn history(&self, saga_id: &str) -> anyhow::Result<Vec<IntentEntry>>;
}

/// Where a step stands according to a saga's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResolution {
  NeverStarted,
  /// `Started` with no terminal entry after it: the process died mid-step.
  InFlight,
  Completed { detail: Option<String> },
  Failed { error: Option<String> },
  Skipped,
  Halted,
}

impl StepResolution {
  pub fn is_completed(&self) -> bool {
    matches!(self, StepResolution::Completed { .. })
  }
}

/// Resolves the latest phase of `step` from a saga history.
pub fn resolve_step(history: &[IntentEntry], step: &str) -> StepResolution {
  match history.iter().rev().find(|e| e.step == step) {
    None => StepResolution::NeverStarted,
    Some(entry) => match entry.phase {
      IntentPhase::Started => StepResolution::InFlight,
      IntentPhase::Completed => StepResolution::Completed {
        detail: entry.detail.clone(),
      },
      IntentPhase::Failed => StepResolution::Failed {
        error: entry.detail.clone(),
      },
      IntentPhase::Skipped => StepResolution::Skipped,
      IntentPhase::Halted => StepResolution::Halted,
    },
  }
}

/// Process-local journal. Survives nothing, but gives tests and
/// single-node development the same recovery semantics as a durable one.
#[derive(Debug, Default)]
pub struct InMemoryJournal {
  entries: RwLock<HashMap<String, Vec<IntentEntry>>>,
}

impl InMemoryJournal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.read().values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[async_trait]
impl IntentJournal for InMemoryJournal {
  async fn record(&self, entry: IntentEntry) -> anyhow::Result<()> {
    self
      .entries
      .write()
      .entry(entry.saga_id.clone())
      .or_default()
      .push(entry);
    Ok(())
  }

  async fn history(&self, saga_id: &str) -> anyhow::Result<Vec<IntentEntry>> {
    Ok(self.entries.read().get(saga_id).cloned().unwrap_or_default())
  }
}
