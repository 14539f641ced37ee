// saga/src/saga/execution.rs

//! `Saga::run()`: walks the steps in order, applying each step's skip
//! condition and failure policy and writing intents to the journal.

use crate::core::control::{SagaOutcome, SagaReport, StepControl, StepDisposition};
use crate::core::handler::Handler;
use crate::core::saga_data::SagaData;
use crate::core::step::{StepDef, StepPolicy};
use crate::error::SagaError;
use crate::journal::{IntentEntry, IntentPhase};
use crate::saga::definition::Saga;
use std::collections::HashMap;
use tracing::{event, info_span, instrument, Instrument, Level};

enum PhaseResult<Err> {
  Continue,
  Halt,
  Failed(Err),
}

enum StepFlow {
  Next,
  Halt,
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Runs every step against `data`, journaling under `saga_id`.
  ///
  /// Returns `Err` only when a `Fatal` step fails (including a fatal step
  /// whose `started` intent could not be written). Best-effort failures are
  /// logged, journaled and listed in the report as `Degraded`.
  #[instrument(
    name = "Saga::run",
    skip_all,
    fields(
      saga = %self.name,
      saga_id = %saga_id,
      num_steps = self.steps.len(),
      journaled = self.journal.is_some(),
    ),
    err(Display)
  )]
  pub async fn run(&self, saga_id: &str, data: SagaData<TData>) -> Result<SagaReport, Err> {
    event!(Level::DEBUG, "Saga execution starting.");
    let mut report = SagaReport::new();

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = info_span!(
        "saga_step",
        step_name = %step_def.name,
        step_index = step_idx,
        policy = ?step_def.policy,
      );
      let flow = self
        .run_step(saga_id, step_def, &data, &mut report)
        .instrument(step_span)
        .await?;

      if let StepFlow::Halt = flow {
        event!(Level::INFO, step = %step_def.name, "Saga halted by a handler.");
        report.outcome = SagaOutcome::Halted {
          step: step_def.name.clone(),
        };
        return Ok(report);
      }
    }

    event!(
      Level::DEBUG,
      degraded = report.degraded_steps().len(),
      "Saga execution completed."
    );
    Ok(report)
  }

  async fn run_step(
    &self,
    saga_id: &str,
    step_def: &StepDef<TData>,
    data: &SagaData<TData>,
    report: &mut SagaReport,
  ) -> Result<StepFlow, Err> {
    let step_name = step_def.name.as_str();

    if let Some(skip_cond) = &step_def.skip_if {
      if skip_cond(data.clone()) {
        event!(Level::INFO, "Step skipped by its skip condition.");
        self.journal_soft(saga_id, step_name, IntentPhase::Skipped, None).await;
        report.push(step_name, StepDisposition::Skipped);
        return Ok(StepFlow::Next);
      }
    }

    if !self.has_handlers(step_name) {
      return match step_def.policy {
        StepPolicy::Fatal => {
          event!(Level::ERROR, "Fatal step has no handlers.");
          Err(Err::from(SagaError::HandlerMissing {
            step_name: step_def.name.clone(),
          }))
        }
        StepPolicy::BestEffort => {
          event!(Level::DEBUG, "Best-effort step has no handlers, skipping.");
          self.journal_soft(saga_id, step_name, IntentPhase::Skipped, None).await;
          report.push(step_name, StepDisposition::Skipped);
          Ok(StepFlow::Next)
        }
      };
    }

    if let Err(journal_err) = self.journal(saga_id, step_name, IntentPhase::Started, None).await {
      let saga_err = SagaError::Journal {
        saga_id: saga_id.to_string(),
        step_name: step_def.name.clone(),
        phase: IntentPhase::Started.to_string(),
        source: journal_err,
      };
      return match step_def.policy {
        StepPolicy::Fatal => {
          event!(Level::ERROR, error = %saga_err, "Could not journal step start; aborting saga.");
          Err(Err::from(saga_err))
        }
        StepPolicy::BestEffort => {
          event!(Level::WARN, error = %saga_err, "Could not journal step start; step not attempted.");
          report.push(
            step_name,
            StepDisposition::Degraded {
              error: saga_err.to_string(),
            },
          );
          Ok(StepFlow::Next)
        }
      };
    }

    for (phase_name, phase_handlers) in [("before", &self.before), ("on", &self.on), ("after", &self.after)] {
      match Self::run_phase(phase_name, step_name, phase_handlers, data).await {
        PhaseResult::Continue => {}
        PhaseResult::Halt => {
          self.journal_soft(saga_id, step_name, IntentPhase::Halted, None).await;
          report.push(step_name, StepDisposition::Halted);
          return Ok(StepFlow::Halt);
        }
        PhaseResult::Failed(e) => {
          let error_text = e.to_string();
          self
            .journal_soft(saga_id, step_name, IntentPhase::Failed, Some(error_text.clone()))
            .await;
          return match step_def.policy {
            StepPolicy::Fatal => {
              event!(Level::ERROR, error = %error_text, "Fatal step failed; aborting saga.");
              Err(e)
            }
            StepPolicy::BestEffort => {
              event!(Level::WARN, error = %error_text, "Best-effort step failed; continuing.");
              report.push(step_name, StepDisposition::Degraded { error: error_text });
              Ok(StepFlow::Next)
            }
          };
        }
      }
    }

    let detail = self
      .annotators
      .get(step_name)
      .and_then(|annotate| annotate(data.clone()));
    self
      .journal_soft(saga_id, step_name, IntentPhase::Completed, detail)
      .await;
    report.push(step_name, StepDisposition::Done);
    event!(Level::DEBUG, "Step finished.");
    Ok(StepFlow::Next)
  }

  async fn run_phase(
    phase_name: &'static str,
    step_name: &str,
    handlers: &HashMap<String, Vec<Handler<TData, Err>>>,
    data: &SagaData<TData>,
  ) -> PhaseResult<Err> {
    let Some(handlers) = handlers.get(step_name) else {
      return PhaseResult::Continue;
    };
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      let handler_span = info_span!("step_handler", phase = phase_name, handler_index = handler_idx);
      match handler_fn(data.clone()).instrument(handler_span).await {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Halt) => {
          event!(Level::DEBUG, phase = phase_name, "Handler requested halt.");
          return PhaseResult::Halt;
        }
        Err(e) => {
          event!(Level::DEBUG, phase = phase_name, error = %e, "Handler failed.");
          return PhaseResult::Failed(e);
        }
      }
    }
    PhaseResult::Continue
  }

  async fn journal(
    &self,
    saga_id: &str,
    step_name: &str,
    phase: IntentPhase,
    detail: Option<String>,
  ) -> anyhow::Result<()> {
    match &self.journal {
      Some(journal) => journal.record(IntentEntry::new(saga_id, step_name, phase, detail)).await,
      None => Ok(()),
    }
  }

  /// Terminal intents are advisory: losing one only widens what recovery
  /// has to re-check, so a failed write is logged and otherwise ignored.
  async fn journal_soft(&self, saga_id: &str, step_name: &str, phase: IntentPhase, detail: Option<String>) {
    if let Err(e) = self.journal(saga_id, step_name, phase, detail).await {
      event!(Level::WARN, %phase, error = %e, "Failed to write intent entry.");
    }
  }
}
