//! StepRunner: ejecución secuencial de un `StepRegistry`.

use std::time::Duration;

use log::{debug, info, warn};

use crate::engine::result::{RunResult, StepFailure};
use crate::engine::rollback::{NoRollback, Rollback};
use crate::errors::StepError;
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::model::{RunContext, StepOutput};
use crate::registry::{RunReport, StepRegistry};
use crate::step::{FailurePolicy, StepDefinition};
use crate::constants::RUNNER_VERSION;

/// Ejecuta los steps de un registry estrictamente en orden, uno a la vez.
///
/// Para cada step evalúa el predicado de idempotencia; si ya está
/// satisfecho lo registra como saltado, si no ejecuta la acción (con los
/// reintentos que declare) y fusiona sus outputs en el contexto. Ante un
/// fallo consulta la política del step: `Abort` detiene la ejecución y
/// dispara el rollback; `WarnAndContinue` registra y sigue.
pub struct StepRunner<E: EventStore = InMemoryEventStore> {
    event_store: E,
    rollback: Box<dyn Rollback>,
}

impl StepRunner<InMemoryEventStore> {
    /// Runner con journal en memoria y sin rollback.
    pub fn new() -> Self {
        Self::with_store(InMemoryEventStore::default())
    }
}

impl Default for StepRunner<InMemoryEventStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EventStore> StepRunner<E> {
    pub fn with_store(event_store: E) -> Self {
        Self { event_store,
               rollback: Box::new(NoRollback) }
    }

    /// Fija el colaborador de limpieza usado ante fallos con política abort.
    pub fn with_rollback<R: Rollback + 'static>(mut self, rollback: R) -> Self {
        self.rollback = Box::new(rollback);
        self
    }

    pub fn events(&self, run_id: uuid::Uuid) -> Vec<RunEvent> {
        self.event_store.list(run_id)
    }

    /// Ejecuta el registry completo sobre `ctx`.
    pub fn run(&mut self, registry: &StepRegistry, ctx: &mut RunContext) -> RunResult {
        let run_id = ctx.run_id;
        self.event_store.append_kind(run_id,
                                     RunEventKind::RunInitialized { registry_hash: registry.registry_hash().to_string(),
                                                                    step_count: registry.len(),
                                                                    runner_version: RUNNER_VERSION.to_string() });
        info!("run {run_id}: {} steps", registry.len());

        let mut fatal = None;
        for (index, step) in registry.iter().enumerate() {
            let Err(error) = self.evaluate(index, step, ctx) else { continue };
            let step_id = step.id().to_string();
            match step.failure_policy() {
                FailurePolicy::WarnAndContinue => {
                    warn!("step {step_id} failed (continuing): {error}");
                    self.event_store.append_kind(run_id,
                                                 RunEventKind::StepWarned { step_index: index,
                                                                            step_id,
                                                                            error: error.to_string() });
                }
                FailurePolicy::Abort => {
                    warn!("step {step_id} failed, aborting run: {error}");
                    self.event_store.append_kind(run_id,
                                                 RunEventKind::StepFailed { step_index: index,
                                                                            step_id: step_id.clone(),
                                                                            error: error.to_string() });
                    let actions = self.rollback.rollback(ctx);
                    self.event_store.append_kind(run_id, RunEventKind::RollbackPerformed { actions });
                    fatal = Some(StepFailure { step_index: index,
                                               step_id,
                                               error });
                    break;
                }
            }
        }

        self.event_store.append_kind(run_id, RunEventKind::RunFinished { aborted: fatal.is_some() });
        let report = RunReport::replay(&self.event_store.list(run_id), registry);
        RunResult::from_report(run_id, report, fatal)
    }

    fn evaluate(&mut self, index: usize, step: &dyn StepDefinition, ctx: &mut RunContext) -> Result<(), StepError> {
        let run_id = ctx.run_id;
        let step_id = step.id().to_string();
        if step.is_satisfied(ctx)? {
            for output in step.adopt(ctx)? {
                ctx.merge(output)?;
            }
            debug!("step {step_id}: already satisfied");
            self.event_store.append_kind(run_id, RunEventKind::StepSkipped { step_index: index, step_id });
            return Ok(());
        }

        self.event_store.append_kind(run_id,
                                     RunEventKind::StepStarted { step_index: index,
                                                                 step_id: step_id.clone() });
        let store = &mut self.event_store;
        let outputs = execute_with_retry(step, ctx, |attempt, error, delay| {
            store.append_kind(run_id,
                              RunEventKind::StepRetried { step_index: index,
                                                          step_id: step_id.clone(),
                                                          attempt,
                                                          error: error.to_string(),
                                                          delay_ms: delay.as_millis() as u64 });
        })?;
        let described: Vec<String> = outputs.iter().map(StepOutput::describe).collect();
        for output in outputs {
            ctx.merge(output)?;
        }
        ctx.mark_completed(&step_id);
        debug!("step {step_id}: completed");
        self.event_store.append_kind(run_id,
                                     RunEventKind::StepCompleted { step_index: index,
                                                                   step_id,
                                                                   outputs: described });
        Ok(())
    }
}

/// Ejecuta la acción de un step aislado, sin predicado ni journal, con los
/// reintentos que declare. Usado por acciones de diagnóstico que reutilizan
/// steps fuera de la secuencia completa.
pub fn run_isolated(step: &dyn StepDefinition, ctx: &mut RunContext) -> Result<(), StepError> {
    let outputs = execute_with_retry(step, ctx, |_, _, _| {})?;
    for output in outputs {
        ctx.merge(output)?;
    }
    Ok(())
}

/// Reintento con backoff lineal según la `RetryPolicy` del step.
fn execute_with_retry<F>(step: &dyn StepDefinition, ctx: &RunContext, mut on_retry: F) -> Result<Vec<StepOutput>, StepError>
    where F: FnMut(u32, &StepError, Duration)
{
    let policy = step.retry_policy();
    let mut attempt = 1;
    loop {
        match step.run(ctx).into_result() {
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!("step {} failed (attempt {}/{}): {} -> sleeping {}ms",
                      step.id(),
                      attempt,
                      policy.max_attempts,
                      e,
                      delay.as_millis());
                on_retry(attempt, &e, delay);
                std::thread::sleep(delay);
                attempt += 1;
            }
            r => return r,
        }
    }
}
