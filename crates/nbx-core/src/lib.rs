//! nbx-core: runner secuencial de steps de aprovisionamiento.
//!
//! Registry ordenado, predicados de idempotencia, políticas de fallo con
//! rollback y journal append-only de la ejecución.
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod registry;
pub mod step;

pub use engine::{run_isolated, NoRollback, Rollback, RunResult, StepFailure, StepRunner};
pub use errors::{RegistryError, StepError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use model::{RunContext, StepOutput};
pub use registry::{build_registry, RegistryBuilder, RunReport, StepRegistry, StepSlot};
pub use step::{FailurePolicy, RetryPolicy, StepDefinition, StepRunResult, StepStatus};

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use nbx_domain::{InstallSettings, SecretBundle};

    use super::*;

    /// Step configurable: cuenta ejecuciones y falla las primeras `fail_times`.
    struct Scripted {
        id: &'static str,
        satisfied: Rc<Cell<bool>>,
        runs: Rc<Cell<u32>>,
        fail_times: u32,
        policy: FailurePolicy,
        retry: RetryPolicy,
        outputs: Vec<StepOutput>,
    }

    impl Scripted {
        fn new(id: &'static str) -> Self {
            Self { id,
                   satisfied: Rc::new(Cell::new(false)),
                   runs: Rc::new(Cell::new(0)),
                   fail_times: 0,
                   policy: FailurePolicy::Abort,
                   retry: RetryPolicy::none(),
                   outputs: vec![] }
        }

        fn failing(mut self, times: u32) -> Self {
            self.fail_times = times;
            self
        }
    }

    impl StepDefinition for Scripted {
        fn id(&self) -> &str {
            self.id
        }

        fn failure_policy(&self) -> FailurePolicy {
            self.policy
        }

        fn retry_policy(&self) -> RetryPolicy {
            self.retry
        }

        fn is_satisfied(&self, _ctx: &RunContext) -> Result<bool, StepError> {
            Ok(self.satisfied.get())
        }

        fn run(&self, _ctx: &RunContext) -> StepRunResult {
            let n = self.runs.get() + 1;
            self.runs.set(n);
            if n <= self.fail_times {
                return StepRunResult::Failure { error: StepError::Internal(format!("boom {n}")) };
            }
            self.satisfied.set(true);
            StepRunResult::with(self.outputs.clone())
        }
    }

    struct Recording(Rc<RefCell<Vec<String>>>);

    impl Rollback for Recording {
        fn rollback(&self, ctx: &RunContext) -> Vec<String> {
            let actions: Vec<String> = ctx.started_services().iter().map(|s| format!("stop {s}")).collect();
            self.0.borrow_mut().extend(actions.clone());
            actions
        }
    }

    fn ctx() -> RunContext {
        RunContext::new(InstallSettings::default())
    }

    #[test]
    fn second_run_skips_everything() {
        let a = Scripted::new("a");
        let b = Scripted::new("b");
        let runs = (a.runs.clone(), b.runs.clone());
        let registry = StepRegistry::builder().step(a).step(b).build().unwrap();

        let mut runner = StepRunner::new();
        let first = runner.run(&registry, &mut ctx());
        assert!(first.is_success());
        assert_eq!((first.completed, first.skipped), (2, 0));

        let second = runner.run(&registry, &mut ctx());
        assert_eq!((second.completed, second.skipped, second.total), (0, 2, 2));
        assert_eq!((runs.0.get(), runs.1.get()), (1, 1));
    }

    #[test]
    fn abort_stops_later_steps_and_rolls_back() {
        let mut a = Scripted::new("a");
        a.outputs = vec![StepOutput::ServiceStarted("netbox".into())];
        let b = Scripted::new("b").failing(1);
        let c = Scripted::new("c");
        let c_runs = c.runs.clone();
        let registry = StepRegistry::builder().step(a).step(b).step(c).build().unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut runner = StepRunner::new().with_rollback(Recording(log.clone()));
        let mut context = ctx();
        let result = runner.run(&registry, &mut context);

        let fatal = result.fatal.as_ref().expect("run should abort");
        assert_eq!((fatal.step_index, fatal.step_id.as_str()), (1, "b"));
        assert_eq!(c_runs.get(), 0);
        assert_eq!(*log.borrow(), vec!["stop netbox".to_string()]);
        assert_eq!(result.report.rollback, vec!["stop netbox".to_string()]);
        assert_eq!(result.report.slots[2].status, StepStatus::Pending);
        assert!(result.report.aborted);
    }

    #[test]
    fn warn_and_continue_keeps_going() {
        let mut a = Scripted::new("a").failing(1);
        a.policy = FailurePolicy::WarnAndContinue;
        let b = Scripted::new("b");
        let registry = StepRegistry::builder().step(a).step(b).build().unwrap();

        let result = StepRunner::new().run(&registry, &mut ctx());
        assert!(result.is_success());
        assert_eq!((result.warned, result.completed), (1, 1));
        assert_eq!(result.report.slots[0].error.as_deref(), Some("internal: boom 1"));
    }

    #[test]
    fn retry_policy_recovers_transient_failure() {
        let mut a = Scripted::new("a").failing(2);
        a.retry = RetryPolicy::new(3, Duration::ZERO);
        let runs = a.runs.clone();
        let registry = StepRegistry::builder().step(a).build().unwrap();

        let mut runner = StepRunner::new();
        let mut context = ctx();
        let result = runner.run(&registry, &mut context);
        assert!(result.is_success());
        assert_eq!(runs.get(), 3);
        assert_eq!(result.report.slots[0].attempts, 3);
        let retried = runner.events(context.run_id)
                            .iter()
                            .filter(|e| matches!(e.kind, RunEventKind::StepRetried { .. }))
                            .count();
        assert_eq!(retried, 2);
    }

    #[test]
    fn retries_are_bounded() {
        let mut a = Scripted::new("a").failing(10);
        a.retry = RetryPolicy::new(2, Duration::ZERO);
        let runs = a.runs.clone();
        let registry = StepRegistry::builder().step(a).build().unwrap();
        let result = StepRunner::new().run(&registry, &mut ctx());
        assert!(!result.is_success());
        assert_eq!(runs.get(), 2);
    }

    struct BrokenPredicate;

    impl StepDefinition for BrokenPredicate {
        fn id(&self) -> &str {
            "broken"
        }

        fn is_satisfied(&self, _ctx: &RunContext) -> Result<bool, StepError> {
            Err(StepError::Verification("cannot probe".into()))
        }

        fn run(&self, _ctx: &RunContext) -> StepRunResult {
            StepRunResult::ok()
        }
    }

    #[test]
    fn predicate_error_is_a_step_failure() {
        let registry = StepRegistry::builder().step(BrokenPredicate).build().unwrap();
        let result = StepRunner::new().run(&registry, &mut ctx());
        let fatal = result.fatal.expect("predicate error aborts");
        assert_eq!(fatal.step_id, "broken");
        assert!(matches!(fatal.error, StepError::Verification(_)));
    }

    #[test]
    fn conflicting_secrets_fail_the_step() {
        let mut a = Scripted::new("a");
        a.outputs = vec![StepOutput::Secrets(SecretBundle::new("one", "k1").unwrap())];
        let mut b = Scripted::new("b");
        b.outputs = vec![StepOutput::Secrets(SecretBundle::new("two", "k2").unwrap())];
        let registry = StepRegistry::builder().step(a).step(b).build().unwrap();
        let result = StepRunner::new().run(&registry, &mut ctx());
        assert!(matches!(result.fatal.map(|f| f.error), Some(StepError::SecretsAlreadyGenerated)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = StepRegistry::builder().step(Scripted::new("x"))
                                         .step(Scripted::new("x"))
                                         .build()
                                         .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateStep("x".into()));
        assert_eq!(StepRegistry::builder().build().unwrap_err(), RegistryError::Empty);
    }

    #[test]
    fn registry_hash_depends_on_order() {
        let ab = StepRegistry::builder().step(Scripted::new("a")).step(Scripted::new("b")).build().unwrap();
        let ba = StepRegistry::builder().step(Scripted::new("b")).step(Scripted::new("a")).build().unwrap();
        assert_ne!(ab.registry_hash(), ba.registry_hash());
        assert_eq!(ab.position("b"), Some(1));
    }

    #[test]
    fn run_isolated_ignores_predicate() {
        let a = Scripted::new("a");
        a.satisfied.set(true);
        let runs = a.runs.clone();
        let mut context = ctx();
        run_isolated(&a, &mut context).unwrap();
        assert_eq!(runs.get(), 1);
    }
}
