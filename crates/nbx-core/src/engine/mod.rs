//! Engine module: StepRunner, resultado de ejecución y colaborador de rollback.

pub mod core;
pub mod result;
pub mod rollback;

pub use core::{run_isolated, StepRunner};
pub use result::{RunResult, StepFailure};
pub use rollback::{NoRollback, Rollback};

pub use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use crate::registry::{RunReport, StepRegistry};
pub use crate::step::{StepRunResult, StepStatus};
