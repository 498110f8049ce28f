//! Definiciones relacionadas a Steps.
//!
//! Un Step es una acción discreta de aprovisionamiento con un predicado de
//! idempotencia y una política de fallo. Este módulo define:
//! - `StepDefinition`: interfaz neutral usada por el runner.
//! - `StepRunResult`: resultado de ejecutar la acción.
//! - `FailurePolicy` / `RetryPolicy`.
//! - `StepStatus`: estado de un step reconstruido desde el journal.

pub mod definition;
mod policy;
mod run_result;
mod status;

pub use definition::StepDefinition;
pub use policy::{FailurePolicy, RetryPolicy};
pub use run_result::StepRunResult;
pub use status::StepStatus;
