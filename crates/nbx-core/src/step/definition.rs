use crate::errors::StepError;
use crate::model::{RunContext, StepOutput};

use super::policy::{FailurePolicy, RetryPolicy};
use super::run_result::StepRunResult;

/// Trait que define un Step de aprovisionamiento.
pub trait StepDefinition {
    /// Identificador estable y único dentro del registry.
    fn id(&self) -> &str;

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::none()
    }

    /// Predicado de idempotencia: `true` si el efecto ya está presente en el
    /// host. Debe ser libre de efectos secundarios y seguro de repetir.
    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError>;

    /// Valores que un step ya satisfecho aporta al contexto a partir del estado
    /// existente (p.ej. secretos ya comprometidos en la configuración).
    fn adopt(&self, _ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        Ok(Vec::new())
    }

    /// Acción con efectos sobre el host.
    fn run(&self, ctx: &RunContext) -> StepRunResult;
}
