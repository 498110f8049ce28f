use crate::errors::StepError;
use crate::model::StepOutput;

/// Resultado abstracto de ejecutar la acción de un step.
#[derive(Debug)]
pub enum StepRunResult {
    Success { outputs: Vec<StepOutput> },
    Failure { error: StepError },
}

impl StepRunResult {
    pub fn ok() -> Self {
        StepRunResult::Success { outputs: Vec::new() }
    }

    pub fn with(outputs: Vec<StepOutput>) -> Self {
        StepRunResult::Success { outputs }
    }

    pub fn into_result(self) -> Result<Vec<StepOutput>, StepError> {
        match self {
            StepRunResult::Success { outputs } => Ok(outputs),
            StepRunResult::Failure { error } => Err(error),
        }
    }
}

impl From<Result<Vec<StepOutput>, StepError>> for StepRunResult {
    fn from(r: Result<Vec<StepOutput>, StepError>) -> Self {
        match r {
            Ok(outputs) => StepRunResult::Success { outputs },
            Err(error) => StepRunResult::Failure { error },
        }
    }
}
