use nbx_adapters::{AdapterError, PreflightError};
use nbx_core::{StepError, StepFailure};
use nbx_host::HostError;
use thiserror::Error;

/// Errores terminales de los binarios.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("preflight failed: {0}")]
    Preflight(#[from] PreflightError),
    #[error("another run is in progress or the lock is stale: {0}")]
    Lock(HostError),
    #[error("setup error: {0}")]
    Setup(#[from] AdapterError),
    #[error("cannot prepare run context: {0}")]
    Context(#[from] StepError),
    #[error("{0}")]
    Step(StepFailure),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Step(_) => 1,
            AppError::Preflight(_) => 2,
            AppError::Lock(_) => 3,
            AppError::Setup(_) | AppError::Context(_) | AppError::Io(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_non_zero_and_distinct() {
        let pre = AppError::Preflight(PreflightError::RunningAsRoot);
        let io = AppError::from(std::io::Error::other("closed"));
        assert_eq!(pre.exit_code(), 2);
        assert_eq!(io.exit_code(), 4);
        assert!(pre.to_string().contains("refusing to run as root"));
    }
}
