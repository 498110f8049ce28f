//! Errores del core: fallos de steps y de construcción del registry.

use nbx_domain::DomainError;
use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error de un step. Todo fallo es atribuible a exactamente un step del
/// registry (el runner lo envuelve en `StepFailure`).
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Fallo de un colaborador externo (comando, archivo, servicio).
    #[error("{0}")]
    Host(#[source] BoxedError),
    /// El efecto esperado no quedó presente tras ejecutar la acción
    /// (p.ej. servicio inactivo después de arrancarlo).
    #[error("verification failed: {0}")]
    Verification(String),
    #[error("missing context value: {0}")]
    MissingContext(&'static str),
    #[error("secrets already generated for this run")]
    SecretsAlreadyGenerated,
    #[error("internal: {0}")]
    Internal(String),
}

impl StepError {
    pub fn host<E>(err: E) -> Self
        where E: std::error::Error + Send + Sync + 'static
    {
        StepError::Host(Box::new(err))
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RegistryError {
    #[error("duplicate step id: {0}")]
    DuplicateStep(String),
    #[error("registry has no steps")]
    Empty,
}
