//! Errores de la capa de adaptación.

use nbx_core::{RegistryError, StepError};
use nbx_host::HostError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: tera::Error,
    },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<AdapterError> for StepError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Host(e) => e.into(),
            other => StepError::host(other),
        }
    }
}
