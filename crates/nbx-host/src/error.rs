//! Errores de la capa host.
//! Mapea fallos de procesos externos y del sistema de archivos a variantes
//! semánticas; el runner los recibe envueltos en `StepError::Host`.

use std::path::PathBuf;

use nbx_core::StepError;
use nbx_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with status {status}: {stderr}")]
    CommandFailed { command: String, status: i32, stderr: String },
    #[error("`{command}` produced non UTF-8 output")]
    Utf8 { command: String },
    #[error("unexpected output from `{command}`: {detail}")]
    UnexpectedOutput { command: String, detail: String },
    #[error("another provisioning run holds {0}")]
    LockHeld(PathBuf),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<HostError> for StepError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Domain(e) => StepError::Domain(e),
            other => StepError::host(other),
        }
    }
}
