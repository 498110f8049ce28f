use std::path::PathBuf;

use nbx_domain::{OsRelease, SecretBundle};

/// Valor producido por un step y fusionado en el `RunContext` para los steps
/// posteriores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutput {
    /// Credenciales de la ejecución (a lo sumo una vez por run).
    Secrets(SecretBundle),
    OsRelease(OsRelease),
    /// Servicio arrancado por esta ejecución (candidato a rollback).
    ServiceStarted(String),
    /// Artefacto temporal escrito por esta ejecución (se elimina en rollback).
    TemporaryFile(PathBuf),
    Note { key: String, value: String },
}

impl StepOutput {
    /// Descripción corta para el journal; nunca incluye valores secretos.
    pub fn describe(&self) -> String {
        match self {
            StepOutput::Secrets(_) => "secrets".to_string(),
            StepOutput::OsRelease(os) => format!("os:{}", os.pretty_name),
            StepOutput::ServiceStarted(s) => format!("service:{s}"),
            StepOutput::TemporaryFile(p) => format!("file:{}", p.display()),
            StepOutput::Note { key, value } => format!("{key}={value}"),
        }
    }
}
