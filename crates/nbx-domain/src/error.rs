use thiserror::Error;

/// Errores del dominio de aprovisionamiento (validación y parseo de insumos).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Error de validación: {0}")]
    ValidationError(String),

    #[error("Error de parseo: {0}")]
    ParseError(String),

    #[error("Sistema operativo no soportado: {0}")]
    UnsupportedPlatform(String),
}
