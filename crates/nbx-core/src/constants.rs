//! Constantes del runner.
//!
//! `RUNNER_VERSION` participa en el `registry_hash` registrado en el journal:
//! dos ejecuciones sólo son comparables si coinciden versión y lista de steps.

/// Versión lógica del runner. Mantener estable mientras no haya cambios
/// incompatibles en la semántica de los steps.
pub const RUNNER_VERSION: &str = "R1.0";
