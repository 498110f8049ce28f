//! netbox-provision
//!
//! Binarios `nbx-install` y `nbx-doctor` sobre los crates del workspace:
//! - `config`: flags con fallback a variables de entorno (clap).
//! - `install`: secuencia completa con resumen final.
//! - `menu`: máquina de estados del menú de diagnóstico.
//! - `console` / `summary`: salida coloreada para el operador.

pub mod config;
pub mod console;
pub mod errors;
pub mod install;
pub mod logging;
pub mod menu;
pub mod summary;

pub use errors::AppError;
