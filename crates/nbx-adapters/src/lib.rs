//! nbx-adapters: steps concretos de NetBox sobre la capa host.
//!
//! Este crate provee:
//! - `steps`: la secuencia de instalación (`netbox_registry`).
//! - `render` / `netbox_config`: plantillas Tera y lectura de
//!   `configuration.py`.
//! - `preflight`: chequeos previos a cualquier efecto.
//! - `rollback`: limpieza ante un abort.
//! - `diagnostics`: acciones independientes del menú de reparación.

pub mod diagnostics;
pub mod error;
pub mod netbox_config;
pub mod preflight;
pub mod render;
pub mod rollback;
pub mod steps;

pub use diagnostics::{ActionExecutor, DiagnosticAction, DiagnosticReport, Diagnostics};
pub use error::AdapterError;
pub use preflight::{preflight, PreflightError};
pub use render::TemplateRenderer;
pub use rollback::HostRollback;
pub use steps::{netbox_registry, StepEnv};
