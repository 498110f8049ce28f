//! nbx-host
//!
//! Capa de infraestructura: todo lo que toca la máquina aprovisionada.
//!
//! Módulos:
//! - `command`: descripción neutral de comandos externos y su salida.
//! - `host`: trait `Host` (ejecución + operaciones de archivos como comandos).
//! - `system`: implementación real con `std::process` y `sudo -n`.
//! - `health`: Service Health Checker (`systemctl is-active`).
//! - `services`: control de unidades systemd.
//! - `secrets_file`: archivo temporal de credenciales.
//! - `lock`: lock advisory contra ejecuciones concurrentes.
//! - `config`: carga de `.env`.
//! - `fake` (feature `testing`): host simulado en memoria.

pub mod command;
pub mod config;
pub mod error;
pub mod health;
pub mod host;
pub mod lock;
pub mod secrets_file;
pub mod services;
pub mod system;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use command::{CommandOutput, CommandSpec, Privilege};
pub use config::init_dotenv;
pub use error::HostError;
#[cfg(any(test, feature = "testing"))]
pub use fake::{FakeFile, FakeHost, FakeService};
pub use health::HealthChecker;
pub use host::{FileSpec, Host};
pub use lock::RunLock;
pub use secrets_file::{read_secrets_file, write_secrets_file};
pub use system::SystemHost;
