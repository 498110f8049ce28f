// nbx-domain library entry point
pub mod error;
pub mod os_release;
pub mod secrets;
pub mod service;
pub mod settings;
pub use error::DomainError;
pub use os_release::OsRelease;
pub use secrets::SecretBundle;
pub use service::{ServiceStatus, MANAGED_SERVICES};
pub use settings::InstallSettings;
