//! Chequeos previos a cualquier efecto sobre el host.
//!
//! Se ejecutan antes del registry: si alguno falla no se ha instalado ni
//! escrito nada.

use log::debug;
use nbx_domain::os_release::OS_RELEASE_PATH;
use nbx_domain::{DomainError, InstallSettings, OsRelease};
use nbx_host::{CommandSpec, Host, HostError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("refusing to run as root: run as a regular user with sudo rights")]
    RunningAsRoot,
    #[error("passwordless sudo is required (sudo -n true failed: {0})")]
    SudoUnavailable(String),
    #[error("cannot read /etc/os-release: {0}")]
    OsReleaseUnreadable(String),
    #[error(transparent)]
    Platform(#[from] DomainError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Rechaza root, exige sudo sin contraseña y un Ubuntu soportado.
pub fn preflight(host: &dyn Host, settings: &InstallSettings) -> Result<OsRelease, PreflightError> {
    settings.validate()?;
    if host.effective_uid() == 0 {
        return Err(PreflightError::RunningAsRoot);
    }
    let sudo = host.run(&CommandSpec::root("true"))?;
    if !sudo.success() {
        return Err(PreflightError::SudoUnavailable(sudo.stderr.trim().to_string()));
    }
    let out = host.run(&CommandSpec::new("cat").arg(OS_RELEASE_PATH))?;
    if !out.success() {
        return Err(PreflightError::OsReleaseUnreadable(out.stderr.trim().to_string()));
    }
    let os = OsRelease::parse(&out.stdout)?;
    os.ensure_supported(&settings.supported_versions)?;
    debug!("preflight ok: {}", os.pretty_name);
    Ok(os)
}
