//! Parámetros de línea de comandos con fallback a variables de entorno.
//!
//! Todas las entradas tienen valor por defecto: `nbx-install` sin argumentos
//! instala con la configuración por defecto (o la del `.env`).
use std::path::PathBuf;

use clap::{Args, Parser};
use nbx_domain::settings::DEFAULT_NETBOX_VERSION;
use nbx_domain::InstallSettings;

pub const DEFAULT_LOCK_FILE: &str = "/run/lock/netbox-provision.lock";

#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    /// Tag de release de NetBox.
    #[arg(long, env = "NETBOX_VERSION", default_value = DEFAULT_NETBOX_VERSION)]
    pub version: String,
    #[arg(long, env = "NETBOX_DOMAIN", default_value = "localhost")]
    pub domain: String,
    #[arg(long, env = "NETBOX_ADMIN_EMAIL", default_value = "admin@localhost")]
    pub admin_email: String,
    #[arg(long, env = "NETBOX_DB_NAME", default_value = "netbox")]
    pub db_name: String,
    #[arg(long, env = "NETBOX_DB_USER", default_value = "netbox")]
    pub db_user: String,
    #[arg(long, env = "NETBOX_DB_HOST", default_value = "localhost")]
    pub db_host: String,
    #[arg(long, env = "NETBOX_REDIS_HOST", default_value = "localhost")]
    pub redis_host: String,
    #[arg(long, env = "NETBOX_REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,
    /// Cuenta de servicio (usuario y grupo).
    #[arg(long = "service-user", env = "NETBOX_USER", default_value = "netbox")]
    pub service_user: String,
    #[arg(long, env = "NETBOX_INSTALL_ROOT", default_value = "/opt")]
    pub install_root: PathBuf,
    #[arg(long, env = "NETBOX_SECRETS_FILE", default_value = "/tmp/netbox-credentials.txt")]
    pub secrets_file: PathBuf,
    #[arg(long, env = "NETBOX_STATE_DIR", default_value = "/var/lib/netbox-provision")]
    pub state_dir: PathBuf,
    /// Versiones de Ubuntu aceptadas (separadas por coma).
    #[arg(long, env = "NETBOX_SUPPORTED_UBUNTU", value_delimiter = ',', default_values = ["22.04", "24.04"])]
    pub supported_ubuntu: Vec<String>,
}

impl SettingsArgs {
    pub fn into_settings(self) -> InstallSettings {
        InstallSettings { version: self.version,
                          domain: self.domain,
                          admin_email: self.admin_email,
                          db_name: self.db_name,
                          db_user: self.db_user,
                          db_host: self.db_host,
                          redis_host: self.redis_host,
                          redis_port: self.redis_port,
                          service_user: self.service_user,
                          install_root: self.install_root,
                          secrets_file: self.secrets_file,
                          state_dir: self.state_dir,
                          supported_versions: self.supported_ubuntu }
    }
}

/// `nbx-install`: instalación completa de NetBox.
#[derive(Debug, Parser)]
#[command(name = "nbx-install", version, about = "Idempotent NetBox installer for Ubuntu")]
pub struct InstallArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
    /// Archivo de lock contra ejecuciones concurrentes.
    #[arg(long, env = "NETBOX_LOCK_FILE", default_value = DEFAULT_LOCK_FILE)]
    pub lock_file: PathBuf,
    /// Logs a nivel debug (equivale a RUST_LOG=debug).
    #[arg(short, long)]
    pub verbose: bool,
}

/// `nbx-doctor`: menú de diagnóstico y reparación.
#[derive(Debug, Parser)]
#[command(name = "nbx-doctor", version, about = "NetBox diagnostics and repair menu")]
pub struct DoctorArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_domain_defaults() {
        let args = InstallArgs::try_parse_from(["nbx-install"]).unwrap();
        assert_eq!(args.settings.into_settings(), InstallSettings::default());
        assert_eq!(args.lock_file, PathBuf::from(DEFAULT_LOCK_FILE));
    }

    #[test]
    fn flags_override_defaults() {
        let args = InstallArgs::try_parse_from(["nbx-install",
                                                "--domain",
                                                "netbox.example.com",
                                                "--supported-ubuntu",
                                                "24.04",
                                                "--redis-port",
                                                "6380"]).unwrap();
        let s = args.settings.into_settings();
        assert_eq!(s.domain, "netbox.example.com");
        assert_eq!(s.supported_versions, vec!["24.04".to_string()]);
        assert_eq!(s.redis_port, 6380);
    }
}
