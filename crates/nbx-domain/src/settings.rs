//! Parámetros de instalación de NetBox.
//!
//! Todos los valores son strings libres que se sustituyen en plantillas; la
//! única validación es de presencia (no vacío). Las rutas derivadas
//! (`app_root`, `venv_dir`, `config_file`, ...) se calculan aquí para que
//! steps, diagnósticos y plantillas compartan exactamente el mismo layout.
use std::path::PathBuf;

use crate::DomainError;

pub const DEFAULT_NETBOX_VERSION: &str = "4.1.11";
pub const DEFAULT_SUPPORTED_UBUNTU: &[&str] = &["22.04", "24.04"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSettings {
    /// Tag de release de NetBox (con o sin prefijo `v`).
    pub version: String,
    /// Dominio servido por Nginx y agregado a `ALLOWED_HOSTS`.
    pub domain: String,
    pub admin_email: String,
    pub db_name: String,
    pub db_user: String,
    pub db_host: String,
    pub redis_host: String,
    pub redis_port: u16,
    /// Cuenta de servicio dedicada (usuario y grupo homónimo).
    pub service_user: String,
    /// Directorio base; NetBox queda en `<install_root>/netbox`.
    pub install_root: PathBuf,
    /// Archivo temporal de credenciales generadas (modo 0600).
    pub secrets_file: PathBuf,
    /// Directorio de marcas de estado (stamps) del aprovisionador.
    pub state_dir: PathBuf,
    pub supported_versions: Vec<String>,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self { version: DEFAULT_NETBOX_VERSION.to_string(),
               domain: "localhost".to_string(),
               admin_email: "admin@localhost".to_string(),
               db_name: "netbox".to_string(),
               db_user: "netbox".to_string(),
               db_host: "localhost".to_string(),
               redis_host: "localhost".to_string(),
               redis_port: 6379,
               service_user: "netbox".to_string(),
               install_root: PathBuf::from("/opt"),
               secrets_file: PathBuf::from("/tmp/netbox-credentials.txt"),
               state_dir: PathBuf::from("/var/lib/netbox-provision"),
               supported_versions: DEFAULT_SUPPORTED_UBUNTU.iter().map(|v| v.to_string()).collect() }
    }
}

impl InstallSettings {
    /// Verifica presencia de los campos libres. No se valida formato.
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [("version", self.version.as_str()),
                        ("domain", self.domain.as_str()),
                        ("admin_email", self.admin_email.as_str()),
                        ("db_name", self.db_name.as_str()),
                        ("db_user", self.db_user.as_str()),
                        ("db_host", self.db_host.as_str()),
                        ("redis_host", self.redis_host.as_str()),
                        ("service_user", self.service_user.as_str())];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::ValidationError(format!("{field} must not be empty")));
            }
        }
        if self.supported_versions.is_empty() {
            return Err(DomainError::ValidationError("supported_versions must not be empty".into()));
        }
        Ok(())
    }

    /// Versión sin prefijo `v` (nombre del directorio extraído).
    pub fn version_number(&self) -> &str {
        let v = self.version.trim();
        v.strip_prefix('v').unwrap_or(v)
    }

    pub fn release_url(&self) -> String {
        format!("https://github.com/netbox-community/netbox/archive/refs/tags/v{}.tar.gz",
                self.version_number())
    }

    /// Tarball descargado antes de extraer.
    pub fn release_tarball(&self) -> PathBuf {
        PathBuf::from(format!("/tmp/netbox-v{}.tar.gz", self.version_number()))
    }

    /// Directorio versionado, p.ej. `/opt/netbox-4.1.11`.
    pub fn release_dir(&self) -> PathBuf {
        self.install_root.join(format!("netbox-{}", self.version_number()))
    }

    /// Symlink estable hacia el release activo (`/opt/netbox`).
    pub fn app_root(&self) -> PathBuf {
        self.install_root.join("netbox")
    }

    /// Proyecto Django (`/opt/netbox/netbox`).
    pub fn project_dir(&self) -> PathBuf {
        self.app_root().join("netbox")
    }

    pub fn manage_py(&self) -> PathBuf {
        self.project_dir().join("manage.py")
    }

    pub fn config_file(&self) -> PathBuf {
        self.project_dir().join("netbox").join("configuration.py")
    }

    pub fn static_root(&self) -> PathBuf {
        self.project_dir().join("static")
    }

    pub fn media_root(&self) -> PathBuf {
        self.project_dir().join("media")
    }

    /// Directorios que deben pertenecer a la cuenta de servicio.
    pub fn writable_dirs(&self) -> Vec<PathBuf> {
        vec![self.media_root(), self.project_dir().join("reports"), self.project_dir().join("scripts")]
    }

    pub fn requirements_file(&self) -> PathBuf {
        self.app_root().join("requirements.txt")
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.app_root().join("venv")
    }

    pub fn venv_bin(&self, program: &str) -> PathBuf {
        self.venv_dir().join("bin").join(program)
    }

    pub fn gunicorn_config(&self) -> PathBuf {
        self.app_root().join("gunicorn.py")
    }

    pub fn housekeeping_script(&self) -> PathBuf {
        self.app_root().join("contrib").join("netbox-housekeeping.sh")
    }

    pub fn stamp_file(&self, name: &str) -> PathBuf {
        self.state_dir.join(format!("{name}.stamp"))
    }

    /// Grupo de la cuenta de servicio (mismo nombre que el usuario).
    pub fn service_group(&self) -> &str {
        &self.service_user
    }

    /// Entradas de `ALLOWED_HOSTS`: dominio configurado más loopback.
    pub fn allowed_hosts(&self) -> Vec<String> {
        let mut hosts = vec![self.domain.trim().to_string()];
        for extra in ["localhost", "127.0.0.1"] {
            if !hosts.iter().any(|h| h == extra) {
                hosts.push(extra.to_string());
            }
        }
        hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(InstallSettings::default().validate().is_ok());
    }

    #[test]
    fn empty_field_is_rejected() {
        let s = InstallSettings { domain: "  ".into(), ..InstallSettings::default() };
        let err = s.validate().unwrap_err();
        assert_eq!(err, DomainError::ValidationError("domain must not be empty".into()));
    }

    #[test]
    fn version_prefix_is_normalized() {
        let s = InstallSettings { version: "v4.0.2".into(), ..InstallSettings::default() };
        assert_eq!(s.version_number(), "4.0.2");
        assert_eq!(s.release_dir(), PathBuf::from("/opt/netbox-4.0.2"));
        assert!(s.release_url().ends_with("/v4.0.2.tar.gz"));
    }

    #[test]
    fn derived_paths_follow_app_root() {
        let s = InstallSettings::default();
        assert_eq!(s.config_file(), PathBuf::from("/opt/netbox/netbox/netbox/configuration.py"));
        assert_eq!(s.venv_bin("gunicorn"), PathBuf::from("/opt/netbox/venv/bin/gunicorn"));
        assert_eq!(s.allowed_hosts(), vec!["localhost".to_string(), "127.0.0.1".to_string()]);
    }
}
