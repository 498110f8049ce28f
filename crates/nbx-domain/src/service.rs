use std::fmt;

/// Servicios systemd que el aprovisionador instala o de los que depende.
pub const MANAGED_SERVICES: &[&str] = &["postgresql", "redis-server", "netbox", "netbox-rq", "nginx"];

/// Estado de un servicio según el gestor de servicios del host.
///
/// Se recalcula en cada consulta; nunca se cachea entre llamadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Active,
    Inactive,
    Unknown,
}

impl ServiceStatus {
    /// Mapea la salida de `systemctl is-active <unit>`.
    pub fn from_is_active(output: &str) -> Self {
        match output.trim() {
            "active" | "reloading" => ServiceStatus::Active,
            "inactive" | "failed" | "deactivating" | "activating" => ServiceStatus::Inactive,
            _ => ServiceStatus::Unknown,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, ServiceStatus::Active)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Inactive => "inactive",
            ServiceStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
