//! Parseo de `/etc/os-release` y chequeo de plataforma soportada.

use crate::DomainError;

pub const OS_RELEASE_PATH: &str = "/etc/os-release";
pub const SUPPORTED_FAMILY: &str = "ubuntu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub version_id: String,
    pub pretty_name: String,
}

impl OsRelease {
    pub fn parse(contents: &str) -> Result<Self, DomainError> {
        let mut id = None;
        let mut version_id = None;
        let mut pretty_name = None;
        for line in contents.lines() {
            let Some((key, raw)) = line.trim().split_once('=') else { continue };
            let value = raw.trim().trim_matches('"').trim_matches('\'').to_string();
            match key {
                "ID" => id = Some(value.to_lowercase()),
                "VERSION_ID" => version_id = Some(value),
                "PRETTY_NAME" => pretty_name = Some(value),
                _ => {}
            }
        }
        let id = id.ok_or_else(|| DomainError::ParseError("os-release has no ID".into()))?;
        let version_id = version_id.ok_or_else(|| DomainError::ParseError("os-release has no VERSION_ID".into()))?;
        let pretty_name = pretty_name.unwrap_or_else(|| format!("{id} {version_id}"));
        Ok(Self { id, version_id, pretty_name })
    }

    /// Acepta únicamente Ubuntu en alguna de las versiones configuradas.
    pub fn ensure_supported(&self, versions: &[String]) -> Result<(), DomainError> {
        if self.id != SUPPORTED_FAMILY || !versions.iter().any(|v| v == &self.version_id) {
            return Err(DomainError::UnsupportedPlatform(format!("{} (expected {} {})",
                                                                self.pretty_name,
                                                                SUPPORTED_FAMILY,
                                                                versions.join("/"))));
        }
        Ok(())
    }
}
