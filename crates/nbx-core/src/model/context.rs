use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use nbx_domain::{InstallSettings, OsRelease, SecretBundle};
use uuid::Uuid;

use super::StepOutput;
use crate::errors::StepError;

/// Estado mutable compartido entre steps durante una sola invocación.
///
/// Lo posee el runner; se descarta al terminar el proceso. Los secretos, una
/// vez fusionados, no se regeneran: todas las superficies de configuración
/// escritas en la misma ejecución ven los mismos valores.
#[derive(Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub settings: InstallSettings,
    secrets: Option<SecretBundle>,
    os_release: Option<OsRelease>,
    started_services: Vec<String>,
    temporary_files: Vec<PathBuf>,
    completed: Vec<String>,
    notes: IndexMap<String, String>,
}

impl RunContext {
    pub fn new(settings: InstallSettings) -> Self {
        Self { run_id: Uuid::new_v4(),
               settings,
               secrets: None,
               os_release: None,
               started_services: Vec::new(),
               temporary_files: Vec::new(),
               completed: Vec::new(),
               notes: IndexMap::new() }
    }

    /// Fusiona un output de step. Re-fusionar los mismos secretos es un no-op;
    /// secretos distintos violan la estabilidad del bundle.
    pub fn merge(&mut self, output: StepOutput) -> Result<(), StepError> {
        match output {
            StepOutput::Secrets(bundle) => match &self.secrets {
                Some(existing) if *existing != bundle => return Err(StepError::SecretsAlreadyGenerated),
                Some(_) => {}
                None => self.secrets = Some(bundle),
            },
            StepOutput::OsRelease(os) => self.os_release = Some(os),
            StepOutput::ServiceStarted(name) => {
                if !self.started_services.contains(&name) {
                    self.started_services.push(name);
                }
            }
            StepOutput::TemporaryFile(path) => {
                if !self.temporary_files.contains(&path) {
                    self.temporary_files.push(path);
                }
            }
            StepOutput::Note { key, value } => {
                self.notes.insert(key, value);
            }
        }
        Ok(())
    }

    pub fn secrets(&self) -> Result<&SecretBundle, StepError> {
        self.secrets.as_ref().ok_or(StepError::MissingContext("secrets"))
    }

    pub fn has_secrets(&self) -> bool {
        self.secrets.is_some()
    }

    pub fn os_release(&self) -> Option<&OsRelease> {
        self.os_release.as_ref()
    }

    pub fn started_services(&self) -> &[String] {
        &self.started_services
    }

    pub fn temporary_files(&self) -> &[PathBuf] {
        &self.temporary_files
    }

    pub fn wrote_temporary_file(&self, path: &Path) -> bool {
        self.temporary_files.iter().any(|p| p == path)
    }

    pub(crate) fn mark_completed(&mut self, step_id: &str) {
        self.completed.push(step_id.to_string());
    }

    /// Steps completados (no saltados) en esta ejecución, en orden.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn notes(&self) -> &IndexMap<String, String> {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_stable_once_merged() {
        let mut ctx = RunContext::new(InstallSettings::default());
        let a = SecretBundle::new("a", "ka").unwrap();
        let b = SecretBundle::new("b", "kb").unwrap();
        ctx.merge(StepOutput::Secrets(a.clone())).unwrap();
        ctx.merge(StepOutput::Secrets(a.clone())).unwrap();
        assert!(matches!(ctx.merge(StepOutput::Secrets(b)), Err(StepError::SecretsAlreadyGenerated)));
        assert_eq!(ctx.secrets().unwrap(), &a);
    }

    #[test]
    fn services_and_files_are_deduplicated() {
        let mut ctx = RunContext::new(InstallSettings::default());
        for _ in 0..2 {
            ctx.merge(StepOutput::ServiceStarted("netbox".into())).unwrap();
            ctx.merge(StepOutput::TemporaryFile(PathBuf::from("/tmp/x"))).unwrap();
        }
        assert_eq!(ctx.started_services(), ["netbox".to_string()]);
        assert!(ctx.wrote_temporary_file(Path::new("/tmp/x")));
    }

    #[test]
    fn notes_and_platform_are_recorded() {
        let mut ctx = RunContext::new(InstallSettings::default());
        let os = OsRelease::parse("ID=ubuntu\nVERSION_ID=\"24.04\"\nPRETTY_NAME=\"Ubuntu 24.04\"\n").unwrap();
        ctx.merge(StepOutput::OsRelease(os)).unwrap();
        ctx.merge(StepOutput::Note { key: "release".into(),
                                     value: "4.1.11".into() })
           .unwrap();
        assert_eq!(ctx.os_release().map(|o| o.version_id.as_str()), Some("24.04"));
        assert_eq!(ctx.notes().get("release").map(String::as_str), Some("4.1.11"));
    }

    #[test]
    fn missing_secrets_is_an_error() {
        let ctx = RunContext::new(InstallSettings::default());
        assert!(matches!(ctx.secrets(), Err(StepError::MissingContext("secrets"))));
    }
}
