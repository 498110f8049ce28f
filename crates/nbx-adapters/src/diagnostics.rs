//! Acciones de diagnóstico y reparación.
//!
//! Cada acción es independiente y reutiliza los steps (o sus funciones) de
//! forma aislada: sin predicado, sin journal y sin rollback. "Run all"
//! ejecuta las acciones 1 a 10 en orden fijo sin abortar ante un fallo.

use std::fmt;
use std::path::Path;

use log::debug;
use nbx_core::{run_isolated, RunContext, StepDefinition, StepError};
use nbx_domain::{InstallSettings, MANAGED_SERVICES};
use nbx_host::{services, CommandSpec};

use crate::netbox_config::{self, REQUIRED_KEYS};
use crate::steps::database::{database_login, redis_answers};
use crate::steps::release::install_requirements;
use crate::steps::{self, StepEnv};

const LOG_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticAction {
    ServiceStatus,
    FixRuntime,
    FixPermissions,
    ReinstallDependencies,
    CheckConfiguration,
    CheckDatabase,
    CheckRedis,
    RunMigrations,
    CollectStatic,
    ShowLogs,
    RunAll,
    Exit,
}

impl DiagnosticAction {
    /// En orden de menú (número = posición + 1).
    pub const ALL: [DiagnosticAction; 12] = [DiagnosticAction::ServiceStatus,
                                             DiagnosticAction::FixRuntime,
                                             DiagnosticAction::FixPermissions,
                                             DiagnosticAction::ReinstallDependencies,
                                             DiagnosticAction::CheckConfiguration,
                                             DiagnosticAction::CheckDatabase,
                                             DiagnosticAction::CheckRedis,
                                             DiagnosticAction::RunMigrations,
                                             DiagnosticAction::CollectStatic,
                                             DiagnosticAction::ShowLogs,
                                             DiagnosticAction::RunAll,
                                             DiagnosticAction::Exit];

    pub fn number(self) -> usize {
        Self::ALL.iter().position(|a| *a == self).map_or(0, |i| i + 1)
    }

    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            DiagnosticAction::ServiceStatus => "Service status",
            DiagnosticAction::FixRuntime => "Fix missing Python runtime",
            DiagnosticAction::FixPermissions => "Fix file permissions",
            DiagnosticAction::ReinstallDependencies => "Reinstall Python dependencies",
            DiagnosticAction::CheckConfiguration => "Check configuration file",
            DiagnosticAction::CheckDatabase => "Check database connectivity",
            DiagnosticAction::CheckRedis => "Check Redis",
            DiagnosticAction::RunMigrations => "Run database migrations",
            DiagnosticAction::CollectStatic => "Collect static files",
            DiagnosticAction::ShowLogs => "Show recent service logs",
            DiagnosticAction::RunAll => "Run all diagnostics",
            DiagnosticAction::Exit => "Exit",
        }
    }
}

impl fmt::Display for DiagnosticAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}) {}", self.number(), self.label())
    }
}

/// Resultado de una acción: líneas informativas y, si falló, el motivo.
#[derive(Debug)]
pub struct DiagnosticReport {
    pub action: DiagnosticAction,
    pub lines: Vec<String>,
    pub error: Option<StepError>,
}

impl DiagnosticReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Ejecuta acciones del menú.
pub trait ActionExecutor {
    fn execute(&self, action: DiagnosticAction) -> Vec<DiagnosticReport>;
}

pub struct Diagnostics {
    env: StepEnv,
    settings: InstallSettings,
}

impl Diagnostics {
    pub fn new(env: StepEnv, settings: InstallSettings) -> Self {
        Self { env, settings }
    }

    fn isolated(&self, step: &dyn StepDefinition) -> Result<Vec<String>, StepError> {
        let mut ctx = RunContext::new(self.settings.clone());
        run_isolated(step, &mut ctx)?;
        Ok(vec![format!("{} done", step.id())])
    }

    fn run_one(&self, action: DiagnosticAction) -> Result<Vec<String>, StepError> {
        let host = self.env.host();
        let s = &self.settings;
        match action {
            DiagnosticAction::ServiceStatus => {
                let statuses = self.env.health().check_all(MANAGED_SERVICES.iter().copied());
                let lines = statuses.iter().map(|(name, status)| format!("{name}: {status}")).collect();
                let down: Vec<&str> = statuses.iter()
                                              .filter(|(_, st)| !st.is_active())
                                              .map(|(n, _)| n.as_str())
                                              .collect();
                if down.is_empty() {
                    Ok(lines)
                } else {
                    debug!("inactive services: {down:?}");
                    Err(StepError::Verification(format!("not active: {}", down.join(", "))))
                }
            }
            DiagnosticAction::FixRuntime => self.isolated(&steps::InstallPythonEnv::new(self.env.clone())),
            DiagnosticAction::FixPermissions => {
                let mut lines = self.isolated(&steps::FixPermissions::new(self.env.clone()))?;
                let config = s.config_file();
                if host.path_exists(&config)? {
                    let owner = format!("{}:{}", s.service_user, s.service_group());
                    host.run_checked(&CommandSpec::root("chown").arg("-R").arg(owner).path_arg(&config))?;
                    host.run_checked(&CommandSpec::root("chmod").arg("600").path_arg(&config))?;
                    lines.push(format!("{} restricted to {}", config.display(), s.service_user));
                }
                Ok(lines)
            }
            DiagnosticAction::ReinstallDependencies => {
                install_requirements(host, s)?;
                Ok(vec![format!("requirements installed into {}", s.venv_dir().display())])
            }
            DiagnosticAction::CheckConfiguration => self.check_configuration(&s.config_file()),
            DiagnosticAction::CheckDatabase => {
                let ready = host.run(&CommandSpec::new("pg_isready"))?;
                if !ready.success() {
                    return Err(StepError::Verification(format!("postgresql not ready: {}", ready.stderr.trim())));
                }
                let text = host.read_file(&s.config_file())?
                               .ok_or_else(|| StepError::Verification("configuration.py not found".into()))?;
                let db = netbox_config::parse_database(&text)
                    .ok_or_else(|| StepError::Verification("DATABASE settings incomplete".into()))?;
                if !database_login(host, &db)? {
                    return Err(StepError::Verification(format!("login to {} as {} failed", db.name, db.user)));
                }
                Ok(vec![format!("logged in to {} as {}", db.name, db.user)])
            }
            DiagnosticAction::CheckRedis => {
                if redis_answers(host, s)? {
                    Ok(vec![format!("redis at {}:{} answered PONG", s.redis_host, s.redis_port)])
                } else {
                    Err(StepError::Verification("redis did not answer PING".into()))
                }
            }
            DiagnosticAction::RunMigrations => self.isolated(&steps::RunMigrations::new(self.env.clone())),
            DiagnosticAction::CollectStatic => self.isolated(&steps::CollectStatic::new(self.env.clone())),
            DiagnosticAction::ShowLogs => {
                let logs = services::recent_logs(host, &["netbox", "netbox-rq"], LOG_LINES)?;
                Ok(logs.lines().map(str::to_string).collect())
            }
            DiagnosticAction::RunAll | DiagnosticAction::Exit => Ok(vec![]),
        }
    }

    fn check_configuration(&self, path: &Path) -> Result<Vec<String>, StepError> {
        let host = self.env.host();
        let s = &self.settings;
        let text = host.read_file(path)?
                       .ok_or_else(|| StepError::Verification(format!("{} not found", path.display())))?;
        let mut problems: Vec<String> = REQUIRED_KEYS.iter()
                                                     .filter(|k| !netbox_config::defines(&text, k))
                                                     .map(|k| format!("{k} is not defined"))
                                                     .collect();
        if netbox_config::parse_secrets(&text).is_none() {
            problems.push("SECRET_KEY or database password missing".into());
        }
        match host.file_mode(path)? {
            Some(0o600) => {}
            Some(mode) => problems.push(format!("mode is {mode:o}, expected 600")),
            None => problems.push("cannot read file mode".into()),
        }
        let owner = host.file_owner(path)?;
        if owner.as_deref() != Some(s.service_user.as_str()) {
            problems.push(format!("owner is {}, expected {}", owner.unwrap_or_default(), s.service_user));
        }
        if problems.is_empty() {
            Ok(vec![format!("{} looks good", path.display())])
        } else {
            Err(StepError::Verification(problems.join("; ")))
        }
    }
}

impl ActionExecutor for Diagnostics {
    fn execute(&self, action: DiagnosticAction) -> Vec<DiagnosticReport> {
        let actions: Vec<DiagnosticAction> = match action {
            DiagnosticAction::RunAll => DiagnosticAction::ALL[..10].to_vec(),
            DiagnosticAction::Exit => vec![],
            single => vec![single],
        };
        actions.into_iter()
               .map(|a| match self.run_one(a) {
                   Ok(lines) => DiagnosticReport { action: a,
                                                   lines,
                                                   error: None },
                   Err(e) => DiagnosticReport { action: a,
                                                lines: vec![],
                                                error: Some(e) },
               })
               .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_matches_menu_order() {
        assert_eq!(DiagnosticAction::ServiceStatus.number(), 1);
        assert_eq!(DiagnosticAction::Exit.number(), 12);
        assert_eq!(DiagnosticAction::from_number(11), Some(DiagnosticAction::RunAll));
        assert_eq!(DiagnosticAction::from_number(0), None);
        assert_eq!(DiagnosticAction::from_number(13), None);
        assert_eq!(DiagnosticAction::ShowLogs.to_string(), "10) Show recent service logs");
    }
}
