//! Descripción de comandos externos y su salida.
//!
//! Cada colaborador (apt, psql, systemctl, manage.py, ...) se invoca como un
//! comando opaco con contrato de exit code y stdout/stderr. `CommandSpec` es
//! neutral respecto al mecanismo: `SystemHost` lo traduce a `sudo`, el
//! `FakeHost` lo interpreta en memoria.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::HostError;

/// Con qué identidad se ejecuta el comando.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    /// Usuario que invocó el aprovisionador (nunca root).
    Invoker,
    /// `sudo -n`.
    Root,
    /// `sudo -n -u <user>`.
    User(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Entrada estándar. Puede contener secretos: nunca se loguea.
    pub stdin: Option<String>,
    pub privilege: Privilege,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(),
               args: Vec::new(),
               env: Vec::new(),
               stdin: None,
               privilege: Privilege::Invoker,
               cwd: None }
    }

    pub fn root(program: impl Into<String>) -> Self {
        Self::new(program).privilege(Privilege::Root)
    }

    pub fn as_user(program: impl Into<String>, user: impl Into<String>) -> Self {
        Self::new(program).privilege(Privilege::User(user.into()))
    }

    pub fn privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Nombre corto del programa (`/opt/netbox/venv/bin/python` -> `python`).
    pub fn program_name(&self) -> &str {
        self.program.rsplit('/').next().unwrap_or(&self.program)
    }
}

// Los valores de entorno pueden ser contraseñas (PGPASSWORD): sólo se
// muestran las claves.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.privilege {
            Privilege::Invoker => {}
            Privilege::Root => write!(f, "sudo ")?,
            Privilege::User(u) => write!(f, "sudo -u {u} ")?,
        }
        for (k, _) in &self.env {
            write!(f, "{k}=*** ")?;
        }
        write!(f, "{}", self.program)?;
        for a in &self.args {
            write!(f, " {a}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandSpec({self})")
    }
}

/// Salida capturada de un comando.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `-1` cuando el proceso terminó por señal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { status: 0,
               stdout: stdout.into(),
               stderr: String::new() }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self { status,
               stdout: String::new(),
               stderr: stderr.into() }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Convierte un exit code distinto de cero en `HostError::CommandFailed`.
    pub fn into_result(self, cmd: &CommandSpec) -> Result<CommandOutput, HostError> {
        if self.success() {
            return Ok(self);
        }
        let stderr = if self.stderr.trim().is_empty() { self.stdout.trim() } else { self.stderr.trim() };
        Err(HostError::CommandFailed { command: cmd.to_string(),
                                       status: self.status,
                                       stderr: stderr.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_env_values() {
        let cmd = CommandSpec::new("psql").arg("-h").arg("localhost").env("PGPASSWORD", "hunter2");
        let shown = cmd.to_string();
        assert_eq!(shown, "PGPASSWORD=*** psql -h localhost");
        assert!(!format!("{cmd:?}").contains("hunter2"));
    }

    #[test]
    fn failed_output_maps_to_error() {
        let cmd = CommandSpec::root("nginx").arg("-t");
        let err = CommandOutput::failed(1, "emerg: bad directive\n").into_result(&cmd).unwrap_err();
        assert_eq!(err.to_string(), "`sudo nginx -t` exited with status 1: emerg: bad directive");
    }

    #[test]
    fn program_name_strips_directories() {
        assert_eq!(CommandSpec::new("/opt/netbox/venv/bin/python").program_name(), "python");
    }
}
