//! `SystemHost`: ejecución real vía `std::process::Command` y `sudo -n`.

use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;
use nix::unistd::Uid;

use crate::command::Privilege;
use crate::{CommandOutput, CommandSpec, Host, HostError};

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }

    /// argv final. Con sudo las variables viajan vía `env K=V` porque la
    /// política por defecto de sudo descarta el entorno del invocador.
    fn argv(cmd: &CommandSpec) -> Vec<String> {
        let mut argv = Vec::new();
        match &cmd.privilege {
            Privilege::Invoker => {}
            Privilege::Root => argv.extend(["sudo".to_string(), "-n".to_string()]),
            Privilege::User(u) => argv.extend(["sudo".to_string(), "-n".to_string(), "-u".to_string(), u.clone()]),
        }
        if cmd.privilege != Privilege::Invoker && !cmd.env.is_empty() {
            argv.push("env".to_string());
            argv.extend(cmd.env.iter().map(|(k, v)| format!("{k}={v}")));
        }
        argv.push(cmd.program.clone());
        argv.extend(cmd.args.iter().cloned());
        argv
    }
}

impl Host for SystemHost {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, HostError> {
        debug!("exec: {cmd}");
        let argv = Self::argv(cmd);
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        if cmd.privilege == Privilege::Invoker {
            command.envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }
        command.stdin(if cmd.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
               .stdout(Stdio::piped())
               .stderr(Stdio::piped());

        let spawn_err = |source| HostError::Spawn { command: cmd.to_string(),
                                                    source };
        let mut child = command.spawn().map_err(spawn_err)?;
        if let (Some(input), Some(mut pipe)) = (&cmd.stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        let decode = |bytes: Vec<u8>| String::from_utf8(bytes).map_err(|_| HostError::Utf8 { command: cmd.to_string() });
        let out = CommandOutput { status: output.status.code().unwrap_or(-1),
                                  stdout: decode(output.stdout)?,
                                  stderr: decode(output.stderr)? };
        if !out.success() {
            debug!("exit {} from {}: {}", out.status, cmd.program_name(), out.stderr.trim());
        }
        Ok(out)
    }

    fn effective_uid(&self) -> u32 {
        Uid::effective().as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_wraps_privileged_commands() {
        let cmd = CommandSpec::as_user("psql", "postgres").arg("-tAc").arg("SELECT 1").env("PGOPTIONS", "-c x=y");
        assert_eq!(SystemHost::argv(&cmd),
                   vec!["sudo", "-n", "-u", "postgres", "env", "PGOPTIONS=-c x=y", "psql", "-tAc", "SELECT 1"]);
        assert_eq!(SystemHost::argv(&CommandSpec::new("id").arg("-u")), vec!["id", "-u"]);
    }

    #[test]
    fn runs_a_real_command() {
        let out = SystemHost.run(&CommandSpec::new("sh").args(["-c", "cat; echo err >&2; exit 3"]).stdin("hi"))
                            .unwrap();
        assert_eq!((out.status, out.stdout.as_str(), out.stderr.trim()), (3, "hi", "err"));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = SystemHost.run(&CommandSpec::new("/nonexistent/nbx-probe")).unwrap_err();
        assert!(matches!(err, HostError::Spawn { .. }));
    }
}
