//! Trait `Host`: frontera entre los steps y la máquina aprovisionada.
//!
//! Sólo `run` y `effective_uid` son primitivos; las operaciones de archivos
//! se expresan como comandos (`test`, `cat`, `install`, `tee`, `ln`, `stat`)
//! ejecutados con sudo, de modo que un host simulado sólo tiene que
//! interpretar comandos.

use std::path::{Path, PathBuf};

use crate::{CommandOutput, CommandSpec, HostError};

/// Dueño y modo de un archivo escrito por el aprovisionador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub mode: u32,
    pub owner: String,
    pub group: String,
}

impl FileSpec {
    pub fn new(mode: u32, owner: impl Into<String>, group: impl Into<String>) -> Self {
        Self { mode,
               owner: owner.into(),
               group: group.into() }
    }

    /// `root:root`, 0644.
    pub fn system() -> Self {
        Self::new(0o644, "root", "root")
    }

    /// Sólo el dueño puede leer y escribir (0600).
    pub fn private(owner: &str, group: &str) -> Self {
        Self::new(0o600, owner, group)
    }

    pub fn mode_str(&self) -> String {
        format!("{:04o}", self.mode)
    }
}

pub trait Host {
    /// Ejecuta un comando y devuelve su salida, sea cual sea el exit code.
    /// Sólo falla si el proceso no pudo lanzarse.
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, HostError>;

    /// UID efectivo del proceso aprovisionador.
    fn effective_uid(&self) -> u32;

    /// Como `run`, pero un exit code distinto de cero es error.
    fn run_checked(&self, cmd: &CommandSpec) -> Result<CommandOutput, HostError> {
        self.run(cmd)?.into_result(cmd)
    }

    fn path_exists(&self, path: &Path) -> Result<bool, HostError> {
        let cmd = CommandSpec::root("test").arg("-e").path_arg(path);
        let out = self.run(&cmd)?;
        match out.status {
            0 => Ok(true),
            1 => Ok(false),
            status => Err(HostError::CommandFailed { command: cmd.to_string(),
                                                     status,
                                                     stderr: out.stderr.trim().to_string() }),
        }
    }

    /// Contenido del archivo, o `None` si no existe.
    fn read_file(&self, path: &Path) -> Result<Option<String>, HostError> {
        if !self.path_exists(path)? {
            return Ok(None);
        }
        let out = self.run_checked(&CommandSpec::root("cat").path_arg(path))?;
        Ok(Some(out.stdout))
    }

    /// Destino de un symlink, o `None` si `path` no es un symlink.
    fn read_link(&self, path: &Path) -> Result<Option<PathBuf>, HostError> {
        let out = self.run(&CommandSpec::root("readlink").path_arg(path))?;
        Ok(out.success().then(|| PathBuf::from(out.stdout.trim())))
    }

    /// Crea el archivo vacío con dueño y modo finales y recién entonces
    /// escribe el contenido, así nunca existe con permisos más abiertos.
    ///
    /// El contenido lo escribe el dueño: con `fs.protected_regular` ni root
    /// puede abrir con `O_CREAT` un archivo ajeno en un directorio sticky
    /// como `/tmp`.
    fn write_file(&self, path: &Path, contents: &str, spec: &FileSpec) -> Result<(), HostError> {
        self.run_checked(&CommandSpec::root("install").args(["-D", "-m"])
                                                      .arg(spec.mode_str())
                                                      .arg("-o")
                                                      .arg(&spec.owner)
                                                      .arg("-g")
                                                      .arg(&spec.group)
                                                      .arg("/dev/null")
                                                      .path_arg(path))?;
        let writer = match spec.owner.as_str() {
            "root" => CommandSpec::root("tee"),
            owner => CommandSpec::as_user("tee", owner),
        };
        self.run_checked(&writer.path_arg(path).stdin(contents))?;
        Ok(())
    }

    /// Directorio (y padres) con dueño y modo dados.
    fn ensure_dir(&self, path: &Path, spec: &FileSpec) -> Result<(), HostError> {
        self.run_checked(&CommandSpec::root("install").args(["-d", "-m"])
                                                      .arg(spec.mode_str())
                                                      .arg("-o")
                                                      .arg(&spec.owner)
                                                      .arg("-g")
                                                      .arg(&spec.group)
                                                      .path_arg(path))?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), HostError> {
        self.run_checked(&CommandSpec::root("rm").arg("-f").path_arg(path))?;
        Ok(())
    }

    /// `ln -sfn target link`: reemplaza un symlink previo.
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
        self.run_checked(&CommandSpec::root("ln").arg("-sfn").path_arg(target).path_arg(link))?;
        Ok(())
    }

    /// Usuario dueño del archivo, o `None` si no existe.
    fn file_owner(&self, path: &Path) -> Result<Option<String>, HostError> {
        let out = self.run(&CommandSpec::root("stat").args(["-c", "%U"]).path_arg(path))?;
        Ok(out.success().then(|| out.stdout.trim().to_string()))
    }

    /// Bits de permiso (p.ej. `0o600`), o `None` si no existe.
    fn file_mode(&self, path: &Path) -> Result<Option<u32>, HostError> {
        let cmd = CommandSpec::root("stat").args(["-c", "%a"]).path_arg(path);
        let out = self.run(&cmd)?;
        if !out.success() {
            return Ok(None);
        }
        u32::from_str_radix(out.stdout.trim(), 8).map(Some)
                                                 .map_err(|_| HostError::UnexpectedOutput { command: cmd.to_string(),
                                                                                            detail: out.stdout.trim().to_string() })
    }

    fn user_exists(&self, user: &str) -> Result<bool, HostError> {
        Ok(self.run(&CommandSpec::new("id").arg("-u").arg(user))?.success())
    }
}
