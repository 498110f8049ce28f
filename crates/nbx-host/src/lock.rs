//! Lock advisory contra ejecuciones concurrentes.
//!
//! Se toma con `flock` sobre el archivo; el kernel lo suelta al morir el
//! proceso, así que un archivo que sobrevive a un crash no bloquea la
//! siguiente ejecución.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::debug;
use nix::errno::Errno;
use nix::fcntl::{flock, FlockArg};

use crate::HostError;

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    // Mantener el descriptor abierto mantiene el lock.
    _file: File,
}

impl RunLock {
    pub fn acquire(path: &Path) -> Result<Self, HostError> {
        let io_err = |source| HostError::Io { path: path.to_path_buf(),
                                              source };
        let mut file = OpenOptions::new().read(true)
                                         .write(true)
                                         .create(true)
                                         .truncate(false)
                                         .open(path)
                                         .map_err(io_err)?;
        match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
            Ok(()) => {}
            Err(Errno::EWOULDBLOCK) => return Err(HostError::LockHeld(path.to_path_buf())),
            Err(e) => return Err(io_err(e.into())),
        }
        file.set_len(0).map_err(io_err)?;
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        writeln!(file, "{}", std::process::id()).map_err(io_err)?;
        debug!("acquired run lock {}", path.display());
        Ok(Self { path: path.to_path_buf(),
                  _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nbx.lock");
        let lock = RunLock::acquire(&path).unwrap();
        assert!(matches!(RunLock::acquire(&path), Err(HostError::LockHeld(_))));
        drop(lock);
        assert!(RunLock::acquire(&path).is_ok());
    }

    #[test]
    fn leftover_file_from_a_dead_run_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nbx.lock");
        std::fs::write(&path, "999999\n").unwrap();
        let lock = RunLock::acquire(&path).unwrap();
        let recorded = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(recorded.trim(), std::process::id().to_string());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunLock::acquire(&dir.path().join("nope/nbx.lock")).unwrap_err();
        assert!(matches!(err, HostError::Io { .. }));
    }
}
