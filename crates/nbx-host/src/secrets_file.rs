//! Archivo temporal de credenciales (`KEY=VALUE`, modo 0600).

use std::path::Path;

use nbx_domain::SecretBundle;

use crate::{FileSpec, Host, HostError};

/// Escribe el bundle restringiendo permisos antes del contenido.
pub fn write_secrets_file(host: &dyn Host, path: &Path, bundle: &SecretBundle, owner: &str) -> Result<(), HostError> {
    let header = "# NetBox credentials generated by netbox-provision.\n# Store them safely and delete this file.\n";
    host.write_file(path, &format!("{header}{}", bundle.to_env_file()), &FileSpec::private(owner, owner))
}

/// Bundle guardado en `path`, o `None` si el archivo no existe.
pub fn read_secrets_file(host: &dyn Host, path: &Path) -> Result<Option<SecretBundle>, HostError> {
    match host.read_file(path)? {
        Some(text) => Ok(Some(SecretBundle::from_env_file(&text)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeHost;
    use crate::CommandSpec;

    #[test]
    fn secrets_file_is_private_and_readable_back() {
        let host = FakeHost::new();
        host.run_checked(&CommandSpec::root("useradd").args(["--system", "netbox"])).unwrap();
        let bundle = SecretBundle::generate();
        let path = Path::new("/tmp/netbox-credentials.txt");
        write_secrets_file(&host, path, &bundle, "netbox").unwrap();

        let file = host.file("/tmp/netbox-credentials.txt").unwrap();
        assert_eq!((file.mode, file.owner.as_str()), (0o600, "netbox"));
        assert_eq!(read_secrets_file(&host, path).unwrap(), Some(bundle));
        assert_eq!(read_secrets_file(&host, Path::new("/tmp/none")).unwrap(), None);

        // modo final antes del contenido
        let cmds = host.commands();
        let install = cmds.iter().position(|c| c.starts_with("sudo install")).unwrap();
        let tee = cmds.iter().position(|c| c.contains("tee /tmp/netbox-credentials.txt")).unwrap();
        assert!(install < tee);
        // el dueño escribe, root no reabre el archivo en /tmp
        assert!(cmds[tee].starts_with("sudo -u netbox tee"), "{}", cmds[tee]);
    }

    #[test]
    fn credentials_are_written_over_a_leftover_owned_by_the_service_user() {
        let host = FakeHost::new();
        host.run_checked(&CommandSpec::root("useradd").args(["--system", "netbox"])).unwrap();
        let path = Path::new("/tmp/netbox-credentials.txt");
        write_secrets_file(&host, path, &SecretBundle::generate(), "netbox").unwrap();
        let fresh = SecretBundle::generate();
        write_secrets_file(&host, path, &fresh, "netbox").unwrap();
        assert_eq!(read_secrets_file(&host, path).unwrap(), Some(fresh));
    }
}
