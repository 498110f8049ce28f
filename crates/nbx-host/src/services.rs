//! Control de unidades systemd.

use crate::{CommandSpec, Host, HostError};

pub fn enable_now(host: &dyn Host, service: &str) -> Result<(), HostError> {
    host.run_checked(&CommandSpec::root("systemctl").args(["enable", "--now", service]))?;
    Ok(())
}

pub fn restart(host: &dyn Host, service: &str) -> Result<(), HostError> {
    host.run_checked(&CommandSpec::root("systemctl").args(["restart", service]))?;
    Ok(())
}

pub fn stop(host: &dyn Host, service: &str) -> Result<(), HostError> {
    host.run_checked(&CommandSpec::root("systemctl").args(["stop", service]))?;
    Ok(())
}

pub fn disable(host: &dyn Host, service: &str) -> Result<(), HostError> {
    host.run_checked(&CommandSpec::root("systemctl").args(["disable", service]))?;
    Ok(())
}

pub fn reload(host: &dyn Host, service: &str) -> Result<(), HostError> {
    host.run_checked(&CommandSpec::root("systemctl").args(["reload", service]))?;
    Ok(())
}

pub fn daemon_reload(host: &dyn Host) -> Result<(), HostError> {
    host.run_checked(&CommandSpec::root("systemctl").arg("daemon-reload"))?;
    Ok(())
}

/// Últimas `lines` líneas del journal de las unidades dadas.
pub fn recent_logs(host: &dyn Host, units: &[&str], lines: usize) -> Result<String, HostError> {
    let mut cmd = CommandSpec::root("journalctl");
    for unit in units {
        cmd = cmd.arg("-u").arg(*unit);
    }
    let out = host.run_checked(&cmd.arg("-n").arg(lines.to_string()).arg("--no-pager"))?;
    Ok(out.stdout)
}
