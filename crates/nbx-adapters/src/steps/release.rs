//! Release de NetBox y entorno Python.

use log::info;
use nbx_core::{RetryPolicy, RunContext, StepDefinition, StepError, StepOutput, StepRunResult};
use nbx_domain::InstallSettings;
use nbx_host::{CommandSpec, Host, HostError};

use super::StepEnv;

/// Descarga y extrae el tarball del release y apunta `<root>/netbox` a él.
pub struct DownloadRelease {
    env: StepEnv,
}

impl DownloadRelease {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let host = self.env.host();
        let s = &ctx.settings;
        let release = s.release_dir();
        if !host.path_exists(&release.join("netbox").join("manage.py"))? {
            let tarball = s.release_tarball();
            host.run_checked(&CommandSpec::root("curl").args(["-fsSL", "-o"])
                                                       .path_arg(&tarball)
                                                       .arg(s.release_url()))?;
            host.run_checked(&CommandSpec::root("tar").arg("-xzf")
                                                      .path_arg(&tarball)
                                                      .arg("-C")
                                                      .path_arg(&s.install_root))?;
            host.remove_file(&tarball)?;
            info!("extracted NetBox {} into {}", s.version_number(), release.display());
        }
        host.symlink(&release, &s.app_root())?;
        Ok(vec![StepOutput::Note { key: "release".into(),
                                   value: s.version_number().to_string() }])
    }
}

impl StepDefinition for DownloadRelease {
    fn id(&self) -> &str {
        "download-release"
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.env.network_retry
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        let host = self.env.host();
        let s = &ctx.settings;
        let release = s.release_dir();
        Ok(host.read_link(&s.app_root())?.as_deref() == Some(release.as_path())
           && host.path_exists(&release.join("netbox").join("manage.py"))?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}

/// `python3 -m venv` en `<app_root>/venv`.
pub fn create_venv(host: &dyn Host, settings: &InstallSettings) -> Result<(), HostError> {
    host.run_checked(&CommandSpec::root("python3").args(["-m", "venv"]).path_arg(&settings.venv_dir()))?;
    Ok(())
}

/// Instala `requirements.txt` del release dentro del virtualenv.
pub fn install_requirements(host: &dyn Host, settings: &InstallSettings) -> Result<(), HostError> {
    let pip = settings.venv_bin("pip").display().to_string();
    host.run_checked(&CommandSpec::root(pip.as_str()).args(["install", "--upgrade", "pip", "wheel"]))?;
    host.run_checked(&CommandSpec::root(pip).args(["install", "-r"]).path_arg(&settings.requirements_file()))?;
    Ok(())
}

pub struct InstallPythonEnv {
    env: StepEnv,
}

impl InstallPythonEnv {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let host = self.env.host();
        let s = &ctx.settings;
        if !host.path_exists(&s.venv_bin("python"))? {
            create_venv(host, s)?;
        }
        install_requirements(host, s)?;
        Ok(vec![])
    }
}

impl StepDefinition for InstallPythonEnv {
    fn id(&self) -> &str {
        "install-python-env"
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.env.network_retry
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        let host = self.env.host();
        let s = &ctx.settings;
        Ok(host.path_exists(&s.venv_bin("python"))? && host.path_exists(&s.venv_bin("gunicorn"))?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}
