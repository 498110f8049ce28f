//! Unidades systemd, sitio Nginx y housekeeping diario.

use std::path::{Path, PathBuf};

use log::info;
use nbx_core::{FailurePolicy, RunContext, StepDefinition, StepError, StepOutput, StepRunResult};
use nbx_domain::InstallSettings;
use nbx_host::{services, CommandSpec, FileSpec};

use super::StepEnv;
use crate::render::{NETBOX_RQ_UNIT, NETBOX_UNIT};

pub const SYSTEMD_DIR: &str = "/etc/systemd/system";
pub const NGINX_SITE_AVAILABLE: &str = "/etc/nginx/sites-available/netbox";
pub const NGINX_SITE_ENABLED: &str = "/etc/nginx/sites-enabled/netbox";
pub const NGINX_DEFAULT_SITE: &str = "/etc/nginx/sites-enabled/default";
pub const HOUSEKEEPING_LINK: &str = "/etc/cron.daily/netbox-housekeeping";

pub struct InstallSystemdUnits {
    env: StepEnv,
}

impl InstallSystemdUnits {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn units(&self, settings: &InstallSettings) -> Result<Vec<(PathBuf, String)>, StepError> {
        [NETBOX_UNIT, NETBOX_RQ_UNIT].into_iter()
                                     .map(|name| -> Result<(PathBuf, String), StepError> {
                                         let text = self.env.templates.unit(name, settings)?;
                                         Ok((Path::new(SYSTEMD_DIR).join(name), text))
                                     })
                                     .collect()
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let host = self.env.host();
        for (path, text) in self.units(&ctx.settings)? {
            host.write_file(&path, &text, &FileSpec::system())?;
        }
        services::daemon_reload(host)?;
        Ok(vec![])
    }
}

impl StepDefinition for InstallSystemdUnits {
    fn id(&self) -> &str {
        "install-systemd-units"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        for (path, text) in self.units(&ctx.settings)? {
            if self.env.host().read_file(&path)?.as_deref() != Some(text.as_str()) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}

/// Sitio HTTP que proxya a gunicorn y sirve `/static/`; reemplaza el sitio
/// por defecto de Nginx.
pub struct ConfigureNginx {
    env: StepEnv,
}

impl ConfigureNginx {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let host = self.env.host();
        let site = Path::new(NGINX_SITE_AVAILABLE);
        host.write_file(site, &self.env.templates.nginx_site(&ctx.settings)?, &FileSpec::system())?;
        host.symlink(site, Path::new(NGINX_SITE_ENABLED))?;
        host.remove_file(Path::new(NGINX_DEFAULT_SITE))?;
        host.run_checked(&CommandSpec::root("nginx").arg("-t"))?;
        if self.env.health().check("nginx").is_active() {
            services::reload(host, "nginx")?;
            info!("nginx reloaded");
        }
        Ok(vec![])
    }
}

impl StepDefinition for ConfigureNginx {
    fn id(&self) -> &str {
        "configure-nginx"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        let host = self.env.host();
        let site = Path::new(NGINX_SITE_AVAILABLE);
        let expected = self.env.templates.nginx_site(&ctx.settings)?;
        Ok(host.read_file(site)?.as_deref() == Some(expected.as_str())
           && host.read_link(Path::new(NGINX_SITE_ENABLED))?.as_deref() == Some(site)
           && host.read_link(Path::new(NGINX_DEFAULT_SITE))?.is_none()
           && !host.path_exists(Path::new(NGINX_DEFAULT_SITE))?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}

/// Enlaza `netbox-housekeeping.sh` en `cron.daily`. Un fallo aquí no
/// impide que NetBox funcione.
pub struct InstallHousekeeping {
    env: StepEnv,
}

impl InstallHousekeeping {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let host = self.env.host();
        let script = ctx.settings.housekeeping_script();
        if !host.path_exists(&script)? {
            return Err(StepError::Verification(format!("{} not found in release", script.display())));
        }
        host.symlink(&script, Path::new(HOUSEKEEPING_LINK))?;
        Ok(vec![])
    }
}

impl StepDefinition for InstallHousekeeping {
    fn id(&self) -> &str {
        "install-housekeeping"
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::WarnAndContinue
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        let script = ctx.settings.housekeeping_script();
        Ok(self.env.host().read_link(Path::new(HOUSEKEEPING_LINK))?.as_deref() == Some(script.as_path()))
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}
