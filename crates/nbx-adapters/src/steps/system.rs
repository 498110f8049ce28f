//! Paquetes del sistema y cuenta de servicio.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use nbx_core::{RetryPolicy, RunContext, StepDefinition, StepError, StepOutput, StepRunResult};
use nbx_host::{CommandSpec, FileSpec};

use super::StepEnv;

/// Paquetes de los que depende NetBox en Ubuntu.
pub const PACKAGES: &[&str] = &["postgresql",
                                "redis-server",
                                "nginx",
                                "python3",
                                "python3-pip",
                                "python3-venv",
                                "python3-dev",
                                "build-essential",
                                "libxml2-dev",
                                "libxslt1-dev",
                                "libffi-dev",
                                "libpq-dev",
                                "libssl-dev",
                                "zlib1g-dev",
                                "curl",
                                "tar"];

const UPGRADE_STAMP: &str = "apt-upgrade";
const UPGRADE_FRESH_HOURS: i64 = 24;

fn apt_get() -> CommandSpec {
    CommandSpec::root("apt-get").env("DEBIAN_FRONTEND", "noninteractive")
}

/// `apt-get update && apt-get upgrade`, a lo sumo una vez cada 24h.
pub struct UpdateSystem {
    env: StepEnv,
}

impl UpdateSystem {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let host = self.env.host();
        host.run_checked(&apt_get().arg("update"))?;
        host.run_checked(&apt_get().args(["-y", "upgrade"]))?;
        let stamp = ctx.settings.stamp_file(UPGRADE_STAMP);
        host.write_file(&stamp, &format!("{}\n", Utc::now().to_rfc3339()), &FileSpec::system())?;
        Ok(vec![])
    }
}

impl StepDefinition for UpdateSystem {
    fn id(&self) -> &str {
        "update-system"
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.env.network_retry
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        let Some(text) = self.env.host().read_file(&ctx.settings.stamp_file(UPGRADE_STAMP))? else {
            return Ok(false);
        };
        let Ok(at) = DateTime::parse_from_rfc3339(text.trim()) else {
            debug!("ignoring unreadable upgrade stamp");
            return Ok(false);
        };
        Ok(Utc::now().signed_duration_since(at) < Duration::hours(UPGRADE_FRESH_HOURS))
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}

pub struct InstallPackages {
    env: StepEnv,
}

impl InstallPackages {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }
}

impl StepDefinition for InstallPackages {
    fn id(&self) -> &str {
        "install-packages"
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.env.network_retry
    }

    fn is_satisfied(&self, _ctx: &RunContext) -> Result<bool, StepError> {
        let out = self.env.host().run(&CommandSpec::new("dpkg-query").args(["-W", "-f=${Package} ${Status}\\n"])
                                                                     .args(PACKAGES.iter().copied()))?;
        let installed = out.stdout.lines().filter(|l| l.ends_with("install ok installed")).count();
        Ok(out.success() && installed == PACKAGES.len())
    }

    fn run(&self, _ctx: &RunContext) -> StepRunResult {
        let cmd = apt_get().args(["install", "-y"]).args(PACKAGES.iter().copied());
        match self.env.host().run_checked(&cmd) {
            Ok(_) => {
                info!("installed {} packages", PACKAGES.len());
                StepRunResult::ok()
            }
            Err(e) => StepRunResult::Failure { error: e.into() },
        }
    }
}

/// Cuenta de sistema sin login, con grupo homónimo.
pub struct CreateServiceUser {
    env: StepEnv,
}

impl CreateServiceUser {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let s = &ctx.settings;
        let cmd = CommandSpec::root("useradd").args(["--system", "--user-group", "--home-dir"])
                                              .path_arg(&s.app_root())
                                              .args(["--shell", "/usr/sbin/nologin"])
                                              .arg(&s.service_user);
        self.env.host().run_checked(&cmd)?;
        info!("created service account {}", s.service_user);
        Ok(vec![])
    }
}

impl StepDefinition for CreateServiceUser {
    fn id(&self) -> &str {
        "create-service-user"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        Ok(self.env.host().user_exists(&ctx.settings.service_user)?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}
