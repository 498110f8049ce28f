//! Configuración de la aplicación y comandos de `manage.py`.

use log::info;
use nbx_core::{RunContext, StepDefinition, StepError, StepOutput, StepRunResult};
use nbx_domain::InstallSettings;
use nbx_host::{CommandSpec, FileSpec, Host, HostError};

use super::StepEnv;

const COLLECTSTATIC_STAMP: &str = "collectstatic";

/// `<venv>/bin/python manage.py <args>` como root, igual que el
/// `upgrade.sh` de NetBox.
pub fn manage(settings: &InstallSettings, args: &[&str]) -> CommandSpec {
    CommandSpec::root(settings.venv_bin("python").display().to_string()).path_arg(&settings.manage_py())
                                                                      .args(args.iter().copied())
                                                                      .cwd(settings.app_root())
}

pub fn migrations_pending(host: &dyn Host, settings: &InstallSettings) -> Result<bool, HostError> {
    Ok(!host.run(&manage(settings, &["migrate", "--check"]))?.success())
}

pub fn apply_migrations(host: &dyn Host, settings: &InstallSettings) -> Result<(), HostError> {
    host.run_checked(&manage(settings, &["migrate", "--no-input"]))?;
    Ok(())
}

/// Corre `collectstatic` y registra la versión para la que se hizo.
pub fn collect_static(host: &dyn Host, settings: &InstallSettings) -> Result<(), HostError> {
    host.run_checked(&manage(settings, &["collectstatic", "--no-input"]))?;
    host.write_file(&settings.stamp_file(COLLECTSTATIC_STAMP),
                    &format!("{}\n", settings.version_number()),
                    &FileSpec::system())
}

/// Directorios escribibles cuyo dueño no es la cuenta de servicio.
pub fn foreign_owned_dirs(host: &dyn Host, settings: &InstallSettings) -> Result<Vec<String>, HostError> {
    let mut wrong = Vec::new();
    for dir in settings.writable_dirs() {
        if host.file_owner(&dir)?.as_deref() != Some(settings.service_user.as_str()) {
            wrong.push(dir.display().to_string());
        }
    }
    Ok(wrong)
}

pub fn fix_permissions(host: &dyn Host, settings: &InstallSettings) -> Result<(), HostError> {
    let owner = format!("{}:{}", settings.service_user, settings.service_group());
    for dir in settings.writable_dirs() {
        host.run_checked(&CommandSpec::root("chown").arg("-R").arg(owner.as_str()).path_arg(&dir))?;
    }
    Ok(())
}

/// Compara contenido, modo y dueño de un archivo gestionado.
fn file_matches(host: &dyn Host, path: &std::path::Path, contents: &str, spec: &FileSpec) -> Result<bool, HostError> {
    Ok(host.read_file(path)?.as_deref() == Some(contents)
       && host.file_mode(path)? == Some(spec.mode)
       && host.file_owner(path)?.as_deref() == Some(spec.owner.as_str()))
}

/// `configuration.py` (0600, dueño la cuenta de servicio).
pub struct WriteConfiguration {
    env: StepEnv,
}

impl WriteConfiguration {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn rendered(&self, ctx: &RunContext) -> Result<String, StepError> {
        Ok(self.env.templates.configuration(&ctx.settings, ctx.secrets()?)?)
    }

    fn spec(settings: &InstallSettings) -> FileSpec {
        FileSpec::private(&settings.service_user, settings.service_group())
    }
}

impl StepDefinition for WriteConfiguration {
    fn id(&self) -> &str {
        "write-configuration"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        let s = &ctx.settings;
        Ok(file_matches(self.env.host(), &s.config_file(), &self.rendered(ctx)?, &Self::spec(s))?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        let s = &ctx.settings;
        let written = self.rendered(ctx).and_then(|text| {
                                            self.env
                                                .host()
                                                .write_file(&s.config_file(), &text, &Self::spec(s))
                                                .map_err(StepError::from)
                                        });
        written.map(|()| Vec::<StepOutput>::new()).into()
    }
}

pub struct RunMigrations {
    env: StepEnv,
}

impl RunMigrations {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }
}

impl StepDefinition for RunMigrations {
    fn id(&self) -> &str {
        "run-migrations"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        Ok(!migrations_pending(self.env.host(), &ctx.settings)?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        match apply_migrations(self.env.host(), &ctx.settings) {
            Ok(()) => {
                info!("database migrations applied");
                StepRunResult::ok()
            }
            Err(e) => StepRunResult::Failure { error: e.into() },
        }
    }
}

pub struct CollectStatic {
    env: StepEnv,
}

impl CollectStatic {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }
}

impl StepDefinition for CollectStatic {
    fn id(&self) -> &str {
        "collect-static"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        let host = self.env.host();
        let s = &ctx.settings;
        let stamp = host.read_file(&s.stamp_file(COLLECTSTATIC_STAMP))?;
        Ok(stamp.as_deref().map(str::trim) == Some(s.version_number()) && host.path_exists(&s.static_root())?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        collect_static(self.env.host(), &ctx.settings).map(|()| Vec::<StepOutput>::new())
                                                       .map_err(StepError::from)
                                                       .into()
    }
}

/// `media/`, `reports/` y `scripts/` pertenecen a la cuenta de servicio.
pub struct FixPermissions {
    env: StepEnv,
}

impl FixPermissions {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }
}

impl StepDefinition for FixPermissions {
    fn id(&self) -> &str {
        "fix-permissions"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        Ok(foreign_owned_dirs(self.env.host(), &ctx.settings)?.is_empty())
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        fix_permissions(self.env.host(), &ctx.settings).map(|()| Vec::<StepOutput>::new())
                                                       .map_err(StepError::from)
                                                       .into()
    }
}

pub struct WriteGunicornConfig {
    env: StepEnv,
}

impl WriteGunicornConfig {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        let s = &ctx.settings;
        let text = self.env.templates.gunicorn(s)?;
        self.env.host().write_file(&s.gunicorn_config(), &text, &FileSpec::system())?;
        Ok(vec![])
    }
}

impl StepDefinition for WriteGunicornConfig {
    fn id(&self) -> &str {
        "write-gunicorn-config"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        let s = &ctx.settings;
        let text = self.env.templates.gunicorn(s)?;
        Ok(file_matches(self.env.host(), &s.gunicorn_config(), &text, &FileSpec::system())?)
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}
