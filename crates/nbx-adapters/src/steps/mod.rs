//! Steps concretos de aprovisionamiento de NetBox.
//!
//! Cada step recibe un `StepEnv` (host + plantillas) y expone un predicado de
//! idempotencia que sólo consulta el host, nunca lo modifica. El orden de
//! `netbox_registry` es el orden de ejecución.

use std::rc::Rc;

use nbx_core::{RetryPolicy, StepRegistry};
use nbx_host::{HealthChecker, Host};

use crate::render::TemplateRenderer;
use crate::AdapterError;

pub mod app;
pub mod database;
pub mod release;
pub mod secrets;
pub mod services;
pub mod system;
pub mod web;

pub use app::{CollectStatic, FixPermissions, RunMigrations, WriteConfiguration, WriteGunicornConfig};
pub use database::{ConfigureDatabase, ConfigureRedis};
pub use release::{DownloadRelease, InstallPythonEnv};
pub use secrets::GenerateSecrets;
pub use services::StartService;
pub use system::{CreateServiceUser, InstallPackages, UpdateSystem};
pub use web::{ConfigureNginx, InstallHousekeeping, InstallSystemdUnits};

/// Colaboradores compartidos por todos los steps.
#[derive(Clone)]
pub struct StepEnv {
    pub host: Rc<dyn Host>,
    pub templates: Rc<TemplateRenderer>,
    /// Reintentos de los steps que bajan de la red.
    pub network_retry: RetryPolicy,
}

impl StepEnv {
    pub fn new(host: Rc<dyn Host>) -> Result<Self, AdapterError> {
        Ok(Self { host,
                  templates: Rc::new(TemplateRenderer::from_embedded()?),
                  network_retry: RetryPolicy::network() })
    }

    pub fn with_network_retry(mut self, policy: RetryPolicy) -> Self {
        self.network_retry = policy;
        self
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn health(&self) -> HealthChecker {
        HealthChecker::new(self.host.clone())
    }
}

/// Secuencia completa de instalación.
pub fn netbox_registry(env: &StepEnv) -> Result<StepRegistry, AdapterError> {
    let registry = StepRegistry::builder().step(UpdateSystem::new(env.clone()))
                                          .step(InstallPackages::new(env.clone()))
                                          .step(CreateServiceUser::new(env.clone()))
                                          .step(GenerateSecrets::new(env.clone()))
                                          .step(ConfigureRedis::new(env.clone()))
                                          .step(ConfigureDatabase::new(env.clone()))
                                          .step(DownloadRelease::new(env.clone()))
                                          .step(InstallPythonEnv::new(env.clone()))
                                          .step(WriteConfiguration::new(env.clone()))
                                          .step(RunMigrations::new(env.clone()))
                                          .step(CollectStatic::new(env.clone()))
                                          .step(FixPermissions::new(env.clone()))
                                          .step(WriteGunicornConfig::new(env.clone()))
                                          .step(InstallSystemdUnits::new(env.clone()))
                                          .step(ConfigureNginx::new(env.clone()))
                                          .step(InstallHousekeeping::new(env.clone()))
                                          .step(StartService::new(env.clone(), "start-netbox", "netbox"))
                                          .step(StartService::new(env.clone(), "start-netbox-rq", "netbox-rq"))
                                          .step(StartService::new(env.clone(), "start-nginx", "nginx"))
                                          .build()?;
    Ok(registry)
}
