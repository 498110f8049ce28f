//! Arranque de servicios con verificación.

use log::info;
use nbx_core::{RunContext, StepDefinition, StepError, StepOutput, StepRunResult};
use nbx_domain::ServiceStatus;
use nbx_host::services;

use super::StepEnv;

/// `systemctl enable --now <service>` y verificación de que quedó activo.
///
/// El predicado consulta la salud en vivo, por lo que el step se evalúa en
/// cada ejecución aunque todo lo anterior esté satisfecho.
pub struct StartService {
    env: StepEnv,
    id: &'static str,
    service: &'static str,
}

impl StartService {
    pub fn new(env: StepEnv, id: &'static str, service: &'static str) -> Self {
        Self { env, id, service }
    }

    pub fn service(&self) -> &str {
        self.service
    }

    fn apply(&self) -> Result<Vec<StepOutput>, StepError> {
        services::enable_now(self.env.host(), self.service)?;
        match self.env.health().check(self.service) {
            ServiceStatus::Active => {
                info!("{} is active", self.service);
                Ok(vec![StepOutput::ServiceStarted(self.service.to_string())])
            }
            other => Err(StepError::Verification(format!("{} is {other} after start", self.service))),
        }
    }
}

impl StepDefinition for StartService {
    fn id(&self) -> &str {
        self.id
    }

    fn is_satisfied(&self, _ctx: &RunContext) -> Result<bool, StepError> {
        Ok(self.env.health().check(self.service).is_active())
    }

    fn run(&self, _ctx: &RunContext) -> StepRunResult {
        self.apply().into()
    }
}
