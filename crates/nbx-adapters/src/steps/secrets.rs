//! Generación (o adopción) de las credenciales de la ejecución.

use log::{info, warn};
use nbx_core::{RunContext, StepDefinition, StepError, StepOutput, StepRunResult};
use nbx_domain::SecretBundle;
use nbx_host::{read_secrets_file, write_secrets_file, HostError};

use super::StepEnv;
use crate::netbox_config;

/// Genera contraseña de base de datos y `SECRET_KEY` una sola vez.
///
/// Si el host ya tiene credenciales comprometidas (en `configuration.py` o
/// en un archivo de credenciales de una ejecución anterior) el step queda
/// satisfecho y las adopta, de modo que una ejecución reanudada escribe los
/// mismos valores en todas las superficies.
pub struct GenerateSecrets {
    env: StepEnv,
}

impl GenerateSecrets {
    pub fn new(env: StepEnv) -> Self {
        Self { env }
    }

    fn existing(&self, ctx: &RunContext) -> Result<Option<SecretBundle>, StepError> {
        let host = self.env.host();
        let s = &ctx.settings;
        if let Some(text) = host.read_file(&s.config_file())? {
            if let Some(bundle) = netbox_config::parse_secrets(&text) {
                return Ok(Some(bundle));
            }
        }
        match read_secrets_file(host, &s.secrets_file) {
            Ok(found) => Ok(found),
            Err(HostError::Domain(e)) => {
                warn!("ignoring unreadable credentials file {}: {e}", s.secrets_file.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn apply(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        if ctx.has_secrets() {
            return Err(StepError::SecretsAlreadyGenerated);
        }
        let s = &ctx.settings;
        let bundle = SecretBundle::generate();
        write_secrets_file(self.env.host(), &s.secrets_file, &bundle, &s.service_user)?;
        info!("credentials written to {} (mode 0600)", s.secrets_file.display());
        Ok(vec![StepOutput::Secrets(bundle), StepOutput::TemporaryFile(s.secrets_file.clone())])
    }
}

impl StepDefinition for GenerateSecrets {
    fn id(&self) -> &str {
        "generate-secrets"
    }

    fn is_satisfied(&self, ctx: &RunContext) -> Result<bool, StepError> {
        Ok(ctx.has_secrets() || self.existing(ctx)?.is_some())
    }

    fn adopt(&self, ctx: &RunContext) -> Result<Vec<StepOutput>, StepError> {
        if ctx.has_secrets() {
            return Ok(vec![]);
        }
        Ok(self.existing(ctx)?.map(StepOutput::Secrets).into_iter().collect())
    }

    fn run(&self, ctx: &RunContext) -> StepRunResult {
        self.apply(ctx).into()
    }
}
