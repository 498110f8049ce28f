//! Flujo de `nbx-install`: preflight, lock, registry, runner y resumen.
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use log::info;
use nbx_adapters::{netbox_registry, preflight, HostRollback, StepEnv};
use nbx_core::{RunContext, RunResult, StepOutput, StepRunner};
use nbx_domain::{InstallSettings, MANAGED_SERVICES};
use nbx_host::{Host, RunLock};

use crate::console::Console;
use crate::errors::AppError;
use crate::summary::{print_summary, SummaryInput};

/// Ejecuta la instalación completa y muestra el resumen. Un fallo de step
/// no es `Err` aquí: viaja en `RunResult::fatal` (ver `finish`).
pub fn install<W: Write>(host: Rc<dyn Host>,
                         settings: InstallSettings,
                         lock_file: &Path,
                         console: &mut Console<W>)
                         -> Result<RunResult, AppError> {
    let os = preflight(host.as_ref(), &settings)?;
    console.success(&format!("Preflight passed on {}", os.pretty_name))?;
    let _lock = RunLock::acquire(lock_file).map_err(AppError::Lock)?;

    let env = StepEnv::new(host.clone())?;
    let registry = netbox_registry(&env)?;
    console.info(&format!("Installing NetBox {} ({} steps)", settings.version_number(), registry.len()))?;

    let mut ctx = RunContext::new(settings);
    ctx.merge(StepOutput::OsRelease(os))?;
    let mut runner = StepRunner::new().with_rollback(HostRollback::new(host.clone()));
    let result = runner.run(&registry, &mut ctx);
    info!("run {} finished: {} completed, {} skipped", result.run_id, result.completed, result.skipped);

    let services = env.health().check_all(MANAGED_SERVICES.iter().copied());
    let secrets_file_present = host.path_exists(&ctx.settings.secrets_file).unwrap_or(false);
    print_summary(console,
                  &SummaryInput { result: &result,
                                  services: &services,
                                  ctx: &ctx,
                                  secrets_file_present })?;
    Ok(result)
}

/// Convierte un fallo fatal del runner en el error del proceso.
pub fn finish(result: RunResult) -> Result<(), AppError> {
    match result.fatal {
        Some(failure) => Err(AppError::Step(failure)),
        None => Ok(()),
    }
}
