//! Limpieza ante un fallo con política abort.

use std::rc::Rc;

use log::warn;
use nbx_core::{Rollback, RunContext};
use nbx_host::{services, Host};

/// Detiene y deshabilita los servicios que arrancó esta ejecución (en orden
/// inverso) y borra los archivos temporales que escribió, p.ej. el archivo de
/// credenciales. No toca nada preexistente.
pub struct HostRollback {
    host: Rc<dyn Host>,
}

impl HostRollback {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }
}

impl Rollback for HostRollback {
    fn rollback(&self, ctx: &RunContext) -> Vec<String> {
        let host = self.host.as_ref();
        let mut actions = Vec::new();
        for service in ctx.started_services().iter().rev() {
            let result = services::stop(host, service).and_then(|()| services::disable(host, service));
            match result {
                Ok(()) => actions.push(format!("stopped and disabled {service}")),
                Err(e) => {
                    warn!("rollback could not stop {service}: {e}");
                    actions.push(format!("failed to stop {service}: {e}"));
                }
            }
        }
        for path in ctx.temporary_files() {
            match host.remove_file(path) {
                Ok(()) => actions.push(format!("removed {}", path.display())),
                Err(e) => {
                    warn!("rollback could not remove {}: {e}", path.display());
                    actions.push(format!("failed to remove {}: {e}", path.display()));
                }
            }
        }
        actions
    }
}
