use crate::model::RunContext;

/// Colaborador de limpieza invocado cuando un step con política abort falla.
///
/// Debe deshacer sólo lo que esta ejecución dejó a medias (servicios que
/// arrancó, archivos temporales que escribió). Devuelve una descripción de
/// cada acción realizada para el journal; los errores de limpieza se
/// reportan ahí mismo y nunca ocultan el error original del step.
pub trait Rollback {
    fn rollback(&self, ctx: &RunContext) -> Vec<String>;
}

/// Rollback vacío (tests y ejecuciones sin colaboradores con estado).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRollback;

impl Rollback for NoRollback {
    fn rollback(&self, _ctx: &RunContext) -> Vec<String> {
        Vec::new()
    }
}
