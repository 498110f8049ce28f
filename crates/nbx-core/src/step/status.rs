/// Estado de un Step dentro de una ejecución.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Skipped` (predicado satisfecho)
/// - `Pending` -> `Running`
/// - `Running` -> `Completed` | `Warned` | `Failed`
///
/// No se permiten reversiones o saltos arbitrarios entre estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// El paso está pendiente de ejecución (o nunca se alcanzó).
    Pending,
    /// El paso está en ejecución.
    Running,
    /// El efecto ya estaba presente; la acción no se ejecutó.
    Skipped,
    /// El paso finalizó correctamente.
    Completed,
    /// Falló bajo política warn-and-continue.
    Warned,
    /// Falló bajo política abort.
    Failed,
}

impl StepStatus {
    pub fn label(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Skipped => "skipped",
            StepStatus::Completed => "completed",
            StepStatus::Warned => "warned",
            StepStatus::Failed => "failed",
        }
    }
}
