//! Tipos de evento del journal y estructura `RunEvent`.
//!
//! Rol en la ejecución:
//! - El `StepRunner` emite eventos a un `EventStore` append-only.
//! - `RunReport::replay` reconstruye el estado de cada step y los contadores
//!   del `RunResult` sin depender de estructuras mutables.
//! - Los eventos nunca contienen valores secretos.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: fija el `registry_hash` y la cantidad de
    /// steps.
    RunInitialized {
        registry_hash: String,
        step_count: usize,
        runner_version: String,
    },
    /// Predicado satisfecho: la acción no se ejecuta.
    StepSkipped { step_index: usize, step_id: String },
    /// La acción comenzó. No implica éxito.
    StepStarted { step_index: usize, step_id: String },
    /// Un intento falló y se reintentará tras `delay_ms`.
    StepRetried {
        step_index: usize,
        step_id: String,
        attempt: u32,
        error: String,
        delay_ms: u64,
    },
    StepCompleted {
        step_index: usize,
        step_id: String,
        outputs: Vec<String>,
    },
    /// Fallo bajo warn-and-continue; la ejecución sigue.
    StepWarned {
        step_index: usize,
        step_id: String,
        error: String,
    },
    /// Fallo terminal (abort). Ningún step posterior se ejecuta.
    StepFailed {
        step_index: usize,
        step_id: String,
        error: String,
    },
    RollbackPerformed { actions: Vec<String> },
    RunFinished { aborted: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el EventStore (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
