//! Tipos del registry: lista ordenada de steps (`StepRegistry`) y estado
//! reconstruido de una ejecución (`RunReport`).
//!
//! El reporte aplica un replay lineal: consume los eventos del journal en
//! orden y actualiza el slot de cada step.
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::constants::RUNNER_VERSION;
use crate::errors::RegistryError;
use crate::event::{RunEvent, RunEventKind};
use crate::hashing::hash_value;
use crate::step::{StepDefinition, StepStatus};

/// Lista ordenada e inmutable de steps. Orden total, sin ciclos: es una
/// lista plana, no un grafo de dependencias.
pub struct StepRegistry {
    steps: Vec<Box<dyn StepDefinition>>,
    registry_hash: String,
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
         .field("steps", &self.ids())
         .field("registry_hash", &self.registry_hash)
         .finish()
    }
}

impl StepRegistry {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn registry_hash(&self) -> &str {
        &self.registry_hash
    }

    pub fn ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn StepDefinition> {
        self.steps.iter().map(|s| s.as_ref())
    }

    pub fn get(&self, id: &str) -> Option<&dyn StepDefinition> {
        self.iter().find(|s| s.id() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == id)
    }
}

/// Construye el registry validando que no haya ids repetidos. El hash se
/// calcula sobre el JSON canónico de la lista ordenada de ids.
pub fn build_registry(steps: Vec<Box<dyn StepDefinition>>) -> Result<StepRegistry, RegistryError> {
    if steps.is_empty() {
        return Err(RegistryError::Empty);
    }
    let mut seen = std::collections::HashSet::new();
    for s in &steps {
        if !seen.insert(s.id().to_string()) {
            return Err(RegistryError::DuplicateStep(s.id().to_string()));
        }
    }
    let ids: Vec<&str> = steps.iter().map(|s| s.id()).collect();
    let registry_hash = hash_value(&json!({ "runner_version": RUNNER_VERSION, "steps": ids }));
    Ok(StepRegistry { steps, registry_hash })
}

/// Estado de un step en el reporte.
#[derive(Debug, Clone)]
pub struct StepSlot {
    pub step_id: String,
    pub status: StepStatus,
    pub attempts: u32,
    pub error: Option<String>,
    pub outputs: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Estado de una ejecución reconstruido desde el journal.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub slots: Vec<StepSlot>,
    pub rollback: Vec<String>,
    pub finished: bool,
    pub aborted: bool,
}

impl RunReport {
    pub fn replay(events: &[RunEvent], registry: &StepRegistry) -> RunReport {
        let mut slots: Vec<StepSlot> = registry.iter()
                                               .map(|s| StepSlot { step_id: s.id().to_string(),
                                                                   status: StepStatus::Pending,
                                                                   attempts: 0,
                                                                   error: None,
                                                                   outputs: vec![],
                                                                   started_at: None,
                                                                   finished_at: None })
                                               .collect();
        let mut rollback = Vec::new();
        let mut finished = false;
        let mut aborted = false;
        for ev in events {
            match &ev.kind {
                RunEventKind::RunInitialized { .. } => {}
                RunEventKind::StepSkipped { step_index, .. } => {
                    if let Some(slot) = slots.get_mut(*step_index) {
                        slot.status = StepStatus::Skipped;
                        slot.finished_at = Some(ev.ts);
                    }
                }
                RunEventKind::StepStarted { step_index, .. } => {
                    if let Some(slot) = slots.get_mut(*step_index) {
                        slot.status = StepStatus::Running;
                        slot.started_at = Some(ev.ts);
                        slot.attempts += 1;
                    }
                }
                RunEventKind::StepRetried { step_index, error, .. } => {
                    if let Some(slot) = slots.get_mut(*step_index) {
                        slot.attempts += 1;
                        slot.error = Some(error.clone());
                    }
                }
                RunEventKind::StepCompleted { step_index, outputs, .. } => {
                    if let Some(slot) = slots.get_mut(*step_index) {
                        slot.status = StepStatus::Completed;
                        slot.outputs = outputs.clone();
                        slot.error = None;
                        slot.finished_at = Some(ev.ts);
                    }
                }
                RunEventKind::StepWarned { step_index, error, .. } => {
                    if let Some(slot) = slots.get_mut(*step_index) {
                        slot.status = StepStatus::Warned;
                        slot.error = Some(error.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                RunEventKind::StepFailed { step_index, error, .. } => {
                    if let Some(slot) = slots.get_mut(*step_index) {
                        slot.status = StepStatus::Failed;
                        slot.error = Some(error.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                RunEventKind::RollbackPerformed { actions } => rollback.extend(actions.iter().cloned()),
                RunEventKind::RunFinished { aborted: a } => {
                    finished = true;
                    aborted = *a;
                }
            }
        }
        RunReport { slots, rollback, finished, aborted }
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.slots.iter().filter(|s| s.status == status).count()
    }
}
