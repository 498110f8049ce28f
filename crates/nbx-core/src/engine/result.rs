use std::fmt;

use uuid::Uuid;

use crate::errors::StepError;
use crate::registry::RunReport;
use crate::step::StepStatus;

/// Primer fallo terminal de una ejecución.
#[derive(Debug)]
pub struct StepFailure {
    pub step_index: usize,
    pub step_id: String,
    pub error: StepError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' (#{}) failed: {}", self.step_id, self.step_index + 1, self.error)
    }
}

/// Resumen de una ejecución del runner.
#[derive(Debug)]
pub struct RunResult {
    pub run_id: Uuid,
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub warned: usize,
    pub fatal: Option<StepFailure>,
    pub report: RunReport,
}

impl RunResult {
    pub(crate) fn from_report(run_id: Uuid, report: RunReport, fatal: Option<StepFailure>) -> Self {
        Self { run_id,
               total: report.slots.len(),
               completed: report.count(StepStatus::Completed),
               skipped: report.count(StepStatus::Skipped),
               warned: report.count(StepStatus::Warned),
               fatal,
               report }
    }

    pub fn is_success(&self) -> bool {
        self.fatal.is_none()
    }
}
