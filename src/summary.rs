//! Resumen final de `nbx-install`.
use std::io::{self, Write};

use nbx_core::{RunContext, RunResult, StepStatus};
use nbx_domain::ServiceStatus;

use crate::console::Console;

/// Lo que el resumen necesita además del resultado del runner.
pub struct SummaryInput<'a> {
    pub result: &'a RunResult,
    pub services: &'a [(String, ServiceStatus)],
    /// Contexto final del run: settings, plataforma y notas de los steps.
    pub ctx: &'a RunContext,
    /// El archivo de credenciales sigue en disco.
    pub secrets_file_present: bool,
}

pub fn print_summary<W: Write>(console: &mut Console<W>, input: &SummaryInput<'_>) -> io::Result<()> {
    let r = input.result;
    console.plain("")?;
    console.plain("Steps:")?;
    for (i, slot) in r.report.slots.iter().enumerate() {
        let mut line = format!("{:>3}. {:<24} {:<9}", i + 1, slot.step_id, slot.status.label());
        if slot.attempts > 1 {
            line.push_str(&format!(" ({} attempts)", slot.attempts));
        }
        if let Some(err) = &slot.error {
            line.push_str(&format!(" {err}"));
        }
        match slot.status {
            StepStatus::Failed => console.error(&line)?,
            StepStatus::Warned => console.warning(&line)?,
            _ => console.plain(&line)?,
        }
    }
    for action in &r.report.rollback {
        console.warning(&format!("rollback: {action}"))?;
    }

    console.plain("")?;
    console.plain("Services:")?;
    for (name, status) in input.services {
        let line = format!("{name}: {status}");
        if status.is_active() {
            console.success(&line)?;
        } else {
            console.warning(&line)?;
        }
    }

    console.plain("")?;
    if let Some(os) = input.ctx.os_release() {
        console.plain(&format!("platform: {}", os.pretty_name))?;
    }
    for (key, value) in input.ctx.notes() {
        console.plain(&format!("{key}: {value}"))?;
    }
    console.info(&format!("{} completed, {} skipped, {} warned of {} steps", r.completed, r.skipped, r.warned, r.total))?;
    if !r.is_success() {
        return Ok(());
    }
    let s = &input.ctx.settings;
    if input.secrets_file_present {
        console.warning(&format!("Generated credentials are in {} (mode 0600). Store them safely, then delete the file.",
                                 s.secrets_file.display()))?;
    }
    console.info(&format!("NetBox should be reachable at http://{}/", s.domain))?;
    console.info(&format!("Create an admin account with: sudo {} {} createsuperuser",
                          s.venv_bin("python").display(),
                          s.manage_py().display()))?;
    Ok(())
}
