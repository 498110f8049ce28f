//! Modelos neutrales del runner (RunContext, StepOutput).

pub mod context;
pub mod output;

pub use context::RunContext;
pub use output::StepOutput;
