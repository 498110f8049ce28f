pub mod builder;
pub mod types;
pub use builder::RegistryBuilder;
pub use types::{build_registry, RunReport, StepRegistry, StepSlot};
