//! Builder para `StepRegistry`.
//!
//! Ejemplo de uso:
//!
//! ```ignore
//! let registry = StepRegistry::builder()
//!     .step(UpdateSystem::new(host.clone()))
//!     .step(InstallPackages::new(host.clone()))
//!     .build()?;
//! ```

use crate::errors::RegistryError;
use crate::step::StepDefinition;

use super::types::{build_registry, StepRegistry};

/// Acumula steps en orden de declaración.
#[derive(Default)]
pub struct RegistryBuilder {
    steps: Vec<Box<dyn StepDefinition>>,
}

impl RegistryBuilder {
    #[inline]
    pub fn step<S>(mut self, step: S) -> Self
        where S: StepDefinition + 'static
    {
        self.steps.push(Box::new(step));
        self
    }

    /// Consume el builder; falla si hay ids repetidos o la lista está vacía.
    pub fn build(self) -> Result<StepRegistry, RegistryError> {
        build_registry(self.steps)
    }
}

impl StepRegistry {
    #[inline]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }
}
