use nbx_core::constants::RUNNER_VERSION;
use nbx_core::hashing::hash_value;
use nbx_core::{RunContext, StepDefinition, StepError, StepRegistry, StepRunResult};
use serde_json::json;

struct Named(&'static str);

impl StepDefinition for Named {
    fn id(&self) -> &str {
        self.0
    }

    fn is_satisfied(&self, _ctx: &RunContext) -> Result<bool, StepError> {
        Ok(true)
    }

    fn run(&self, _ctx: &RunContext) -> StepRunResult {
        StepRunResult::ok()
    }
}

#[test]
fn registry_hash_covers_runner_version_and_ids() {
    let registry = StepRegistry::builder().step(Named("install-packages"))
                                          .step(Named("create-service-user"))
                                          .build()
                                          .unwrap();
    let expected = hash_value(&json!({ "steps": ["install-packages", "create-service-user"],
                                       "runner_version": RUNNER_VERSION }));
    assert_eq!(registry.registry_hash(), expected);
    assert_eq!(expected.len(), 64);
}
