//! Step type registration.
//!
//! A registered [`StepType`] is immutable: its options, output count, and
//! factory are fixed at registration and shared through an `Arc` with every
//! instance created from it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nodes::{Step, StepConfig, StepDefinition, StepFactory, StepOptions};
use tracing::info;

use crate::{EngineError, HostNode, StepInstance};

/// Tuning knobs for the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Prefix applied to every type name (`<namespace>:<type>`).
    pub namespace: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespace: "vestra".to_owned(),
        }
    }
}

/// A registered step type.
pub struct StepType {
    /// Namespaced type name.
    pub name: String,
    pub options: StepOptions,
    /// Number of output ports.
    pub outputs: usize,
    factory: StepFactory,
}

impl StepType {
    pub fn build(&self, config: &StepConfig) -> Box<dyn Step> {
        (self.factory)(config)
    }
}

impl fmt::Debug for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepType")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Maps namespaced type names to registered step types.
#[derive(Debug, Default)]
pub struct StepRegistry {
    config: RegistryConfig,
    types: BTreeMap<String, Arc<StepType>>,
}

impl StepRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            types: BTreeMap::new(),
        }
    }

    /// Prefix `name` with the namespace unless it already carries it.
    pub fn qualify(&self, name: &str) -> String {
        let prefix = format!("{}:", self.config.namespace);
        if name.starts_with(&prefix) {
            name.to_owned()
        } else {
            format!("{prefix}{name}")
        }
    }

    /// Register a step type.
    ///
    /// # Errors
    /// [`EngineError::DuplicateStepType`] if the namespaced name is taken.
    pub fn register(&mut self, definition: StepDefinition) -> Result<Arc<StepType>, EngineError> {
        let name = self.qualify(&definition.type_name);
        if self.types.contains_key(&name) {
            return Err(EngineError::DuplicateStepType(name));
        }

        let step_type = Arc::new(StepType {
            name: name.clone(),
            options: definition.options,
            outputs: definition.outputs,
            factory: definition.factory,
        });
        info!(
            step_type = %name,
            require_flow_run = step_type.options.require_flow_run,
            outputs = step_type.outputs,
            "registered step type"
        );
        self.types.insert(name, Arc::clone(&step_type));
        Ok(step_type)
    }

    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = StepDefinition>,
    ) -> Result<(), EngineError> {
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(())
    }

    /// Look up a type by bare or namespaced name.
    pub fn get(&self, name: &str) -> Option<Arc<StepType>> {
        self.types.get(&self.qualify(name)).cloned()
    }

    /// Create an instance of `name` bound to `host`.
    ///
    /// # Errors
    /// [`EngineError::UnknownStepType`] if nothing is registered under `name`.
    pub fn instantiate(
        &self,
        name: &str,
        host: Arc<dyn HostNode>,
    ) -> Result<StepInstance, EngineError> {
        let step_type = self
            .get(name)
            .ok_or_else(|| EngineError::UnknownStepType(self.qualify(name)))?;
        Ok(StepInstance::new(step_type, host))
    }

    /// Registered types, ordered by name.
    pub fn types(&self) -> impl Iterator<Item = &StepType> {
        self.types.values().map(Arc::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingNode;
    use nodes::mock::MockStep;
    use nodes::Message;

    #[test]
    fn names_are_namespaced_once() {
        let registry = StepRegistry::default();
        assert_eq!(registry.qualify("ur3-move"), "vestra:ur3-move");
        assert_eq!(registry.qualify("vestra:ur3-move"), "vestra:ur3-move");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = StepRegistry::default();
        let mock = MockStep::echoing("echo");
        registry
            .register(mock.definition(StepOptions::default(), 1))
            .unwrap();

        let mut again = mock.definition(StepOptions::default(), 1);
        again.type_name = "vestra:echo".into();
        let err = registry.register(again).unwrap_err();

        assert!(matches!(err, EngineError::DuplicateStepType(name) if name == "vestra:echo"));
    }

    #[test]
    fn unknown_type_cannot_be_instantiated() {
        let registry = StepRegistry::default();
        let err = registry
            .instantiate("missing", Arc::new(RecordingNode::new("n1")))
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown step type: 'vestra:missing'");
    }

    #[test]
    fn instances_share_their_type() {
        let mut registry = StepRegistry::default();
        registry
            .register(MockStep::returning("m", Message::new(1)).definition(StepOptions::STANDALONE, 2))
            .unwrap();

        let a = registry.instantiate("m", Arc::new(RecordingNode::new("a"))).unwrap();
        let b = registry.instantiate("vestra:m", Arc::new(RecordingNode::new("b"))).unwrap();

        assert!(std::ptr::eq(a.step_type(), b.step_type()));
        assert_eq!(a.step_type().outputs, 2);
        assert!(!b.step_type().options.require_flow_run);
        assert!(format!("{a:?}").contains("vestra:m"));
    }

    #[test]
    fn custom_namespace_applies() {
        let registry = StepRegistry::new(RegistryConfig {
            namespace: "lab".into(),
        });
        assert_eq!(registry.qualify("xpeel-status"), "lab:xpeel-status");
    }
}
