use crate::callbacks::{CallbackRegistry, CallbackSpec, CompositionCallback};
use crate::errors::Result;

/// Tag that keeps containers running after the scenario ends
pub const DO_NOT_DECOMPOSE_TAG: &str = "doNotDecompose";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioStatus {
    #[default]
    Passed,
    Failed,
}

/// State owned by one test scenario and passed to every composition call
#[derive(Default)]
pub struct ScenarioContext {
    name: String,
    tags: Vec<String>,
    status: ScenarioStatus,
    callbacks: CallbackRegistry,
}

impl ScenarioContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn mark_failed(&mut self) {
        self.status = ScenarioStatus::Failed;
    }

    pub fn status(&self) -> ScenarioStatus {
        self.status
    }

    pub fn failed(&self) -> bool {
        self.status == ScenarioStatus::Failed
    }

    pub fn register_callback<C: CompositionCallback + 'static>(&mut self, callback: C) {
        self.callbacks.register(callback);
    }

    /// Register a callback described by configuration
    pub fn register_callback_spec(&mut self, spec: CallbackSpec) -> Result<()> {
        self.callbacks.register_spec(spec)
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }
}
