// Composition lifecycle callbacks
// Observers notified when a composition comes up, goes down, or builds the
// environment for an external command.

use crate::composition::Composition;
use crate::context::ScenarioContext;
use crate::errors::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Observer of a composition's lifecycle.
///
/// Hooks fire in registration order. `composing` runs after service names
/// are known and before containers are started; `decomposing` runs after
/// every container and network of the project has been removed.
pub trait CompositionCallback {
    fn composing(&self, composition: &Composition, ctx: &ScenarioContext) -> Result<()>;

    fn decomposing(&self, composition: &Composition, ctx: &ScenarioContext) -> Result<()>;

    /// Adjust the environment used for every external command
    fn get_env(
        &self,
        composition: &Composition,
        ctx: &ScenarioContext,
        env: &mut HashMap<String, String>,
    );

    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Ordered, append-only list of callbacks
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: Vec<Box<dyn CompositionCallback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: CompositionCallback + 'static>(&mut self, callback: C) {
        self.register_boxed(Box::new(callback));
    }

    pub fn register_boxed(&mut self, callback: Box<dyn CompositionCallback>) {
        debug!(callback = callback.name(), "registered composition callback");
        self.callbacks.push(callback);
    }

    /// Register a callback described by configuration. The spec must declare
    /// every hook; an incomplete spec is rejected and nothing is appended.
    pub fn register_spec(&mut self, spec: CallbackSpec) -> Result<()> {
        let callback = ScriptCallback::try_from(spec)?;
        self.register(callback);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn CompositionCallback> {
        self.callbacks.iter().map(|cb| cb.as_ref())
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.callbacks.iter().map(|cb| cb.name()))
            .finish()
    }
}

/// Callback as written in `.compose-fixture.yml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CallbackSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomposing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
}

impl CallbackSpec {
    /// Hooks the spec leaves undeclared
    pub fn missing_hooks(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.composing.is_none() {
            missing.push("composing");
        }
        if self.decomposing.is_none() {
            missing.push("decomposing");
        }
        if self.env.is_none() {
            missing.push("env");
        }
        missing
    }
}

/// Callback backed by shell snippets and a fixed set of env overrides.
///
/// Snippets run with `sh -c` under the composition environment plus
/// `FIXTURE_PROJECT_NAME`, `FIXTURE_SCENARIO` and `FIXTURE_SERVICES`.
/// An empty snippet does nothing. `{project}` in an env value expands to the
/// project name.
#[derive(Debug, Clone)]
pub struct ScriptCallback {
    name: String,
    composing: String,
    decomposing: String,
    env: HashMap<String, String>,
}

impl TryFrom<CallbackSpec> for ScriptCallback {
    type Error = FixtureError;

    fn try_from(spec: CallbackSpec) -> Result<Self> {
        match (spec.composing, spec.decomposing, spec.env) {
            (Some(composing), Some(decomposing), Some(env)) => Ok(Self {
                name: spec.name,
                composing,
                decomposing,
                env,
            }),
            (composing, decomposing, env) => {
                let incomplete = CallbackSpec {
                    name: spec.name,
                    composing,
                    decomposing,
                    env,
                };
                Err(FixtureError::TypeCheck(format!(
                    "callback '{}' does not implement required hooks: {}",
                    incomplete.name,
                    incomplete.missing_hooks().join(", ")
                )))
            }
        }
    }
}

impl ScriptCallback {
    fn run_script(
        &self,
        hook: &str,
        script: &str,
        composition: &Composition,
        ctx: &ScenarioContext,
    ) -> Result<()> {
        if script.trim().is_empty() {
            return Ok(());
        }

        let mut env = composition.env(ctx);
        env.insert(
            "FIXTURE_PROJECT_NAME".to_string(),
            composition.project_name().to_string(),
        );
        env.insert("FIXTURE_SCENARIO".to_string(), ctx.name().to_string());
        env.insert(
            "FIXTURE_SERVICES".to_string(),
            composition.service_names().join(","),
        );

        let argv = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        let output = composition.runner().run(&argv, false, Some(&env))?;

        if !output.success() {
            return Err(FixtureError::CallbackFailed {
                name: self.name.clone(),
                message: format!(
                    "{} hook exited with code {}\nStdout: {}\nStderr: {}",
                    hook, output.exit_code, output.stdout, output.stderr
                ),
            });
        }

        Ok(())
    }
}

impl CompositionCallback for ScriptCallback {
    fn composing(&self, composition: &Composition, ctx: &ScenarioContext) -> Result<()> {
        self.run_script("composing", &self.composing, composition, ctx)
    }

    fn decomposing(&self, composition: &Composition, ctx: &ScenarioContext) -> Result<()> {
        self.run_script("decomposing", &self.decomposing, composition, ctx)
    }

    fn get_env(
        &self,
        composition: &Composition,
        _ctx: &ScenarioContext,
        env: &mut HashMap<String, String>,
    ) {
        for (key, value) in &self.env {
            env.insert(
                key.clone(),
                value.replace("{project}", composition.project_name()),
            );
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
