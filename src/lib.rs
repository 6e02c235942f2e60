// Library interface for compose-fixture
// docker-compose fixtures for behaviour-driven test suites

pub mod callbacks;
pub mod cli;
pub mod composition;
pub mod config;
pub mod context;
pub mod docker;
pub mod errors;
pub mod runner;
pub mod scenario;

pub use callbacks::{CallbackRegistry, CallbackSpec, CompositionCallback, ScriptCallback};
pub use composition::{ComposeOptions, Composition, CompositionState};
pub use context::ScenarioContext;
pub use docker::{ContainerRecord, PortBinding};
pub use errors::{FixtureError, Result};
pub use runner::{CommandOutput, CommandRunner, ScriptedRunner, SystemRunner};
