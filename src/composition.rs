// A group of containers brought up from compose files under one project name

use crate::config::{ComposeConfig, Config};
use crate::context::ScenarioContext;
use crate::docker::compose::{file_args, resolve_compose_files};
use crate::docker::{ComposeProgram, ContainerRecord};
use crate::errors::{FixtureError, Result};
use crate::runner::{CommandOutput, CommandRunner, SystemRunner};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Current process environment. Variables whose name or value is not valid
/// UTF-8 are skipped with a warning.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) => {
                warn!(key = %key, "skipping environment variable with non UTF-8 value");
                None
            }
            (Err(key), _) => {
                warn!(key = ?key, "skipping environment variable with non UTF-8 name");
                None
            }
        })
        .collect()
}

/// Fresh docker-safe project name (lowercase hex, no dashes)
pub fn generate_project_name() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// How a composition is created
#[derive(Clone)]
pub struct ComposeOptions {
    /// Defaults to a freshly generated name
    pub project_name: Option<String>,
    pub compose: ComposeConfig,
    pub runner: Arc<dyn CommandRunner>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            project_name: None,
            compose: ComposeConfig::default(),
            runner: Arc::new(SystemRunner),
        }
    }
}

impl ComposeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            compose: config.compose.clone(),
            ..Default::default()
        }
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionState {
    Up,
    Down,
}

/// Containers started from one or more compose files under a shared
/// project name. Single use: once decomposed it cannot be brought back up.
pub struct Composition {
    project_name: String,
    compose_files: Vec<PathBuf>,
    service_names: Vec<String>,
    containers: Vec<ContainerRecord>,
    program: ComposeProgram,
    settings: ComposeConfig,
    runner: Arc<dyn CommandRunner>,
    state: CompositionState,
}

impl Composition {
    /// Bring up every service of the given compose files.
    ///
    /// Directory specs are read as `<dir>/docker-compose.yml`. Callbacks'
    /// `composing` hooks fire after service names are known and before
    /// `up --force-recreate -d`. Nothing is rolled back on failure; call
    /// `decompose` to clean up.
    pub fn compose<P: AsRef<Path>>(
        ctx: &ScenarioContext,
        specs: &[P],
        options: ComposeOptions,
    ) -> Result<Self> {
        let mut composition = Self::prepare(specs, options)?;
        info!(
            project = %composition.project_name,
            files = ?composition.compose_files,
            "composing"
        );

        composition.service_names = composition.collect_service_names(ctx)?;

        for callback in ctx.callbacks().iter() {
            debug!(callback = callback.name(), "composing hook");
            callback.composing(&composition, ctx)?;
        }

        composition.issue_command(ctx, &["up", "--force-recreate", "-d"])?;

        info!(
            project = %composition.project_name,
            containers = composition.containers.len(),
            "composition up"
        );
        Ok(composition)
    }

    /// Take over a project that is already running. No `composing` hooks
    /// fire and no `up` is issued.
    pub fn attach<P: AsRef<Path>>(
        ctx: &ScenarioContext,
        specs: &[P],
        options: ComposeOptions,
    ) -> Result<Self> {
        if options.project_name.is_none() {
            return Err(FixtureError::InvalidState(
                "attaching to a composition requires a project name".to_string(),
            ));
        }

        let mut composition = Self::prepare(specs, options)?;
        composition.service_names = composition.collect_service_names(ctx)?;
        composition.rebuild_containers(ctx)?;
        Ok(composition)
    }

    fn prepare<P: AsRef<Path>>(specs: &[P], options: ComposeOptions) -> Result<Self> {
        if specs.is_empty() {
            return Err(FixtureError::InvalidCommand(
                "at least one compose file is required".to_string(),
            ));
        }

        let program = ComposeProgram::from_setting(
            options.compose.program,
            &options.compose.docker,
            options.runner.as_ref(),
        );

        Ok(Self {
            project_name: options.project_name.unwrap_or_else(generate_project_name),
            compose_files: resolve_compose_files(specs),
            service_names: Vec::new(),
            containers: Vec::new(),
            program,
            settings: options.compose,
            runner: options.runner,
            state: CompositionState::Up,
        })
    }

    fn collect_service_names(&mut self, ctx: &ScenarioContext) -> Result<Vec<String>> {
        let output = self.issue_command(ctx, &["config", "--services"])?;
        let marker = self.settings.warning_marker.as_str();

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| marker.is_empty() || !line.contains(marker))
            .map(str::to_string)
            .collect())
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn compose_files(&self) -> &[PathBuf] {
        &self.compose_files
    }

    /// Services declared by the compose files, in file order
    pub fn service_names(&self) -> Vec<String> {
        self.service_names.clone()
    }

    /// Containers as of the last refresh
    pub fn containers(&self) -> &[ContainerRecord] {
        &self.containers
    }

    pub fn program(&self) -> &ComposeProgram {
        &self.program
    }

    /// Container engine binary used for non-compose calls
    pub fn docker_program(&self) -> &str {
        &self.settings.docker
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn state(&self) -> CompositionState {
        self.state
    }

    /// Process environment plus `COMPOSE_PROJECT_NAME` and the network
    /// variable, then every callback's `get_env` in registration order
    pub fn env(&self, ctx: &ScenarioContext) -> HashMap<String, String> {
        let mut env = process_env();
        env.insert(
            "COMPOSE_PROJECT_NAME".to_string(),
            self.project_name.clone(),
        );
        env.insert(
            self.settings.network_env_var.clone(),
            self.project_name.clone(),
        );

        for callback in ctx.callbacks().iter() {
            callback.get_env(self, ctx, &mut env);
        }

        env
    }

    /// Run `<compose> -f ... <args>` and return its stdout.
    ///
    /// Every command except `ps` and `config` refreshes the container list.
    pub fn issue_command(&mut self, ctx: &ScenarioContext, args: &[&str]) -> Result<String> {
        self.ensure_up()?;
        let subcommand = *args.first().ok_or_else(|| {
            FixtureError::InvalidCommand("compose command without arguments".to_string())
        })?;

        let mut argv = self.program.base_argv();
        argv.extend(file_args(&self.compose_files));
        argv.extend(args.iter().map(|arg| arg.to_string()));

        let env = self.env(ctx);
        let output = self.runner.run(&argv, true, Some(&env))?;

        if subcommand != "ps" && subcommand != "config" {
            self.rebuild_containers(ctx)?;
        }

        Ok(output.stdout)
    }

    /// Replace the container list with a fresh `ps -q` + `docker inspect`
    pub fn rebuild_containers(&mut self, ctx: &ScenarioContext) -> Result<()> {
        let ids = self.issue_command(ctx, &["ps", "-q"])?;
        let mut containers = Vec::new();

        for id in ids.split_whitespace() {
            let argv = vec![
                self.settings.docker.clone(),
                "inspect".to_string(),
                id.to_string(),
            ];
            let output = self.runner.run(&argv, true, None)?;
            containers.push(ContainerRecord::from_inspect_json(&output.stdout)?);
        }

        debug!(
            project = %self.project_name,
            count = containers.len(),
            "container list rebuilt"
        );
        self.containers = containers;
        Ok(())
    }

    fn docker(&self, ctx: &ScenarioContext, args: &[&str]) -> Result<CommandOutput> {
        let mut argv = vec![self.settings.docker.clone()];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        let env = self.env(ctx);
        self.runner.run(&argv, true, Some(&env))
    }

    /// Stop and remove every container and network of the project, then
    /// fire the `decomposing` hooks. The composition is Down only if every
    /// step succeeded.
    pub fn decompose(&mut self, ctx: &ScenarioContext) -> Result<()> {
        self.ensure_up()?;
        info!(project = %self.project_name, "decomposing");

        self.issue_command(ctx, &["unpause"])?;
        self.issue_command(ctx, &["kill"])?;
        self.issue_command(ctx, &["rm", "-f"])?;

        // Containers started outside the compose files (e.g. chaincode)
        let name_filter = format!("name={}", self.project_name);
        let output = self.docker(ctx, &["ps", "-qa", "--filter", &name_filter])?;
        for container_id in output.stdout.split_whitespace() {
            self.docker(ctx, &["rm", "-f", container_id])?;
        }

        let output = self.docker(ctx, &["network", "ls", "-q", "--filter", &name_filter])?;
        for network_id in output.stdout.split_whitespace() {
            self.docker(ctx, &["network", "rm", network_id])?;
        }

        for callback in ctx.callbacks().iter() {
            debug!(callback = callback.name(), "decomposing hook");
            callback.decomposing(self, ctx)?;
        }

        self.state = CompositionState::Down;
        info!(project = %self.project_name, "composition down");
        Ok(())
    }

    /// First container whose name contains `part`
    pub fn container_for(&self, part: &str) -> Result<&ContainerRecord> {
        self.containers
            .iter()
            .find(|container| container.name_contains(part))
            .ok_or_else(|| FixtureError::ContainerNotFound(part.to_string()))
    }

    /// IP address of the first container whose name contains `part`
    pub fn ip_for(&self, part: &str) -> Result<&str> {
        let container = self.container_for(part)?;
        container
            .ip_address()
            .ok_or_else(|| FixtureError::NoIpAddress(container.name().to_string()))
    }

    fn ensure_up(&self) -> Result<()> {
        match self.state {
            CompositionState::Up => Ok(()),
            CompositionState::Down => Err(FixtureError::InvalidState(format!(
                "composition '{}' has already been decomposed",
                self.project_name
            ))),
        }
    }
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composition")
            .field("project_name", &self.project_name)
            .field("compose_files", &self.compose_files)
            .field("service_names", &self.service_names)
            .field("containers", &self.containers)
            .field("program", &self.program)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
