// Command implementations for the cfx binary

pub mod down;
pub mod env;
pub mod logs;
pub mod ps;
pub mod services;
pub mod up;

use crate::composition::{generate_project_name, ComposeOptions, Composition};
use crate::config::Config;
use crate::context::ScenarioContext;
use crate::errors::{FixtureError, Result};
use std::env as std_env;
use std::path::PathBuf;

/// Compose files and project name shared by every subcommand
#[derive(Debug, Clone)]
pub struct Target {
    pub files: Vec<PathBuf>,
    pub project: Option<String>,
}

/// Config discovered from the working directory plus a context holding the
/// configured callbacks
pub(crate) fn load(scenario: &str) -> Result<(Config, ScenarioContext)> {
    let config = Config::discover(&std_env::current_dir()?)?;
    let mut ctx = ScenarioContext::new(scenario);

    for spec in config.callbacks.iter().cloned() {
        ctx.register_callback_spec(spec)?;
    }

    Ok((config, ctx))
}

pub(crate) fn options(config: &Config, project: Option<&str>) -> ComposeOptions {
    let options = ComposeOptions::from_config(config);
    match project {
        Some(name) => options.with_project_name(name),
        None => options,
    }
}

/// Project name given with `-p`, required by commands that act on a
/// running project
pub(crate) fn require_project<'a>(target: &'a Target, command: &str) -> Result<&'a str> {
    target.project.as_deref().ok_or_else(|| {
        FixtureError::InvalidState(format!("`{}` needs the project name (-p)", command))
    })
}

/// Attach to the running project named with `-p`
pub(crate) fn attach(
    target: &Target,
    config: &Config,
    ctx: &ScenarioContext,
    command: &str,
) -> Result<Composition> {
    let project = require_project(target, command)?;
    Composition::attach(ctx, &target.files, options(config, Some(project)))
}

/// Attach under the given project name or a throwaway one. Only for
/// commands that read the compose files, not the containers.
pub(crate) fn attach_any(target: &Target, config: &Config, ctx: &ScenarioContext) -> Result<Composition> {
    let project = target.project.clone().unwrap_or_else(generate_project_name);
    Composition::attach(ctx, &target.files, options(config, Some(project.as_str())))
}

pub(crate) fn print_containers(composition: &Composition) {
    println!(
        "{:<30} {:<15} {:<16} {:<30}",
        "NAME", "SERVICE", "IP", "PORTS"
    );
    println!("{}", "-".repeat(91));

    for container in composition.containers() {
        let ports: Vec<String> = container
            .ports()
            .iter()
            .map(|(spec, bindings)| match bindings.first() {
                Some(binding) => format!("{}->{}", binding.host_port, spec),
                None => spec.clone(),
            })
            .collect();

        println!(
            "{:<30} {:<15} {:<16} {:<30}",
            container.name(),
            container.service_name(),
            container.ip_address().unwrap_or("-"),
            ports.join(", ")
        );
    }
}
