use super::{attach, load, Target};
use crate::docker::logs::LogCollector;
use crate::errors::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Save container logs of a running project to files
pub fn run(target: Target, scenario: String, dir: Option<PathBuf>) -> Result<()> {
    let (config, ctx) = load(&scenario)?;
    let composition = attach(&target, &config, &ctx, "logs")?;
    let dir = dir.unwrap_or_else(|| config.logs.dir.clone());

    let collector = LogCollector::new(
        composition.runner(),
        composition.docker_program(),
        &dir,
        &scenario,
    );
    let names: Vec<String> = composition
        .containers()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut written = collector.collect(&names)?;
    written.extend(collector.collect_siblings(&config.logs.sibling_filter)?);

    for path in &written {
        println!("{} {}", "✓".green(), path.display());
    }
    if written.is_empty() {
        println!("No logs collected");
    }

    Ok(())
}
