use super::{load, options, require_project, Target};
use crate::composition::Composition;
use crate::errors::Result;
use colored::Colorize;

/// Remove every container and network of a project
pub fn run(target: Target) -> Result<()> {
    let project = require_project(&target, "down")?;
    let (config, ctx) = load("cfx down")?;

    let mut composition =
        Composition::attach(&ctx, &target.files, options(&config, Some(project)))?;

    println!("Decomposing project '{}'...", project);
    composition.decompose(&ctx)?;
    println!("{} Project '{}' removed", "✓".green(), project);

    Ok(())
}
