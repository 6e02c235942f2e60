use super::{load, options, print_containers, Target};
use crate::composition::Composition;
use crate::errors::Result;
use colored::Colorize;

/// Bring up a composition and leave it running
pub fn run(target: Target) -> Result<()> {
    let (config, ctx) = load("cfx up")?;

    println!("Composing {} file(s)...", target.files.len());
    let composition = Composition::compose(
        &ctx,
        &target.files,
        options(&config, target.project.as_deref()),
    )?;

    println!(
        "{} Composition up, project: {}",
        "✓".green(),
        composition.project_name().bold()
    );
    println!("Services: {}", composition.service_names().join(", "));
    println!();
    print_containers(&composition);
    println!();
    println!(
        "Tear down with: cfx down -p {} {}",
        composition.project_name(),
        target
            .files
            .iter()
            .map(|f| format!("-f {}", f.display()))
            .collect::<Vec<_>>()
            .join(" ")
    );

    Ok(())
}
