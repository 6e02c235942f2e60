use super::{attach, load, print_containers, Target};
use crate::errors::Result;

/// Show containers of a running project
pub fn run(target: Target) -> Result<()> {
    let (config, ctx) = load("cfx ps")?;
    let composition = attach(&target, &config, &ctx, "ps")?;

    if composition.containers().is_empty() {
        println!("No containers for project '{}'", composition.project_name());
        return Ok(());
    }

    print_containers(&composition);
    Ok(())
}
