use super::{attach_any, load, Target};
use crate::errors::Result;

/// List services declared by the compose files
pub fn run(target: Target) -> Result<()> {
    let (config, ctx) = load("cfx services")?;
    let composition = attach_any(&target, &config, &ctx)?;

    for service in composition.service_names() {
        println!("{}", service);
    }

    Ok(())
}
