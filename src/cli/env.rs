use super::{attach, load, Target};
use crate::composition::process_env;
use crate::errors::Result;

/// Print the variables a composition adds to the process environment
pub fn run(target: Target) -> Result<()> {
    let (config, ctx) = load("cfx env")?;
    let composition = attach(&target, &config, &ctx, "env")?;

    let base = process_env();
    let mut added: Vec<(String, String)> = composition
        .env(&ctx)
        .into_iter()
        .filter(|(key, value)| base.get(key) != Some(value))
        .collect();
    added.sort();

    for (key, value) in added {
        println!("{}={}", key, value);
    }

    Ok(())
}
