//! `bd detect-pollution` -- detect pollution in issue data (stub).

use anyhow::Result;

use crate::context::RuntimeContext;

/// Execute the `bd detect-pollution` command (stub).
pub fn run(_ctx: &RuntimeContext) -> Result<()> {
    println!("bd detect-pollution: not yet implemented");
    Ok(())
}
