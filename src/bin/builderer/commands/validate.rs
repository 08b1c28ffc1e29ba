//! `builderer validate` - check the description and list the graph.

use anyhow::Result;
use builderer::ops;

use crate::cli::ValidateArgs;
use crate::commands::configure;

pub fn execute(args: ValidateArgs) -> Result<()> {
    let workspace = configure(&args.selection)?;
    let stdout = std::io::stdout();
    ops::validate(&workspace, &mut stdout.lock())?;
    Ok(())
}
