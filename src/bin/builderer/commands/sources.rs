//! `builderer sources` - source listing with line counts.

use anyhow::Result;
use builderer::ops;

use crate::cli::SourcesArgs;
use crate::commands::configure;

pub fn execute(args: SourcesArgs) -> Result<()> {
    let workspace = configure(&args.selection)?;
    let stdout = std::io::stdout();
    ops::sources(&workspace, &mut stdout.lock())?;
    Ok(())
}
