//! `builderer graph` - DOT dump on stdout.

use anyhow::Result;
use builderer::ops;

use crate::cli::GraphArgs;
use crate::commands::configure;

pub fn execute(args: GraphArgs) -> Result<()> {
    let workspace = configure(&args.selection)?;
    let stdout = std::io::stdout();
    ops::write_dot(&workspace, &mut stdout.lock())?;
    Ok(())
}
