//! `builderer licenses` - license report over repository targets.

use anyhow::Result;
use builderer::ops;

use crate::cli::LicensesArgs;
use crate::commands::configure;

pub fn execute(args: LicensesArgs) -> Result<()> {
    let workspace = configure(&args.selection)?;
    let stdout = std::io::stdout();
    ops::licenses(&workspace, &mut stdout.lock())?;
    Ok(())
}
