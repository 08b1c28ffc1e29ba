//! `builderer generate` - emit native build files.

use anyhow::Result;
use builderer::ops;

use crate::cli::GenerateArgs;
use crate::commands::configure;

pub fn execute(args: GenerateArgs) -> Result<()> {
    let workspace = configure(&args.selection)?;
    ops::generate(&workspace)?;
    Ok(())
}
