//! `builderer build` - generate and drive the native tool.

use anyhow::Result;
use builderer::ops::{self, BuildOptions};

use crate::cli::BuildArgs;
use crate::commands::configure;

pub fn execute(args: BuildArgs) -> Result<i32> {
    let workspace = configure(&args.selection)?;
    let options = BuildOptions {
        target: args.selection.targets.first().cloned(),
        build_config: args.build_config,
        build_arch: args.build_arch,
    };
    Ok(ops::build(&workspace, &options)?)
}
