//! `builderer run` - build a binary target and execute it.

use anyhow::Result;
use builderer::ops::{self, RunOptions};

use crate::cli::RunArgs;
use crate::commands::configure_named;

pub fn execute(args: RunArgs) -> Result<i32> {
    // Configure the whole workspace narrowed to the requested target.
    let workspace = configure_named(&args.config, std::slice::from_ref(&args.target))?;
    let options = RunOptions {
        build_config: args.build_config,
        build_arch: args.build_arch,
        args: args.args,
    };
    Ok(ops::run(&workspace, &args.target, &options)?)
}
