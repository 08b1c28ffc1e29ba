//! Builderer CLI - generate native build files from workspace descriptions

use anyhow::Result;
use builderer::util::diagnostic::{emit, Diagnostic};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("builderer=debug")
    } else if cli.quiet {
        EnvFilter::new("builderer=error")
    } else {
        EnvFilter::new("builderer=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            match e.downcast_ref::<builderer::Error>() {
                Some(err) => {
                    let mut diag = Diagnostic::error(format!("{:#}", e))
                        .with_context(format!("error kind: {}", err.kind()));
                    if let Some(suggestion) = suggestion_for(err) {
                        diag = diag.with_suggestion(suggestion);
                    }
                    emit(&diag, false);
                }
                None => eprintln!("error: {:#}", e),
            }
            std::process::exit(1);
        }
    }
}

fn suggestion_for(err: &builderer::Error) -> Option<&'static str> {
    use builderer::Error;
    match err {
        Error::DependencyCycle { .. } => {
            Some("Break the cycle by removing or restructuring deps")
        }
        Error::UnknownConfig { .. } => {
            Some("Run against a config declared in CONFIG.builderer")
        }
        Error::UnknownDependency { .. } | Error::UnknownTarget { .. } => {
            Some("Run `builderer validate` to list known targets")
        }
        Error::MissingGenerator { .. } => {
            Some("Register the buildtool in CONFIG.builderer under [buildtools]")
        }
        _ => None,
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args).map(|_| 0),
        Commands::Build(args) => commands::build::execute(args),
        Commands::Run(args) => commands::run::execute(args),
        Commands::Graph(args) => commands::graph::execute(args).map(|_| 0),
        Commands::Sources(args) => commands::sources::execute(args).map(|_| 0),
        Commands::Validate(args) => commands::validate::execute(args).map(|_| 0),
        Commands::Licenses(args) => commands::licenses::execute(args).map(|_| 0),
        Commands::Completions(args) => commands::completions::execute(args).map(|_| 0),
    }
}
