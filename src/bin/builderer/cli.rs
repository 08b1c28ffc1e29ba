//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Builderer - a meta-build-system generator for C/C++ workspaces
#[derive(Parser)]
#[command(name = "builderer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug/info)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate native build files for the selected config
    Generate(GenerateArgs),

    /// Generate and drive the native build tool
    Build(BuildArgs),

    /// Build a binary target and execute it
    Run(RunArgs),

    /// Emit the dependency graph as DOT on stdout
    Graph(GraphArgs),

    /// List enumerated sources with line counts
    Sources(SourcesArgs),

    /// Validate the workspace description and list the graph
    Validate(ValidateArgs),

    /// Print license texts of repository targets
    Licenses(LicensesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Selection shared by every workspace command.
#[derive(Args)]
pub struct Selection {
    /// Named config from CONFIG.builderer
    #[arg(long)]
    pub config: String,

    /// Optional Pkg:Tgt labels restricting the working set
    pub targets: Vec<String>,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub selection: Selection,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Build a single build configuration from the matrix
    #[arg(long)]
    pub build_config: Option<String>,

    /// Build a single architecture from the matrix
    #[arg(long)]
    pub build_arch: Option<String>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Named config from CONFIG.builderer
    #[arg(long)]
    pub config: String,

    /// The Pkg:Tgt binary target to run
    pub target: String,

    /// Build a single build configuration from the matrix
    #[arg(long)]
    pub build_config: Option<String>,

    /// Build a single architecture from the matrix
    #[arg(long)]
    pub build_arch: Option<String>,

    /// Arguments forwarded to the binary
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct GraphArgs {
    #[command(flatten)]
    pub selection: Selection,
}

#[derive(Args)]
pub struct SourcesArgs {
    #[command(flatten)]
    pub selection: Selection,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub selection: Selection,
}

#[derive(Args)]
pub struct LicensesArgs {
    #[command(flatten)]
    pub selection: Selection,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
