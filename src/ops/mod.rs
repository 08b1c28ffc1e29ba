//! High-level operations.
//!
//! This module contains the implementation of Builderer commands.

pub mod build;
pub mod generate;
pub mod graph;
pub mod licenses;
pub mod run;
pub mod sources;
pub mod validate;

pub use self::build::{build, BuildOptions};
pub use self::generate::generate;
pub use self::graph::write_dot;
pub use self::licenses::licenses;
pub use self::run::{run, RunOptions};
pub use self::sources::sources;
pub use self::validate::validate;
