//! The workspace analysis core: configuration, targets, and the facade.

pub mod conditional;
pub mod config;
pub mod glob;
pub mod label;
pub mod package;
pub mod pathref;
pub mod registry;
pub mod target;
pub mod workspace;

pub use self::conditional::{Case, Condition, Value};
pub use self::config::{BakedConfig, ConfigRecord, ConfigValue, Scalar};
pub use self::label::Label;
pub use self::package::Package;
pub use self::registry::Registry;
pub use self::target::{CppBinary, CppLibrary, GenerateFiles, GitRepository, Target};
pub use self::workspace::{EffectiveFlags, SourceSet, Workspace};
