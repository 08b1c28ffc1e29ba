//! Shared utilities

pub mod diagnostic;
pub mod fs;
pub mod interning;
pub mod process;

pub use self::diagnostic::Diagnostic;
pub use self::interning::InternedString;
