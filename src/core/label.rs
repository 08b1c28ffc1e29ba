//! Target labels.
//!
//! A label `package_path:target_name` is the canonical identity of a
//! target. The shorthand `:target_name` refers to the current package.

use std::fmt;

use crate::error::{Error, Result};
use crate::util::InternedString;

/// A fully-qualified target identifier.
///
/// Case is preserved; comparison is byte-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    package: InternedString,
    target: InternedString,
}

fn valid_target_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

impl Label {
    /// Construct from already-validated parts.
    pub fn new(package: impl Into<InternedString>, target: impl Into<InternedString>) -> Self {
        Label {
            package: package.into(),
            target: target.into(),
        }
    }

    /// Parse `pkg:tgt`, resolving the `:tgt` shorthand against
    /// `current_package`.
    pub fn parse(label: &str, current_package: Option<&str>) -> Result<Label> {
        let malformed = |message: &str| Error::MalformedLabel {
            label: label.to_string(),
            message: message.to_string(),
        };

        let (package, target) = label
            .split_once(':')
            .ok_or_else(|| malformed("expected `package:target`"))?;
        if !valid_target_name(target) {
            return Err(malformed("target name must match [A-Za-z0-9_.-]+"));
        }
        let package = if package.is_empty() {
            current_package.ok_or_else(|| malformed("`:target` shorthand requires a package"))?
        } else {
            package
        };
        Ok(Label::new(package, target))
    }

    /// The workspace-relative package path.
    pub fn package(&self) -> InternedString {
        self.package
    }

    /// The target name within the package.
    pub fn target(&self) -> InternedString {
        self.target
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.target)
    }
}
