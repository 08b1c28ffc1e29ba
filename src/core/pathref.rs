//! Cross-package path reference expansion.
//!
//! A `{Pkg:Tgt}` placeholder embedded in an attribute string stands for
//! the effective source root of the referenced target under the active
//! config: the sandboxed hdrs or srcs root, a repository checkout, or a
//! generator's output directory. Expansion is a single left-to-right
//! scan; expanded text is never re-scanned.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Which root a path attribute draws from when the referenced target is
/// sandboxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefContext {
    /// `hdrs`, `public_includes`, `private_includes`
    Include,
    /// `srcs`, generator `inputs`
    Source,
}

/// Result of splitting a pattern into its leading reference (if any) and
/// the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRef<'a> {
    /// The `Pkg:Tgt` text inside the braces.
    pub reference: &'a str,
    /// Remainder after the closing brace, leading separator stripped.
    pub rest: &'a str,
}

/// Split a leading `{Pkg:Tgt}` reference off a pattern string.
///
/// Returns `None` for patterns that do not start with a reference.
pub fn split_leading_ref(value: &str) -> Result<Option<SplitRef<'_>>> {
    if !value.starts_with('{') {
        ensure_no_stray_braces(value)?;
        return Ok(None);
    }
    let close = value.find('}').ok_or_else(|| Error::MalformedPathReference {
        value: value.to_string(),
    })?;
    let reference = &value[1..close];
    if reference.is_empty() || reference.contains('{') {
        return Err(Error::MalformedPathReference {
            value: value.to_string(),
        });
    }
    let rest = value[close + 1..].trim_start_matches('/');
    ensure_no_stray_braces(rest)?;
    Ok(Some(SplitRef { reference, rest }))
}

fn ensure_no_stray_braces(value: &str) -> Result<()> {
    if value.contains('{') || value.contains('}') {
        return Err(Error::MalformedPathReference {
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Expand every `{Pkg:Tgt}` reference in `value` through `lookup`.
///
/// `lookup` maps the reference text to the referenced target's effective
/// root; it is responsible for the transitive-dependency check.
pub fn expand_refs(
    value: &str,
    mut lookup: impl FnMut(&str) -> Result<PathBuf>,
) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| Error::MalformedPathReference {
            value: value.to_string(),
        })?;
        let reference = &after[..close];
        if reference.is_empty() || reference.contains('{') {
            return Err(Error::MalformedPathReference {
                value: value.to_string(),
            });
        }
        out.push_str(&lookup(reference)?.to_string_lossy());
        rest = &after[close + 1..];
    }
    if rest.contains('}') {
        return Err(Error::MalformedPathReference {
            value: value.to_string(),
        });
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_root(reference: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(format!("/roots/{}", reference.replace(':', "/"))))
    }

    #[test]
    fn test_expand_single_reference() {
        let out = expand_refs("{Ext:zlib}/include", fixed_root).unwrap();
        assert_eq!(out, "/roots/Ext/zlib/include");
    }

    #[test]
    fn test_plain_string_passes_through() {
        assert_eq!(expand_refs("src/a.cpp", fixed_root).unwrap(), "src/a.cpp");
    }

    #[test]
    fn test_unbalanced_braces_are_fatal() {
        for bad in ["{Ext:zlib/include", "src/}x", "{}", "{a{b}}"] {
            let err = expand_refs(bad, fixed_root).unwrap_err();
            assert_eq!(err.kind(), "MalformedPathReference", "{}", bad);
        }
    }

    #[test]
    fn test_expanded_text_not_rescanned() {
        // The produced root contains no braces, but a literal suffix
        // after the reference must not be treated as a new opener.
        let out = expand_refs("{A:b}/x", |_| Ok(PathBuf::from("/r"))).unwrap();
        assert_eq!(out, "/r/x");
    }

    #[test]
    fn test_split_leading_ref() {
        let split = split_leading_ref("{Ext:zlib}/**/*.h").unwrap().unwrap();
        assert_eq!(split.reference, "Ext:zlib");
        assert_eq!(split.rest, "**/*.h");

        assert!(split_leading_ref("src/**/*.h").unwrap().is_none());
        assert!(split_leading_ref("src/{x}.h").is_err());
    }

    #[test]
    fn test_lookup_error_propagates() {
        let err = expand_refs("{A:b}/x", |r| {
            Err(Error::UnreferencedPathTarget {
                reference: r.to_string(),
                target: "App:hello".to_string(),
            })
        })
        .unwrap_err();
        assert_eq!(err.kind(), "UnreferencedPathTarget");
    }
}
