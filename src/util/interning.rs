//! String interning for identifier storage and comparison.
//!
//! Package and target names repeat throughout the registry, the graph and
//! every label; interning gives O(1) equality and zero-cost cloning.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{LazyLock, RwLock};

/// Global string interner
static INTERNER: LazyLock<RwLock<HashSet<&'static str>>> =
    LazyLock::new(|| RwLock::new(HashSet::new()));

/// An interned string that provides O(1) equality and zero-cost cloning.
///
/// All InternedStrings with the same content point to the same memory
/// location, making equality a pointer comparison.
#[derive(Clone, Copy)]
pub struct InternedString {
    inner: &'static str,
}

impl InternedString {
    /// Create a new interned string from any string-like type.
    pub fn new(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();

        // Fast path: check if already interned (read lock only)
        {
            let interner = INTERNER.read().unwrap();
            if let Some(&interned) = interner.get(s) {
                return InternedString { inner: interned };
            }
        }

        // Slow path: need to intern (write lock)
        let mut interner = INTERNER.write().unwrap();

        // Double-check after acquiring write lock
        if let Some(&interned) = interner.get(s) {
            return InternedString { inner: interned };
        }

        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        interner.insert(leaked);

        InternedString { inner: leaked }
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.inner
    }

    /// Check if the string is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the length of the string.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl Default for InternedString {
    fn default() -> Self {
        InternedString::new("")
    }
}

impl Deref for InternedString {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.inner
    }
}

impl AsRef<str> for InternedString {
    #[inline]
    fn as_ref(&self) -> &str {
        self.inner
    }
}

impl Borrow<str> for InternedString {
    #[inline]
    fn borrow(&self) -> &str {
        self.inner
    }
}

impl PartialEq for InternedString {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner, other.inner)
    }
}

impl Eq for InternedString {}

impl PartialEq<str> for InternedString {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.inner == other
    }
}

impl PartialOrd for InternedString {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedString {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(other.inner)
    }
}

impl Hash for InternedString {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        // All equal strings share an address, so hashing the pointer is sound
        std::ptr::hash(self.inner, state)
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.inner, f)
    }
}

impl fmt::Display for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner, f)
    }
}

impl From<&str> for InternedString {
    fn from(s: &str) -> Self {
        InternedString::new(s)
    }
}

impl From<String> for InternedString {
    fn from(s: String) -> Self {
        InternedString::new(s)
    }
}

impl From<&String> for InternedString {
    fn from(s: &String) -> Self {
        InternedString::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_equality() {
        let a = InternedString::new("util");
        let b = InternedString::new("util");
        let c = InternedString::new("app");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(std::ptr::eq(a.inner, b.inner));
    }

    #[test]
    fn test_hash_consistency() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(InternedString::new("zlib"), 42);
        assert_eq!(map.get(&InternedString::new("zlib")), Some(&42));
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let a = InternedString::new("App");
        let b = InternedString::new("app");
        assert!(a < b);
    }
}
