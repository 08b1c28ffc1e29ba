//! Configuration records and matrix baking.
//!
//! A `ConfigRecord` is a named point in configuration space. Axes whose
//! value is a sequence make the record a *matrix*; `bake` expands the
//! matrix into one fully-scalar `BakedConfig` per point of the Cartesian
//! product.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved configuration axes.
pub mod keys {
    pub const PLATFORM: &str = "platform";
    pub const ARCHITECTURE: &str = "architecture";
    pub const BUILDTOOL: &str = "buildtool";
    pub const TOOLCHAIN: &str = "toolchain";
    pub const BUILD_CONFIG: &str = "build_config";
    pub const BUILD_ROOT: &str = "build_root";
    pub const SANDBOX_ROOT: &str = "sandbox_root";
}

/// A single configuration scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    String(String),
}

impl Scalar {
    /// The string form, if this scalar is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

/// A config field value: a scalar, or a sequence expanded at baking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl ConfigValue {
    /// Whether this value is a sequence axis.
    pub fn is_list(&self) -> bool {
        matches!(self, ConfigValue::List(_))
    }

    /// The scalar value, if baked.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ConfigValue::Scalar(s) => Some(s),
            ConfigValue::List(_) => None,
        }
    }
}

impl From<Scalar> for ConfigValue {
    fn from(v: Scalar) -> Self {
        ConfigValue::Scalar(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Scalar(v.into())
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(v: Vec<&str>) -> Self {
        ConfigValue::List(v.into_iter().map(Scalar::from).collect())
    }
}

/// A named point (matrix or baked) in the configuration space.
///
/// Fields keep their declaration order; baking iterates axes in that
/// order with the first sequence axis varying slowest.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRecord {
    name: String,
    fields: Vec<(String, ConfigValue)>,
}

impl ConfigRecord {
    /// Create an empty record with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        ConfigRecord {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Set a field, replacing any previous value for the key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Builder-style `set`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a scalar string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(ConfigValue::as_scalar)
            .and_then(Scalar::as_str)
    }

    /// The record name as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether every axis holds a single scalar.
    pub fn is_baked(&self) -> bool {
        self.fields.iter().all(|(_, v)| !v.is_list())
    }

    /// Expand every sequence axis into the full Cartesian product.
    ///
    /// Iteration is axis-by-axis in declaration order, first axis varying
    /// slowest. An empty sequence on any axis yields no baked configs.
    pub fn bake(&self) -> Vec<BakedConfig> {
        let axes: Vec<(usize, &[Scalar])> = self
            .fields
            .iter()
            .enumerate()
            .filter_map(|(i, (_, v))| match v {
                ConfigValue::List(items) => Some((i, items.as_slice())),
                ConfigValue::Scalar(_) => None,
            })
            .collect();

        if axes.iter().any(|(_, items)| items.is_empty()) {
            return Vec::new();
        }

        let count: usize = axes.iter().map(|(_, items)| items.len()).product();
        // `count` is 1 for a fully-scalar record: it bakes to itself.
        let mut baked = Vec::with_capacity(count);
        for ordinal in 0..count {
            let mut record = self.clone();
            let mut slug_parts = Vec::with_capacity(axes.len());
            let mut remainder = ordinal;
            let mut stride = count;
            for (field_index, items) in &axes {
                stride /= items.len();
                let pick = remainder / stride;
                remainder %= stride;
                let value = items[pick].clone();
                slug_parts.push(value.to_string());
                record.fields[*field_index].1 = ConfigValue::Scalar(value);
            }
            let slug = if slug_parts.is_empty() {
                "default".to_string()
            } else {
                slug_parts.join(".")
            };
            baked.push(BakedConfig { slug, record });
        }
        baked
    }
}

/// A configuration record whose every axis holds a single scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedConfig {
    slug: String,
    record: ConfigRecord,
}

impl BakedConfig {
    /// The stable name slug assembled from the matrix axis values,
    /// e.g. `x86-64.debug`. Unique within the matrix and usable as a
    /// path or identifier fragment.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// The underlying (fully scalar) record.
    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    /// Get a scalar field.
    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.record.get(key).and_then(ConfigValue::as_scalar)
    }

    /// Get a scalar string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.record.get_str(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> ConfigRecord {
        ConfigRecord::new("ci")
            .with_field(keys::PLATFORM, "linux")
            .with_field(keys::ARCHITECTURE, vec!["x86-64", "arm64"])
            .with_field(keys::BUILD_CONFIG, vec!["debug", "release"])
    }

    #[test]
    fn test_bake_order_first_axis_slowest() {
        let baked = matrix().bake();
        let slugs: Vec<_> = baked.iter().map(|b| b.slug()).collect();
        assert_eq!(
            slugs,
            vec![
                "x86-64.debug",
                "x86-64.release",
                "arm64.debug",
                "arm64.release"
            ]
        );
    }

    #[test]
    fn test_bake_projects_back_onto_axes() {
        let baked = matrix().bake();
        let archs: Vec<_> = baked
            .iter()
            .map(|b| b.get_str(keys::ARCHITECTURE).unwrap().to_string())
            .collect();
        // Projection preserves each axis's declared values.
        assert_eq!(archs, vec!["x86-64", "x86-64", "arm64", "arm64"]);
        for b in &baked {
            assert!(b.record().is_baked());
            assert_eq!(b.get_str(keys::PLATFORM), Some("linux"));
        }
    }

    #[test]
    fn test_empty_axis_bakes_to_nothing() {
        let record = ConfigRecord::new("empty")
            .with_field(keys::ARCHITECTURE, ConfigValue::List(Vec::new()))
            .with_field(keys::BUILD_CONFIG, vec!["debug"]);
        assert!(record.bake().is_empty());
    }

    #[test]
    fn test_scalar_record_bakes_to_itself() {
        let record = ConfigRecord::new("one")
            .with_field(keys::PLATFORM, "linux")
            .with_field(keys::BUILD_CONFIG, "debug");
        let baked = record.bake();
        assert_eq!(baked.len(), 1);
        assert_eq!(baked[0].slug(), "default");
        assert_eq!(baked[0].get_str(keys::BUILD_CONFIG), Some("debug"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut record = ConfigRecord::new("r");
        record.set("a", "1");
        record.set("b", "2");
        record.set("a", "3");
        let keys: Vec<_> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record.get_str("a"), Some("3"));
    }

    #[test]
    fn test_slug_uniqueness() {
        let baked = matrix().bake();
        let mut slugs: Vec<_> = baked.iter().map(|b| b.slug().to_string()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), baked.len());
    }
}
