//! Conditional expression trees over configuration records.
//!
//! Attribute values are possibly-nested sequences of scalars and
//! conditional branches. `Value::resolve` flattens such a tree against a
//! baked config into a flat scalar list: left-to-right, depth-first,
//! empty branches dropped.

use std::collections::BTreeMap;

use crate::core::config::{ConfigRecord, ConfigValue, Scalar};
use crate::error::{Error, Result};

/// Expected axis value(s) for one condition entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    One(Scalar),
    AnyOf(Vec<Scalar>),
}

impl From<&str> for Expected {
    fn from(v: &str) -> Self {
        Expected::One(v.into())
    }
}

impl From<Vec<&str>> for Expected {
    fn from(v: Vec<&str>) -> Self {
        Expected::AnyOf(v.into_iter().map(Scalar::from).collect())
    }
}

/// A conjunction of axis requirements.
///
/// The empty condition always holds. Every referenced key must exist in
/// the config and hold a scalar; a missing key is `UnknownConfigKey` and
/// a sequence value is `MatrixLeakage`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    entries: BTreeMap<String, Expected>,
}

impl Condition {
    /// The always-true condition.
    pub fn new() -> Self {
        Condition::default()
    }

    /// Add a requirement.
    pub fn with(mut self, key: impl Into<String>, expected: impl Into<Expected>) -> Self {
        self.entries.insert(key.into(), expected.into());
        self
    }

    /// Whether this condition has no requirements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Requirements in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Expected)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Evaluate under a config record.
    pub fn eval(&self, config: &ConfigRecord) -> Result<bool> {
        for (key, expected) in &self.entries {
            let value = config
                .get(key)
                .ok_or_else(|| Error::UnknownConfigKey { key: key.clone() })?;
            let actual = match value {
                ConfigValue::Scalar(s) => s,
                ConfigValue::List(_) => {
                    return Err(Error::MatrixLeakage { key: key.clone() });
                }
            };
            let holds = match expected {
                Expected::One(v) => actual == v,
                Expected::AnyOf(vs) => vs.contains(actual),
            };
            if !holds {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// One arm of a `Switch`.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub condition: Condition,
    pub values: Vec<Value>,
}

impl Case {
    pub fn new(condition: Condition, values: impl IntoIterator<Item = Value>) -> Self {
        Case {
            condition,
            values: values.into_iter().collect(),
        }
    }

    /// A case that always matches; place it last as a default arm.
    pub fn default_case(values: impl IntoIterator<Item = Value>) -> Self {
        Case::new(Condition::new(), values)
    }
}

/// A possibly-conditional attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Seq(Vec<Value>),
    Optional {
        condition: Condition,
        values: Vec<Value>,
    },
    Switch(Vec<Case>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Seq(Vec::new())
    }
}

impl Value {
    /// A single string scalar.
    pub fn string(v: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(v.into()))
    }

    /// A plain sequence of string scalars.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Seq(items.into_iter().map(Value::string).collect())
    }

    /// An `Optional` branch.
    pub fn optional(condition: Condition, values: impl IntoIterator<Item = Value>) -> Self {
        Value::Optional {
            condition,
            values: values.into_iter().collect(),
        }
    }

    /// A `Switch` over cases, first match wins.
    pub fn switch(cases: impl IntoIterator<Item = Case>) -> Self {
        Value::Switch(cases.into_iter().collect())
    }

    /// Whether resolution can ever produce anything.
    pub fn is_trivially_empty(&self) -> bool {
        match self {
            Value::Scalar(_) => false,
            Value::Seq(vs) => vs.iter().all(Value::is_trivially_empty),
            Value::Optional { values, .. } => values.iter().all(Value::is_trivially_empty),
            Value::Switch(cases) => cases
                .iter()
                .all(|c| c.values.iter().all(Value::is_trivially_empty)),
        }
    }

    /// Flatten to scalars under a config.
    ///
    /// Resolution is pure and order-preserving: left-to-right, depth
    /// first, with non-matching branches contributing nothing.
    pub fn resolve(&self, config: &ConfigRecord) -> Result<Vec<Scalar>> {
        let mut out = Vec::new();
        self.resolve_into(config, &mut out)?;
        Ok(out)
    }

    fn resolve_into(&self, config: &ConfigRecord, out: &mut Vec<Scalar>) -> Result<()> {
        match self {
            Value::Scalar(v) => out.push(v.clone()),
            Value::Seq(values) => {
                for value in values {
                    value.resolve_into(config, out)?;
                }
            }
            Value::Optional { condition, values } => {
                if condition.eval(config)? {
                    for value in values {
                        value.resolve_into(config, out)?;
                    }
                }
            }
            Value::Switch(cases) => {
                // First matching case wins; no match yields nothing.
                for case in cases {
                    if case.condition.eval(config)? {
                        for value in &case.values {
                            value.resolve_into(config, out)?;
                        }
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve and render every scalar as a string.
    pub fn resolve_strings(&self, config: &ConfigRecord) -> Result<Vec<String>> {
        Ok(self
            .resolve(config)?
            .into_iter()
            .map(|s| s.to_string())
            .collect())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::strings(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::keys;

    fn baked(platform: &str) -> ConfigRecord {
        ConfigRecord::new("test")
            .with_field(keys::PLATFORM, platform)
            .with_field(keys::TOOLCHAIN, "gcc")
            .with_field(keys::BUILD_CONFIG, "debug")
    }

    fn std_flag_switch() -> Value {
        Value::switch([
            Case::new(
                Condition::new().with(keys::PLATFORM, "windows"),
                [Value::string("/std:c++20")],
            ),
            Case::new(
                Condition::new().with(keys::PLATFORM, vec!["linux", "macos"]),
                [Value::string("-std=c++20")],
            ),
        ])
    }

    #[test]
    fn test_switch_first_match_wins() {
        let value = std_flag_switch();
        assert_eq!(
            value.resolve_strings(&baked("linux")).unwrap(),
            vec!["-std=c++20"]
        );
        assert_eq!(
            value.resolve_strings(&baked("windows")).unwrap(),
            vec!["/std:c++20"]
        );
    }

    #[test]
    fn test_switch_no_match_is_empty() {
        let value = std_flag_switch();
        assert!(value.resolve_strings(&baked("android")).unwrap().is_empty());
    }

    #[test]
    fn test_optional_drops_when_false() {
        let value = Value::Seq(vec![
            Value::string("-Wall"),
            Value::optional(
                Condition::new().with(keys::BUILD_CONFIG, "release"),
                [Value::string("-O2")],
            ),
            Value::optional(
                Condition::new().with(keys::BUILD_CONFIG, "debug"),
                [Value::string("-O0"), Value::string("-g")],
            ),
        ]);
        assert_eq!(
            value.resolve_strings(&baked("linux")).unwrap(),
            vec!["-Wall", "-O0", "-g"]
        );
    }

    #[test]
    fn test_nested_switch_inside_optional() {
        // Depth-first: the inner switch contributes in place.
        let value = Value::Seq(vec![
            Value::string("first"),
            Value::optional(
                Condition::new().with(keys::TOOLCHAIN, "gcc"),
                [std_flag_switch(), Value::string("last")],
            ),
        ]);
        assert_eq!(
            value.resolve_strings(&baked("linux")).unwrap(),
            vec!["first", "-std=c++20", "last"]
        );
    }

    #[test]
    fn test_unknown_key_is_fatal() {
        let value = Value::optional(
            Condition::new().with("simd", "avx2"),
            [Value::string("-mavx2")],
        );
        let err = value.resolve(&baked("linux")).unwrap_err();
        assert_eq!(err.kind(), "UnknownConfigKey");
    }

    #[test]
    fn test_matrix_leakage_is_fatal() {
        let matrix = ConfigRecord::new("m")
            .with_field(keys::PLATFORM, "linux")
            .with_field(keys::BUILD_CONFIG, vec!["debug", "release"]);
        let value = Value::optional(
            Condition::new().with(keys::BUILD_CONFIG, "debug"),
            [Value::string("-g")],
        );
        let err = value.resolve(&matrix).unwrap_err();
        assert_eq!(err.kind(), "MatrixLeakage");
    }

    #[test]
    fn test_empty_condition_always_holds() {
        assert!(Condition::new().eval(&baked("linux")).unwrap());
        let value = Value::switch([
            Case::new(
                Condition::new().with(keys::PLATFORM, "windows"),
                [Value::string("/W4")],
            ),
            Case::default_case([Value::string("-Wall")]),
        ]);
        assert_eq!(
            value.resolve_strings(&baked("linux")).unwrap(),
            vec!["-Wall"]
        );
    }

    #[test]
    fn test_condition_set_membership() {
        let cond = Condition::new().with(keys::PLATFORM, vec!["linux", "macos"]);
        assert!(cond.eval(&baked("macos")).unwrap());
        assert!(!cond.eval(&baked("windows")).unwrap());
    }
}
