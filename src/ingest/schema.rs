//! TOML schema of description files.
//!
//! Description files are declarative documents; this module defines
//! their serde shape and the conversions into core types. Unknown
//! attribute keys are rejected at ingestion, not silently ignored.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::conditional::{Case, Condition, Expected, Value};
use crate::core::config::Scalar;
use crate::core::target::{CppBinary, CppLibrary, GenerateFiles, GitRepository};

/// `CONFIG.builderer` - buildtools and named configs.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDoc {
    /// Buildtool name -> generator kind.
    #[serde(default)]
    pub buildtools: BTreeMap<String, String>,

    /// Config name -> matrix record.
    #[serde(default)]
    pub configs: BTreeMap<String, ConfigSchema>,
}

/// One `[configs.<name>]` table.
///
/// Reserved axes are explicit fields so their baking order is fixed:
/// `architecture` is declared before `build_config` and therefore varies
/// slowest. User-defined fields follow in document order.
#[derive(Debug, Deserialize)]
pub struct ConfigSchema {
    pub buildtool: String,
    pub toolchain: String,
    pub platform: String,
    pub build_root: String,
    pub sandbox_root: String,
    pub architecture: toml::Value,
    pub build_config: toml::Value,
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// A scalar-or-array condition entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpectedSchema {
    One(Scalar),
    AnyOf(Vec<Scalar>),
}

impl From<ExpectedSchema> for Expected {
    fn from(schema: ExpectedSchema) -> Self {
        match schema {
            ExpectedSchema::One(v) => Expected::One(v),
            ExpectedSchema::AnyOf(vs) => Expected::AnyOf(vs),
        }
    }
}

/// A condition table: axis -> expected scalar or set.
pub type ConditionSchema = BTreeMap<String, ExpectedSchema>;

pub fn condition_from(schema: ConditionSchema) -> Condition {
    let mut condition = Condition::new();
    for (key, expected) in schema {
        condition = condition.with(key, Expected::from(expected));
    }
    condition
}

/// An attribute value: scalar, array, or conditional expression.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueSchema {
    Scalar(Scalar),
    Optional(OptionalWrapper),
    Switch(SwitchWrapper),
    Seq(Vec<ValueSchema>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionalWrapper {
    pub optional: OptionalSchema,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionalSchema {
    #[serde(default)]
    pub condition: ConditionSchema,
    #[serde(default)]
    pub values: Vec<ValueSchema>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchWrapper {
    pub switch: Vec<CaseSchema>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSchema {
    #[serde(default)]
    pub condition: ConditionSchema,
    #[serde(default)]
    pub values: Vec<ValueSchema>,
}

impl From<ValueSchema> for Value {
    fn from(schema: ValueSchema) -> Self {
        match schema {
            ValueSchema::Scalar(v) => Value::Scalar(v),
            ValueSchema::Seq(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            ValueSchema::Optional(wrapper) => Value::Optional {
                condition: condition_from(wrapper.optional.condition),
                values: wrapper
                    .optional
                    .values
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            },
            ValueSchema::Switch(wrapper) => Value::Switch(
                wrapper
                    .switch
                    .into_iter()
                    .map(|case| {
                        Case::new(
                            condition_from(case.condition),
                            case.values.into_iter().map(Value::from),
                        )
                    })
                    .collect(),
            ),
        }
    }
}

fn value_or_default(schema: Option<ValueSchema>) -> Value {
    schema.map(Value::from).unwrap_or_default()
}

/// `BUILD.builderer` - one package and its targets.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDoc {
    /// Must equal the file's workspace-relative directory.
    pub package: String,

    #[serde(default)]
    pub cc_library: Vec<CcLibrarySchema>,
    #[serde(default)]
    pub cc_binary: Vec<CcBinarySchema>,
    #[serde(default)]
    pub git_repository: Vec<GitRepositorySchema>,
    #[serde(default)]
    pub generate_files: Vec<GenerateFilesSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CcLibrarySchema {
    pub name: String,
    #[serde(default)]
    pub condition: ConditionSchema,
    #[serde(default)]
    pub hdrs: Option<ValueSchema>,
    #[serde(default)]
    pub srcs: Option<ValueSchema>,
    #[serde(default)]
    pub public_includes: Option<ValueSchema>,
    #[serde(default)]
    pub private_includes: Option<ValueSchema>,
    #[serde(default)]
    pub public_defines: Option<ValueSchema>,
    #[serde(default)]
    pub private_defines: Option<ValueSchema>,
    #[serde(default)]
    pub c_flags: Option<ValueSchema>,
    #[serde(default)]
    pub cxx_flags: Option<ValueSchema>,
    #[serde(default)]
    pub link_flags: Option<ValueSchema>,
    #[serde(default)]
    pub deps: Option<ValueSchema>,
    #[serde(default)]
    pub sandbox: bool,
}

impl From<CcLibrarySchema> for CppLibrary {
    fn from(schema: CcLibrarySchema) -> Self {
        CppLibrary {
            name: schema.name.into(),
            condition: condition_from(schema.condition),
            hdrs: value_or_default(schema.hdrs),
            srcs: value_or_default(schema.srcs),
            public_includes: value_or_default(schema.public_includes),
            private_includes: value_or_default(schema.private_includes),
            public_defines: value_or_default(schema.public_defines),
            private_defines: value_or_default(schema.private_defines),
            c_flags: value_or_default(schema.c_flags),
            cxx_flags: value_or_default(schema.cxx_flags),
            link_flags: value_or_default(schema.link_flags),
            deps: value_or_default(schema.deps),
            sandbox: schema.sandbox,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CcBinarySchema {
    pub name: String,
    #[serde(default)]
    pub condition: ConditionSchema,
    #[serde(default)]
    pub srcs: Option<ValueSchema>,
    #[serde(default)]
    pub private_includes: Option<ValueSchema>,
    #[serde(default)]
    pub private_defines: Option<ValueSchema>,
    #[serde(default)]
    pub c_flags: Option<ValueSchema>,
    #[serde(default)]
    pub cxx_flags: Option<ValueSchema>,
    #[serde(default)]
    pub link_flags: Option<ValueSchema>,
    #[serde(default)]
    pub deps: Option<ValueSchema>,
    #[serde(default)]
    pub output_path: Option<ValueSchema>,
    #[serde(default)]
    pub sandbox: bool,
}

impl From<CcBinarySchema> for CppBinary {
    fn from(schema: CcBinarySchema) -> Self {
        CppBinary {
            name: schema.name.into(),
            condition: condition_from(schema.condition),
            srcs: value_or_default(schema.srcs),
            private_includes: value_or_default(schema.private_includes),
            private_defines: value_or_default(schema.private_defines),
            c_flags: value_or_default(schema.c_flags),
            cxx_flags: value_or_default(schema.cxx_flags),
            link_flags: value_or_default(schema.link_flags),
            deps: value_or_default(schema.deps),
            output_path: schema.output_path.map(Value::from),
            sandbox: schema.sandbox,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitRepositorySchema {
    pub name: String,
    #[serde(default)]
    pub condition: ConditionSchema,
    pub remote: String,
    pub sha: String,
}

impl From<GitRepositorySchema> for GitRepository {
    fn from(schema: GitRepositorySchema) -> Self {
        GitRepository {
            name: schema.name.into(),
            condition: condition_from(schema.condition),
            remote: schema.remote,
            sha: schema.sha,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateFilesSchema {
    pub name: String,
    #[serde(default)]
    pub condition: ConditionSchema,
    pub generator: ValueSchema,
    #[serde(default)]
    pub inputs: Option<ValueSchema>,
    #[serde(default)]
    pub outputs: Option<ValueSchema>,
}

impl From<GenerateFilesSchema> for GenerateFiles {
    fn from(schema: GenerateFilesSchema) -> Self {
        GenerateFiles {
            name: schema.name.into(),
            condition: condition_from(schema.condition),
            generator: Value::from(schema.generator),
            inputs: value_or_default(schema.inputs),
            outputs: value_or_default(schema.outputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::keys;
    use crate::core::config::ConfigRecord;

    #[test]
    fn test_value_schema_conditional_encoding() {
        let doc: BuildDoc = toml::from_str(
            r#"
package = "App"

[[cc_library]]
name = "util"
hdrs = ["include/**/*.h"]
srcs = ["src/**/*.cpp"]
public_includes = ["include"]
cxx_flags = [
    "-Wall",
    { optional = { condition = { toolchain = "gcc" }, values = ["-Wextra"] } },
    { switch = [
        { condition = { build_config = "debug" }, values = ["-O0", "-g"] },
        { condition = { build_config = "release" }, values = ["-O2"] },
    ] },
]
deps = [":base"]
"#,
        )
        .unwrap();

        assert_eq!(doc.package, "App");
        let lib: CppLibrary = doc.cc_library.into_iter().next().unwrap().into();

        let config = ConfigRecord::new("t")
            .with_field(keys::TOOLCHAIN, "gcc")
            .with_field(keys::BUILD_CONFIG, "debug");
        assert_eq!(
            lib.cxx_flags.resolve_strings(&config).unwrap(),
            vec!["-Wall", "-Wextra", "-O0", "-g"]
        );
        assert_eq!(lib.deps.resolve_strings(&config).unwrap(), vec![":base"]);
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let result: std::result::Result<BuildDoc, _> = toml::from_str(
            r#"
package = "App"

[[cc_library]]
name = "util"
header_files = ["include/u.h"]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_doc_reserved_and_extra_axes() {
        let doc: ConfigDoc = toml::from_str(
            r#"
[buildtools]
make = "make"

[configs.dev]
buildtool = "make"
toolchain = "gcc"
platform = "linux"
build_root = "build"
sandbox_root = "sandbox"
architecture = ["x86-64", "arm64"]
build_config = ["debug", "release"]
lto = false
"#,
        )
        .unwrap();
        assert_eq!(doc.buildtools["make"], "make");
        let schema = &doc.configs["dev"];
        assert!(schema.architecture.is_array());
        assert_eq!(schema.extra.get("lto").and_then(|v| v.as_bool()), Some(false));
    }
}
