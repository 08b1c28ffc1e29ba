//! Description ingestion - populates the registry from the workspace.
//!
//! Two description kinds are discovered on disk: one `CONFIG.builderer`
//! at the workspace root, and one `BUILD.builderer` per package
//! directory. Both are declarative TOML documents (see [`schema`]);
//! everything they declare flows through the registry's public API, so
//! duplicate and mismatch errors surface exactly as with programmatic
//! registration.

pub mod schema;

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::core::config::{ConfigRecord, ConfigValue, Scalar};
use crate::core::registry::Registry;
use crate::error::{Error, Result};
use crate::generators::builtin_factory;
use crate::util::fs::to_slash;

use schema::{BuildDoc, ConfigDoc, ConfigSchema};

pub const CONFIG_FILENAME: &str = "CONFIG.builderer";
pub const BUILD_FILENAME: &str = "BUILD.builderer";

/// Ingest every description file under `root` into a fresh registry.
pub fn load_workspace(root: &Path) -> Result<Registry> {
    let mut registry = Registry::new();
    load_config(root, &mut registry)?;
    for dir in discover_package_dirs(root) {
        load_build(root, &dir, &mut registry)?;
    }
    Ok(registry)
}

fn ingest_error(path: &Path, message: impl ToString) -> Error {
    Error::Ingest {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ingest_error(path, e))
}

/// Workspace-relative directories containing a `BUILD.builderer`, in
/// deterministic walk order. Dot- and underscore-prefixed directories
/// are not descended into.
pub fn discover_package_dirs(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_dir()
                && entry.depth() > 0
                && (name.starts_with('.') || name.starts_with('_')))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && entry.file_name() == BUILD_FILENAME
        })
        .filter_map(|entry| {
            entry
                .path()
                .parent()
                .and_then(|dir| dir.strip_prefix(root).ok())
                .map(Path::to_path_buf)
        })
        .collect()
}

fn toml_scalar(path: &Path, value: &toml::Value) -> Result<Scalar> {
    match value {
        toml::Value::String(s) => Ok(Scalar::String(s.clone())),
        toml::Value::Boolean(b) => Ok(Scalar::Bool(*b)),
        toml::Value::Integer(i) => Ok(Scalar::Int(*i)),
        other => Err(ingest_error(
            path,
            format!("config values must be scalars or arrays of scalars, got {}", other),
        )),
    }
}

fn toml_config_value(path: &Path, value: &toml::Value) -> Result<ConfigValue> {
    match value {
        toml::Value::Array(items) => Ok(ConfigValue::List(
            items
                .iter()
                .map(|v| toml_scalar(path, v))
                .collect::<Result<_>>()?,
        )),
        scalar => Ok(ConfigValue::Scalar(toml_scalar(path, scalar)?)),
    }
}

fn config_record(path: &Path, name: &str, schema: &ConfigSchema) -> Result<ConfigRecord> {
    use crate::core::config::keys;

    let mut record = ConfigRecord::new(name)
        .with_field(keys::BUILDTOOL, schema.buildtool.as_str())
        .with_field(keys::TOOLCHAIN, schema.toolchain.as_str())
        .with_field(keys::PLATFORM, schema.platform.as_str())
        .with_field(keys::BUILD_ROOT, schema.build_root.as_str())
        .with_field(keys::SANDBOX_ROOT, schema.sandbox_root.as_str());
    record.set(keys::ARCHITECTURE, toml_config_value(path, &schema.architecture)?);
    record.set(keys::BUILD_CONFIG, toml_config_value(path, &schema.build_config)?);
    for (key, value) in &schema.extra {
        record.set(key.as_str(), toml_config_value(path, value)?);
    }
    Ok(record)
}

fn load_config(root: &Path, registry: &mut Registry) -> Result<()> {
    let path = root.join(CONFIG_FILENAME);
    let doc: ConfigDoc =
        toml::from_str(&read(&path)?).map_err(|e| ingest_error(&path, e))?;

    for (name, kind) in &doc.buildtools {
        registry.add_buildtool(name, builtin_factory(kind)?)?;
    }
    for (name, schema) in &doc.configs {
        registry.add_config(config_record(&path, name, schema)?)?;
    }
    debug!(path = %path.display(), configs = doc.configs.len(), "config ingested");
    Ok(())
}

fn load_build(root: &Path, dir: &Path, registry: &mut Registry) -> Result<()> {
    let path = root.join(dir).join(BUILD_FILENAME);
    let doc: BuildDoc =
        toml::from_str(&read(&path)?).map_err(|e| ingest_error(&path, e))?;

    let package = registry.add_package(&doc.package, &to_slash(dir))?;
    for target in doc.cc_library {
        package.add_target(crate::core::target::CppLibrary::from(target))?;
    }
    for target in doc.cc_binary {
        package.add_target(crate::core::target::CppBinary::from(target))?;
    }
    for target in doc.git_repository {
        package.add_target(crate::core::target::GitRepository::from(target))?;
    }
    for target in doc.generate_files {
        package.add_target(crate::core::target::GenerateFiles::from(target))?;
    }
    debug!(path = %path.display(), "package ingested");
    Ok(())
}
