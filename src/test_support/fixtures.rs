//! Canned workspaces for unit tests.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::core::config::{keys, ConfigRecord};
use crate::core::registry::Registry;
use crate::core::target::{CppBinary, CppLibrary};
use crate::generators::builtin_factory;

/// Write a file beneath `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A scratch workspace with the `App` package sources on disk.
pub fn scratch_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "App/include/u.h", "#pragma once\nint util();\n");
    write_file(tmp.path(), "App/src/u.cpp", "int util() { return 1; }\n");
    write_file(
        tmp.path(),
        "App/main.cpp",
        "int util();\nint main() { return util(); }\n",
    );
    tmp
}

/// The matrix config used by fixtures: linux/gcc, two build configs.
pub fn dev_config() -> ConfigRecord {
    ConfigRecord::new("dev")
        .with_field(keys::BUILDTOOL, "make")
        .with_field(keys::TOOLCHAIN, "gcc")
        .with_field(keys::PLATFORM, "linux")
        .with_field(keys::BUILD_ROOT, "build")
        .with_field(keys::SANDBOX_ROOT, "sandbox")
        .with_field(keys::ARCHITECTURE, vec!["x86-64"])
        .with_field(keys::BUILD_CONFIG, vec!["debug", "release"])
}

/// A registry with the `App` package: a `util` library and a `hello`
/// binary depending on it.
pub fn hello_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .add_buildtool("make", builtin_factory("make").unwrap())
        .unwrap();
    registry.add_config(dev_config()).unwrap();

    let pkg = registry.add_package("App", "App").unwrap();
    pkg.add_target(
        CppLibrary::new("util")
            .with_hdrs(vec!["include/**/*.h"])
            .with_srcs(vec!["src/**/*.cpp"])
            .with_public_includes(vec!["include"]),
    )
    .unwrap();
    pkg.add_target(
        CppBinary::new("hello")
            .with_srcs(vec!["main.cpp"])
            .with_deps(vec![":util"]),
    )
    .unwrap();
    registry
}
