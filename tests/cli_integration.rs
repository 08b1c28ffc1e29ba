//! CLI integration tests for Builderer.
//!
//! These tests drive the binary against real workspaces on disk, from
//! description ingestion through build-file generation.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::SystemTime;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the builderer binary command.
fn builderer() -> Command {
    Command::cargo_bin("builderer").unwrap()
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

const CONFIG: &str = r#"
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
"#;

/// A workspace with a util library and a hello binary.
fn hello_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "CONFIG.builderer", CONFIG);
    write(
        tmp.path(),
        "App/BUILD.builderer",
        r#"
package = "App"

[[cc_library]]
name = "util"
hdrs = ["include/**/*.h"]
srcs = ["src/**/*.cpp"]
public_includes = ["include"]
cxx_flags = [
    { switch = [
        { condition = { build_config = "debug" }, values = ["-O0", "-g"] },
        { condition = { build_config = "release" }, values = ["-O2"] },
    ] },
]

[[cc_binary]]
name = "hello"
srcs = ["main.cpp"]
deps = [":util"]
"#,
    );
    write(tmp.path(), "App/include/u.h", "#pragma once\nint util();\n");
    write(tmp.path(), "App/src/u.cpp", "int util() { return 1; }\n");
    write(
        tmp.path(),
        "App/main.cpp",
        "int util();\nint main() { return util(); }\n",
    );
    tmp
}

// ============================================================================
// builderer validate
// ============================================================================

#[test]
fn test_validate_lists_graph() {
    let tmp = hello_workspace();

    builderer()
        .args(["validate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("App:hello\n  App:util"));
}

#[test]
fn test_validate_requires_config_flag() {
    let tmp = hello_workspace();

    builderer()
        .args(["validate"])
        .current_dir(tmp.path())
        .assert()
        .failure();
}

#[test]
fn test_validate_unknown_config() {
    let tmp = hello_workspace();

    builderer()
        .args(["validate", "--config", "prod"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnknownConfig"));
}

#[test]
fn test_validate_unknown_dependency() {
    let tmp = hello_workspace();
    write(
        tmp.path(),
        "Broken/BUILD.builderer",
        r#"
package = "Broken"

[[cc_binary]]
name = "bad"
srcs = ["bad.cpp"]
deps = ["App:nonexistent"]
"#,
    );

    builderer()
        .args(["validate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnknownDependency"));
}

// ============================================================================
// builderer graph
// ============================================================================

#[test]
fn test_graph_emits_dot() {
    let tmp = hello_workspace();

    builderer()
        .args(["graph", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph DependencyGraph"))
        .stdout(predicate::str::contains(
            "\"App:hello\" -> {\"App:util\"};",
        ));
}

// ============================================================================
// builderer generate
// ============================================================================

#[test]
fn test_generate_writes_makefiles_for_every_baked_config() {
    let tmp = hello_workspace();

    builderer()
        .args(["generate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let build = tmp.path().join("build");
    let root = fs::read_to_string(build.join("Makefile")).unwrap();
    assert!(root.contains("VALID_ARCH := x86-64 arm64"));
    assert!(root.contains("VALID_CONFIG := debug release"));

    for (arch, config) in [
        ("x86-64", "debug"),
        ("x86-64", "release"),
        ("arm64", "debug"),
        ("arm64", "release"),
    ] {
        assert!(
            build.join(arch).join(config).join("App/hello.mk").is_file(),
            "missing fragment for {}/{}",
            arch,
            config
        );
    }

    let debug = fs::read_to_string(build.join("x86-64/debug/App/util.mk")).unwrap();
    assert!(debug.contains("-O0"));
    let release = fs::read_to_string(build.join("x86-64/release/App/util.mk")).unwrap();
    assert!(release.contains("-O2"));
}

#[test]
fn test_generate_restricted_working_set() {
    let tmp = hello_workspace();
    write(
        tmp.path(),
        "Extra/BUILD.builderer",
        r#"
package = "Extra"

[[cc_binary]]
name = "unrelated"
srcs = ["other.cpp"]
"#,
    );
    write(tmp.path(), "Extra/other.cpp", "int main() { return 0; }\n");

    builderer()
        .args(["generate", "--config", "dev", "App:hello"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let build = tmp.path().join("build");
    assert!(build.join("x86-64/debug/App/hello.mk").is_file());
    assert!(!build.join("x86-64/debug/Extra").exists());
}

fn mtimes_under(root: &Path) -> Vec<(std::path::PathBuf, SystemTime)> {
    let mut files = Vec::new();
    for entry in walkdir(root) {
        files.push((
            entry.clone(),
            fs::metadata(&entry).unwrap().modified().unwrap(),
        ));
    }
    files.sort();
    files
}

fn walkdir(root: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    if root.is_dir() {
        for entry in fs::read_dir(root).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                out.extend(walkdir(&path));
            } else {
                out.push(path);
            }
        }
    }
    out
}

#[test]
fn test_second_generate_pass_touches_nothing() {
    let tmp = hello_workspace();
    // Sandbox the library so the pass exercises the mirror too.
    let build_file = tmp.path().join("App/BUILD.builderer");
    let contents = fs::read_to_string(&build_file)
        .unwrap()
        .replace("name = \"util\"", "name = \"util\"\nsandbox = true");
    fs::write(&build_file, contents).unwrap();

    builderer()
        .args(["generate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let sandbox = tmp.path().join("sandbox");
    assert!(sandbox.join("App/util/hdrs/include/u.h").is_file());
    assert!(sandbox.join("App/util/srcs/src/u.cpp").is_file());

    let before_build = mtimes_under(&tmp.path().join("build"));
    let before_sandbox = mtimes_under(&sandbox);
    assert!(!before_build.is_empty());

    builderer()
        .args(["generate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert_eq!(before_build, mtimes_under(&tmp.path().join("build")));
    assert_eq!(before_sandbox, mtimes_under(&sandbox));
}

#[test]
fn test_sandboxed_consumer_uses_sandbox_include_path() {
    let tmp = hello_workspace();
    let build_file = tmp.path().join("App/BUILD.builderer");
    let contents = fs::read_to_string(&build_file)
        .unwrap()
        .replace("name = \"util\"", "name = \"util\"\nsandbox = true");
    fs::write(&build_file, contents).unwrap();

    builderer()
        .args(["generate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let fragment =
        fs::read_to_string(tmp.path().join("build/x86-64/debug/App/hello.mk")).unwrap();
    assert!(
        fragment.contains("sandbox/App/util/hdrs/include"),
        "consumer include path should point into the sandbox:\n{}",
        fragment
    );
}

// ============================================================================
// error taxonomy end to end
// ============================================================================

#[test]
fn test_dependency_cycle_fails_before_any_build_write() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "CONFIG.builderer", CONFIG);
    write(
        tmp.path(),
        "A/BUILD.builderer",
        r#"
package = "A"

[[cc_library]]
name = "x"
srcs = ["x.cpp"]
deps = ["B:y"]
"#,
    );
    write(
        tmp.path(),
        "B/BUILD.builderer",
        r#"
package = "B"

[[cc_library]]
name = "y"
srcs = ["y.cpp"]
deps = ["A:x"]
"#,
    );
    write(tmp.path(), "A/x.cpp", "");
    write(tmp.path(), "B/y.cpp", "");

    builderer()
        .args(["generate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("DependencyCycle"))
        .stderr(predicate::str::contains("A:x -> B:y -> A:x"));

    assert!(!tmp.path().join("build").exists());
}

#[test]
fn test_duplicate_target_rejected() {
    let tmp = hello_workspace();
    write(
        tmp.path(),
        "Dup/BUILD.builderer",
        r#"
package = "Dup"

[[cc_library]]
name = "twice"

[[cc_library]]
name = "twice"
"#,
    );

    builderer()
        .args(["validate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("DuplicateTarget"));
}

#[test]
fn test_unknown_attribute_rejected() {
    let tmp = hello_workspace();
    write(
        tmp.path(),
        "Bad/BUILD.builderer",
        r#"
package = "Bad"

[[cc_library]]
name = "lib"
header_files = ["wrong.h"]
"#,
    );

    builderer()
        .args(["validate", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ingest"));
}

// ============================================================================
// builderer sources
// ============================================================================

#[test]
fn test_sources_reports_line_counts() {
    let tmp = hello_workspace();

    builderer()
        .args(["sources", "--config", "dev"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("App :"))
        .stdout(predicate::str::contains("App/include/u.h"))
        .stdout(predicate::str::contains("Total :"));
}

// ============================================================================
// builderer completions
// ============================================================================

#[test]
fn test_completions_bash() {
    builderer()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("builderer"));
}
