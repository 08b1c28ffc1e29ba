//! GNU Make back-end.
//!
//! Emits a root `Makefile` under `build_root` plus one `.mk` fragment
//! per buildable target per baked config. The root makefile selects the
//! fragment set through `ARCH`/`CONFIG` variables validated against the
//! matrix axes, so a single generated tree serves every baked config.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::config::{keys, BakedConfig, ConfigRecord, ConfigValue};
use crate::core::label::Label;
use crate::core::target::Target;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};
use crate::generators::Generator;
use crate::util::fs::{relative_path, to_slash, write_if_changed};

const SUPPORTED_PLATFORMS: &[&str] = &["linux", "macos"];
const SUPPORTED_TOOLCHAINS: &[&str] = &["gcc", "clang"];

/// The GNU Make generator.
#[derive(Debug, Default)]
pub struct MakeGenerator;

impl MakeGenerator {
    pub fn new() -> Self {
        MakeGenerator
    }
}

fn axis_values(config: &ConfigRecord, key: &str) -> Result<Vec<String>> {
    match config.get(key) {
        Some(ConfigValue::Scalar(s)) => Ok(vec![s.to_string()]),
        Some(ConfigValue::List(items)) => Ok(items.iter().map(|s| s.to_string()).collect()),
        None => Err(Error::UnknownConfigKey {
            key: key.to_string(),
        }),
    }
}

/// `pkg@tgt`, the phony name a target answers to.
fn phony_name(label: Label) -> String {
    format!("{}@{}", label.package(), label.target())
}

/// A collision-free object file name derived from the source path.
fn object_name(workspace: &Workspace, source: &Path) -> String {
    let rel = if source.starts_with(workspace.root()) {
        relative_path(workspace.root(), source)
    } else {
        relative_path(workspace.sandbox_root(), source)
    };
    format!("{}.o", to_slash(&rel).replace('/', "_"))
}

fn is_c_source(path: &Path) -> bool {
    path.extension().map(|e| e == "c").unwrap_or(false)
}

/// Archive path of a library target.
fn library_output(label: Label) -> String {
    format!("$(LIBS_ROOT)/{}/lib{}.a", label.package(), label.target())
}

impl Generator for MakeGenerator {
    fn name(&self) -> &'static str {
        "make"
    }

    fn validate(&self, config: &ConfigRecord, _workspace: &Workspace) -> Result<()> {
        let platform = config.get_str(keys::PLATFORM).unwrap_or_default();
        if !SUPPORTED_PLATFORMS.contains(&platform) {
            return Err(Error::UnsupportedPlatform {
                platform: platform.to_string(),
                generator: "make".to_string(),
            });
        }
        let toolchain = config.get_str(keys::TOOLCHAIN).unwrap_or_default();
        if !SUPPORTED_TOOLCHAINS.contains(&toolchain) {
            return Err(Error::GeneratorFailure {
                target: config.name().to_string(),
                message: format!("unsupported toolchain `{}`", toolchain),
            });
        }
        Ok(())
    }

    fn generate(&self, config: &ConfigRecord, workspace: &Workspace) -> Result<()> {
        if workspace.baked_configs().is_empty() {
            return Ok(());
        }
        self.write_root_makefile(config, workspace)?;
        for baked in workspace.baked_configs() {
            for (package, target) in workspace.iter_targets() {
                if !emits_fragment(target) {
                    continue;
                }
                let label = Label::new(package.name(), target.name());
                self.write_fragment(workspace, &baked, label)?;
            }
        }
        info!(build_root = %workspace.build_root().display(), "make files generated");
        Ok(())
    }
}

fn emits_fragment(target: &Target) -> bool {
    match target {
        Target::CppLibrary(lib) => !lib.is_header_only(),
        Target::CppBinary(_) => true,
        _ => false,
    }
}

impl MakeGenerator {
    fn write_root_makefile(&self, config: &ConfigRecord, workspace: &Workspace) -> Result<()> {
        let archs = axis_values(config, keys::ARCHITECTURE)?;
        let build_configs = axis_values(config, keys::BUILD_CONFIG)?;
        let toolchain = config.get_str(keys::TOOLCHAIN).unwrap_or("gcc");
        let (cc, cxx) = match toolchain {
            "clang" => ("clang", "clang++"),
            _ => ("gcc", "g++"),
        };

        let fragments: Vec<Label> = workspace
            .iter_targets()
            .filter(|(_, t)| emits_fragment(t))
            .map(|(p, t)| Label::new(p.name(), t.name()))
            .collect();

        let workspace_rel = relative_path(workspace.build_root(), workspace.root());

        let mut out = String::new();
        out.push_str("# Generated by builderer\n\n");
        out.push_str(&format!("ARCH ?= {}\n", archs[0]));
        out.push_str(&format!("CONFIG ?= {}\n", build_configs[0]));
        out.push_str(&format!("VALID_ARCH := {}\n", archs.join(" ")));
        out.push_str(&format!("VALID_CONFIG := {}\n", build_configs.join(" ")));
        out.push_str("ifeq ($(filter $(ARCH),$(VALID_ARCH)),)\n");
        out.push_str("  $(error $(ARCH) does not exist in $(VALID_ARCH))\n");
        out.push_str("endif\n");
        out.push_str("ifeq ($(filter $(CONFIG),$(VALID_CONFIG)),)\n");
        out.push_str("  $(error $(CONFIG) does not exist in $(VALID_CONFIG))\n");
        out.push_str("endif\n\n");

        out.push_str("BUILD_ROOT        := $(abspath $(dir $(lastword $(MAKEFILE_LIST))))\n");
        out.push_str("BUILD_CONFIG_ROOT := $(BUILD_ROOT)/$(ARCH)/$(CONFIG)\n");
        out.push_str("OBJS_ROOT         := $(BUILD_CONFIG_ROOT)/.obj\n");
        out.push_str("LIBS_ROOT         := $(BUILD_CONFIG_ROOT)/.lib\n");
        out.push_str("RUNTIME_ROOT      := $(BUILD_CONFIG_ROOT)/.out\n");
        out.push_str(&format!(
            "WORKSPACE_ROOT    := $(abspath $(BUILD_ROOT)/{})\n\n",
            to_slash(&workspace_rel)
        ));

        out.push_str("ECHO   := echo\n");
        out.push_str("MKDIR  := mkdir -p\n");
        out.push_str("RM     := rm -f\n");
        out.push_str(&format!("CC     := {}\n", cc));
        out.push_str(&format!("CXX    := {}\n", cxx));
        out.push_str(&format!("CCLD   := {}\n", cxx));
        out.push_str("AR     := ar\n\n");

        out.push_str("help:\n");
        out.push_str("\t@$(ECHO) ARCH=$(ARCH)\n");
        out.push_str("\t@$(ECHO) CONFIG=$(CONFIG)\n");
        out.push_str("\t@$(ECHO) BUILD_ROOT=$(BUILD_ROOT)\n");
        out.push_str("\t@$(ECHO) WORKSPACE_ROOT=$(WORKSPACE_ROOT)\n\n");

        out.push_str("build:");
        for label in &fragments {
            out.push_str(&format!(" \\\n  {}", phony_name(*label)));
        }
        out.push_str("\n\n.PHONY: help build\n\n.SUFFIXES:\n\n");

        for label in &fragments {
            out.push_str(&format!(
                "include $(abspath $(BUILD_CONFIG_ROOT)/{}/{}.mk)\n",
                label.package(),
                label.target()
            ));
        }

        let path = workspace.build_root().join("Makefile");
        write_if_changed(&path, out.as_bytes())
            .map_err(|e| Error::sandbox_io(&path, std::io::Error::other(format!("{:#}", e))))?;
        Ok(())
    }

    fn write_fragment(
        &self,
        workspace: &Workspace,
        baked: &BakedConfig,
        label: Label,
    ) -> Result<()> {
        let (_, target) = workspace.find_target(label)?;
        let sources = workspace.enumerate_sources(baked, label)?;
        let flags = workspace.effective_flags(baked, label)?;
        let phony = phony_name(label);

        let mut compile_flags = String::new();
        for include in &flags.includes {
            compile_flags.push_str(&format!(" -I{}", include.display()));
        }
        for define in &flags.defines {
            compile_flags.push_str(&format!(" -D{}", define));
        }

        let mut out = String::new();
        out.push_str(&format!("# {} ({})\n\n", label, baked.slug()));

        let objects: Vec<(PathBuf, String)> = sources
            .srcs
            .iter()
            .map(|src| {
                (
                    src.clone(),
                    format!(
                        "$(OBJS_ROOT)/{}/{}/{}",
                        label.package(),
                        label.target(),
                        object_name(workspace, src)
                    ),
                )
            })
            .collect();

        out.push_str(&format!("{}_OBJS :=", phony));
        for (_, obj) in &objects {
            out.push_str(&format!(" \\\n  {}", obj));
        }
        out.push_str("\n\n");

        for (src, obj) in &objects {
            let (compiler, lang_flags) = if is_c_source(src) {
                ("$(CC)", flags.c_flags.join(" "))
            } else {
                ("$(CXX)", flags.cxx_flags.join(" "))
            };
            out.push_str(&format!("{}: {}\n", obj, src.display()));
            out.push_str("\t@$(MKDIR) $(dir $@)\n");
            out.push_str(&format!(
                "\t{} {}{} -c -o $@ $<\n\n",
                compiler,
                lang_flags,
                compile_flags
            ));
        }

        // Archives of linkable library dependencies, link order follows
        // the deterministic traversal.
        let mut dep_archives = Vec::new();
        for dep in workspace.all_dependencies(label) {
            let (_, dep_target) = workspace.find_target(dep)?;
            if let Target::CppLibrary(lib) = dep_target {
                if !lib.is_header_only() {
                    dep_archives.push(library_output(dep));
                }
            }
        }

        match target {
            Target::CppLibrary(_) => {
                let output = library_output(label);
                out.push_str(&format!("{}: $({}_OBJS)\n", output, phony));
                out.push_str("\t@$(MKDIR) $(dir $@)\n");
                out.push_str("\t$(AR) rcs $@ $^\n\n");
                out.push_str(&format!("{}: {}\n", phony, output));
                out.push_str(&format!(".PHONY: {}\n", phony));
            }
            Target::CppBinary(bin) => {
                let output = match &bin.output_path {
                    Some(value) => {
                        let path = value.resolve_strings(baked.record())?.join("");
                        if path.is_empty() {
                            format!("$(RUNTIME_ROOT)/{}/{}", label.package(), label.target())
                        } else {
                            format!("$(WORKSPACE_ROOT)/{}", path)
                        }
                    }
                    None => format!("$(RUNTIME_ROOT)/{}/{}", label.package(), label.target()),
                };
                out.push_str(&format!(
                    "{}: $({}_OBJS) {}\n",
                    output,
                    phony,
                    dep_archives.join(" ")
                ));
                out.push_str("\t@$(MKDIR) $(dir $@)\n");
                out.push_str(&format!(
                    "\t$(CCLD) -o $@ $({}_OBJS) {} {}\n\n",
                    phony,
                    dep_archives.join(" "),
                    flags.link_flags.join(" ")
                ));
                out.push_str(&format!("{}: {}\n", phony, output));
                out.push_str(&format!(".PHONY: {}\n", phony));
            }
            _ => {}
        }

        let arch = baked.get_str(keys::ARCHITECTURE).unwrap_or("default");
        let build_config = baked.get_str(keys::BUILD_CONFIG).unwrap_or("default");
        let path = workspace
            .build_root()
            .join(arch)
            .join(build_config)
            .join(label.package().as_str())
            .join(format!("{}.mk", label.target()));
        write_if_changed(&path, out.as_bytes())
            .map_err(|e| Error::sandbox_io(&path, std::io::Error::other(format!("{:#}", e))))?;
        Ok(())
    }
}
