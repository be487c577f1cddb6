//! Compilation database generation for Android ninja build graphs
//!
//! Android produces two generated ninja graphs:
//! - `out/build-<target>.ninja`, written by Kati from the `Android.mk` files
//! - `out/soong/build.ninja`, written by Soong from the `Android.bp` files
//!
//! Neither carries a ready-made compiler command line per source file. This
//! crate recovers one by scanning the graphs as plain text:
//! - Soong modules are indexed into per-module fragments plus a variable
//!   table, and each build edge's `ccCmd` / `cFlags` pair is expanded into an
//!   argument list ([`SoongNinja`]).
//! - Kati rules are gated by their `description`, `$(cat ...)` substitutions
//!   are inlined and the clang invocation is cut out of the wrapper shell
//!   command ([`LegacyRuleResolver`]).
//!
//! Both append [`CompileCommandEntry`] records to one [`CompilationDatabase`].
//!
//! ```no_run
//! use convenient_ninja::{CompdbConfig, NinjaGraphs, find_build_descriptions, BuildDescription};
//!
//! # fn main() -> convenient_ninja::CompdbResult<()> {
//! let config = CompdbConfig::new("/aosp", "aosp_arm64", "/aosp/external/foo", "compile_commands.json");
//! config.validate()?;
//! let mut graphs = NinjaGraphs::open(&config)?;
//! for path in find_build_descriptions(&config.src) {
//!     let description = BuildDescription::parse_file(&path)?;
//!     for module in description.local_modules() {
//!         graphs.get_build_cmd_for_module(module, description.kind())?;
//!     }
//! }
//! graphs.compdb().write_to(&config.output)?;
//! # Ok(())
//! # }
//! ```

pub mod arguments;
pub mod build_description;
pub mod build_edge;
pub mod compdb;
pub mod config;
pub mod error;
pub mod graphs;
pub mod legacy_rules;
mod lines;
pub mod module_index;
pub mod soong;
pub mod variables;

pub use arguments::parse_arguments;
pub use build_description::{BuildDescription, BuildFileKind, find_build_descriptions};
pub use build_edge::{BuildEdgeExtractor, BuildEdgeRecord};
pub use compdb::{CompilationDatabase, CompileCommandEntry};
pub use config::CompdbConfig;
pub use error::{CompdbError, CompdbResult};
pub use graphs::NinjaGraphs;
pub use legacy_rules::{CatCache, LegacyLine, LegacyRuleResolver, ScanState, locate_compiler};
pub use module_index::{ModuleBlockIndex, ModuleFragment};
pub use soong::SoongNinja;
pub use variables::{VariableBinding, VariableTable};
