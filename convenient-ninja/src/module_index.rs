//! Per-module index of a Soong-generated `build.ninja`
//!
//! Soong writes every module variant as a block of the form
//!
//! ```text
//! # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # #
//! # Module:  libfoo
//! # Variant: android_arm64_armv8-a_static
//! ...build edges...
//!
//! # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # #
//! ```
//!
//! The index keeps the verbatim text from the `# Module:` / `# Variant:` line up
//! to and including the next delimiter, and collects every flat `name = value`
//! assignment of the whole file into a [`VariableTable`].

use crate::error::{CompdbError, CompdbResult};
use crate::lines::lossy_lines;
use crate::variables::VariableTable;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Verbatim slice of the graph belonging to one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFragment {
    pub name: String,
    /// Last `# Variant:` label seen before the delimiter
    pub variant: String,
    pub raw_text: String,
}

struct IndexPatterns {
    module_first_line: Regex,
    module_last_line: Regex,
    variant: Regex,
    vars: Regex,
}

impl IndexPatterns {
    fn new() -> Self {
        Self {
            module_first_line: Regex::new(r"^#\s*Module:\s*([\w+.@-]+)\s*").unwrap(),
            module_last_line: Regex::new(r"^\s*[# ]{50,}$").unwrap(),
            variant: Regex::new(r"^#\s*Variant:\s*([\w+.-]+)\s*").unwrap(),
            vars: Regex::new(r"^\s*([\w+.-]+)\s*=\s*(.*)$").unwrap(),
        }
    }
}

/// Module fragments plus the file-wide variable table
#[derive(Debug, Default)]
pub struct ModuleBlockIndex {
    fragments: Vec<ModuleFragment>,
    /// Position of the first fragment per module name
    by_name: HashMap<String, usize>,
    variables: VariableTable,
}

impl ModuleBlockIndex {
    /// Index a graph file
    pub fn from_file(path: &Path) -> CompdbResult<Self> {
        let file = File::open(path).map_err(|e| CompdbError::Io(path.to_path_buf(), e))?;
        info!("preparing module dict and vars for {}...", path.display());
        let index = Self::from_reader(BufReader::new(file))
            .map_err(|e| CompdbError::Io(path.to_path_buf(), e))?;
        info!(
            "indexed {} module blocks and {} variables",
            index.fragments.len(),
            index.variables.len()
        );
        Ok(index)
    }

    /// Index graph text from any line source
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let patterns = IndexPatterns::new();
        let mut index = Self::default();

        let mut collecting = false;
        let mut text = String::new();
        let mut module_name = String::new();
        let mut variant_name = String::new();

        for line in lossy_lines(reader) {
            let line = line?;

            if let Some(caps) = patterns.vars.captures(&line) {
                index.variables.insert(&caps[1], &caps[2]);
            }

            if let Some(caps) = patterns.module_first_line.captures(&line) {
                collecting = true;
                module_name = caps[1].to_string();
            }

            if let Some(caps) = patterns.variant.captures(&line) {
                collecting = true;
                variant_name = caps[1].to_string();
            }

            if !collecting {
                continue;
            }

            text.push_str(&line);
            text.push('\n');

            if patterns.module_last_line.is_match(&line) {
                index.store(ModuleFragment {
                    name: std::mem::take(&mut module_name),
                    variant: std::mem::take(&mut variant_name),
                    raw_text: std::mem::take(&mut text),
                });
                collecting = false;
            }
        }

        Ok(index)
    }

    fn store(&mut self, fragment: ModuleFragment) {
        self.by_name
            .entry(fragment.name.clone())
            .or_insert(self.fragments.len());
        self.fragments.push(fragment);
    }

    /// First fragment stored under `name`
    pub fn fragment_for(&self, name: &str) -> Option<&ModuleFragment> {
        self.by_name.get(name).map(|&index| &self.fragments[index])
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    /// Number of stored fragments, repeats included
    pub fn module_count(&self) -> usize {
        self.fragments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DELIMITER: &str =
        "# # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # # #";

    fn index(text: &str) -> ModuleBlockIndex {
        ModuleBlockIndex::from_reader(Cursor::new(text)).unwrap()
    }

    #[test]
    fn test_fragment_spans_header_to_delimiter() {
        let graph = format!(
            "{DELIMITER}\n# Module:  libfoo\n# Variant: android_arm64\n\nbuild $\n    out/foo.o : g.cc.cc src/foo.cpp\n\n{DELIMITER}\n# Module:  libbar\n{DELIMITER}\n"
        );
        let index = index(&graph);

        assert_eq!(index.module_count(), 2);
        let fragment = index.fragment_for("libfoo").unwrap();
        assert_eq!(fragment.variant, "android_arm64");
        assert!(fragment.raw_text.starts_with("# Module:  libfoo\n"));
        assert!(fragment.raw_text.contains("build $\n"));
        assert!(fragment.raw_text.ends_with(&format!("{DELIMITER}\n")));
        assert!(!fragment.raw_text.contains("libbar"));
        assert_eq!(index.fragment_for("libbar").unwrap().variant, "");
    }

    #[test]
    fn test_variant_alone_starts_collection() {
        let graph = format!("# Variant: host\ncFlags = -O2\n{DELIMITER}\n");
        let index = index(&graph);

        let fragment = index.fragment_for("").unwrap();
        assert_eq!(fragment.variant, "host");
        assert!(fragment.raw_text.contains("cFlags = -O2"));
    }

    #[test]
    fn test_first_fragment_wins() {
        let graph = format!(
            "# Module: libfoo\n# Variant: arm64\n{DELIMITER}\n# Module: libfoo\n# Variant: x86\n{DELIMITER}\n"
        );
        let index = index(&graph);

        assert_eq!(index.module_count(), 2);
        assert_eq!(index.fragment_for("libfoo").unwrap().variant, "arm64");
    }

    #[test]
    fn test_unknown_module() {
        let index = index("ninja_required_version = 1.7.0\n");
        assert!(index.fragment_for("libfoo").is_none());
    }

    #[test]
    fn test_variables_are_collected_file_wide() {
        let graph = format!(
            "g.cc.clang = prebuilts/clang/bin/clang\n# Module: libfoo\n    cFlags = -Wall\n{DELIMITER}\nm.libbar.flags = -DBAR\n"
        );
        let index = index(&graph);

        let vars = index.variables();
        assert_eq!(vars.get("g.cc.clang"), Some("prebuilts/clang/bin/clang"));
        assert_eq!(vars.get("cFlags"), Some("-Wall"));
        assert_eq!(vars.get("m.libbar.flags"), Some("-DBAR"));
        assert!(vars.get("Module").is_none());
    }

    #[test]
    fn test_short_hash_line_does_not_terminate() {
        let graph = format!("# Module: libfoo\n# # # #\nccCmd = clang\n{DELIMITER}\n");
        let index = index(&graph);

        assert!(index.fragment_for("libfoo").unwrap().raw_text.contains("ccCmd = clang"));
    }

    #[test]
    fn test_non_utf8_bytes_are_tolerated() {
        let mut graph = b"# Module: libfoo\n    cFlags = -DTAG=\xff\n".to_vec();
        graph.extend_from_slice(format!("{DELIMITER}\n").as_bytes());

        let index = ModuleBlockIndex::from_reader(Cursor::new(graph)).unwrap();

        assert!(index.fragment_for("libfoo").is_some());
        assert_eq!(index.variables().get("cFlags"), Some("-DTAG=\u{fffd}"));
    }
}
