// Build edge extraction for Soong module fragments
// Groups `build $` blocks into records and emits one entry per complete compile edge

use crate::arguments::parse_arguments;
use crate::compdb::{CompilationDatabase, CompileCommandEntry};
use crate::variables::VariableTable;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fields collected for one build edge
///
/// Every field is first-match-wins within its edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEdgeRecord {
    pub build_target: Option<String>,
    pub build_src: Option<String>,
    pub cc_cmd: Option<String>,
    pub ld_cmd: Option<String>,
    pub c_flags: Option<String>,
    pub ld_flags: Option<String>,
}

impl BuildEdgeRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Entry for this edge, if it has a source, a compiler and flags
    pub fn to_entry(&self, directory: &Path) -> Option<CompileCommandEntry> {
        let (Some(src), Some(cc_cmd), Some(c_flags)) =
            (&self.build_src, &self.cc_cmd, &self.c_flags)
        else {
            return None;
        };

        Some(CompileCommandEntry {
            directory: directory.to_path_buf(),
            file: src.clone(),
            arguments: parse_arguments(&format!("{} {}", cc_cmd, c_flags)),
        })
    }
}

/// Walks a module fragment edge by edge
pub struct BuildEdgeExtractor<'a> {
    variables: &'a VariableTable,
    directory: PathBuf,
    build: Regex,
    build_target: Regex,
    build_src: Regex,
    cc_cmd: Regex,
    ld_cmd: Regex,
    c_flags: Regex,
    ld_flags: Regex,
}

fn fill(slot: &mut Option<String>, pattern: &Regex, line: &str) {
    if slot.is_none() {
        if let Some(caps) = pattern.captures(line) {
            *slot = Some(caps[1].to_string());
        }
    }
}

impl<'a> BuildEdgeExtractor<'a> {
    pub fn new(variables: &'a VariableTable, directory: impl Into<PathBuf>) -> Self {
        Self {
            variables,
            directory: directory.into(),
            build: Regex::new(r"^\s*build \$\s*").unwrap(),
            build_target: Regex::new(r"^\s*([\w+/._-]+)\s*:\s*([\w+/._-]+)\s*\$").unwrap(),
            build_src: Regex::new(r"^\s*([\w+/._-]+)\s*\|\s*([\w+/._-]+)\s*(.*)").unwrap(),
            cc_cmd: Regex::new(r"^\s*ccCmd\s*=\s*([\w+/._-]+)\s*").unwrap(),
            ld_cmd: Regex::new(r"^\s*ldCmd\s*=\s*([\w+/._-]+)\s*").unwrap(),
            c_flags: Regex::new(r"^\s*cFlags\s*=(.*)").unwrap(),
            ld_flags: Regex::new(r"^\s*ldFlags\s*=(.*)").unwrap(),
        }
    }

    /// Append one entry per complete edge of `fragment` to `compdb`
    ///
    /// Returns the number of entries appended.
    pub fn extract(&self, fragment: &str, compdb: &mut CompilationDatabase) -> usize {
        let mut emitted = 0;
        let mut record = BuildEdgeRecord::default();

        for line in fragment.lines() {
            let line = self.variables.expand(line);

            if self.build.is_match(&line) {
                emitted += self.flush(&record, compdb);
                record = BuildEdgeRecord::default();
            }

            self.accumulate(&mut record, &line);
        }

        emitted + self.flush(&record, compdb)
    }

    fn accumulate(&self, record: &mut BuildEdgeRecord, line: &str) {
        fill(&mut record.build_target, &self.build_target, line);
        fill(&mut record.build_src, &self.build_src, line);
        fill(&mut record.cc_cmd, &self.cc_cmd, line);
        fill(&mut record.ld_cmd, &self.ld_cmd, line);
        fill(&mut record.c_flags, &self.c_flags, line);
        fill(&mut record.ld_flags, &self.ld_flags, line);
    }

    fn flush(&self, record: &BuildEdgeRecord, compdb: &mut CompilationDatabase) -> usize {
        match record.to_entry(&self.directory) {
            Some(entry) => {
                debug!("process build cmd for: {}", entry.file);
                compdb.push(entry);
                1
            }
            None => {
                if !record.is_empty() {
                    debug!("skipping incomplete build edge: {:?}", record);
                }
                0
            }
        }
    }
}
