//! Compile commands for Android.mk modules from the Kati `build-<target>.ninja`
//!
//! Kati emits one ninja rule per compile step:
//!
//! ```text
//! rule rule123
//!  description = target arm64 C++: libfoo <= external/foo/foo.cpp
//!  command = /bin/bash -c "(rm -f $out) && (PWD=/proc/self/cwd prebuilts/clang/bin/clang++ \$$(cat out/flags.rsp) -c -o $out $in)"
//! build out/obj/foo.o: rule123 external/foo/foo.cpp | deps
//! ```
//!
//! A module's rules are found by looking for its name in the `description`.
//! The `command` is a shell wrapper around the real compiler call, so
//! `$(cat ...)` substitutions are inlined and the clang invocation is cut out
//! of the surrounding `( ... )` subshells.
//!
//! Rule templates and `$(cat ...)` contents are graph-global and stay cached
//! across module queries. The scan itself is repeated for every module.

use crate::arguments::parse_arguments;
use crate::compdb::{CompilationDatabase, CompileCommandEntry};
use crate::error::{CompdbError, CompdbResult};
use crate::lines::lossy_lines;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Compiler drivers whose invocation is extracted from a command
const COMPILER_SUFFIXES: &[&str] = &["/clang", "/clang++"];

/// Outputs of these kinds are never compile invocations
const SKIPPED_SOURCE_SUFFIXES: &[&str] = &[".S", ".o"];

/// Where the scanner stands relative to the queried module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No rule header seen yet
    SeekRule,
    /// The current description does not mention the module
    SeekDescription,
    /// The current description mentions the module
    Active,
}

impl ScanState {
    /// State after reading `line` while scanning for `module`
    pub fn next(self, line: &LegacyLine<'_>, module: &str) -> Self {
        match line {
            LegacyLine::Rule(_) if self == ScanState::SeekRule => ScanState::SeekDescription,
            LegacyLine::Description(description) if describes_module(description, module) => {
                ScanState::Active
            }
            LegacyLine::Description(_) => ScanState::SeekDescription,
            _ => self,
        }
    }
}

/// Whether a rule description belongs to `module` (its 32-bit variant excluded)
fn describes_module(description: &str, module: &str) -> bool {
    description.contains(module) && !description.contains(&format!("{module}_32"))
}

/// One classified line of the Kati graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyLine<'a> {
    Rule(&'a str),
    Description(&'a str),
    Command(&'a str),
    Build { rule: &'a str, file: &'a str },
    Other,
}

/// Flattened contents of files referenced by `$(cat ...)`
///
/// Relative paths are read from the Android root. Unreadable files are cached
/// as empty.
#[derive(Debug, Default)]
pub struct CatCache {
    root_dir: PathBuf,
    contents: HashMap<String, String>,
}

impl CatCache {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            contents: HashMap::new(),
        }
    }

    /// Contents of `file_name` with newlines turned into spaces, trimmed
    pub fn cat(&mut self, file_name: &str) -> String {
        if let Some(content) = self.contents.get(file_name) {
            return content.clone();
        }

        let content = match std::fs::read(self.root_dir.join(file_name)) {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .replace('\n', " ")
                .trim()
                .to_string(),
            Err(e) => {
                warn!("Failed to read {} for $(cat): {}", file_name, e);
                String::new()
            }
        };

        self.contents.insert(file_name.to_string(), content.clone());
        content
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.contents.get(file_name).map(|s| s.as_str())
    }
}

/// Cut the compiler invocation out of a wrapper command
///
/// Leading space-delimited tokens are dropped until one ends in `/clang` or
/// `/clang++`. The rest is trimmed and loses one trailing `"`. Returns `None`
/// when no compiler token is found.
pub fn locate_compiler(command: &str) -> Option<&str> {
    let mut rest = command;

    while !rest.is_empty() {
        let token_end = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == ' ')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        let token = &rest[..token_end];
        if COMPILER_SUFFIXES.iter().any(|suffix| token.ends_with(suffix)) {
            break;
        }
        rest = &rest[token_end..];
    }

    let command = rest.trim();
    if command.is_empty() {
        return None;
    }
    Some(command.strip_suffix('"').unwrap_or(command))
}

struct LegacyPatterns {
    rule: Regex,
    description: Regex,
    command: Regex,
    build: Regex,
    cat: Regex,
    subcommand: Regex,
}

impl LegacyPatterns {
    fn new() -> Self {
        Self {
            rule: Regex::new(r"^\s*rule\s+(\S+)$").unwrap(),
            description: Regex::new(r"^\s*description\s*=\s*(.+)$").unwrap(),
            command: Regex::new(r"^\s*command\s*=\s*(.+)$").unwrap(),
            build: Regex::new(r"^\s*build\s+.*:\s*(?P<rule>\S+)\s+(?P<file>\S+)").unwrap(),
            // Ninja-escaped `\$$(cat path)` as well as plain `$(cat path)`
            cat: Regex::new(r"\\?\$\$?\(\s*cat\s+([^)]+)\)").unwrap(),
            subcommand: Regex::new(r"\(([^)]*)\)").unwrap(),
        }
    }

    fn classify<'a>(&self, line: &'a str) -> LegacyLine<'a> {
        if let Some(caps) = self.rule.captures(line) {
            return LegacyLine::Rule(caps.get(1).map_or("", |m| m.as_str()));
        }
        if let Some(caps) = self.description.captures(line) {
            return LegacyLine::Description(caps.get(1).map_or("", |m| m.as_str()));
        }
        if let Some(caps) = self.command.captures(line) {
            return LegacyLine::Command(caps.get(1).map_or("", |m| m.as_str()));
        }
        if let Some(caps) = self.build.captures(line) {
            if let (Some(rule), Some(file)) = (caps.name("rule"), caps.name("file")) {
                return LegacyLine::Build {
                    rule: rule.as_str(),
                    file: file.as_str(),
                };
            }
        }
        LegacyLine::Other
    }
}

/// Query component for the Kati graph
pub struct LegacyRuleResolver {
    ninja_file: PathBuf,
    root_dir: PathBuf,
    /// Command template per rule name, last definition wins
    rules: HashMap<String, String>,
    cat_cache: CatCache,
    patterns: LegacyPatterns,
}

impl LegacyRuleResolver {
    pub fn new(ninja_file: impl Into<PathBuf>, root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        Self {
            ninja_file: ninja_file.into(),
            cat_cache: CatCache::new(root_dir.clone()),
            root_dir,
            rules: HashMap::new(),
            patterns: LegacyPatterns::new(),
        }
    }

    /// Classify a single graph line
    pub fn classify<'a>(&self, line: &'a str) -> LegacyLine<'a> {
        self.patterns.classify(line)
    }

    /// Stored command template for `rule_name`
    pub fn rule(&self, rule_name: &str) -> Option<&str> {
        self.rules.get(rule_name).map(|s| s.as_str())
    }

    /// Cached `$(cat ...)` contents for `file_name`, if it was read already
    pub fn cached_cat(&self, file_name: &str) -> Option<&str> {
        self.cat_cache.get(file_name)
    }

    /// Append the compile commands of `module` to `compdb`
    ///
    /// Streams the whole graph from the start. Returns the number of entries
    /// appended.
    pub fn get_build_cmd_for_module(
        &mut self,
        module: &str,
        compdb: &mut CompilationDatabase,
    ) -> CompdbResult<usize> {
        let file =
            File::open(&self.ninja_file).map_err(|e| CompdbError::Io(self.ninja_file.clone(), e))?;
        self.scan(BufReader::new(file), module, compdb)
            .map_err(|e| CompdbError::Io(self.ninja_file.clone(), e))
    }

    /// Scan graph text for the rules of `module`
    pub fn scan<R: BufRead>(
        &mut self,
        reader: R,
        module: &str,
        compdb: &mut CompilationDatabase,
    ) -> std::io::Result<usize> {
        let mut state = ScanState::SeekRule;
        let mut rule_name: Option<String> = None;
        let mut emitted = 0;

        for line in lossy_lines(reader) {
            let line = line?;
            let classified = self.patterns.classify(&line);
            state = state.next(&classified, module);

            match classified {
                LegacyLine::Rule(name) => rule_name = Some(name.to_string()),
                LegacyLine::Command(template) if state == ScanState::Active => {
                    if let Some(name) = &rule_name {
                        self.rules.insert(name.clone(), template.to_string());
                    }
                }
                LegacyLine::Build { rule, file } if state == ScanState::Active => {
                    if let Some(entry) = self.resolve_build(rule, file) {
                        compdb.push(entry);
                        emitted += 1;
                    }
                }
                _ => {}
            }
        }

        info!("module {}: {} compile commands", module, emitted);
        Ok(emitted)
    }

    fn resolve_build(&mut self, rule: &str, file: &str) -> Option<CompileCommandEntry> {
        let template = self.rules.get(rule)?;

        if SKIPPED_SOURCE_SUFFIXES.iter().any(|suffix| file.ends_with(suffix)) {
            debug!("skipping {} (not a compile input)", file);
            return None;
        }

        let cat_cache = &mut self.cat_cache;
        let command = self
            .patterns
            .cat
            .replace_all(template, |caps: &Captures| cat_cache.cat(caps[1].trim()))
            .into_owned();

        let mut subcommands = self
            .patterns
            .subcommand
            .captures_iter(&command)
            .filter_map(|caps| caps.get(1))
            .peekable();

        let compiler_command = if subcommands.peek().is_none() {
            locate_compiler(&command)
        } else {
            subcommands.find_map(|subcommand| locate_compiler(subcommand.as_str()))
        }?;

        debug!("build cmd for {}: {}", file, compiler_command);
        Some(CompileCommandEntry {
            directory: self.root_dir.clone(),
            file: file.to_string(),
            arguments: parse_arguments(compiler_command),
        })
    }
}
