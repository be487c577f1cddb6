// Module discovery in Android.mk / Android.bp files
// A line scan for module names, no makefile or blueprint evaluation

use crate::error::{CompdbError, CompdbResult};
use crate::lines::lossy_lines;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Which ninja graph a build description feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildFileKind {
    /// `*.mk`, built through Kati
    AndroidMk,
    /// `*.bp`, built through Soong
    AndroidBp,
    Unknown,
}

impl BuildFileKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("mk") => BuildFileKind::AndroidMk,
            Some("bp") => BuildFileKind::AndroidBp,
            _ => BuildFileKind::Unknown,
        }
    }
}

/// Module names declared by one build description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescription {
    pub path: PathBuf,
    kind: BuildFileKind,
    local_modules: Vec<String>,
}

impl BuildDescription {
    /// Read the module names declared in `path`
    pub fn parse_file(path: &Path) -> CompdbResult<Self> {
        if !path.exists() {
            return Err(CompdbError::BuildDescriptionMissing(path.to_path_buf()));
        }

        let kind = BuildFileKind::from_path(path);
        let local_modules = match kind {
            BuildFileKind::Unknown => Vec::new(),
            _ => {
                let file = File::open(path).map_err(|e| CompdbError::Io(path.to_path_buf(), e))?;
                Self::parse_modules(BufReader::new(file), kind)
                    .map_err(|e| CompdbError::Io(path.to_path_buf(), e))?
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            local_modules,
        })
    }

    /// Module names from build description text of the given kind
    pub fn parse_modules<R: BufRead>(reader: R, kind: BuildFileKind) -> std::io::Result<Vec<String>> {
        let pattern = match kind {
            BuildFileKind::AndroidMk => Regex::new(r"^\s*LOCAL_MODULE\s*:=\s*(.+)$").unwrap(),
            BuildFileKind::AndroidBp => Regex::new(r#"^\s*name\s*:\s*"(.+)""#).unwrap(),
            BuildFileKind::Unknown => return Ok(Vec::new()),
        };

        let mut modules = Vec::new();
        for line in lossy_lines(reader) {
            let line = line?;
            let Some(caps) = pattern.captures(&line) else {
                continue;
            };

            let module = match kind {
                BuildFileKind::AndroidBp => caps[1].replace("\",", "").trim().to_string(),
                _ => caps[1].trim().to_string(),
            };
            info!("found LOCAL_MODULE: {}", module);
            modules.push(module);
        }
        Ok(modules)
    }

    pub fn kind(&self) -> BuildFileKind {
        self.kind
    }

    pub fn local_modules(&self) -> &[String] {
        &self.local_modules
    }
}

fn is_build_description(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && BuildFileKind::from_path(entry.path()) != BuildFileKind::Unknown
}

/// Every `.mk` and `.bp` file below `src`, in file name order
pub fn find_build_descriptions(src: &Path) -> Vec<PathBuf> {
    info!("Searching for build descriptions in {}", src.display());
    let mut found = Vec::new();

    let walker = WalkDir::new(src)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();
    for entry in walker {
        match entry {
            Ok(entry) if is_build_description(&entry) => {
                debug!("Found build description: {}", entry.path().display());
                found.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("Error reading directory entry: {}", e),
        }
    }

    found
}
