// Compilation database sink shared by both ninja resolvers

use crate::error::{CompdbError, CompdbResult};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// One `compile_commands.json` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommandEntry {
    /// Absolute directory the compiler runs in
    pub directory: PathBuf,
    pub file: String,
    pub arguments: Vec<String>,
}

/// Append-only, ordered list of entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilationDatabase {
    entries: Vec<CompileCommandEntry>,
}

impl CompilationDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CompileCommandEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CompileCommandEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as a JSON array, indented by one space per level
    pub fn write_json<W: Write>(&self, writer: W) -> CompdbResult<()> {
        let mut serializer =
            serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(b" "));
        self.serialize(&mut serializer)?;
        Ok(())
    }

    /// Write the JSON rendering to `path`
    pub fn write_to(&self, path: &Path) -> CompdbResult<()> {
        let io_error = |e| CompdbError::Io(path.to_path_buf(), e);
        let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
        self.write_json(&mut writer)?;
        writer.flush().map_err(io_error)?;
        info!("wrote {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(file: &str) -> CompileCommandEntry {
        CompileCommandEntry {
            directory: PathBuf::from("/aosp"),
            file: file.to_string(),
            arguments: vec!["/t/clang".to_string(), "-c".to_string()],
        }
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut compdb = CompilationDatabase::new();
        assert!(compdb.is_empty());

        compdb.push(entry("b.cpp"));
        compdb.push(entry("a.cpp"));

        let files: Vec<_> = compdb.entries().iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["b.cpp", "a.cpp"]);
        assert_eq!(compdb.len(), 2);
    }

    fn json(compdb: &CompilationDatabase) -> String {
        let mut buf = Vec::new();
        compdb.write_json(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_json_shape() {
        let mut compdb = CompilationDatabase::new();
        compdb.push(entry("src/foo.cpp"));

        let json = json(&compdb);
        assert!(json.starts_with("[\n {\n  \"directory\": \"/aosp\","));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["file"], "src/foo.cpp");
        assert_eq!(value[0]["arguments"][0], "/t/clang");
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_database_is_empty_array() {
        assert_eq!(json(&CompilationDatabase::new()), "[]");
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("compile_commands.json");

        let mut compdb = CompilationDatabase::new();
        compdb.push(entry("src/foo.cpp"));
        compdb.write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, json(&compdb));
        let read: Vec<CompileCommandEntry> = serde_json::from_str(&written).unwrap();
        assert_eq!(read, compdb.entries());
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("compile_commands.json");

        let err = CompilationDatabase::new().write_to(&path).unwrap_err();
        assert!(matches!(err, CompdbError::Io(p, _) if p == path));
    }
}
