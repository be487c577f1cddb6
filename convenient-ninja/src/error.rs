use std::path::PathBuf;

/// Compilation database error types
///
/// Only the three startup preconditions abort a run. Everything that goes
/// wrong for a single module, edge, `$(cat ...)` file or variable reference is
/// logged and absorbed where it happens.
#[derive(Debug, thiserror::Error)]
pub enum CompdbError {
    /// Directory to scan for build descriptions does not exist
    #[error("source directory not found: {0}")]
    SourceRootMissing(PathBuf),

    /// Kati graph `out/build-<target>.ninja` does not exist
    #[error("build target ninja file not found: {0}")]
    TargetNinjaMissing(PathBuf),

    /// Soong graph `out/soong/build.ninja` does not exist
    #[error("soong build.ninja file not found: {0}")]
    SoongNinjaMissing(PathBuf),

    /// `Android.mk` / `Android.bp` vanished between discovery and parsing
    #[error("build description not found: {0}")]
    BuildDescriptionMissing(PathBuf),

    /// File system I/O error
    #[error("IO error at {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Compilation database could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompdbError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CompdbError::SourceRootMissing(_) => 3,
            CompdbError::TargetNinjaMissing(_) => 4,
            CompdbError::SoongNinjaMissing(_) => 5,
            _ => 1,
        }
    }
}

pub type CompdbResult<T> = Result<T, CompdbError>;
