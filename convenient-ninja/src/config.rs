use crate::error::{CompdbError, CompdbResult};
use std::path::PathBuf;

/// Inputs of one generator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompdbConfig {
    /// Android source tree root, the directory ninja runs in
    pub android_root: PathBuf,
    /// Lunch target, selects `out/build-<target>.ninja`
    pub target: String,
    /// Directory scanned for `Android.mk` / `Android.bp` files
    pub src: PathBuf,
    /// Where `compile_commands.json` is written
    pub output: PathBuf,
}

impl CompdbConfig {
    pub fn new(
        android_root: impl Into<PathBuf>,
        target: impl Into<String>,
        src: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            android_root: android_root.into(),
            target: target.into(),
            src: src.into(),
            output: output.into(),
        }
    }

    /// Kati graph for [`Self::target`]
    pub fn target_ninja(&self) -> PathBuf {
        self.android_root
            .join("out")
            .join(format!("build-{}.ninja", self.target))
    }

    /// Soong graph
    pub fn soong_ninja(&self) -> PathBuf {
        self.android_root.join("out").join("soong").join("build.ninja")
    }

    /// Fails when the source directory to scan does not exist
    pub fn validate(&self) -> CompdbResult<()> {
        if !self.src.is_dir() {
            return Err(CompdbError::SourceRootMissing(self.src.clone()));
        }
        Ok(())
    }
}
