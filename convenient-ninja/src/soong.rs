// Compile commands for Android.bp modules from out/soong/build.ninja

use crate::build_edge::BuildEdgeExtractor;
use crate::compdb::CompilationDatabase;
use crate::error::CompdbResult;
use crate::module_index::ModuleBlockIndex;
use std::path::PathBuf;
use tracing::{info, warn};

/// Query component for the Soong graph
///
/// The module index is built on the first query and reused, read-only, by
/// every later one.
#[derive(Debug)]
pub struct SoongNinja {
    ninja_file: PathBuf,
    root_dir: PathBuf,
    index: Option<ModuleBlockIndex>,
}

impl SoongNinja {
    pub fn new(ninja_file: impl Into<PathBuf>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            ninja_file: ninja_file.into(),
            root_dir: root_dir.into(),
            index: None,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    fn index(&mut self) -> CompdbResult<&ModuleBlockIndex> {
        let index = match self.index.take() {
            Some(index) => index,
            None => ModuleBlockIndex::from_file(&self.ninja_file)?,
        };
        Ok(&*self.index.insert(index))
    }

    /// Append the compile commands of `module` to `compdb`
    ///
    /// A module without a block in the graph contributes nothing. Returns the
    /// number of entries appended.
    pub fn get_build_cmd_for_module(
        &mut self,
        module: &str,
        compdb: &mut CompilationDatabase,
    ) -> CompdbResult<usize> {
        let root_dir = self.root_dir.clone();
        let index = self.index()?;

        let Some(fragment) = index.fragment_for(module) else {
            warn!("module {} not found in soong build.ninja", module);
            return Ok(0);
        };

        let emitted = BuildEdgeExtractor::new(index.variables(), root_dir)
            .extract(&fragment.raw_text, compdb);
        info!(
            "module {} ({}): {} compile commands",
            module, fragment.variant, emitted
        );
        Ok(emitted)
    }
}
