// Both Android ninja graphs behind one dispatcher

use crate::build_description::BuildFileKind;
use crate::compdb::CompilationDatabase;
use crate::config::CompdbConfig;
use crate::error::{CompdbError, CompdbResult};
use crate::legacy_rules::LegacyRuleResolver;
use crate::soong::SoongNinja;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// The Kati and Soong graphs of one Android tree and the database they feed
pub struct NinjaGraphs {
    root_dir: PathBuf,
    kati: LegacyRuleResolver,
    soong: SoongNinja,
    compdb: CompilationDatabase,
}

impl NinjaGraphs {
    /// Locate both graphs below the configured Android root
    ///
    /// A missing graph is fatal for the whole run.
    pub fn open(config: &CompdbConfig) -> CompdbResult<Self> {
        let target_ninja = config.target_ninja();
        if !target_ninja.exists() {
            error!("not exist build target ninja file: {}", target_ninja.display());
            return Err(CompdbError::TargetNinjaMissing(target_ninja));
        }

        let soong_ninja = config.soong_ninja();
        if !soong_ninja.exists() {
            error!("not exist soong/build.ninja file: {}", soong_ninja.display());
            return Err(CompdbError::SoongNinjaMissing(soong_ninja));
        }

        let root_dir = std::path::absolute(&config.android_root)
            .map_err(|e| CompdbError::Io(config.android_root.clone(), e))?;
        info!("android root: {}", root_dir.display());

        Ok(Self {
            kati: LegacyRuleResolver::new(target_ninja, root_dir.clone()),
            soong: SoongNinja::new(soong_ninja, root_dir.clone()),
            root_dir,
            compdb: CompilationDatabase::new(),
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Append the compile commands of `module` from the graph matching `kind`
    ///
    /// Returns the number of entries appended.
    pub fn get_build_cmd_for_module(
        &mut self,
        module: &str,
        kind: BuildFileKind,
    ) -> CompdbResult<usize> {
        info!("get build command for module: {}", module);
        match kind {
            BuildFileKind::AndroidMk => self.kati.get_build_cmd_for_module(module, &mut self.compdb),
            BuildFileKind::AndroidBp => {
                self.soong.get_build_cmd_for_module(module, &mut self.compdb)
            }
            BuildFileKind::Unknown => {
                debug!("no ninja graph for module {}", module);
                Ok(0)
            }
        }
    }

    pub fn compdb(&self) -> &CompilationDatabase {
        &self.compdb
    }

    pub fn into_compdb(self) -> CompilationDatabase {
        self.compdb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path) -> CompdbConfig {
        CompdbConfig::new(root, "test", root, root.join("compile_commands.json"))
    }

    #[test]
    fn test_missing_target_ninja() {
        let temp_dir = TempDir::new().unwrap();
        let err = NinjaGraphs::open(&config(temp_dir.path())).err().unwrap();
        assert!(matches!(err, CompdbError::TargetNinjaMissing(_)));
    }

    #[test]
    fn test_missing_soong_ninja() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("out")).unwrap();
        fs::write(temp_dir.path().join("out/build-test.ninja"), "").unwrap();

        let err = NinjaGraphs::open(&config(temp_dir.path())).err().unwrap();
        assert!(matches!(err, CompdbError::SoongNinjaMissing(_)));
    }

    #[test]
    fn test_unknown_kind_is_a_no_op() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("out/soong")).unwrap();
        fs::write(temp_dir.path().join("out/build-test.ninja"), "").unwrap();
        fs::write(temp_dir.path().join("out/soong/build.ninja"), "").unwrap();

        let mut graphs = NinjaGraphs::open(&config(temp_dir.path())).unwrap();
        assert!(graphs.root_dir().is_absolute());
        assert_eq!(
            graphs
                .get_build_cmd_for_module("libfoo", BuildFileKind::Unknown)
                .unwrap(),
            0
        );
        assert!(graphs.into_compdb().is_empty());
    }
}
