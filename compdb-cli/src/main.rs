//! gen-compdb - compile_commands.json for Android modules
//!
//! Usage:
//!   gen-compdb --target aosp_arm64 --android-root /aosp --src /aosp/external/foo

use clap::{Parser, crate_version};
use convenient_ninja::{
    BuildDescription, CompdbConfig, CompdbResult, NinjaGraphs, find_build_descriptions,
};
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info, span, warn};
use tracing_subscriber::FmtSubscriber;

/// Generate compile_commands.json for all local modules in path
#[derive(Parser)]
#[command(version = crate_version!())]
struct Opts {
    /// Build target, selects out/build-<target>.ninja
    #[arg(short, long, env = "TARGET_PRODUCT")]
    target: String,

    /// Android root directory
    #[arg(short, long, env = "ANDROID_BUILD_TOP")]
    android_root: PathBuf,

    /// Path to scan for Android.mk / Android.bp files
    #[arg(short, long)]
    src: PathBuf,

    /// Where to write the compilation database
    #[arg(short, long, default_value = "compile_commands.json")]
    output: PathBuf,

    /// Log level: DEBUG, INFO, WARN or ERROR
    #[arg(long, default_value = "INFO", env = "COMPDB_LOG")]
    log_level: String,

    /// Print debug information
    #[arg(short, long)]
    debug: bool,
}

impl Opts {
    fn config(&self) -> CompdbConfig {
        CompdbConfig::new(&self.android_root, &self.target, &self.src, &self.output)
    }
}

/// Gets the log level enum variant from a level string
///
/// Unknown strings fall back to `Level::INFO`
pub fn get_log_level(level: &str) -> Level {
    match level.to_uppercase().as_ref() {
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARN" => Level::WARN,
        "ERROR" => Level::ERROR,
        "FATAL" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn run(config: &CompdbConfig) -> CompdbResult<()> {
    config.validate()?;
    let mut graphs = NinjaGraphs::open(config)?;

    for path in find_build_descriptions(&config.src) {
        let span = span!(Level::INFO, "build_description", path = %path.display());
        let _enter = span.enter();

        let description = match BuildDescription::parse_file(&path) {
            Ok(description) => description,
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };

        for module in description.local_modules() {
            graphs.get_build_cmd_for_module(module, description.kind())?;
        }
    }

    graphs.compdb().write_to(&config.output)
}

fn main() {
    // Get the command line arguments
    let opts: Opts = Opts::parse();

    let log_level = if opts.debug {
        Level::DEBUG
    } else {
        get_log_level(&opts.log_level)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {}", e);
    }

    let config = opts.config();
    info!(
        "generating {} for {} (target {})",
        config.output.display(),
        config.src.display(),
        config.target
    );

    if let Err(e) = run(&config) {
        error!("{}", e);
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_get_log_level() {
        assert_eq!(get_log_level("debug"), Level::DEBUG);
        assert_eq!(get_log_level("WARN"), Level::WARN);
        assert_eq!(get_log_level("fatal"), Level::ERROR);
        assert_eq!(get_log_level("chatty"), Level::INFO);
    }

    #[test]
    fn test_opts_are_consistent() {
        Opts::command().debug_assert();
    }

    #[test]
    fn test_opts_to_config() {
        let opts = Opts::try_parse_from([
            "gen-compdb",
            "--target",
            "aosp_arm64",
            "--android-root",
            "/aosp",
            "--src",
            "/aosp/external/foo",
        ])
        .unwrap();

        let config = opts.config();
        assert_eq!(config.output, PathBuf::from("compile_commands.json"));
        assert_eq!(config.target_ninja(), PathBuf::from("/aosp/out/build-aosp_arm64.ninja"));
        assert!(!opts.debug);
    }

    #[test]
    fn test_run_reports_missing_source() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = CompdbConfig::new(
            temp_dir.path(),
            "test",
            temp_dir.path().join("missing"),
            temp_dir.path().join("out.json"),
        );

        assert_eq!(run(&config).unwrap_err().exit_code(), 3);
    }
}
