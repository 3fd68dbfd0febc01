use clap::{Args, Parser};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.typefold.toml):
  Create this file in the root of the generated tree to set defaults.

  [typefold]
  # Path filters
  exclude_folders = [\"fixtures\", \"golden\"]
  extensions = [\"rs\"]

  # Consolidation
  generated_only = false     # Only touch files carrying the generated banner
  import_prefix = \"crate::resources\"  # Path prefix for injected imports

  A Cargo.toml with the same keys under [package.metadata.typefold] is
  used as a fallback when no .typefold.toml is found.
";

/// Options for output formatting and verbosity.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputOptions {
    /// Output the run report as raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output for debugging (shows files being processed).
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode: no report, no summary; rely on the exit code.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Command line interface configuration using `clap`.
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "typefold - folds duplicate declarations in generated Rust sources into one canonical copy",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Directory of generated sources to consolidate.
    /// Defaults to the current directory.
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Report what would change without writing any file.
    #[arg(long)]
    pub dry_run: bool,

    /// Output formatting options.
    #[command(flatten)]
    pub output: OutputOptions,

    /// Folders to exclude from the walk.
    #[arg(long = "exclude-folder", alias = "exclude-folders")]
    pub exclude_folders: Vec<String>,

    /// Only process files carrying the generated-code banner.
    #[arg(long)]
    pub generated_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["typefold"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        assert!(!cli.dry_run);
        assert!(!cli.output.json);
        assert!(!cli.generated_only);
        assert!(cli.exclude_folders.is_empty());
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "typefold",
            "crate/src/resources",
            "--dry-run",
            "--json",
            "--exclude-folder",
            "fixtures",
            "--exclude-folder",
            "golden",
            "--generated-only",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("crate/src/resources"));
        assert!(cli.dry_run);
        assert!(cli.output.json);
        assert!(cli.output.verbose);
        assert_eq!(cli.exclude_folders, vec!["fixtures", "golden"]);
        assert!(cli.generated_only);
    }

    #[test]
    fn test_quiet_short_flag() {
        let cli = Cli::try_parse_from(["typefold", "-q"]).unwrap();
        assert!(cli.output.quiet);
    }
}
