//! Shared entry point behind every `typefold` binary.

use crate::cli::Cli;
use crate::config::Config;
use crate::constants::{DEFAULT_EXTENSION, DEFAULT_IMPORT_PREFIX};
use crate::engine::{FoldOptions, Typefold};
use anyhow::Result;
use clap::Parser;

/// Runs the consolidator with the given arguments.
///
/// # Errors
///
/// Returns an error if argument parsing fails, or if the run aborts fatally.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run typefold with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
///
/// # Errors
///
/// Returns an error if argument parsing fails, or if the run aborts fatally.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["typefold".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => {
            match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    // Let clap print help/version as intended, but captured by redirect
                    write!(writer, "{e}")?;
                    writer.flush()?;
                    return Ok(0);
                }
                _ => {
                    eprint!("{e}");
                    return Ok(1);
                }
            }
        }
    };

    if !cli_var.path.exists() {
        eprintln!(
            "Error: The directory '{}' does not exist.",
            cli_var.path.display()
        );
        return Ok(1);
    }
    if !cli_var.path.is_dir() {
        eprintln!("Error: '{}' is not a directory.", cli_var.path.display());
        return Ok(1);
    }

    let config = match Config::load_from_path(&cli_var.path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return Ok(1);
        }
    };

    let mut exclude_folders = config.typefold.exclude_folders.clone().unwrap_or_default();
    exclude_folders.extend(cli_var.exclude_folders.clone());

    let extensions = config
        .typefold
        .extensions
        .clone()
        .unwrap_or_else(|| vec![DEFAULT_EXTENSION.to_owned()]);
    let generated_only = cli_var.generated_only || config.typefold.generated_only.unwrap_or(false);
    let import_prefix = config
        .typefold
        .import_prefix
        .clone()
        .unwrap_or_else(|| DEFAULT_IMPORT_PREFIX.to_owned());

    if !cli_var.output.json && !cli_var.output.quiet {
        crate::output::print_exclusion_list(writer, &exclude_folders).ok();
    }

    // Print verbose configuration info (before progress bar)
    if cli_var.output.verbose && !cli_var.output.json {
        eprintln!("[VERBOSE] typefold v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("[VERBOSE] Configuration:");
        eprintln!("   Path: {}", cli_var.path.display());
        eprintln!("   Generated-only: {generated_only}");
        eprintln!("   Import prefix: {import_prefix}");
        eprintln!("   Extensions: {extensions:?}");
        if !exclude_folders.is_empty() {
            eprintln!("   Exclude folders: {exclude_folders:?}");
        }
        if let Some(ref config_file) = config.config_file_path {
            eprintln!("   Config file: {}", config_file.display());
        }
        if cli_var.dry_run {
            eprintln!("   Dry-run: enabled");
        }
        eprintln!();
    }

    let options = FoldOptions {
        exclude_folders,
        extensions,
        generated_only,
        import_prefix,
        dry_run: cli_var.dry_run,
        verbose: cli_var.output.verbose && !cli_var.output.json,
    };
    let mut engine = Typefold::new(options);

    // Count files first to create progress bar with accurate total
    let total_files = engine.count_files(&cli_var.path);

    let progress: Option<indicatif::ProgressBar> =
        if cli_var.output.json || cli_var.output.quiet {
            None
        } else if total_files > 0 {
            Some(crate::output::create_progress_bar(total_files as u64))
        } else {
            Some(crate::output::create_spinner())
        };

    let result = engine.run(&cli_var.path);
    if let Some(p) = progress {
        p.finish_and_clear();
    }
    let report = result?;

    if cli_var.output.verbose && !cli_var.output.json {
        eprintln!("[VERBOSE] Consolidation completed in {}ms", report.elapsed_ms);
        eprintln!("   Files scanned: {}", report.files_scanned);
        eprintln!("   Files skipped: {}", report.files_skipped);
        eprintln!("   Declarations seen: {}", report.declarations_seen);
        eprintln!();
    }

    if cli_var.output.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else if !cli_var.output.quiet {
        crate::output::print_report(writer, &report)?;
        crate::output::print_summary_line(writer, &report)?;
        if report.dry_run {
            crate::output::print_dry_run_marker(writer)?;
        }
        crate::output::print_time(writer, &report)?;
    }

    crate::output::print_collision_warnings(&report);

    Ok(0)
}
