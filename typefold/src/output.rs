use crate::report::RunReport;
use crate::scanner::BlockKind;
use crate::utils::normalize_display_path;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Print the exclusion list in styled format.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_exclusion_list(writer: &mut impl Write, folders: &[String]) -> std::io::Result<()> {
    if folders.is_empty() {
        let defaults = crate::constants::get_default_exclude_folders();
        let mut sorted_defaults: Vec<&str> = defaults.iter().copied().collect();
        sorted_defaults.sort_unstable();
        let list = sorted_defaults.join(", ");
        writeln!(
            writer,
            "{} {}",
            "[OK] Using default exclusions only:".green(),
            list.dimmed()
        )?;
    } else {
        let list = folders
            .iter()
            .map(std::string::String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(writer, "{} {}", "Excluding:".yellow().bold(), list)?;
    }
    Ok(())
}

/// Create and return a spinner for runs with an unknown file count.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_spinner() -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("typefold consolidating…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Create a progress bar with file count (used when total files is known).
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_progress_bar(total_files: u64) -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("consolidating...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.tick();
    pb
}

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        "║  Typefold Consolidation Results        ║".cyan().bold()
    )?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Helper to create a styled table
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Helper to map a block kind to a table color
fn get_kind_color(kind: BlockKind) -> Color {
    match kind {
        BlockKind::Struct => Color::Cyan,
        BlockKind::Enum => Color::Magenta,
        BlockKind::Impl => Color::White,
    }
}

/// Print the duplicate group table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_group_table(writer: &mut impl Write, report: &RunReport) -> std::io::Result<()> {
    if report.groups.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "Consolidated Declarations".bold().underline())?;

    let mut table = create_table(vec![
        "Kind",
        "Name",
        "Identity",
        "Canonical",
        "Duplicates",
        "Impls",
    ]);

    for group in &report.groups {
        let canonical = format!(
            "{}:{}",
            normalize_display_path(&group.canonical.file),
            group.canonical.line
        );

        table.add_row(vec![
            Cell::new(group.kind.label()).fg(get_kind_color(group.kind)),
            Cell::new(&group.name).add_attribute(Attribute::Bold),
            Cell::new(&group.identity[..8]).add_attribute(Attribute::Dim),
            Cell::new(canonical),
            Cell::new(group.duplicates.len()),
            Cell::new(group.impls.len()),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print summary with colored "pills".
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary_pills(writer: &mut impl Write, report: &RunReport) -> std::io::Result<()> {
    fn pill(label: &str, count: usize) -> String {
        if count == 0 {
            format!("{}: {}", label, count.to_string().green())
        } else {
            format!("{}: {}", label, count.to_string().red().bold())
        }
    }

    writeln!(
        writer,
        "{}  {}  {}  {}",
        pill("Groups", report.duplicate_groups),
        pill("Duplicates", report.duplicates_removed),
        pill("Impls", report.impls_consolidated),
        pill("Rewritten", report.files_rewritten),
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Print the full report.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
pub fn print_report(writer: &mut impl Write, report: &RunReport) -> std::io::Result<()> {
    print_header(writer)?;

    if report.is_clean() {
        writeln!(
            writer,
            "\x1b[32m✓ All clean! No duplicate declarations found.\x1b[0m"
        )?;
        return Ok(());
    }

    print_group_table(writer, report)?;
    print_summary_pills(writer, report)?;
    Ok(())
}

/// Print the `[SUMMARY]` line with the headline counts.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary_line(writer: &mut impl Write, report: &RunReport) -> std::io::Result<()> {
    writeln!(
        writer,
        "\n[SUMMARY] {} duplicate groups, {} duplicates removed, {} impls consolidated, {} files rewritten",
        report.duplicate_groups,
        report.duplicates_removed,
        report.impls_consolidated,
        report.files_rewritten
    )
}

/// Print the `[TIME]` line.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_time(writer: &mut impl Write, report: &RunReport) -> std::io::Result<()> {
    writeln!(writer, "\n[TIME] Completed in {}ms", report.elapsed_ms)
}

/// Print the `[DRY-RUN]` marker line.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_dry_run_marker(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        writer,
        "\n{}",
        "[DRY-RUN] No files were written".yellow().bold()
    )
}

/// Print a `[WARN]` line on stderr for every identity collision.
pub fn print_collision_warnings(report: &RunReport) {
    for collision in &report.collisions {
        eprintln!(
            "[WARN] identity collision on `{}` at {}:{}; declaration left untouched",
            collision.name,
            normalize_display_path(&collision.site.file),
            collision.site.line
        );
    }
}
