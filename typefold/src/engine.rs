//! Two-phase consolidation over a directory of generated sources.
//!
//! Phase 1 scans every file in fixed order, feeding declarations into the
//! registry and recording removals; each file with removals is rewritten
//! once through the edit list. Phase 2 replays the parked impl blocks
//! under their canonical declarations. All content goes through one
//! read/write seam holding an in-memory overlay, which is also how
//! dry-run keeps the disk untouched while the report stays accurate.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::canonical::{canonical_text, declaration_name, identity_of};
use crate::constants::{provenance_comment, DEFAULT_EXTENSION, DEFAULT_IMPORT_PREFIX, GENERATED_BANNER};
use crate::registry::{AssociatedImpl, Occurrence, RegisterOutcome, Registry};
use crate::report::{CollisionReport, RewrittenFile, RunReport, Site};
use crate::resolver::impl_target;
use crate::rewriter::{ByteRangeRewriter, Edit, RewriteError};
use crate::scanner::{self, BlockKind};
use crate::utils::{collect_source_files, normalize_display_path, LineIndex};

/// Options controlling a consolidation run
#[derive(Debug, Clone)]
pub struct FoldOptions {
    /// Folder names excluded from the walk, on top of the defaults
    pub exclude_folders: Vec<String>,
    /// File extensions to process
    pub extensions: Vec<String>,
    /// Only process files carrying the generated-code banner
    pub generated_only: bool,
    /// Module path prefix for injected import statements
    pub import_prefix: String,
    /// Leave the disk untouched, writing only to the overlay
    pub dry_run: bool,
    /// Per-file diagnostics on stderr
    pub verbose: bool,
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self {
            exclude_folders: Vec::new(),
            extensions: vec![DEFAULT_EXTENSION.to_owned()],
            generated_only: false,
            import_prefix: DEFAULT_IMPORT_PREFIX.to_owned(),
            dry_run: false,
            verbose: false,
        }
    }
}

/// Fatal failure of a consolidation run
#[derive(Debug, thiserror::Error)]
pub enum ConsolidateError {
    /// The canonical declaration could not be relocated during reinsertion.
    /// Skipping would silently drop the impl blocks parked on it.
    #[error("cannot relocate canonical declaration `{name}` in {}", file.display())]
    ReinsertTargetMissing {
        /// Declaration name
        name: String,
        /// File that was expected to hold the declaration
        file: PathBuf,
    },
    /// The edit list for a file was rejected. Spans from one scan never
    /// overlap, so this indicates a bookkeeping bug rather than bad input.
    #[error("edit list rejected for {}: {source}", file.display())]
    Rewrite {
        /// File whose edits were rejected
        file: PathBuf,
        /// Underlying rewriter error
        #[source]
        source: RewriteError,
    },
    /// Reading or writing a file failed
    #[error("i/o failure on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// An impl block seen in the current file and not yet consumed
struct PendingImpl {
    macro_start: usize,
    block_end: usize,
    target: String,
    canonical: String,
    identity: u64,
    line: usize,
}

/// A block scheduled for deletion from the current file
struct Removal {
    start: usize,
    end: usize,
}

/// Reinsertion work for one canonical entry, detached from the registry
struct ReinsertWork {
    identity: u64,
    name: String,
    anchor: String,
    file: PathBuf,
    impls: Vec<AssociatedImpl>,
}

/// The consolidation engine. One instance drives one run.
pub struct Typefold {
    options: FoldOptions,
    registry: Registry,
    /// Current content of every file written so far, keyed by path
    overlay: FxHashMap<PathBuf, String>,
    /// Files written (or, in dry-run, that would have been written)
    modified: FxHashSet<PathBuf>,
    collisions: Vec<CollisionReport>,
    rewritten: Vec<RewrittenFile>,
    files_scanned: usize,
    files_skipped: usize,
    declarations_seen: usize,
}

impl Typefold {
    /// Create an engine for one run
    #[must_use]
    pub fn new(options: FoldOptions) -> Self {
        Self {
            options,
            registry: Registry::new(),
            overlay: FxHashMap::default(),
            modified: FxHashSet::default(),
            collisions: Vec::new(),
            rewritten: Vec::new(),
            files_scanned: 0,
            files_skipped: 0,
            declarations_seen: 0,
        }
    }

    /// Count the files a run over `root` would process
    #[must_use]
    pub fn count_files(&self, root: &Path) -> usize {
        collect_source_files(
            root,
            &self.options.exclude_folders,
            &self.options.extensions,
            false,
        )
        .0
        .len()
    }

    /// The registry populated by the last run
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Content a file holds after the run. `None` when the run never
    /// wrote it. This is how dry-run output can be inspected.
    #[must_use]
    pub fn rewritten_text(&self, path: &Path) -> Option<&str> {
        if !self.modified.contains(path) {
            return None;
        }
        self.overlay.get(path).map(String::as_str)
    }

    /// Run both phases over `root` and produce the report.
    ///
    /// # Errors
    ///
    /// Returns an error when a canonical declaration cannot be relocated
    /// during reinsertion, when an edit list is rejected, or on an i/o
    /// failure while writing (phase 1) or reading back (phase 2).
    pub fn run(&mut self, root: &Path) -> Result<RunReport, ConsolidateError> {
        let started = Instant::now();

        let (files, dir_count) = collect_source_files(
            root,
            &self.options.exclude_folders,
            &self.options.extensions,
            self.options.verbose,
        );
        if self.options.verbose {
            eprintln!(
                "[VERBOSE] Collected {} files across {} directories",
                files.len(),
                dir_count
            );
        }

        for file in &files {
            self.process_file(file)?;
        }
        self.reinsert()?;

        Ok(RunReport {
            files_scanned: self.files_scanned,
            files_skipped: self.files_skipped,
            declarations_seen: self.declarations_seen,
            duplicate_groups: self.registry.group_count(),
            duplicates_removed: self.registry.duplicate_count(),
            impls_consolidated: self.registry.impl_count(),
            files_rewritten: self.modified.len(),
            groups: RunReport::groups_from_registry(&self.registry),
            rewritten: self.rewritten.clone(),
            collisions: self.collisions.clone(),
            elapsed_ms: started.elapsed().as_millis(),
            dry_run: self.options.dry_run,
        })
    }

    /// Phase 1 for one file: scan, register, associate, rewrite.
    fn process_file(&mut self, path: &Path) -> Result<(), ConsolidateError> {
        let Some(text) = self.read_lenient(path) else {
            self.files_skipped += 1;
            return Ok(());
        };
        if self.options.generated_only && !text.contains(GENERATED_BANNER) {
            self.files_skipped += 1;
            return Ok(());
        }
        self.files_scanned += 1;

        let line_index = LineIndex::new(&text);
        let mut pending: Vec<PendingImpl> = Vec::new();
        let mut removals: Vec<Removal> = Vec::new();
        let mut import_names: Vec<String> = Vec::new();
        let mut blocks = 0usize;

        let mut cursor = 0;
        while let Some(span) = scanner::next_block(&text, cursor) {
            cursor = span.block_end;
            blocks += 1;
            let line = line_index.line_index(span.block_start);

            if span.kind.is_declaration() {
                let Some(name) = declaration_name(span.header(&text)) else {
                    continue;
                };
                self.declarations_seen += 1;
                let canonical = canonical_text(span.extended_text(&text));
                let identity = identity_of(&canonical);
                let occurrence = Occurrence {
                    file: path.to_path_buf(),
                    macro_start: span.macro_start,
                    block_end: span.block_end,
                    line,
                };
                match self.registry.register(
                    identity,
                    &name,
                    span.kind,
                    span.anchor(&text),
                    &canonical,
                    occurrence,
                ) {
                    RegisterOutcome::Canonical => {}
                    RegisterOutcome::Collision => {
                        self.collisions.push(CollisionReport {
                            name,
                            site: Site {
                                file: path.to_path_buf(),
                                line,
                            },
                        });
                    }
                    RegisterOutcome::Duplicate => {
                        removals.push(Removal {
                            start: span.macro_start,
                            end: span.block_end,
                        });
                        let canonical_is_local = self
                            .registry
                            .get(identity)
                            .is_some_and(|entry| entry.canonical.file == path);
                        if !canonical_is_local {
                            import_names.push(name.clone());
                        }
                        // Sweep the impls collected earlier in this file
                        // that target the now-consolidated name.
                        let mut kept = Vec::with_capacity(pending.len());
                        for imp in pending.drain(..) {
                            if imp.target == name {
                                removals.push(Removal {
                                    start: imp.macro_start,
                                    end: imp.block_end,
                                });
                                self.registry.attach_impl(
                                    identity,
                                    AssociatedImpl {
                                        identity: imp.identity,
                                        source_file: path.to_path_buf(),
                                        line: imp.line,
                                        text: imp.canonical,
                                    },
                                );
                            } else {
                                kept.push(imp);
                            }
                        }
                        pending = kept;
                    }
                }
            } else {
                let Some(target) = impl_target(span.header(&text)) else {
                    continue;
                };
                let canonical = canonical_text(span.extended_text(&text));
                let identity = identity_of(&canonical);
                if let Some(decl_identity) = self.registry.consolidated_identity(&target) {
                    removals.push(Removal {
                        start: span.macro_start,
                        end: span.block_end,
                    });
                    self.registry.attach_impl(
                        decl_identity,
                        AssociatedImpl {
                            identity,
                            source_file: path.to_path_buf(),
                            line,
                            text: canonical,
                        },
                    );
                } else {
                    pending.push(PendingImpl {
                        macro_start: span.macro_start,
                        block_end: span.block_end,
                        target,
                        canonical,
                        identity,
                        line,
                    });
                }
            }
        }

        if self.options.verbose {
            eprintln!(
                "[VERBOSE] {}: {} blocks, {} removals",
                normalize_display_path(path),
                blocks,
                removals.len()
            );
        }

        if !removals.is_empty() {
            self.rewrite_file(path, &text, &removals, import_names)?;
        }
        Ok(())
    }

    /// Apply the recorded removals and the import insertion in one pass
    /// against the immutable file snapshot.
    fn rewrite_file(
        &mut self,
        path: &Path,
        text: &str,
        removals: &[Removal],
        import_names: Vec<String>,
    ) -> Result<(), ConsolidateError> {
        let mut rewriter = ByteRangeRewriter::new(text);
        // Deletions go in before the import insert: edits sharing offset
        // zero apply in insertion order.
        for removal in removals {
            rewriter.add_edit(Edit::delete_block(text, removal.start, removal.end));
        }

        let mut seen = FxHashSet::default();
        let imports: Vec<String> = import_names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        if !imports.is_empty() {
            let statement = format!(
                "use {}::{{{}}};\n",
                self.options.import_prefix,
                imports.join(", ")
            );
            rewriter.add_edit(Edit::insert(0, statement));
        }

        let new_text = rewriter.apply().map_err(|source| ConsolidateError::Rewrite {
            file: path.to_path_buf(),
            source,
        })?;
        self.write(path, new_text)?;
        self.rewritten.push(RewrittenFile {
            file: path.to_path_buf(),
            removals: removals.len(),
            imports,
        });
        Ok(())
    }

    /// Phase 2: replay parked impl blocks under their canonical
    /// declarations, in registry insertion order.
    fn reinsert(&mut self) -> Result<(), ConsolidateError> {
        let work: Vec<ReinsertWork> = self
            .registry
            .entries()
            .filter(|entry| !entry.impls.is_empty())
            .map(|entry| ReinsertWork {
                identity: entry.identity,
                name: entry.name.clone(),
                anchor: entry.anchor.clone(),
                file: entry.canonical.file.clone(),
                impls: entry.impls.clone(),
            })
            .collect();

        for item in work {
            let text = self.read(&item.file)?;
            let block_start = locate_anchor(&text, &item.anchor).ok_or_else(|| {
                ConsolidateError::ReinsertTargetMissing {
                    name: item.name.clone(),
                    file: item.file.clone(),
                }
            })?;
            let close = scanner::find_block_close(&text, block_start).ok_or_else(|| {
                ConsolidateError::ReinsertTargetMissing {
                    name: item.name.clone(),
                    file: item.file.clone(),
                }
            })?;
            let block_end = close + 1;

            let existing = existing_impl_identities(&text);
            let mut addition = String::new();
            let mut added = 0usize;
            for imp in &item.impls {
                if existing.contains(&imp.identity) {
                    continue;
                }
                addition.push_str("\n\n");
                addition.push_str(&provenance_comment(&item.name, item.identity));
                addition.push('\n');
                addition.push_str(&imp.text);
                added += 1;
            }
            if addition.is_empty() {
                continue;
            }

            if self.options.verbose {
                eprintln!(
                    "[VERBOSE] reinserting {} impl block(s) for `{}` into {}",
                    added,
                    item.name,
                    normalize_display_path(&item.file)
                );
            }

            let mut new_text = text;
            new_text.insert_str(block_end, &addition);
            self.write(&item.file, new_text)?;
        }
        Ok(())
    }

    /// Read through the overlay; a disk miss is fatal. Used in phase 2,
    /// where every target file must be readable.
    fn read(&self, path: &Path) -> Result<String, ConsolidateError> {
        if let Some(text) = self.overlay.get(path) {
            return Ok(text.clone());
        }
        std::fs::read_to_string(path).map_err(|source| ConsolidateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read through the overlay; a disk miss (unreadable or non-UTF-8
    /// file) skips the file instead of failing the run.
    fn read_lenient(&self, path: &Path) -> Option<String> {
        if let Some(text) = self.overlay.get(path) {
            return Some(text.clone());
        }
        match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                if self.options.verbose {
                    eprintln!("[VERBOSE] skipping {}: {e}", normalize_display_path(path));
                }
                None
            }
        }
    }

    /// Write through the overlay; the disk write is skipped in dry-run.
    fn write(&mut self, path: &Path, text: String) -> Result<(), ConsolidateError> {
        if !self.options.dry_run {
            std::fs::write(path, &text).map_err(|source| ConsolidateError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        self.overlay.insert(path.to_path_buf(), text);
        self.modified.insert(path.to_path_buf());
        Ok(())
    }
}

/// Find `anchor` at the start of a line. Offsets recorded during the scan
/// are stale once the file has been rewritten, so relocation goes by
/// content.
fn locate_anchor(text: &str, anchor: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = text[from..].find(anchor) {
        let pos = from + rel;
        if pos == 0 || text.as_bytes()[pos - 1] == b'\n' {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

/// Identities of every impl block currently present in `text`. Parked
/// impls already present are skipped at reinsertion time.
fn existing_impl_identities(text: &str) -> FxHashSet<u64> {
    let mut identities = FxHashSet::default();
    let mut cursor = 0;
    while let Some(span) = scanner::next_block(text, cursor) {
        cursor = span.block_end;
        if span.kind == BlockKind::Impl {
            identities.insert(identity_of(&canonical_text(span.extended_text(text))));
        }
    }
    identities
}
