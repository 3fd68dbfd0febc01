//! Serializable result types describing one consolidation run.

use serde::Serialize;
use std::path::PathBuf;

use crate::registry::Registry;
use crate::scanner::BlockKind;

/// A file-and-line location
#[derive(Debug, Clone, Serialize)]
pub struct Site {
    /// Source file path
    pub file: PathBuf,
    /// Line of the declaring keyword (1-indexed)
    pub line: usize,
}

/// One consolidated duplicate group
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    /// Declaration kind
    pub kind: BlockKind,
    /// Declaration name
    pub name: String,
    /// Identity hash as 16 hex digits
    pub identity: String,
    /// Site of the surviving canonical declaration
    pub canonical: Site,
    /// Sites of the removed duplicate declarations
    pub duplicates: Vec<Site>,
    /// Source sites of the impl blocks moved under the canonical copy
    pub impls: Vec<Site>,
}

/// A file rewritten in place during the removal phase
#[derive(Debug, Clone, Serialize)]
pub struct RewrittenFile {
    /// File path
    pub file: PathBuf,
    /// Number of blocks removed from the file
    pub removals: usize,
    /// Names carried by the injected import statement, in removal order
    pub imports: Vec<String>,
}

/// An identity hash hit whose canonical text did not match
#[derive(Debug, Clone, Serialize)]
pub struct CollisionReport {
    /// Name of the declaration left untouched
    pub name: String,
    /// Where it was seen
    pub site: Site,
}

/// Full result of one consolidation run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Files scanned in phase 1
    pub files_scanned: usize,
    /// Files skipped (unreadable, or missing the generated banner when
    /// `generated_only` is set)
    pub files_skipped: usize,
    /// Struct and enum declarations seen across all files
    pub declarations_seen: usize,
    /// Number of identities with at least one duplicate
    pub duplicate_groups: usize,
    /// Duplicate declarations removed
    pub duplicates_removed: usize,
    /// Impl blocks moved under their canonical declaration
    pub impls_consolidated: usize,
    /// Distinct files modified (removal phase and reinsertion phase)
    pub files_rewritten: usize,
    /// Per-group detail, in first-sighting order
    pub groups: Vec<GroupReport>,
    /// Per-file rewrite detail for the removal phase
    pub rewritten: Vec<RewrittenFile>,
    /// Identity collisions left untouched
    pub collisions: Vec<CollisionReport>,
    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u128,
    /// Whether the run left the disk untouched
    pub dry_run: bool,
}

impl RunReport {
    /// Check whether the run found nothing to consolidate
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.duplicate_groups == 0 && self.collisions.is_empty()
    }

    /// Build the per-group detail from the registry, entries with at
    /// least one duplicate only, in first-sighting order.
    #[must_use]
    pub fn groups_from_registry(registry: &Registry) -> Vec<GroupReport> {
        registry
            .entries()
            .filter(|entry| entry.has_duplicates())
            .map(|entry| GroupReport {
                kind: entry.kind,
                name: entry.name.clone(),
                identity: format!("{:016x}", entry.identity),
                canonical: Site {
                    file: entry.canonical.file.clone(),
                    line: entry.canonical.line,
                },
                duplicates: entry
                    .duplicates
                    .iter()
                    .map(|occ| Site {
                        file: occ.file.clone(),
                        line: occ.line,
                    })
                    .collect(),
                impls: entry
                    .impls
                    .iter()
                    .map(|imp| Site {
                        file: imp.source_file.clone(),
                        line: imp.line,
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AssociatedImpl, Occurrence};

    fn occurrence(file: &str, line: usize) -> Occurrence {
        Occurrence {
            file: PathBuf::from(file),
            macro_start: 0,
            block_end: 10,
            line,
        }
    }

    #[test]
    fn test_groups_skip_unique_entries() {
        let mut registry = Registry::new();
        let canonical = "pub struct Account {\npub id: i64,\n}";
        registry.register(
            1,
            "Account",
            BlockKind::Struct,
            "pub struct Account {",
            canonical,
            occurrence("a.rs", 4),
        );
        registry.register(
            2,
            "Invoice",
            BlockKind::Struct,
            "pub struct Invoice {",
            "pub struct Invoice {\npub total: i64,\n}",
            occurrence("a.rs", 9),
        );
        registry.register(
            1,
            "Account",
            BlockKind::Struct,
            "pub struct Account {",
            canonical,
            occurrence("b.rs", 2),
        );
        registry.attach_impl(
            1,
            AssociatedImpl {
                identity: 77,
                source_file: PathBuf::from("b.rs"),
                line: 8,
                text: "impl Account {\nfn id(&self) {}\n}".to_owned(),
            },
        );

        let groups = RunReport::groups_from_registry(&registry);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Account");
        assert_eq!(groups[0].identity, format!("{:016x}", 1u64));
        assert_eq!(groups[0].canonical.file, PathBuf::from("a.rs"));
        assert_eq!(groups[0].duplicates.len(), 1);
        assert_eq!(groups[0].impls.len(), 1);
        assert_eq!(groups[0].impls[0].line, 8);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = RunReport {
            files_scanned: 3,
            files_skipped: 1,
            declarations_seen: 12,
            duplicate_groups: 1,
            duplicates_removed: 2,
            impls_consolidated: 1,
            files_rewritten: 2,
            groups: vec![GroupReport {
                kind: BlockKind::Enum,
                name: "Status".to_owned(),
                identity: "00000000deadbeef".to_owned(),
                canonical: Site {
                    file: PathBuf::from("a.rs"),
                    line: 10,
                },
                duplicates: vec![Site {
                    file: PathBuf::from("b.rs"),
                    line: 20,
                }],
                impls: vec![],
            }],
            rewritten: vec![],
            collisions: vec![],
            elapsed_ms: 5,
            dry_run: true,
        };

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["duplicate_groups"], 1);
        assert_eq!(json["groups"][0]["kind"], "enum");
        assert_eq!(json["groups"][0]["identity"], "00000000deadbeef");
        assert_eq!(json["dry_run"], true);
    }

    #[test]
    fn test_is_clean() {
        let mut report = RunReport {
            files_scanned: 0,
            files_skipped: 0,
            declarations_seen: 0,
            duplicate_groups: 0,
            duplicates_removed: 0,
            impls_consolidated: 0,
            files_rewritten: 0,
            groups: vec![],
            rewritten: vec![],
            collisions: vec![],
            elapsed_ms: 0,
            dry_run: false,
        };
        assert!(report.is_clean());
        report.duplicate_groups = 1;
        assert!(!report.is_clean());
    }
}
