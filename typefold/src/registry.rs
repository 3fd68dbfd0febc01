//! Process-wide registry of declaration identities.
//!
//! The first sighting of an identity becomes the canonical definition;
//! every later sighting is recorded as a duplicate. Impl blocks that
//! belong to a consolidated declaration are parked on its entry until
//! the reinsertion pass replays them under the canonical copy.

use std::path::PathBuf;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::scanner::BlockKind;

/// A single sighting of a declaration block in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Source file path
    pub file: PathBuf,
    /// Start byte offset, including attached attributes and doc comments
    pub macro_start: usize,
    /// End byte offset (exclusive, past the closing brace)
    pub block_end: usize,
    /// Line of the declaration keyword (1-indexed)
    pub line: usize,
}

/// An impl block collected for replay under a canonical declaration
#[derive(Debug, Clone)]
pub struct AssociatedImpl {
    /// Identity hash of the impl block's canonical text
    pub identity: u64,
    /// File the impl block was removed from
    pub source_file: PathBuf,
    /// Line of the impl keyword in the source file (1-indexed)
    pub line: usize,
    /// Canonical text of the impl block
    pub text: String,
}

/// Registry entry for one declaration identity
#[derive(Debug, Clone)]
pub struct CanonicalEntry {
    /// Identity hash of the declaration's canonical text
    pub identity: u64,
    /// Declaration name, generics stripped
    pub name: String,
    /// Block kind (struct or enum)
    pub kind: BlockKind,
    /// Raw header slice from keyword through opening brace, used to
    /// relocate the canonical block after offsets have shifted
    pub anchor: String,
    /// Canonical text the identity was computed over
    pub canonical_text: String,
    /// First sighting, the copy every other sighting folds into
    pub canonical: Occurrence,
    /// Later sightings, removed from their files
    pub duplicates: Vec<Occurrence>,
    /// Impl blocks parked for replay under the canonical copy
    pub impls: Vec<AssociatedImpl>,
    /// Identities already parked, so exact impl copies collapse to one
    impl_identities: FxHashSet<u64>,
}

impl CanonicalEntry {
    /// Check whether any duplicate sighting has been recorded
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Total number of sightings, canonical included
    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        1 + self.duplicates.len()
    }

    /// Park an impl block for replay.
    ///
    /// Returns `false` when an impl with the same identity is already
    /// parked; the caller still removes its copy from the source file.
    pub fn attach_impl(&mut self, imp: AssociatedImpl) -> bool {
        if !self.impl_identities.insert(imp.identity) {
            return false;
        }
        self.impls.push(imp);
        true
    }

    /// Check whether an impl identity is already parked on this entry
    #[must_use]
    pub fn has_impl(&self, identity: u64) -> bool {
        self.impl_identities.contains(&identity)
    }
}

/// Outcome of registering a declaration sighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// First sighting; the occurrence becomes the canonical definition
    Canonical,
    /// Identity already registered; the occurrence is a duplicate
    Duplicate,
    /// Identity hash matched but the canonical text differs; the
    /// occurrence is left untouched
    Collision,
}

impl RegisterOutcome {
    /// Check whether the sighting should be removed from its file
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }
}

/// Process-wide duplicate declaration registry
#[derive(Debug, Default)]
pub struct Registry {
    /// Entries keyed by declaration identity
    entries: FxHashMap<u64, CanonicalEntry>,
    /// Identities in first-sighting order, for stable iteration
    order: Vec<u64>,
    /// Declaration name to the identity first registered under it
    by_name: FxHashMap<String, u64>,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration sighting.
    ///
    /// The identity hash decides the match; on a hash hit the canonical
    /// text is compared exactly, and a mismatch is reported as a
    /// collision instead of a duplicate.
    pub fn register(
        &mut self,
        identity: u64,
        name: &str,
        kind: BlockKind,
        anchor: &str,
        canonical_text: &str,
        occurrence: Occurrence,
    ) -> RegisterOutcome {
        if let Some(entry) = self.entries.get_mut(&identity) {
            if entry.canonical_text != canonical_text {
                return RegisterOutcome::Collision;
            }
            entry.duplicates.push(occurrence);
            return RegisterOutcome::Duplicate;
        }

        self.entries.insert(
            identity,
            CanonicalEntry {
                identity,
                name: name.to_owned(),
                kind,
                anchor: anchor.to_owned(),
                canonical_text: canonical_text.to_owned(),
                canonical: occurrence,
                duplicates: Vec::new(),
                impls: Vec::new(),
                impl_identities: FxHashSet::default(),
            },
        );
        self.order.push(identity);
        // First registration wins the name binding; a later declaration
        // with the same name but different content keeps its own entry.
        self.by_name.entry(name.to_owned()).or_insert(identity);
        RegisterOutcome::Canonical
    }

    /// Look up the identity bound to a declaration name, but only when
    /// that entry has at least one recorded duplicate.
    ///
    /// Impl association keys off this: impls near a unique declaration
    /// stay where they are.
    #[must_use]
    pub fn consolidated_identity(&self, name: &str) -> Option<u64> {
        let identity = *self.by_name.get(name)?;
        let entry = self.entries.get(&identity)?;
        entry.has_duplicates().then_some(identity)
    }

    /// Park an impl block on an entry, collapsing exact copies.
    ///
    /// Returns `false` when the entry is unknown or the impl identity is
    /// already parked.
    pub fn attach_impl(&mut self, identity: u64, imp: AssociatedImpl) -> bool {
        match self.entries.get_mut(&identity) {
            Some(entry) => entry.attach_impl(imp),
            None => false,
        }
    }

    /// Get an entry by identity
    #[must_use]
    pub fn get(&self, identity: u64) -> Option<&CanonicalEntry> {
        self.entries.get(&identity)
    }

    /// Iterate entries in first-sighting order
    pub fn entries(&self) -> impl Iterator<Item = &CanonicalEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Number of registered identities
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of entries with at least one duplicate
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.entries().filter(|e| e.has_duplicates()).count()
    }

    /// Total duplicate sightings across all entries
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.entries().map(|e| e.duplicates.len()).sum()
    }

    /// Total impl blocks parked for replay
    #[must_use]
    pub fn impl_count(&self) -> usize {
        self.entries().map(|e| e.impls.len()).sum()
    }
}
