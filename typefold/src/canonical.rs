//! Canonical text, content identity, and name extraction.
//!
//! Duplicate detection is keyed on the canonicalized form of a span:
//! comments and attribute lines are stripped per line, whitespace is
//! trimmed, and the surviving lines are joined back with newlines. Two
//! declarations merge only when this form is identical, so same-named
//! declarations with different bodies never collapse. Canonicalization is
//! idempotent, which the reinsertion pass relies on when it re-scans its
//! own output.

use crate::constants::{ATTRIBUTE_MARKER, COMMENT_MARKER};
use std::hash::{Hash, Hasher};

/// Reduce span text to its canonical comment-free form.
///
/// Per line: drop everything from the first `//` onward, then everything
/// from the first `#` onward, trim surrounding whitespace, and discard
/// lines left empty. Attribute and doc-comment lines attached to a span
/// therefore never influence its identity.
#[must_use]
pub fn canonical_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line
            .split_once(COMMENT_MARKER)
            .map_or(line, |(before, _)| before);
        let line = line
            .split_once(ATTRIBUTE_MARKER)
            .map_or(line, |(before, _)| before);
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Content identity of already-canonicalized text.
#[must_use]
pub fn identity_of(canonical: &str) -> u64 {
    hash_string(canonical)
}

/// Hash a string
fn hash_string(s: &str) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Remove every angle-bracket group from `s` at full depth.
///
/// Nested generics are consumed entirely: `Foo<Bar<Baz>>` becomes `Foo`.
/// A stray closing bracket saturates at depth zero instead of underflowing.
#[must_use]
pub fn strip_generics(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth: usize = 0;
    for ch in s.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Extract the declared name from a header (the text between the
/// declaring keyword and the opening brace).
///
/// Generic parameter groups are stripped at full depth first, then the
/// first whitespace token is the name. Returns `None` for an empty
/// result, the unresolvable-name degenerate case.
#[must_use]
pub fn declaration_name(header: &str) -> Option<String> {
    let stripped = strip_generics(header);
    stripped.split_whitespace().next().map(str::to_owned)
}
