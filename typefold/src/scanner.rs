//! Brace-depth-aware segmentation of generated source text.
//!
//! Locates top-level `pub struct` / `pub enum` / `impl` blocks and their
//! exact byte spans without a real parser. The scanner leans on the
//! regularity of generator output: declarations start at column 0, the
//! opening brace sits on the keyword line, and no brace characters occur
//! inside string or character literals.

use crate::constants::{
    ATTRIBUTE_MARKER, COMMENT_MARKER, ENUM_KEYWORD, IMPL_KEYWORD, STRUCT_KEYWORD,
};
use serde::Serialize;

/// The kind of top-level block a span covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// A `pub struct` declaration.
    Struct,
    /// A `pub enum` declaration.
    Enum,
    /// An `impl` block.
    Impl,
}

impl BlockKind {
    /// Short lowercase label for display output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BlockKind::Struct => "struct",
            BlockKind::Enum => "enum",
            BlockKind::Impl => "impl",
        }
    }

    /// True for the declaration kinds that participate in duplicate
    /// detection and import injection.
    #[must_use]
    pub fn is_declaration(self) -> bool {
        matches!(self, BlockKind::Struct | BlockKind::Enum)
    }

    fn keyword(self) -> &'static str {
        match self {
            BlockKind::Struct => STRUCT_KEYWORD,
            BlockKind::Enum => ENUM_KEYWORD,
            BlockKind::Impl => IMPL_KEYWORD,
        }
    }
}

/// A contiguous byte range identifying one top-level block.
///
/// `macro_start <= block_start < body_open < block_end`. Spans produced by
/// repeated [`next_block`] calls never overlap: the scan cursor always
/// resumes at or past the previous span's end.
#[derive(Debug, Clone)]
pub struct Span {
    /// What the span covers.
    pub kind: BlockKind,
    /// Start of the attached attribute/doc-comment run (`<= block_start`).
    pub macro_start: usize,
    /// Offset of the declaring keyword.
    pub block_start: usize,
    /// Length of the matched keyword.
    pub keyword_len: usize,
    /// Offset of the opening brace.
    pub body_open: usize,
    /// One past the matching closing brace.
    pub block_end: usize,
}

impl Span {
    /// Header text between the declaring keyword and the opening brace.
    #[must_use]
    pub fn header<'t>(&self, text: &'t str) -> &'t str {
        &text[self.block_start + self.keyword_len..self.body_open]
    }

    /// The raw slice from the keyword through the opening brace, used to
    /// relocate the block after its file has been rewritten.
    #[must_use]
    pub fn anchor<'t>(&self, text: &'t str) -> &'t str {
        &text[self.block_start..=self.body_open]
    }

    /// Full span text including attached attribute and doc-comment lines.
    #[must_use]
    pub fn extended_text<'t>(&self, text: &'t str) -> &'t str {
        &text[self.macro_start..self.block_end]
    }
}

/// Find the next top-level block at or after `cursor`.
///
/// The nearest keyword match wins and determines the kind. Malformed
/// matches (missing or unmatched braces, a `;` before the opening brace,
/// an empty interior) are skipped and scanning resumes behind them, so a
/// degenerate declaration never aborts the scan of its file.
#[must_use]
pub fn next_block(text: &str, cursor: usize) -> Option<Span> {
    let mut cursor = cursor;
    while cursor < text.len() {
        let (block_start, kind) = next_keyword(text, cursor)?;
        let keyword_len = kind.keyword().len();
        let after_keyword = block_start + keyword_len;

        let Some(body_open) = find_byte(text, b'{', block_start) else {
            cursor = after_keyword;
            continue;
        };
        // A `;` before the brace means a unit or tuple declaration whose
        // brace belongs to some later block.
        if text[block_start..body_open].contains(';') {
            cursor = after_keyword;
            continue;
        }
        let Some(close) = find_block_close(text, block_start) else {
            cursor = after_keyword;
            continue;
        };
        if close < body_open {
            cursor = after_keyword;
            continue;
        }
        if text[body_open + 1..close].trim().is_empty() {
            // Empty interior: malformed match, resume past it.
            cursor = close + 1;
            continue;
        }

        return Some(Span {
            kind,
            macro_start: extend_attachments(text, block_start),
            block_start,
            keyword_len,
            body_open,
            block_end: close + 1,
        });
    }
    None
}

/// Offset of the `}` matching the block opened after `block_start`.
///
/// Depth-aware without counting: seed the candidate close at the first `}`
/// after `block_start` and the nested-open search just past the header
/// line; every nested `{` found before the candidate close pushes the
/// candidate to the next `}`. When no nested open precedes the candidate,
/// it is the matching close. Returns `None` when the block is never
/// closed.
pub(crate) fn find_block_close(text: &str, block_start: usize) -> Option<usize> {
    let mut close = find_byte(text, b'}', block_start)?;
    let Some(newline) = find_byte(text, b'\n', block_start) else {
        // Single-line block: the first close is the match.
        return Some(close);
    };
    let mut open_search = newline + 1;
    while let Some(open) = find_byte(text, b'{', open_search) {
        if open >= close {
            break;
        }
        close = find_byte(text, b'}', close + 1)?;
        open_search = open + 1;
    }
    Some(close)
}

/// Walk backward from `block_start` over the contiguous run of attribute
/// (`#`) and comment (`//`) lines immediately above it. Returns the start
/// offset of the topmost absorbed line. Blank lines stop the walk, so a
/// file-top banner separated by a blank line is never absorbed.
fn extend_attachments(text: &str, block_start: usize) -> usize {
    let mut macro_start = block_start;
    while macro_start > 0 {
        let prev_line_start = line_start_of(text, macro_start - 1);
        let trimmed = text[prev_line_start..macro_start].trim_start();
        if trimmed.starts_with(ATTRIBUTE_MARKER) || trimmed.starts_with(COMMENT_MARKER) {
            macro_start = prev_line_start;
        } else {
            break;
        }
    }
    macro_start
}

/// Earliest keyword match at or after `cursor`, with its kind.
fn next_keyword(text: &str, cursor: usize) -> Option<(usize, BlockKind)> {
    let mut best: Option<(usize, BlockKind)> = None;
    for kind in [BlockKind::Struct, BlockKind::Enum, BlockKind::Impl] {
        if let Some(pos) = next_keyword_of(text, cursor, kind) {
            if best.is_none_or(|(b, _)| pos < b) {
                best = Some((pos, kind));
            }
        }
    }
    best
}

/// Next valid occurrence of one keyword at or after `from`.
///
/// A match is valid only at the start of a line, and `impl` must be
/// followed by a space or `<` so identifiers merely starting with the
/// keyword are not matched. Indented (nested) occurrences are rejected by
/// the line anchor.
fn next_keyword_of(text: &str, from: usize, kind: BlockKind) -> Option<usize> {
    let keyword = kind.keyword();
    let mut at = from;
    while let Some(rel) = text[at..].find(keyword) {
        let pos = at + rel;
        if line_anchored(text, pos) && keyword_bounded(text, pos, kind) {
            return Some(pos);
        }
        at = pos + 1;
    }
    None
}

fn line_anchored(text: &str, pos: usize) -> bool {
    pos == 0 || text.as_bytes()[pos - 1] == b'\n'
}

fn keyword_bounded(text: &str, pos: usize, kind: BlockKind) -> bool {
    match kind {
        BlockKind::Impl => matches!(
            text.as_bytes().get(pos + IMPL_KEYWORD.len()),
            Some(b' ' | b'<')
        ),
        BlockKind::Struct | BlockKind::Enum => true,
    }
}

fn find_byte(text: &str, needle: u8, from: usize) -> Option<usize> {
    text.as_bytes()[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|rel| from + rel)
}

/// Start offset of the line containing `idx`.
fn line_start_of(text: &str, idx: usize) -> usize {
    text[..idx].rfind('\n').map_or(0, |nl| nl + 1)
}
