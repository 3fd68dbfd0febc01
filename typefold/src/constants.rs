use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Keyword opening a struct declaration, anchored at the start of a line.
pub const STRUCT_KEYWORD: &str = "pub struct ";

/// Keyword opening an enum declaration, anchored at the start of a line.
pub const ENUM_KEYWORD: &str = "pub enum ";

/// Keyword opening an impl block, anchored at the start of a line.
///
/// The character after the keyword must be a space or `<` so that
/// identifiers merely starting with `impl` are not matched.
pub const IMPL_KEYWORD: &str = "impl";

/// Marker beginning an attribute line (`#[...]`, `#![...]`).
pub const ATTRIBUTE_MARKER: char = '#';

/// Marker beginning a line comment or doc comment.
pub const COMMENT_MARKER: &str = "//";

/// Token separating trait and target in an impl header.
pub const FOR_MARKER: &str = "for";

/// Banner line emitted at the top of every generated file.
pub const GENERATED_BANNER: &str = "// This file was automatically generated.";

/// Module path prefix for injected import statements.
pub const DEFAULT_IMPORT_PREFIX: &str = "crate::resources";

/// Prefix of the provenance comment placed above each reinserted impl block.
pub const PROVENANCE_PREFIX: &str = "// consolidated: impl for ";

/// File extension processed when none is configured.
pub const DEFAULT_EXTENSION: &str = "rs";

/// Configuration file searched for in the input directory and its parents.
pub const CONFIG_FILE_NAME: &str = ".typefold.toml";

/// Cargo manifest probed for a `[package.metadata.typefold]` section when
/// no dedicated configuration file is present.
pub const MANIFEST_FILE_NAME: &str = "Cargo.toml";

/// Set of folders to exclude by default.
pub fn get_default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert(".git");
        s.insert("target");
        s.insert("vendor");
        s.insert("node_modules");
        s.insert("build");
        s.insert("dist");
        s
    })
}

/// Render the provenance comment for an impl consolidated under `name`.
#[must_use]
pub fn provenance_comment(name: &str, identity: u64) -> String {
    format!("{PROVENANCE_PREFIX}{name} (identity {identity:016x})")
}
