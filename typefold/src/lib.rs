//! Core library for the typefold consolidation tool.
//!
//! This library provides the core functionality for folding duplicate
//! declarations in machine-generated Rust sources into one canonical copy,
//! including block scanning, identity hashing, and in-place rewriting.

// Allow common complexity warnings - these are intentional design choices
#![allow(
    clippy::too_many_arguments,
    clippy::similar_names,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module containing the consolidation engine.
/// This includes the `Typefold` struct driving both phases of a run.
pub mod engine;

/// Module containing the top-level block scanner.
/// This is responsible for segmenting source text into declaration and impl spans.
pub mod scanner;

/// Module for canonical text and identity hashing.
pub mod canonical;

/// Module for associating impl blocks with declaration names.
pub mod resolver;

/// Module containing the process-wide declaration registry.
/// This records canonical occurrences, duplicates, and parked impl blocks.
pub mod registry;

/// Module containing the byte-range text rewriter.
pub mod rewriter;

/// Module defining the run report data structures.
pub mod report;

/// Module for loading configuration.
pub mod config;

/// Module containing utility functions.
/// This includes the file walk and line indexing helpers.
pub mod utils;

/// Module defining the entry point logic.
pub mod entry_point;

/// Module containing shared constants.
pub mod constants;

/// Module for rich CLI output formatting with colored text and spinners.
pub mod output;

/// Module defining the command-line interface arguments and structs.
pub mod cli;
