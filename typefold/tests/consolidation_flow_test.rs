//! End-to-end flow over a realistic slice of generated API bindings.
//!
//! Two generated files share an enum; the second also carries the enum's
//! conversion impls. After a run the enum must live in one place with
//! every impl under it, and a second run must change nothing.
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;
use tempfile::tempdir;
use typefold::engine::{FoldOptions, Typefold};

const BALANCE_RS: &str = "\
// This file was automatically generated.

/// The currency of the amount.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Currency {
    Eur,
    Gbp,
    Usd,
}

pub struct Balance {
    pub available: i64,
    pub currency: Currency,
}
";

const PAYOUT_RS: &str = "\
// This file was automatically generated.

/// The currency of the amount.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Currency {
    Eur,
    Gbp,
    Usd,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Currency::Eur => \"eur\",
            Currency::Gbp => \"gbp\",
            Currency::Usd => \"usd\",
        }
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Eur
    }
}

pub struct Payout {
    pub amount: i64,
    pub currency: Currency,
}
";

fn run(dir: &Path) -> typefold::report::RunReport {
    let mut engine = Typefold::new(FoldOptions::default());
    engine.run(dir).unwrap()
}

#[test]
fn test_generated_api_consolidation() {
    let dir = tempdir().unwrap();
    let balance = dir.path().join("balance.rs");
    let payout = dir.path().join("payout.rs");
    fs::write(&balance, BALANCE_RS).unwrap();
    fs::write(&payout, PAYOUT_RS).unwrap();

    let report = run(dir.path());

    assert_eq!(report.duplicate_groups, 1);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.impls_consolidated, 4);
    assert_eq!(report.files_rewritten, 2);

    let payout_text = fs::read_to_string(&payout).unwrap();
    assert!(payout_text.starts_with("use crate::resources::{Currency};\n"));
    assert!(!payout_text.contains("pub enum Currency"));
    assert!(!payout_text.contains("impl "));
    assert!(payout_text.contains("pub struct Payout"));

    let balance_text = fs::read_to_string(&balance).unwrap();
    assert!(balance_text.contains("pub enum Currency"));
    assert!(balance_text.contains("pub struct Balance"));
    assert_eq!(
        balance_text.matches("// consolidated: impl for Currency").count(),
        4,
        "every moved impl carries a provenance comment"
    );

    // Impls land in the order the duplicating file declared them.
    let as_str = balance_text.find("pub fn as_str").unwrap();
    let as_ref = balance_text.find("impl AsRef<str> for Currency {").unwrap();
    let display = balance_text
        .find("impl std::fmt::Display for Currency {")
        .unwrap();
    let default = balance_text.find("impl Default for Currency {").unwrap();
    assert!(as_str < as_ref);
    assert!(as_ref < display);
    assert!(display < default);

    let combined = format!("{balance_text}{payout_text}");
    assert_eq!(
        combined.matches("pub enum Currency").count(),
        1,
        "exactly one copy of the enum survives"
    );
}

#[test]
fn test_generated_api_run_is_idempotent() {
    let dir = tempdir().unwrap();
    let balance = dir.path().join("balance.rs");
    let payout = dir.path().join("payout.rs");
    fs::write(&balance, BALANCE_RS).unwrap();
    fs::write(&payout, PAYOUT_RS).unwrap();

    run(dir.path());
    let balance_after_first = fs::read_to_string(&balance).unwrap();
    let payout_after_first = fs::read_to_string(&payout).unwrap();

    let second = run(dir.path());

    assert_eq!(second.duplicate_groups, 0);
    assert_eq!(second.duplicates_removed, 0);
    assert_eq!(second.impls_consolidated, 0);
    assert_eq!(second.files_rewritten, 0);
    assert!(second.is_clean());
    assert_eq!(fs::read_to_string(&balance).unwrap(), balance_after_first);
    assert_eq!(fs::read_to_string(&payout).unwrap(), payout_after_first);
}

#[test]
fn test_third_file_reuses_the_same_canonical() {
    let dir = tempdir().unwrap();
    let balance = dir.path().join("balance.rs");
    let payout = dir.path().join("payout.rs");
    let refund = dir.path().join("refund.rs");
    fs::write(&balance, BALANCE_RS).unwrap();
    fs::write(&payout, PAYOUT_RS).unwrap();
    fs::write(
        &refund,
        "// This file was automatically generated.\n\n/// The currency of the amount.\n#[derive(Copy, Clone, Debug, Eq, PartialEq)]\npub enum Currency {\n    Eur,\n    Gbp,\n    Usd,\n}\n\npub struct Refund {\n    pub amount: i64,\n    pub currency: Currency,\n}\n",
    )
    .unwrap();

    let report = run(dir.path());

    assert_eq!(report.duplicate_groups, 1);
    assert_eq!(report.duplicates_removed, 2);
    assert_eq!(report.groups[0].duplicates.len(), 2);

    let refund_text = fs::read_to_string(&refund).unwrap();
    assert!(refund_text.starts_with("use crate::resources::{Currency};\n"));
    assert!(refund_text.contains("pub struct Refund"));

    let balance_text = fs::read_to_string(&balance).unwrap();
    assert!(balance_text.contains("pub enum Currency"));
}
