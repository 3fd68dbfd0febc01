//! Resolution of impl blocks to the declaration they extend.
//!
//! Works on the impl header text only. `impl Foo { .. }` targets `Foo`;
//! `impl Trait for Target { .. }` targets `Target`, never the trait.
//! Matching is exact string equality after generic stripping — no
//! semantic type normalization, so `module::Foo` does not match `Foo`.

use crate::canonical::strip_generics;
use crate::constants::FOR_MARKER;

/// The type name an impl header targets, if one can be extracted.
///
/// Generic groups are stripped at full depth first, so `impl<'a>
/// Account<'a>` targets `Account` and `impl AsRef<str> for Status`
/// targets `Status`. Returns `None` for a header with no tokens or a
/// trailing `for` with nothing after it; such impls are left untouched.
#[must_use]
pub fn impl_target(header: &str) -> Option<String> {
    let stripped = strip_generics(header);
    let tokens: Vec<&str> = stripped.split_whitespace().collect();
    let target = match tokens.iter().position(|t| *t == FOR_MARKER) {
        Some(pos) => tokens.get(pos + 1)?,
        None => tokens.first()?,
    };
    Some((*target).to_owned())
}

/// True when the impl header extends the declaration called `name`.
#[must_use]
pub fn is_related(header: &str, name: &str) -> bool {
    impl_target(header).is_some_and(|target| target == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_impl_targets_first_token() {
        assert_eq!(impl_target(" Account "), Some("Account".to_owned()));
    }

    #[test]
    fn test_trait_for_targets_right_hand_type() {
        assert_eq!(
            impl_target(" Object for Account "),
            Some("Account".to_owned())
        );
        assert_eq!(
            impl_target(" std::fmt::Display for Status "),
            Some("Status".to_owned())
        );
    }

    #[test]
    fn test_generic_groups_stripped() {
        assert_eq!(
            impl_target("<'a> CreateAccount<'a> "),
            Some("CreateAccount".to_owned())
        );
        assert_eq!(
            impl_target(" AsRef<str> for Status "),
            Some("Status".to_owned())
        );
        assert_eq!(
            impl_target(" From<Account> for Wrapper<Account> "),
            Some("Wrapper".to_owned())
        );
    }

    #[test]
    fn test_degenerate_headers() {
        assert_eq!(impl_target("   "), None);
        assert_eq!(impl_target(" Trait for "), None);
        assert_eq!(impl_target("<'a> "), None);
    }

    #[test]
    fn test_path_target_is_not_normalized() {
        assert!(!is_related(" Object for module::Account ", "Account"));
        assert!(is_related(" Object for Account ", "Account"));
        assert!(!is_related(" Account ", "Charge"));
    }
}
