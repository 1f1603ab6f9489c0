//! Name normalization for case-insensitive catalog matching.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Returns the matching key for a class type or exercise name.
///
/// Trims, collapses whitespace runs to one space and lowercases, so
/// `"  Warrior   I"` and `"warrior i"` share a key.
pub fn name_key(name: &str) -> String {
    WHITESPACE_RE
        .replace_all(name.trim(), " ")
        .to_lowercase()
}
