use regex::Regex;
use std::sync::LazyLock;

/// A whole value that is one interpolation token: `{name}`, `{count()}`.
/// The character class is ASCII word characters plus parentheses.
static PROTECTED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{[A-Za-z0-9_()]+\}$").expect("protected token pattern is valid")
});

/// Whether a leaf must be copied verbatim instead of translated
///
/// Only values that consist of a single placeholder token and nothing else
/// are protected. Prose that merely contains a token is translated.
pub fn is_protected(value: &str) -> bool {
    PROTECTED_TOKEN.is_match(value)
}
