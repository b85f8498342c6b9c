/*!
 * Detection of strings that should pass through untranslated.
 *
 * Numbers, symbols, file extensions, URLs, e-mail addresses and bare
 * placeholders are echoed back as-is instead of being sent to a provider.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Decimal digits only; fractions and numeral letters such as `½` or `Ⅻ` do not count
static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("Invalid digits regex"));

/// Strings made only of placeholder characters, e.g. `%@` or `%1$lld / %2$lld`.
///
/// The class also accepts short words spelled with `d`, `l`, `f` and `s`
/// only (e.g. `sdf`), which are then skipped as well.
static PLACEHOLDER_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[%@dlfs\d$\s\-/]+$").expect("Invalid placeholder-only regex")
});

/// Whether a source string needs no translation
pub fn is_non_translatable(text: &str) -> bool {
    let stripped = text.trim();

    if stripped.is_empty() {
        return true;
    }

    let mut chars = stripped.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        if !only.is_alphabetic() {
            return true;
        }
    }

    // Numbers and percentages
    let digits: String = stripped.chars().filter(|c| !matches!(c, '.' | ',' | '%')).collect();
    if DIGITS_REGEX.is_match(&digits) {
        return true;
    }

    // File extensions
    if stripped.starts_with('.') && stripped.chars().count() <= 5 {
        return true;
    }

    if ["http://", "https://", "www."].iter().any(|prefix| stripped.starts_with(prefix)) {
        return true;
    }

    // E-mail addresses
    if stripped.contains('@') && stripped.contains('.') && !stripped.contains(' ') {
        return true;
    }

    PLACEHOLDER_ONLY_REGEX.is_match(stripped)
}

/// Whether a string should be skipped outright, blank or not translatable
pub fn should_skip(text: &str) -> bool {
    text.trim().is_empty() || is_non_translatable(text)
}
