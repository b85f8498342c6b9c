use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for catalog locale codes
///
/// String catalogs use Apple locale identifiers: an ISO 639-1 or 639-2 code,
/// optionally followed by a script or region subtag (`pt-BR`, `zh-Hans`).
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// Bibliographic ISO 639-2/B codes and their terminology counterparts
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T.iter().find(|(b, _)| *b == code).map(|(_, t)| *t)
}

/// Split a locale identifier into its language and optional subtag
///
/// `pt-BR` gives `("pt", Some("BR"))`, `de` gives `("de", None)`.
pub fn split_locale(code: &str) -> (String, Option<String>) {
    let code = code.trim();
    match code.split_once(['-', '_']) {
        Some((base, rest)) if !rest.is_empty() => (base.to_lowercase(), Some(rest.to_string())),
        _ => (code.trim_end_matches(['-', '_']).to_lowercase(), None),
    }
}

/// Validate the language part of a locale identifier
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let (base, _) = split_locale(code);

    if base.len() == 2 && Language::from_639_1(&base).is_some() {
        return Ok(LanguageCodeType::Part1);
    }
    if base.len() == 3 {
        if Language::from_639_3(&base).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if part2b_to_part2t(&base).is_some() {
            return Ok(LanguageCodeType::Part2B);
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize the language part of a locale to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let (base, _) = split_locale(code);

    if base.len() == 2 {
        if let Some(lang) = Language::from_639_1(&base) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if base.len() == 3 {
        if Language::from_639_3(&base).is_some() {
            return Ok(base);
        }
        if let Some(part2t) = part2b_to_part2t(&base) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two locale codes name the same language and subtag
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let (Ok(lang1), Ok(lang2)) = (normalize_to_part2t(code1), normalize_to_part2t(code2)) else {
        return false;
    };
    let subtag1 = split_locale(code1).1.map(|s| s.to_lowercase());
    let subtag2 = split_locale(code2).1.map(|s| s.to_lowercase());

    lang1 == lang2 && subtag1 == subtag2
}

/// Get the English language name for a locale code, e.g. `Portuguese (BR)`
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(match split_locale(code).1 {
        Some(subtag) => format!("{} ({})", lang.to_name(), subtag),
        None => lang.to_name().to_string(),
    })
}

/// Language name for prompts, falling back to the raw code
pub fn display_name(code: &str) -> String {
    get_language_name(code).unwrap_or_else(|_| code.to_string())
}
