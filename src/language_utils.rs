use isolang::Language;

use crate::errors::ValidationError;

/// Language utilities for ISO language code handling
///
/// Subtitle tracks, translation engines and users all spell languages a
/// little differently ("ko", "kor", "pt-BR", "zh_Hans"). These helpers
/// validate and normalize ISO 639-1 (2-letter) and ISO 639-2 (3-letter)
/// codes, ignoring region and script subtags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

// ISO 639-2/B codes that differ from their 639-2/T form
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

/// Primary language subtag, lowercased: "pt-BR" -> "pt", "zh_Hant" -> "zh"
pub fn base_language(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(part2b, _)| *part2b == code)
        .map(|(_, part2t)| *part2t)
}

fn lookup(code: &str) -> Option<(Language, LanguageCodeType)> {
    let base = base_language(code);
    match base.len() {
        2 => Language::from_639_1(&base).map(|lang| (lang, LanguageCodeType::Part1)),
        3 => {
            if let Some(lang) = Language::from_639_3(&base) {
                return Some((lang, LanguageCodeType::Part2T));
            }
            part2b_to_part2t(&base)
                .and_then(Language::from_639_3)
                .map(|lang| (lang, LanguageCodeType::Part2B))
        }
        _ => None,
    }
}

/// Validate an ISO 639-1 or ISO 639-2 code, region subtags allowed
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType, ValidationError> {
    lookup(code)
        .map(|(_, kind)| kind)
        .ok_or_else(|| ValidationError::InvalidLiteral { kind: "language code", value: code.to_string() })
}

/// True if `code` names a known language
pub fn is_known_language(code: &str) -> bool {
    lookup(code).is_some()
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String, ValidationError> {
    lookup(code)
        .map(|(lang, _)| lang.to_639_3().to_string())
        .ok_or_else(|| ValidationError::InvalidLiteral { kind: "language code", value: code.to_string() })
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
///
/// Falls back to ISO 639-2/T when the language has no 2-letter code.
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String, ValidationError> {
    lookup(code)
        .map(|(lang, _)| {
            lang.to_639_1()
                .map(str::to_string)
                .unwrap_or_else(|| lang.to_639_3().to_string())
        })
        .ok_or_else(|| ValidationError::InvalidLiteral { kind: "language code", value: code.to_string() })
}

/// Check if two language codes represent the same language
///
/// Unknown codes only match when they are spelled identically.
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => base_language(code1) == base_language(code2) && !code1.trim().is_empty(),
    }
}

/// English name of a language, if the code is known
pub fn get_language_name(code: &str) -> Option<String> {
    lookup(code).map(|(lang, _)| lang.to_name().to_string())
}
