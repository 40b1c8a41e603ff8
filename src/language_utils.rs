use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities: ISO code handling and per-script reading-speed budgets
///
/// Accepts ISO 639-1 (2-letter) and ISO 639-2 (3-letter, T or B form) codes.
/// Target code meaning "keep the source text, translate nothing"
pub const ORIGINAL_TARGET: &str = "original";

// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
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

/// Writing-system family of a target language; drives the review character budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFamily {
    Latin,
    Cjk,
    Thai,
}

impl ScriptFamily {
    /// Comfortable reading speed in characters per second
    pub fn cps_budget(self) -> f64 {
        match self {
            ScriptFamily::Latin => 17.0,
            ScriptFamily::Cjk => 13.0,
            ScriptFamily::Thai => 15.0,
        }
    }

    /// Classify a language code; unknown codes are treated as Latin-like
    pub fn for_language(code: &str) -> Self {
        match normalize_to_part2t(code).as_deref() {
            Ok("zho") | Ok("jpn") | Ok("kor") | Ok("yue") => ScriptFamily::Cjk,
            Ok("tha") => ScriptFamily::Thai,
            _ => ScriptFamily::Latin,
        }
    }

    /// Maximum characters a cue of `duration_secs` may carry
    pub fn max_chars_for(self, duration_secs: f64) -> usize {
        (duration_secs.max(0.0) * self.cps_budget()).floor() as usize
    }
}

fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Whether the target requests pass-through instead of translation
pub fn is_original_target(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(ORIGINAL_TARGET)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if bibliographic_to_terminology(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(part2t) = bibliographic_to_terminology(&normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Name used in prompts; falls back to the raw code for unknown languages
pub fn display_name(code: &str) -> String {
    get_language_name(code).unwrap_or_else(|_| code.trim().to_string())
}
