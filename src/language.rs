// src/language.rs

//! Language codes, writing scripts, and per-character script membership.
//!
//! Membership is a best-effort heuristic: a character belongs to a script
//! when the script's name appears in the character's Unicode name. Scripts
//! whose Unicode names differ from the name used here carry an explicit set
//! of code points instead.

use std::ops::RangeInclusive;

/// Devanagari danda, the sentence terminator shared by several Indic scripts.
pub const DANDA: char = '\u{0964}';

/// Language code to language name.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("as", "assamese"),
    ("bd", "bodo"),
    ("bn", "bengali"),
    ("bh", "bihari"),
    ("en", "english"),
    ("gu", "gujarati"),
    ("hi", "hindi"),
    ("kn", "kannada"),
    ("ks", "kashmiri"),
    ("ml", "malayalam"),
    ("mr", "marathi"),
    ("ne", "nepali"),
    ("or", "oriya"),
    ("pa", "punjabi"),
    ("sa", "sanskrit"),
    ("sd", "sindhi"),
    ("ta", "tamil"),
    ("te", "telugu"),
    ("ur", "urdu"),
];

/// Language code to script name.
const LANGUAGE_SCRIPTS: &[(&str, &str)] = &[
    ("hi", "devanagari"),
    ("kn", "kannada"),
    ("mr", "devanagari"),
    ("te", "telugu"),
    ("ta", "tamil"),
    ("gu", "gujarati"),
    ("or", "oriya"),
    ("bn", "bengali"),
    ("ml", "malayalam"),
    ("ne", "devanagari"),
    ("pa", "gurmukhi"),
    ("as", "bengali"),
    ("en", "latin"),
    ("ur", "arabic"),
    ("bd", "devanagari"),
    ("san", "ol chiki"),
    ("dg", "dogra"),
    ("mni", "meitei"),
];

// Meetei Mayek letters are named "MEETEI MAYEK ...", so name matching misses them.
const MEITEI_CHARS: &[RangeInclusive<char>] = &['\u{ABC0}'..='\u{ABF9}', '\u{AAE0}'..='\u{AAF6}'];
const OL_CHIKI_CHARS: &[RangeInclusive<char>] = &['\u{1C50}'..='\u{1C7F}'];
const DOGRA_CHARS: &[RangeInclusive<char>] = &['\u{11800}'..='\u{1183B}'];

/// Get the script used to write a language.
pub fn script_for(language_code: &str) -> Option<&'static str> {
    let code = language_code.to_lowercase();
    LANGUAGE_SCRIPTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, script)| *script)
}

/// Get the language name for a code.
pub fn name_for(language_code: &str) -> Option<&'static str> {
    let code = language_code.to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Get the language code for a language name.
pub fn code_for_name(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| *code)
}

/// Accept either a language code or a language name and return the code.
pub fn resolve_code(lang: &str) -> Option<String> {
    if script_for(lang).is_some() {
        return Some(lang.to_lowercase());
    }
    code_for_name(lang)
        .filter(|code| script_for(code).is_some())
        .map(str::to_string)
}

fn fallback_chars(script: &str) -> &'static [RangeInclusive<char>] {
    match script {
        "meitei" => MEITEI_CHARS,
        "ol chiki" => OL_CHIKI_CHARS,
        "dogra" => DOGRA_CHARS,
        _ => &[],
    }
}

/// Characters accepted for every script.
fn is_script_neutral(ch: char) -> bool {
    ch == DANDA || ch.is_whitespace() || ch.is_ascii_punctuation()
}

/// Check whether a character belongs to a script.
///
/// Never fails: characters without a Unicode name are simply not in the
/// script unless the script lists them explicitly.
pub fn is_in_script(ch: char, script: &str) -> bool {
    ScriptClassifier::new(script).contains(ch)
}

/// Reusable classifier bound to one script.
#[derive(Debug, Clone)]
pub struct ScriptClassifier {
    script: String,
    fallback: &'static [RangeInclusive<char>],
}

impl ScriptClassifier {
    /// Create a classifier for a script name.
    pub fn new(script: &str) -> Self {
        let script = script.to_lowercase();
        let fallback = fallback_chars(&script);
        Self { script, fallback }
    }

    /// Create a classifier for the script of a language code.
    pub fn for_language(language_code: &str) -> Option<Self> {
        script_for(language_code).map(Self::new)
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Check whether a character belongs to this script.
    pub fn contains(&self, ch: char) -> bool {
        if is_script_neutral(ch) {
            return true;
        }

        let named = unicode_names2::name(ch)
            .map(|name| name.to_string().to_lowercase().contains(&self.script))
            .unwrap_or(false);

        named || self.fallback.iter().any(|range| range.contains(&ch))
    }

    /// Count the characters of `text` belonging to this script.
    pub fn count(&self, text: &str) -> usize {
        text.chars().filter(|&ch| self.contains(ch)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_for() {
        assert_eq!(script_for("hi"), Some("devanagari"));
        assert_eq!(script_for("MR"), Some("devanagari"));
        assert_eq!(script_for("ta"), Some("tamil"));
        assert_eq!(script_for("mni"), Some("meitei"));
        assert_eq!(script_for("xx"), None);
    }

    #[test]
    fn test_language_names() {
        assert_eq!(name_for("gu"), Some("gujarati"));
        assert_eq!(code_for_name("Hindi"), Some("hi"));
        assert_eq!(code_for_name("klingon"), None);
        assert_eq!(resolve_code("hindi"), Some("hi".to_string()));
        assert_eq!(resolve_code("TA"), Some("ta".to_string()));
        // Known language without a script mapping
        assert_eq!(resolve_code("sindhi"), None);
    }

    #[test]
    fn test_neutral_characters_always_pass() {
        for script in ["devanagari", "tamil", "latin", "ol chiki", "meitei"] {
            assert!(is_in_script(' ', script));
            assert!(is_in_script('\n', script));
            assert!(is_in_script('।', script));
            assert!(is_in_script(',', script));
            assert!(is_in_script('<', script));
        }
    }

    #[test]
    fn test_named_characters() {
        assert!(is_in_script('क', "devanagari"));
        assert!(is_in_script('க', "tamil"));
        assert!(is_in_script('a', "latin"));
        assert!(!is_in_script('a', "devanagari"));
        assert!(!is_in_script('क', "tamil"));
        assert!(is_in_script('क', "Devanagari"));
    }

    #[test]
    fn test_fallback_sets() {
        // MEETEI MAYEK LETTER KOK does not contain "meitei"
        assert!(is_in_script('\u{ABC0}', "meitei"));
        assert!(is_in_script('\u{1C5A}', "ol chiki"));
        assert!(!is_in_script('\u{ABC0}', "devanagari"));
    }

    #[test]
    fn test_unnamed_characters_rejected() {
        // Private use and unassigned code points have no name
        assert!(!is_in_script('\u{E000}', "devanagari"));
        assert!(!is_in_script('\u{0378}', "latin"));
    }

    #[test]
    fn test_classifier_count() {
        let classifier = ScriptClassifier::for_language("hi").unwrap();
        assert_eq!(classifier.script(), "devanagari");
        // 5 devanagari chars, 2 spaces and the danda count; latin letters do not
        assert_eq!(classifier.count("नमस ते। abc"), 8);
    }
}
