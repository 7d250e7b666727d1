//! Pattern normalization, validation and address matching

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base58 alphabet used by Solana addresses (no `0`, `O`, `I`, `l`)
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Glyphs users commonly type for characters base58 leaves out
const SUBSTITUTIONS: [(char, char); 4] = [('0', '9'), ('O', 'o'), ('I', '1'), ('l', '1')];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Pattern is required")]
    Empty,
    #[error("Pattern only contains ambiguous characters (0, O, I, l)")]
    OnlyAmbiguous,
    #[error("Pattern contains invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },
}

/// Where in the address the pattern must appear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Match at start of address
    #[default]
    Prefix,
    /// Match at end of address
    Suffix,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Prefix => write!(f, "prefix"),
            MatchMode::Suffix => write!(f, "suffix"),
        }
    }
}

/// Matching options for one search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    pub case_sensitive: bool,
    pub mode: MatchMode,
}

/// Partial replacement for [`SearchConfig`]; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub mode: Option<MatchMode>,
}

impl SearchConfig {
    pub fn new(case_sensitive: bool, mode: MatchMode) -> Self {
        Self { case_sensitive, mode }
    }

    /// Replace the fields present in `update`
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(case_sensitive) = update.case_sensitive {
            self.case_sensitive = case_sensitive;
        }
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
    }
}

fn substitute(c: char) -> Option<char> {
    SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
}

/// Replace commonly confused glyphs with their base58 look-alikes
pub fn normalize(pattern: &str) -> String {
    pattern.chars().map(|c| substitute(c).unwrap_or(c)).collect()
}

/// True if every character is in the base58 alphabet. Empty is valid.
pub fn validate(pattern: &str) -> bool {
    pattern.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Like [`validate`] but reports the first offending character and
/// rejects empty patterns
pub fn validate_detailed(pattern: &str) -> Result<(), PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    match pattern
        .chars()
        .enumerate()
        .find(|(_, c)| !BASE58_ALPHABET.contains(*c))
    {
        Some((position, ch)) => Err(PatternError::InvalidCharacter { ch, position }),
        None => Ok(()),
    }
}

/// Characters a pattern position can usefully take.
///
/// Case-insensitive matching folds the alphabet to lowercase, and drops
/// glyphs that [`normalize`] rewrites since a pattern never keeps them.
pub fn valid_characters(case_sensitive: bool) -> String {
    if case_sensitive {
        return BASE58_ALPHABET.to_string();
    }

    let mut folded = String::new();
    for c in BASE58_ALPHABET.chars().map(|c| c.to_ascii_lowercase()) {
        if !folded.contains(c) && substitute(c).is_none() {
            folded.push(c);
        }
    }
    folded
}

/// Number of distinct symbols per address position
pub fn charset_size(case_sensitive: bool) -> usize {
    valid_characters(case_sensitive).chars().count()
}

/// Test `address` against `pattern` under `config`.
///
/// Case-insensitive matching lowercases both sides; ASCII input (every
/// base58 address) takes a byte comparison without allocating.
pub fn matches(address: &str, pattern: &str, config: &SearchConfig) -> bool {
    if !config.case_sensitive && !(address.is_ascii() && pattern.is_ascii()) {
        let folded = SearchConfig {
            case_sensitive: true,
            ..*config
        };
        return matches(&address.to_lowercase(), &pattern.to_lowercase(), &folded);
    }

    let (addr, pat) = (address.as_bytes(), pattern.as_bytes());
    if pat.len() > addr.len() {
        return false;
    }

    let window = match config.mode {
        MatchMode::Prefix => &addr[..pat.len()],
        MatchMode::Suffix => &addr[addr.len() - pat.len()..],
    };

    if config.case_sensitive {
        window == pat
    } else {
        window.eq_ignore_ascii_case(pat)
    }
}

/// A trimmed, normalized and validated pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Pattern(String);

impl Pattern {
    /// Trim, normalize and validate raw user input
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PatternError::Empty);
        }
        if trimmed.chars().all(|c| substitute(c).is_some()) {
            return Err(PatternError::OnlyAmbiguous);
        }

        let normalized = normalize(trimmed);
        validate_detailed(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Pattern {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A pattern bound to its config, ready for the hot loop
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Pattern,
    config: SearchConfig,
}

impl PatternMatcher {
    pub fn new(pattern: Pattern, config: SearchConfig) -> Self {
        Self { pattern, config }
    }

    pub fn is_match(&self, address: &str) -> bool {
        matches(address, self.pattern.as_str(), &self.config)
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSENSITIVE_PREFIX: SearchConfig = SearchConfig {
        case_sensitive: false,
        mode: MatchMode::Prefix,
    };
    const SENSITIVE_SUFFIX: SearchConfig = SearchConfig {
        case_sensitive: true,
        mode: MatchMode::Suffix,
    };

    #[test]
    fn test_normalize_substitutes_once() {
        assert_eq!(normalize("B0b"), "B9b");
        assert_eq!(normalize("0OIl"), "9o11");
        assert_eq!(normalize("abc"), "abc");
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in ["0OIl", "B0b", "hello", "IlO0xyz"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalized_base58_always_validates() {
        for c in BASE58_ALPHABET.chars() {
            assert!(validate(&normalize(&c.to_string())));
        }
        assert!(validate(&normalize(BASE58_ALPHABET)));
        assert!(validate(&normalize("0OIl")));
    }

    #[test]
    fn test_validate() {
        assert!(validate("Sol"));
        assert!(validate(""));
        assert!(!validate("S0l"));
        assert!(!validate("abc!"));
    }

    #[test]
    fn test_validate_detailed_reports_position() {
        assert_eq!(validate_detailed(""), Err(PatternError::Empty));
        assert_eq!(
            validate_detailed("abO"),
            Err(PatternError::InvalidCharacter { ch: 'O', position: 2 })
        );
        assert!(validate_detailed("abo").is_ok());
    }

    #[test]
    fn test_charset_size() {
        assert_eq!(charset_size(true), 58);
        assert_eq!(charset_size(false), 34);
        assert!(!valid_characters(false).contains('l'));
        assert!(valid_characters(false).chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_case_insensitive_prefix() {
        assert!(matches("ABC123xyz", "abc", &INSENSITIVE_PREFIX));
        assert!(matches("abc123xyz", "ABC", &INSENSITIVE_PREFIX));
        assert!(!matches("xABC123", "abc", &INSENSITIVE_PREFIX));
    }

    #[test]
    fn test_case_insensitive_folds_non_ascii() {
        assert!(matches("Äbc", "ä", &INSENSITIVE_PREFIX));
        assert!(matches("äBC", "ÄB", &INSENSITIVE_PREFIX));
        assert!(!matches("Äbc", "ä", &SearchConfig::new(true, MatchMode::Prefix)));

        let insensitive_suffix = SearchConfig::new(false, MatchMode::Suffix);
        assert!(matches("abcÖ", "cö", &insensitive_suffix));
        assert!(!matches("Öabc", "ö", &insensitive_suffix));
    }

    #[test]
    fn test_suffix_mode() {
        assert!(matches("xyzBTC", "BTC", &SENSITIVE_SUFFIX));
        assert!(!matches("BTCxyz", "BTC", &SENSITIVE_SUFFIX));
        assert!(!matches("xyzbtc", "BTC", &SENSITIVE_SUFFIX));
    }

    #[test]
    fn test_pattern_longer_than_address() {
        assert!(!matches("ab", "abc", &INSENSITIVE_PREFIX));
        assert!(!matches("ab", "abc", &SENSITIVE_SUFFIX));
    }

    #[test]
    fn test_parse_trims_and_normalizes() {
        let pattern = Pattern::parse("  S0l ").unwrap();
        assert_eq!(pattern.as_str(), "S91");
        assert_eq!(pattern.len(), 3);
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Pattern::parse(""), Err(PatternError::Empty));
        assert_eq!(Pattern::parse("   "), Err(PatternError::Empty));
        assert_eq!(Pattern::parse("0OIl"), Err(PatternError::OnlyAmbiguous));
        assert!(matches!(
            Pattern::parse("ab_c"),
            Err(PatternError::InvalidCharacter { ch: '_', position: 2 })
        ));
    }

    #[test]
    fn test_config_update_replaces_given_fields() {
        let mut config = SearchConfig::default();
        assert_eq!(config, INSENSITIVE_PREFIX);

        config.apply(ConfigUpdate {
            mode: Some(MatchMode::Suffix),
            ..Default::default()
        });
        assert_eq!(config.mode, MatchMode::Suffix);
        assert!(!config.case_sensitive);

        config.apply(ConfigUpdate {
            case_sensitive: Some(true),
            mode: None,
        });
        assert_eq!(config, SENSITIVE_SUFFIX);
    }

    #[test]
    fn test_config_serde_shape() {
        let json = serde_json::to_string(&SENSITIVE_SUFFIX).unwrap();
        assert_eq!(json, r#"{"caseSensitive":true,"mode":"suffix"}"#);
        let update: ConfigUpdate = serde_json::from_str(r#"{"mode":"prefix"}"#).unwrap();
        assert_eq!(update.mode, Some(MatchMode::Prefix));
        assert_eq!(update.case_sensitive, None);
    }

    #[test]
    fn test_matcher_uses_bound_config() {
        let matcher = PatternMatcher::new(Pattern::parse("sol").unwrap(), INSENSITIVE_PREFIX);
        assert!(matcher.is_match("SoLana111"));
        assert!(!matcher.is_match("111Solana"));
    }
}
