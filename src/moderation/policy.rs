//! Moderation policy data
//!
//! The filter algorithm never hard-codes words. Everything it matches comes
//! from a `FilterPolicy`, which can be loaded from JSON at startup.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::moderation::filter::FilterError;

/// Word roots matched as substrings of normalized tokens.
///
/// Roots are intentionally short so inflected forms match without being
/// listed one by one.
const DEFAULT_ROOTS: &[&str] = &[
    "хуй", "хуе", "хуё", "хуя", "пизд", "еба", "ёба", "ебл", "бля", "сука", "суки",
    "муда", "залуп", "пидор", "пидар", "шлюх", "гандон", "дроч", "fuck", "shit", "bitch",
    "cunt", "asshole", "whore",
];

/// Patterns run against the raw text to catch spellings that tokenizing
/// would break apart (punctuation inside a word, Latin look-alikes).
///
/// Patterns whose letters also occur inside ordinary inflections (тихую,
/// плохую) only match at the start of a word.
const DEFAULT_PATTERNS: &[&str] = &[
    r"(?:^|[^\p{L}])[хx][^\p{L}\s]*[уy][^\p{L}\s]*[йияеёю]",
    r"х\*+[йяеё]",
    r"[пp][^\p{L}\s]*[иi1!][^\p{L}\s]*[зz3][^\p{L}\s]*[дd]",
    r"(?:^|[^\p{L}])е[^\p{L}\s]*[бb6][^\p{L}\s]*[аa@][^\p{L}\s]*[лтнш]",
    r"[бb6][^\p{L}\s]+[лl][^\p{L}\s]*[яy]",
    r"f[^\p{L}\s]*[u\*@][^\p{L}\s]*c[^\p{L}\s]*k",
    r"sh[^\p{L}\s]*[i1!\*][^\p{L}\s]*t\b",
];

/// Characters replaced with spaces before tokenizing
const DEFAULT_SEPARATORS: &str = ".,!?;:\"'`()[]{}<>-_*/\\|@#$%^&~+=«»—–…";

const DEFAULT_MIN_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPolicy {
    /// Lowercase word roots; a token containing any of them is rejected
    pub roots: Vec<String>,

    /// Regular expressions matched case-insensitively against the raw text
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Punctuation folded into whitespace during normalization
    #[serde(default = "FilterPolicy::default_separators")]
    pub separators: String,

    /// Tokens shorter than this (in characters) are ignored
    #[serde(default = "FilterPolicy::default_min_token_chars")]
    pub min_token_chars: usize,
}

impl FilterPolicy {
    fn default_separators() -> String {
        DEFAULT_SEPARATORS.to_string()
    }

    const fn default_min_token_chars() -> usize {
        DEFAULT_MIN_TOKEN_CHARS
    }

    /// Policy with only the given roots and no patterns
    pub fn with_roots<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            patterns: Vec::new(),
            separators: Self::default_separators(),
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, FilterError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FilterError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            roots: DEFAULT_ROOTS.iter().map(|s| s.to_string()).collect(),
            patterns: DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect(),
            separators: Self::default_separators(),
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
        }
    }
}
