//! Content filter for free-text input
//!
//! Two independent checks, either of which rejects:
//! 1. normalized tokens of at least `min_token_chars` characters are searched
//!    for any denylisted root as a substring
//! 2. the untouched input is matched against the policy's regex set
//!
//! The filter is stateless once built and safe to share across threads.

use regex::{RegexSet, RegexSetBuilder};
use std::collections::HashSet;
use thiserror::Error;

use crate::moderation::policy::FilterPolicy;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("failed to read filter policy {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed filter policy: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a piece of text was or was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// A token contained this denylisted root
    Root(String),
    /// The raw text matched the pattern at this index in the policy
    Pattern(usize),
}

impl Verdict {
    pub fn is_rejected(&self) -> bool {
        !matches!(self, Verdict::Accepted)
    }
}

#[derive(Debug)]
pub struct ContentFilter {
    roots: Vec<String>,
    patterns: RegexSet,
    separators: HashSet<char>,
    min_token_chars: usize,
}

impl ContentFilter {
    pub fn new(policy: FilterPolicy) -> Result<Self, FilterError> {
        let patterns = RegexSetBuilder::new(&policy.patterns)
            .case_insensitive(true)
            .build()?;

        let roots = policy
            .roots
            .iter()
            .map(|root| root.trim().to_lowercase())
            .filter(|root| !root.is_empty())
            .collect();

        Ok(Self {
            roots,
            patterns,
            separators: policy.separators.chars().collect(),
            min_token_chars: policy.min_token_chars,
        })
    }

    /// Filter built from the policy compiled into the crate
    pub fn builtin() -> Result<Self, FilterError> {
        Self::new(FilterPolicy::default())
    }

    pub fn is_rejected(&self, text: &str) -> bool {
        self.verdict(text).is_rejected()
    }

    pub fn verdict(&self, text: &str) -> Verdict {
        let normalized = self.normalize(text);
        let hit = normalized
            .split_whitespace()
            .filter(|token| token.chars().count() >= self.min_token_chars)
            .find_map(|token| self.roots.iter().find(|root| token.contains(root.as_str())));

        if let Some(root) = hit {
            return Verdict::Root(root.clone());
        }

        match self.patterns.matches(text).iter().next() {
            Some(index) => Verdict::Pattern(index),
            None => Verdict::Accepted,
        }
    }

    /// Lowercase and fold separator characters into spaces
    fn normalize(&self, text: &str) -> String {
        text.to_lowercase()
            .chars()
            .map(|c| if self.separators.contains(&c) { ' ' } else { c })
            .collect()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}
