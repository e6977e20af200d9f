//! Lexical and structural filtering of candidate names

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

static NAME_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+(?: [A-Z][a-z]+)*$").expect("name pattern is valid"));

/// Navigation and boilerplate labels that are never names
const EXCLUDED_TERMS: &[&str] = &[
    "home", "about", "contact", "projects", "services", "blog", "products", "portfolio",
    "gallery", "resume", "careers", "pricing", "privacy", "terms", "login", "signup",
    "search", "subscribe", "newsletter", "welcome", "read more", "learn more", "about me",
    "about us", "contact me", "contact us", "get in touch", "all rights reserved",
];

const MAX_WORDS: usize = 3;
const MIN_CHARS: usize = 5;
const MAX_CHARS: usize = 20;

/// Why a candidate was rejected; rules are applied in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AllUppercase,
    TooManyWords,
    LengthOutOfRange,
    ContainsDigit,
    ExcludedTerm,
    NotNameShaped,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::AllUppercase => "entirely upper-case",
            Self::TooManyWords => "more than three words",
            Self::LengthOutOfRange => "length outside 5..=20",
            Self::ContainsDigit => "contains a digit",
            Self::ExcludedTerm => "navigation or boilerplate term",
            Self::NotNameShaped => "not shaped like a name",
        };
        f.write_str(reason)
    }
}

/// Filters raw candidates down to plausible human names
#[derive(Debug, Clone)]
pub struct NameValidator {
    exclusions: HashSet<String>,
}

impl Default for NameValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameValidator {
    pub fn new() -> Self {
        Self {
            exclusions: EXCLUDED_TERMS.iter().map(|term| term.to_string()).collect(),
        }
    }

    /// Adds terms to the exclusion list (compared case-insensitively)
    pub fn with_extra_exclusions<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclusions
            .extend(terms.into_iter().map(|term| term.as_ref().trim().to_lowercase()));
        self
    }

    /// Runs every rule in order and reports the first one that fails
    pub fn check(&self, candidate: &str) -> Result<(), Rejection> {
        if candidate.chars().any(char::is_alphabetic) && !candidate.chars().any(char::is_lowercase)
        {
            return Err(Rejection::AllUppercase);
        }

        if candidate.split_whitespace().count() > MAX_WORDS {
            return Err(Rejection::TooManyWords);
        }

        let length = candidate.chars().count();
        if !(MIN_CHARS..=MAX_CHARS).contains(&length) {
            return Err(Rejection::LengthOutOfRange);
        }

        if candidate.chars().any(char::is_numeric) {
            return Err(Rejection::ContainsDigit);
        }

        if self.exclusions.contains(&candidate.to_lowercase()) {
            return Err(Rejection::ExcludedTerm);
        }

        if !NAME_SHAPE.is_match(candidate) {
            return Err(Rejection::NotNameShaped);
        }

        Ok(())
    }

    pub fn is_valid(&self, candidate: &str) -> bool {
        self.check(candidate).is_ok()
    }

    /// Keeps the candidates that pass every rule
    pub fn validate<'a, I>(&self, candidates: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates
            .into_iter()
            .filter(|candidate| match self.check(candidate) {
                Ok(()) => true,
                Err(reason) => {
                    tracing::trace!("Rejected candidate {:?}: {}", candidate, reason);
                    false
                }
            })
            .map(str::to_string)
            .collect()
    }
}
