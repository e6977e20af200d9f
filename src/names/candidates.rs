use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

/// Where a candidate name was first seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// A person recognizer backend, by name
    Recognizer(&'static str),
    /// A self-introduction idiom such as "Hi, I'm ..."
    PatternMatch,
    /// A capitalized word repeated across the corpus
    Repetition,
    /// A line holding a single capitalized word
    StandaloneLine,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recognizer(name) => write!(f, "recognizer:{}", name),
            Self::PatternMatch => write!(f, "pattern"),
            Self::Repetition => write!(f, "repetition"),
            Self::StandaloneLine => write!(f, "standalone-line"),
        }
    }
}

/// An unvalidated string suspected of being a person's name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCandidate {
    pub text: String,
    pub source: CandidateSource,
}

/// Candidates keyed by exact text
///
/// The first source to report a text is kept; provenance is informational.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: BTreeMap<String, CandidateSource>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate, returning false if the text was already present
    pub fn insert(&mut self, text: impl Into<String>, source: CandidateSource) -> bool {
        let text = text.into();
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        match self.entries.entry(text.to_string()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(source);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Merges another set into this one
    pub fn merge(&mut self, other: CandidateSet) {
        for (text, source) in other.entries {
            self.entries.entry(text).or_insert(source);
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    pub fn source_of(&self, text: &str) -> Option<CandidateSource> {
        self.entries.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = NameCandidate> + '_ {
        self.entries.iter().map(|(text, source)| NameCandidate {
            text: text.clone(),
            source: *source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_keep_first_source() {
        let mut set = CandidateSet::new();
        assert!(set.insert("Jane Doe", CandidateSource::PatternMatch));
        assert!(!set.insert("Jane Doe", CandidateSource::Repetition));
        assert_eq!(set.len(), 1);
        assert_eq!(set.source_of("Jane Doe"), Some(CandidateSource::PatternMatch));
    }

    #[test]
    fn test_exact_text_keys() {
        let mut set = CandidateSet::new();
        set.insert("Jane", CandidateSource::StandaloneLine);
        set.insert("jane", CandidateSource::StandaloneLine);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_blank_ignored_and_trimmed() {
        let mut set = CandidateSet::new();
        assert!(!set.insert("   ", CandidateSource::PatternMatch));
        assert!(set.insert(" Jane ", CandidateSource::PatternMatch));
        assert!(set.contains("Jane"));
    }

    #[test]
    fn test_merge() {
        let mut a = CandidateSet::new();
        a.insert("Jane", CandidateSource::Recognizer("gazetteer"));
        let mut b = CandidateSet::new();
        b.insert("Jane", CandidateSource::Repetition);
        b.insert("Omar", CandidateSource::Repetition);
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(
            a.source_of("Jane"),
            Some(CandidateSource::Recognizer("gazetteer"))
        );
    }
}
