//! Person recognizer backends
//!
//! Each backend sits behind [`PersonRecognizer`] so the extractor can hold an
//! ordered list of whichever backends loaded, and union their spans.

use crate::names::CandidateSource;
use crate::WhoseError;
use std::collections::HashSet;
use std::path::Path;

/// Capability interface for anything that can find person spans in text
pub trait PersonRecognizer: Send + Sync {
    /// Short backend identifier used for provenance and logging
    fn name(&self) -> &'static str;

    /// Returns every span this backend labels as a person
    fn recognize_persons(&self, text: &str) -> Vec<String>;

    fn source(&self) -> CandidateSource {
        CandidateSource::Recognizer(self.name())
    }
}

/// Longest span a recognizer will emit, in words
const MAX_SPAN_WORDS: usize = 3;

/// Words that introduce a person immediately after them
const PERSON_CUES: &[&str] = &[
    "mr", "mrs", "ms", "miss", "mx", "dr", "prof", "sir", "dame", "by", "founder", "cofounder",
    "co-founder", "ceo", "cto", "owner", "author", "photographer", "designer", "developer",
    "editor", "director", "manager", "artist", "dear",
];

/// Capitalized words that start sentences or label navigation, never names
const NON_NAME_WORDS: &[&str] = &[
    "a", "about", "all", "an", "and", "are", "as", "at", "blog", "but", "by", "contact",
    "copyright", "for", "from", "get", "hello", "hi", "home", "how", "i", "i'm", "if", "in", "is", "it",
    "learn", "menu", "more", "my", "new", "no", "not", "of", "on", "or", "our", "portfolio",
    "posts", "privacy", "products", "projects", "read", "search", "see", "services", "shop",
    "so", "terms", "that", "the", "their", "these", "they", "this", "those", "to", "us", "we",
    "welcome", "what", "when", "where", "which", "who", "why", "with", "work", "you", "your",
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "monday", "tuesday", "wednesday", "thursday", "friday",
    "saturday", "sunday",
];

/// Given names recognized out of the box
const GIVEN_NAMES: &[&str] = &[
    "aaron", "adam", "adrian", "aisha", "alan", "albert", "alex", "alexander", "alexandra",
    "alice", "amanda", "amir", "amy", "ana", "andrea", "andrew", "angela", "anna", "anne",
    "anthony", "antonio", "arjun", "ashley", "barbara", "ben", "benjamin", "brian", "carlos",
    "carmen", "caroline", "catherine", "charles", "charlotte", "chen", "chris", "christina",
    "christopher", "claire", "daniel", "david", "deborah", "diana", "diane", "diego",
    "dmitri", "elena", "elizabeth", "emily", "emma", "eric", "fatima", "francesca", "frank",
    "gabriel", "george", "grace", "hannah", "hassan", "helen", "henry", "hiroshi", "ian",
    "isabel", "ivan", "jack", "jacob", "james", "jane", "jason", "jennifer", "jessica",
    "joanna", "john", "jonathan", "jose", "joseph", "julia", "justin", "karen", "kate",
    "katherine", "kevin", "laura", "lena", "linda", "lisa", "lucas", "lucy", "maria", "mark",
    "marta", "martin", "mary", "matthew", "mei", "michael", "michelle", "mohamed", "mohammed",
    "nadia", "natalie", "nicholas", "nicole", "olga", "oliver", "olivia", "omar", "patrick",
    "paul", "peter", "priya", "rachel", "rahul", "rebecca", "richard", "robert", "ryan",
    "samantha", "samuel", "sandra", "sarah", "sofia", "sophie", "stephen", "steven", "susan",
    "thomas", "timothy", "victoria", "william", "yuki", "zoe",
];

/// A whitespace token with its edge punctuation stripped
#[derive(Debug)]
struct Token<'a> {
    word: &'a str,
    /// The raw token ended a clause (`,` `.` `;` `:` `!` `?`)
    closes_clause: bool,
    /// The raw token ended with a period, as abbreviations like `Dr.` do
    period: bool,
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    line.split_whitespace()
        .filter_map(|raw| {
            let closes_clause = raw.ends_with(|c: char| ",.;:!?)".contains(c));
            let period = raw.ends_with('.');
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\'');
            let word = word.trim_matches(|c: char| c == '-' || c == '\'');
            (!word.is_empty()).then_some(Token {
                word,
                closes_clause,
                period,
            })
        })
        .collect()
}

/// True for `Jane`, `O'Neil`, `Smith-Jones`; false for `JANE`, `jane`, `J`
fn is_title_case(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }

    let rest: Vec<char> = chars.collect();
    !rest.is_empty()
        && rest.iter().any(|c| c.is_lowercase())
        && rest
            .iter()
            .all(|c| c.is_alphabetic() || *c == '-' || *c == '\'')
}

fn is_non_name(word: &str) -> bool {
    let lowered = word.to_lowercase();
    NON_NAME_WORDS.contains(&lowered.as_str()) || PERSON_CUES.contains(&lowered.as_str())
}

/// The token before `index` introduces a person
fn follows_cue(tokens: &[Token<'_>], index: usize) -> bool {
    let Some(previous) = index.checked_sub(1).map(|i| &tokens[i]) else {
        return false;
    };
    PERSON_CUES.contains(&previous.word.to_lowercase().as_str())
        && (!previous.closes_clause || previous.period)
}

fn is_name_word(word: &str) -> bool {
    is_title_case(word) && !is_non_name(word)
}

/// Collects up to `MAX_SPAN_WORDS` name words starting at `start`
fn take_span(tokens: &[Token<'_>], start: usize) -> (String, usize) {
    let mut words = Vec::new();
    let mut index = start;
    while index < tokens.len() && words.len() < MAX_SPAN_WORDS && is_name_word(tokens[index].word)
    {
        words.push(tokens[index].word);
        index += 1;
        if tokens[index - 1].closes_clause {
            break;
        }
    }
    (words.join(" "), index - start)
}

/// Context-cued proper noun chunker
///
/// Emits title-case spans that follow a person cue ("by", "Dr", "founder"),
/// and any run of two or three consecutive title-case words that are not
/// function words or navigation labels.
#[derive(Debug, Default)]
pub struct ProperNounChunker;

impl ProperNounChunker {
    pub fn new() -> Self {
        Self
    }
}

impl PersonRecognizer for ProperNounChunker {
    fn name(&self) -> &'static str {
        "proper-noun-chunker"
    }

    fn recognize_persons(&self, text: &str) -> Vec<String> {
        let mut spans = Vec::new();

        for line in text.lines() {
            let tokens = tokenize(line);
            let mut index = 0;

            while index < tokens.len() {
                let cued = follows_cue(&tokens, index);

                let (span, consumed) = take_span(&tokens, index);
                if consumed == 0 {
                    index += 1;
                    continue;
                }

                if cued || consumed >= 2 {
                    spans.push(span);
                }
                index += consumed;
            }
        }

        spans
    }
}

/// Given-name gazetteer
///
/// A known given name, optionally followed by up to two title-case surnames,
/// is labeled as a person. The built-in list can be extended from a file with
/// one name per line (`#` starts a comment).
#[derive(Debug)]
pub struct GivenNameGazetteer {
    names: HashSet<String>,
}

impl Default for GivenNameGazetteer {
    fn default() -> Self {
        Self::new()
    }
}

impl GivenNameGazetteer {
    pub fn new() -> Self {
        Self {
            names: GIVEN_NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Builds the gazetteer from the built-in list plus the names in `path`
    pub fn with_names_file(path: &Path) -> Result<Self, WhoseError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WhoseError::NerUnavailable(format!(
                "given-name list {} could not be read: {}",
                path.display(),
                e
            ))
        })?;

        let mut gazetteer = Self::new();
        gazetteer.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        );
        Ok(gazetteer)
    }

    pub fn extend<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.names
            .extend(names.into_iter().map(|name| name.to_lowercase()));
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl PersonRecognizer for GivenNameGazetteer {
    fn name(&self) -> &'static str {
        "given-name-gazetteer"
    }

    fn recognize_persons(&self, text: &str) -> Vec<String> {
        let mut spans = Vec::new();

        for line in text.lines() {
            let tokens = tokenize(line);
            let mut index = 0;

            while index < tokens.len() {
                let word = tokens[index].word;
                if is_title_case(word) && self.names.contains(&word.to_lowercase()) {
                    let (span, consumed) = take_span(&tokens, index);
                    if consumed > 0 {
                        spans.push(span);
                        index += consumed;
                        continue;
                    }
                    spans.push(word.to_string());
                }
                index += 1;
            }
        }

        spans
    }
}
