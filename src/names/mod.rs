//! Person-name extraction and validation
//!
//! Candidates come from several independent sources: recognizer backends (a
//! pretrained transformer when built with `bert-ner`, then heuristic ones),
//! greeting idioms, repetition and standalone-line heuristics. They are merged
//! by exact text and filtered by [`NameValidator`] once the whole corpus has
//! been seen.

mod candidates;
mod extractor;
mod patterns;
mod recognizers;
#[cfg(feature = "bert-ner")]
mod statistical;
mod validator;

pub use candidates::{CandidateSet, CandidateSource, NameCandidate};
pub use extractor::NameExtractor;
pub use patterns::{greeting_names, repeated_words, standalone_lines};
pub use recognizers::{GivenNameGazetteer, PersonRecognizer, ProperNounChunker};
pub use validator::{NameValidator, Rejection};

#[cfg(feature = "bert-ner")]
pub use statistical::TransformerRecognizer;
