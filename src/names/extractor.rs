use crate::config::ExtractionConfig;
use crate::names::patterns::{greeting_names, repeated_words, standalone_lines};
use crate::names::recognizers::{GivenNameGazetteer, PersonRecognizer, ProperNounChunker};
use crate::names::{CandidateSet, CandidateSource};
use crate::WhoseError;

/// Fuses recognizer backends with the pattern rules into one candidate set
///
/// Page-local sources (recognizers, greeting idioms, standalone lines) run per
/// page through [`NameExtractor::extract_page`]; the repetition heuristic
/// depends on global frequency and runs once over the full corpus through
/// [`NameExtractor::extract_corpus`]. Together they equal
/// [`NameExtractor::extract_candidates`] over the whole text.
pub struct NameExtractor {
    recognizers: Vec<Box<dyn PersonRecognizer>>,
}

impl std::fmt::Debug for NameExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameExtractor")
            .field(
                "recognizers",
                &self.recognizers.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl NameExtractor {
    /// Creates an extractor over an ordered list of recognizer backends
    ///
    /// # Returns
    ///
    /// * `Ok(NameExtractor)` - At least one backend is available
    /// * `Err(WhoseError::NerUnavailable)` - The list is empty
    pub fn new(recognizers: Vec<Box<dyn PersonRecognizer>>) -> Result<Self, WhoseError> {
        if recognizers.is_empty() {
            return Err(WhoseError::NerUnavailable(
                "no recognizer backends configured".to_string(),
            ));
        }
        Ok(Self { recognizers })
    }

    /// Builds the default backends, skipping any that fail to load
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, WhoseError> {
        let mut recognizers: Vec<Box<dyn PersonRecognizer>> = Vec::new();

        #[cfg(feature = "bert-ner")]
        {
            match crate::names::TransformerRecognizer::load() {
                Ok(model) => recognizers.push(Box::new(model)),
                Err(e) => tracing::warn!("Skipping transformer recognizer: {}", e),
            }
        }

        recognizers.push(Box::new(ProperNounChunker::new()));

        let gazetteer = match &config.given_names_path {
            Some(path) => GivenNameGazetteer::with_names_file(path),
            None => Ok(GivenNameGazetteer::new()),
        };
        match gazetteer {
            Ok(gazetteer) => {
                tracing::debug!("Loaded given-name gazetteer with {} names", gazetteer.len());
                recognizers.push(Box::new(gazetteer));
            }
            Err(e) => tracing::warn!("Skipping given-name gazetteer: {}", e),
        }

        Self::new(recognizers)
    }

    pub fn recognizer_names(&self) -> Vec<&'static str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    /// Candidates that only depend on the text of one page
    pub fn extract_page(&self, text: &str) -> CandidateSet {
        let mut candidates = CandidateSet::new();
        if text.trim().is_empty() {
            return candidates;
        }

        for recognizer in &self.recognizers {
            let source = recognizer.source();
            for span in recognizer.recognize_persons(text) {
                candidates.insert(span, source);
            }
        }

        for name in greeting_names(text) {
            candidates.insert(name, CandidateSource::PatternMatch);
        }

        for line in standalone_lines(text) {
            candidates.insert(line, CandidateSource::StandaloneLine);
        }

        candidates
    }

    /// Candidates that depend on frequency across the whole corpus
    pub fn extract_corpus(&self, corpus: &str) -> CandidateSet {
        let mut candidates = CandidateSet::new();
        for word in repeated_words(corpus) {
            candidates.insert(word, CandidateSource::Repetition);
        }
        candidates
    }

    /// Every source over a single text
    pub fn extract_candidates(&self, text: &str) -> CandidateSet {
        let mut candidates = self.extract_page(text);
        candidates.merge(self.extract_corpus(text));
        candidates
    }
}
