//! Pretrained transformer NER backend
//!
//! Wraps the `rust-bert` token classification pipeline (a BERT model
//! fine-tuned on CoNLL-03) and keeps the entities labeled as persons. The
//! model weights are fetched into the local cache on first load.

use crate::names::PersonRecognizer;
use crate::WhoseError;
use rust_bert::pipelines::ner::{Entity, NERModel};
use std::sync::Mutex;

/// Label the CoNLL-03 models give to person entities
const PERSON_LABEL: &str = "PER";

/// Lines sent to the model per call
const BATCH_LINES: usize = 32;

/// Statistical person recognizer
pub struct TransformerRecognizer {
    model: Mutex<NERModel>,
}

impl TransformerRecognizer {
    /// Loads the default English NER model
    ///
    /// # Returns
    ///
    /// * `Err(WhoseError::NerUnavailable)` - The weights could not be fetched or loaded
    pub fn load() -> Result<Self, WhoseError> {
        let model = NERModel::new(Default::default())
            .map_err(|e| WhoseError::NerUnavailable(format!("transformer model: {}", e)))?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl std::fmt::Debug for TransformerRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRecognizer").finish_non_exhaustive()
    }
}

impl PersonRecognizer for TransformerRecognizer {
    fn name(&self) -> &'static str {
        "transformer-ner"
    }

    fn recognize_persons(&self, text: &str) -> Vec<String> {
        let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
        let Ok(model) = self.model.lock() else {
            tracing::warn!("Transformer recognizer is poisoned, skipping");
            return Vec::new();
        };

        lines
            .chunks(BATCH_LINES)
            .flat_map(|batch| model.predict_full_entities(batch))
            .flat_map(|entities| person_spans(&entities))
            .collect()
    }
}

fn person_spans(entities: &[Entity]) -> Vec<String> {
    entities
        .iter()
        .filter(|entity| is_person_label(&entity.label))
        .map(|entity| entity.word.trim().to_string())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Accepts both merged (`PER`) and IOB-tagged (`B-PER`, `I-PER`) labels
fn is_person_label(label: &str) -> bool {
    let bare = label
        .strip_prefix("B-")
        .or_else(|| label.strip_prefix("I-"))
        .unwrap_or(label);
    bare == PERSON_LABEL
}
