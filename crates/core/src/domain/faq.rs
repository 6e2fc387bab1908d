use serde::{Deserialize, Serialize};

use crate::errors::DataIntegrityError;

pub const FAQ_SOURCE: &str = "faq";

/// One question/answer pair from the FAQ corpus.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    FAQ_SOURCE.to_string()
}

impl FaqEntry {
    /// Validates the non-empty invariant; `row` is the 1-based source
    /// row used in the failure message.
    pub fn new(question: &str, answer: &str, row: usize) -> Result<Self, DataIntegrityError> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() {
            return Err(DataIntegrityError::EmptyFaqField { row, field: "question" });
        }
        if answer.is_empty() {
            return Err(DataIntegrityError::EmptyFaqField { row, field: "answer" });
        }
        Ok(Self {
            question: question.to_string(),
            answer: answer.to_string(),
            source: default_source(),
        })
    }

    /// The searchable text unit the index is built over.
    pub fn composed_text(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}
