use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal ingestion-time failures. A build that hits one of these
/// aborts whole; no partial store or index is left behind.
///
/// Driver-level failures (sqlx, csv, io, embedding transport) are
/// wrapped through the constructors below so this crate stays free
/// of storage dependencies.
#[derive(Debug, Error)]
pub enum DataIntegrityError {
    #[error("record `{record}` has malformed numeric field `{field}`: `{value}`")]
    MalformedNumericField { record: String, field: &'static str, value: String },
    #[error("duplicate customer identifier `{0}`")]
    DuplicateIdentifier(String),
    #[error("source file not found: `{0}`")]
    MissingSource(PathBuf),
    #[error("FAQ row {row} has an empty {field}")]
    EmptyFaqField { row: usize, field: &'static str },
    #[error("csv error: {0}")]
    Csv(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("index serialization failed: {0}")]
    Serialization(String),
}

impl DataIntegrityError {
    pub fn csv(source: impl Display) -> Self {
        Self::Csv(source.to_string())
    }

    pub fn database(source: impl Display) -> Self {
        Self::Database(source.to_string())
    }

    pub fn embedding(source: impl Display) -> Self {
        Self::Embedding(source.to_string())
    }

    pub fn io(source: impl Display) -> Self {
        Self::Io(source.to_string())
    }

    pub fn serialization(source: impl Display) -> Self {
        Self::Serialization(source.to_string())
    }
}

/// Top-level failure of one conversational turn. Surfaced to callers
/// as an error field beside an empty result, never as a raised fault.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("No prompt provided")]
    EmptyPrompt,
    #[error("reasoning engine failure: {0}")]
    Model(String),
    #[error("tool loop exceeded {0} iterations without a final answer")]
    LoopExhausted(usize),
}

#[cfg(test)]
mod tests {
    use super::{ConversationError, DataIntegrityError};

    #[test]
    fn malformed_field_names_the_record() {
        let err = DataIntegrityError::MalformedNumericField {
            record: "7590-VHVEG".to_string(),
            field: "total_charges",
            value: " ".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("7590-VHVEG"));
        assert!(rendered.contains("total_charges"));
    }

    #[test]
    fn empty_prompt_message_matches_entrypoint_contract() {
        assert_eq!(ConversationError::EmptyPrompt.to_string(), "No prompt provided");
    }
}
