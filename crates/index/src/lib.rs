//! Semantic FAQ index: embedding client abstraction, the vector index
//! and its builder, and the lazily-initialized process-wide handle.

pub mod embedder;
pub mod index;
pub mod shared;

use thiserror::Error;

pub use embedder::{EmbeddingClient, EmbeddingError, HttpEmbeddingClient};
pub use index::{
    build_from_csv, SearchHit, SemanticIndex, NO_RESULTS_SENTINEL, RESULT_DELIMITER, TOP_K,
};
pub use shared::SharedIndex;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Integrity(#[from] telassist_core::DataIntegrityError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
