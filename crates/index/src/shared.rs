use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::embedder::EmbeddingClient;
use crate::index::{build_from_csv, SemanticIndex};
use crate::IndexError;

/// Process-wide handle to the semantic index.
///
/// The index is expensive to load and immutable once loaded, so it is
/// materialized at most once: the first caller loads the persisted
/// file (or rebuilds it from the FAQ CSV when absent) and every later
/// caller shares the same `Arc`. `OnceCell` serializes concurrent
/// first calls, so two sessions racing on first use cannot build the
/// index twice or observe a partially-built handle.
pub struct SharedIndex {
    cell: OnceCell<Arc<SemanticIndex>>,
    embedder: Arc<dyn EmbeddingClient>,
    index_path: PathBuf,
    faq_path: PathBuf,
    model: String,
}

impl SharedIndex {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index_path: PathBuf,
        faq_path: PathBuf,
        model: impl Into<String>,
    ) -> Self {
        Self { cell: OnceCell::new(), embedder, index_path, faq_path, model: model.into() }
    }

    pub async fn get(&self) -> Result<Arc<SemanticIndex>, IndexError> {
        self.cell
            .get_or_try_init(|| async {
                let index = if self.index_path.exists() {
                    let index = SemanticIndex::load(&self.index_path)?;
                    info!(
                        entries = index.len(),
                        path = %self.index_path.display(),
                        "semantic index loaded"
                    );
                    index
                } else {
                    info!(path = %self.index_path.display(), "no persisted index, rebuilding");
                    build_from_csv(
                        self.embedder.as_ref(),
                        &self.faq_path,
                        &self.index_path,
                        &self.model,
                    )
                    .await?
                };
                Ok::<_, IndexError>(Arc::new(index))
            })
            .await
            .cloned()
    }

    /// Tool-facing search over the lazily-loaded index.
    pub async fn search_formatted(&self, query: &str) -> Result<String, IndexError> {
        let index = self.get().await?;
        Ok(index.search_formatted(self.embedder.as_ref(), query).await?)
    }
}
