use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use telassist_core::{DataIntegrityError, FaqEntry};

use crate::embedder::{EmbeddingClient, EmbeddingError};

pub const TOP_K: usize = 3;
pub const NO_RESULTS_SENTINEL: &str = "No relevant FAQ found.";
pub const RESULT_DELIMITER: &str = "\n---\n";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IndexedEntry {
    pub entry: FaqEntry,
    pub vector: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub score: f32,
    pub text: String,
}

/// Nearest-neighbor index over composed FAQ texts. Built once per
/// ingestion run and read-only afterwards.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SemanticIndex {
    model: String,
    dimension: usize,
    entries: Vec<IndexedEntry>,
}

impl SemanticIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embeds every entry and assembles the index. Any embedding
    /// failure fails the whole build; the caller persists only a
    /// fully-built index.
    pub async fn build(
        embedder: &dyn EmbeddingClient,
        faq_entries: Vec<FaqEntry>,
        model: &str,
    ) -> Result<Self, DataIntegrityError> {
        let texts: Vec<String> = faq_entries.iter().map(FaqEntry::composed_text).collect();
        let vectors =
            embedder.embed(&texts).await.map_err(DataIntegrityError::embedding)?;

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        let entries = faq_entries
            .into_iter()
            .zip(vectors)
            .map(|(entry, vector)| IndexedEntry { entry, vector })
            .collect::<Vec<_>>();

        Ok(Self { model: model.to_string(), dimension, entries })
    }

    /// Top-k entries by cosine similarity to the query.
    pub async fn search(
        &self,
        embedder: &dyn EmbeddingClient,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, EmbeddingError> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = embedder
            .embed(std::slice::from_ref(&query.to_string()))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let mut scored: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|indexed| SearchHit {
                score: cosine_similarity(&query_vector, &indexed.vector),
                text: indexed.entry.composed_text(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    /// The tool-facing rendering: top-3 composed texts joined by the
    /// delimiter, or the sentinel when the index has no entries.
    pub async fn search_formatted(
        &self,
        embedder: &dyn EmbeddingClient,
        query: &str,
    ) -> Result<String, EmbeddingError> {
        let hits = self.search(embedder, query, TOP_K).await?;
        if hits.is_empty() {
            return Ok(NO_RESULTS_SENTINEL.to_string());
        }
        Ok(hits.iter().map(|hit| hit.text.as_str()).collect::<Vec<_>>().join(RESULT_DELIMITER))
    }

    /// Persists atomically: serialize to a sibling temp file, then
    /// rename over any previous index. A failed build never replaces
    /// the old index with partial content.
    pub fn save(&self, path: &Path) -> Result<(), DataIntegrityError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(DataIntegrityError::io)?;
            }
        }

        let serialized =
            serde_json::to_vec(self).map_err(DataIntegrityError::serialization)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, serialized).map_err(DataIntegrityError::io)?;
        fs::rename(&temp_path, path).map_err(DataIntegrityError::io)?;

        info!(entries = self.entries.len(), path = %path.display(), "semantic index persisted");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, DataIntegrityError> {
        let raw = fs::read(path).map_err(DataIntegrityError::io)?;
        serde_json::from_slice(&raw).map_err(DataIntegrityError::serialization)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Reads the two-column FAQ CSV, embeds every entry, and persists the
/// resulting index. Full destroy-and-recreate: the old index file is
/// replaced only once the new one is completely built.
pub async fn build_from_csv(
    embedder: &dyn EmbeddingClient,
    csv_path: &Path,
    index_path: &Path,
    model: &str,
) -> Result<SemanticIndex, DataIntegrityError> {
    if !csv_path.exists() {
        return Err(DataIntegrityError::MissingSource(csv_path.to_path_buf()));
    }

    let entries = read_faq_entries(csv_path)?;
    let index = SemanticIndex::build(embedder, entries, model).await?;
    index.save(index_path)?;
    Ok(index)
}

#[derive(Debug, Deserialize)]
struct FaqRow {
    question: String,
    answer: String,
}

fn read_faq_entries(path: &Path) -> Result<Vec<FaqEntry>, DataIntegrityError> {
    let mut reader = csv::Reader::from_path(path).map_err(DataIntegrityError::csv)?;
    let mut entries = Vec::new();

    for (index, row) in reader.deserialize::<FaqRow>().enumerate() {
        let row = row.map_err(DataIntegrityError::csv)?;
        entries.push(FaqEntry::new(&row.question, &row.answer, index + 1)?);
    }

    Ok(entries)
}
