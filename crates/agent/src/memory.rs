use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use telassist_core::{MemoryRecord, SessionKey, TurnRole};

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory backend failure: {0}")]
    Backend(String),
}

/// Durable per-session conversational memory. Records are partitioned
/// by (actor, thread) and nothing crosses keys. Recall is best-effort:
/// callers treat failures as degraded retrieval, not turn failures.
#[async_trait]
pub trait SessionMemory: Send + Sync {
    async fn record(
        &self,
        key: &SessionKey,
        role: TurnRole,
        text: &str,
    ) -> Result<Uuid, MemoryError>;

    async fn recall(
        &self,
        key: &SessionKey,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError>;
}

/// The minimal backing store: per-key append-only vectors behind one
/// RwLock. Distinct keys contend only on the map itself.
#[derive(Default)]
pub struct InMemorySessionMemory {
    sessions: RwLock<HashMap<SessionKey, Vec<MemoryRecord>>>,
}

#[async_trait]
impl SessionMemory for InMemorySessionMemory {
    async fn record(
        &self,
        key: &SessionKey,
        role: TurnRole,
        text: &str,
    ) -> Result<Uuid, MemoryError> {
        let record = MemoryRecord::new(role, text);
        let id = record.id;
        let mut sessions = self.sessions.write().await;
        sessions.entry(key.clone()).or_default().push(record);
        Ok(id)
    }

    async fn recall(
        &self,
        key: &SessionKey,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let sessions = self.sessions.read().await;
        let Some(records) = sessions.get(key) else {
            return Ok(Vec::new());
        };

        let query_tokens = tokenize(query);
        let mut scored: Vec<(usize, &MemoryRecord)> = records
            .iter()
            .map(|record| (overlap(&query_tokens, &tokenize(&record.text)), record))
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().take(limit).map(|(_, record)| record.clone()).collect())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn overlap(query_tokens: &[String], record_tokens: &[String]) -> usize {
    query_tokens.iter().filter(|token| record_tokens.contains(token)).count()
}

#[cfg(test)]
mod tests {
    use telassist_core::{SessionKey, TurnRole};

    use super::{InMemorySessionMemory, SessionMemory};

    #[tokio::test]
    async fn records_are_isolated_per_session_key() {
        let memory = InMemorySessionMemory::default();
        let key_a1 = SessionKey::new("actor-a", "t1");
        let key_a2 = SessionKey::new("actor-a", "t2");
        let key_b1 = SessionKey::new("actor-b", "t1");

        memory
            .record(&key_a1, TurnRole::Human, "my roaming bill looks wrong")
            .await
            .expect("record");

        let same_key = memory.recall(&key_a1, "roaming bill", 5).await.expect("recall");
        assert_eq!(same_key.len(), 1);

        let other_thread = memory.recall(&key_a2, "roaming bill", 5).await.expect("recall");
        assert!(other_thread.is_empty());

        let other_actor = memory.recall(&key_b1, "roaming bill", 5).await.expect("recall");
        assert!(other_actor.is_empty());
    }

    #[tokio::test]
    async fn recall_ranks_by_token_overlap_and_respects_limit() {
        let memory = InMemorySessionMemory::default();
        let key = SessionKey::new("actor-a", "t1");

        memory.record(&key, TurnRole::Human, "how much is the premium plan").await.expect("r");
        memory.record(&key, TurnRole::Agent, "the premium plan is $80").await.expect("r");
        memory.record(&key, TurnRole::Human, "unrelated voicemail question").await.expect("r");

        let hits = memory.recall(&key, "premium plan price", 2).await.expect("recall");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|record| record.text.contains("premium")));
    }

    #[tokio::test]
    async fn appends_preserve_call_order_within_a_key() {
        let memory = InMemorySessionMemory::default();
        let key = SessionKey::new("actor-a", "t1");

        memory.record(&key, TurnRole::Human, "first message here").await.expect("r");
        memory.record(&key, TurnRole::Agent, "second message here").await.expect("r");

        let hits = memory.recall(&key, "message here", 5).await.expect("recall");
        assert_eq!(hits.len(), 2);
        // equal scores keep append order
        assert!(hits[0].text.starts_with("first"));
        assert!(hits[1].text.starts_with("second"));
    }
}
