use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Composite key scoping conversational memory. Nothing recorded
/// under one key is ever visible under another.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct SessionKey {
    pub actor_id: String,
    pub thread_id: String,
}

impl SessionKey {
    pub fn new(actor_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self { actor_id: actor_id.into(), thread_id: thread_id.into() }
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::new("default-user", "default")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnRole {
    Human,
    Agent,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Agent => "agent",
        }
    }
}

/// One durably recorded turn. Ids are generated fresh per record so
/// repeated writes of the same text never collide.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub role: TurnRole,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), role, text: text.into(), recorded_at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryRecord, SessionKey, TurnRole};

    #[test]
    fn distinct_threads_yield_distinct_keys() {
        let a = SessionKey::new("user-a", "t1");
        let b = SessionKey::new("user-a", "t2");
        assert_ne!(a, b);
    }

    #[test]
    fn records_get_fresh_identifiers() {
        let first = MemoryRecord::new(TurnRole::Human, "hello");
        let second = MemoryRecord::new(TurnRole::Human, "hello");
        assert_ne!(first.id, second.id);
        assert_eq!(first.role.as_str(), "human");
    }
}
