//! Shared domain types, configuration, and error taxonomy for the
//! telassist retrieval agent.
//!
//! The crates above this one split along the data path:
//! `telassist-db` owns the structured customer store, `telassist-index`
//! owns the semantic FAQ index, and `telassist-agent` wires both into
//! the tool-calling conversation runtime.

pub mod config;
pub mod domain;
pub mod errors;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::customer::{CustomerRecord, RawCustomerRow};
pub use domain::faq::{FaqEntry, FAQ_SOURCE};
pub use domain::session::{MemoryRecord, SessionKey, TurnRole};
pub use errors::{ConversationError, DataIntegrityError};
