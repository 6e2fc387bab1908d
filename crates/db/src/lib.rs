//! Structured customer store: SQLite pool, drop-and-recreate store
//! builder, the guarded ad-hoc SELECT tool, and the fixed aggregate
//! battery.

pub mod connection;
pub mod query;
pub mod stats;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use query::{run_select, MULTI_STATEMENT_REFUSAL, NON_SELECT_REFUSAL, NO_RESULTS};
pub use stats::summarize;
pub use store::{build_from_csv, row_count};
