use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, ValueRef};
use tracing::debug;

use crate::DbPool;

pub const NON_SELECT_REFUSAL: &str = "Only SELECT queries allowed.";
pub const MULTI_STATEMENT_REFUSAL: &str = "Only a single SELECT statement is allowed.";
pub const NO_RESULTS: &str = "No results.";

const MAX_RENDERED_ROWS: usize = 15;
const COLUMN_DELIMITER: &str = " | ";

/// Executes a caller-supplied read statement against the customer
/// store and renders the outcome as plain text.
///
/// This is the highest-risk tool surface, so two guards run before
/// anything touches the database: the statement must start with
/// `SELECT`, and it must not contain a second statement behind an
/// embedded terminator. Every failure past the guards is captured and
/// rendered as text; this function never returns an error and never
/// mutates the store.
pub async fn run_select(pool: &DbPool, statement: &str) -> String {
    let trimmed = statement.trim();
    if !trimmed.to_ascii_uppercase().starts_with("SELECT") {
        debug!(statement = trimmed, "rejected non-SELECT statement");
        return NON_SELECT_REFUSAL.to_string();
    }
    if has_embedded_terminator(trimmed) {
        debug!(statement = trimmed, "rejected multi-statement input");
        return MULTI_STATEMENT_REFUSAL.to_string();
    }

    let rows = match sqlx::query(trimmed).fetch_all(pool).await {
        Ok(rows) => rows,
        Err(error) => return format!("SQL Error: {error}"),
    };

    if rows.is_empty() {
        return NO_RESULTS.to_string();
    }

    render_rows(&rows)
}

/// True when a statement terminator remains after the single allowed
/// trailing one. Terminators inside single-quoted literals ('' is the
/// SQL escape) do not count.
fn has_embedded_terminator(statement: &str) -> bool {
    let body = statement.trim_end().trim_end_matches(';');
    let mut in_literal = false;
    for ch in body.chars() {
        match ch {
            '\'' => in_literal = !in_literal,
            ';' if !in_literal => return true,
            _ => {}
        }
    }
    false
}

fn render_rows(rows: &[SqliteRow]) -> String {
    let header = rows[0]
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect::<Vec<_>>()
        .join(COLUMN_DELIMITER);

    let mut output = header;
    for row in rows.iter().take(MAX_RENDERED_ROWS) {
        let rendered = (0..row.columns().len())
            .map(|index| render_value(row, index))
            .collect::<Vec<_>>()
            .join(COLUMN_DELIMITER);
        output.push('\n');
        output.push_str(&rendered);
    }

    if rows.len() > MAX_RENDERED_ROWS {
        output.push('\n');
        output.push_str(&format!("... ({} total rows)", rows.len()));
    }

    output
}

fn render_value(row: &SqliteRow, index: usize) -> String {
    if let Ok(raw) = row.try_get_raw(index) {
        if raw.is_null() {
            return "None".to_string();
        }
    }
    if let Ok(value) = row.try_get::<i64, _>(index) {
        return value.to_string();
    }
    if let Ok(value) = row.try_get::<f64, _>(index) {
        return value.to_string();
    }
    if let Ok(value) = row.try_get::<String, _>(index) {
        return value;
    }
    if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
        return format!("<{} bytes>", value.len());
    }
    "?".to_string()
}

#[cfg(test)]
mod tests {
    use super::has_embedded_terminator;

    #[test]
    fn single_statement_with_trailing_terminator_is_clean() {
        assert!(!has_embedded_terminator("SELECT 1"));
        assert!(!has_embedded_terminator("SELECT 1;"));
        assert!(!has_embedded_terminator("SELECT 1 ;  "));
    }

    #[test]
    fn chained_statement_is_flagged() {
        assert!(has_embedded_terminator("SELECT 1; DROP TABLE customers"));
        assert!(has_embedded_terminator("SELECT 1; DROP TABLE customers;"));
    }

    #[test]
    fn terminator_inside_literal_is_not_flagged() {
        assert!(!has_embedded_terminator(
            "SELECT * FROM customers WHERE customer_id = 'a;b'"
        ));
        assert!(!has_embedded_terminator(
            "SELECT * FROM customers WHERE note = 'it''s; fine'"
        ));
    }
}
