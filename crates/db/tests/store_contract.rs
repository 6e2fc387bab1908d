use std::fs;
use std::path::PathBuf;

use telassist_core::DataIntegrityError;
use telassist_db::{
    build_from_csv, connect_with_settings, row_count, run_select, summarize, DbPool,
    MULTI_STATEMENT_REFUSAL, NON_SELECT_REFUSAL, NO_RESULTS,
};

const HEADER: &str = "customerID,gender,SeniorCitizen,Partner,Dependents,tenure,PhoneService,\
MultipleLines,InternetService,OnlineSecurity,OnlineBackup,DeviceProtection,TechSupport,\
StreamingTV,StreamingMovies,Contract,PaperlessBilling,PaymentMethod,MonthlyCharges,\
TotalCharges,Churn";

fn customer_line(
    id: &str,
    tenure: &str,
    monthly: &str,
    total: &str,
    contract: &str,
    internet: &str,
    churn: &str,
) -> String {
    format!(
        "{id},Female,0,Yes,No,{tenure},Yes,No,{internet},No,Yes,No,No,No,No,{contract},Yes,\
Electronic check,{monthly},{total},{churn}"
    )
}

fn write_csv(dir: &tempfile::TempDir, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.path().join(name);
    let mut contents = String::from(HEADER);
    for line in lines {
        contents.push('\n');
        contents.push_str(line);
    }
    contents.push('\n');
    fs::write(&path, contents).expect("write fixture csv");
    path
}

async fn memory_pool() -> DbPool {
    connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect")
}

fn small_fixture() -> Vec<String> {
    vec![
        customer_line("C-001", "1", "29.85", "29.85", "Month-to-month", "DSL", "No"),
        customer_line("C-002", "34", "56.95", "1889.5", "One year", "DSL", "No"),
        customer_line("C-003", "2", "53.85", "108.15", "Month-to-month", "Fiber optic", "Yes"),
        customer_line("C-004", "45", "42.3", "1840.75", "Two year", "No", "No"),
        customer_line("C-005", "8", "99.65", "820.5", "Month-to-month", "Fiber optic", "Yes"),
    ]
}

#[tokio::test]
async fn ingest_yields_exact_row_count_and_rebuild_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;

    let inserted = build_from_csv(&pool, &path).await.expect("first build");
    assert_eq!(inserted, 5);
    assert_eq!(row_count(&pool).await.expect("count"), 5);

    let inserted_again = build_from_csv(&pool, &path).await.expect("rebuild");
    assert_eq!(inserted_again, 5);
    assert_eq!(row_count(&pool).await.expect("count after rebuild"), 5);
}

#[tokio::test]
async fn ingested_rows_have_no_null_required_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    let (nulls,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM customers WHERE customer_id IS NULL OR tenure IS NULL \
         OR monthly_charges IS NULL OR total_charges IS NULL OR churn IS NULL",
    )
    .fetch_one(&pool)
    .await
    .expect("null scan");
    assert_eq!(nulls, 0);
}

#[tokio::test]
async fn duplicate_identifier_fails_the_build() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut lines = small_fixture();
    lines.push(customer_line("C-001", "3", "10.0", "30.0", "One year", "DSL", "No"));
    let path = write_csv(&dir, "customers.csv", &lines);
    let pool = memory_pool().await;

    let err = build_from_csv(&pool, &path).await.expect_err("must fail");
    assert!(matches!(err, DataIntegrityError::DuplicateIdentifier(id) if id == "C-001"));
}

#[tokio::test]
async fn malformed_numeric_field_fails_the_build_and_preserves_old_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = write_csv(&dir, "good.csv", &small_fixture());
    let bad = write_csv(
        &dir,
        "bad.csv",
        &[customer_line("C-009", "4", "not-a-number", "19.0", "One year", "DSL", "No")],
    );
    let pool = memory_pool().await;

    build_from_csv(&pool, &good).await.expect("seed store");
    let err = build_from_csv(&pool, &bad).await.expect_err("must fail");
    assert!(matches!(
        err,
        DataIntegrityError::MalformedNumericField { field: "monthly_charges", .. }
    ));

    // the failed rebuild rolled back; the previous store is intact
    assert_eq!(row_count(&pool).await.expect("count"), 5);
}

#[tokio::test]
async fn missing_source_file_is_reported() {
    let pool = memory_pool().await;
    let err = build_from_csv(&pool, std::path::Path::new("no-such-customers.csv"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, DataIntegrityError::MissingSource(_)));
}

#[tokio::test]
async fn non_select_statements_get_fixed_refusal_and_store_is_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    for statement in [
        "DROP TABLE customers",
        "delete from customers",
        "UPDATE customers SET churn = 'Yes'",
        "\"; DROP TABLE customers; --\"",
        "PRAGMA journal_mode",
    ] {
        assert_eq!(run_select(&pool, statement).await, NON_SELECT_REFUSAL);
    }

    assert_eq!(row_count(&pool).await.expect("count"), 5);
}

#[tokio::test]
async fn chained_statement_behind_select_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    let reply = run_select(&pool, "SELECT 1; DROP TABLE customers").await;
    assert_eq!(reply, MULTI_STATEMENT_REFUSAL);
    assert_eq!(row_count(&pool).await.expect("count"), 5);
}

#[tokio::test]
async fn terminator_inside_string_literal_still_executes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    let reply =
        run_select(&pool, "SELECT customer_id FROM customers WHERE customer_id = 'a;b'").await;
    assert_eq!(reply, NO_RESULTS);
}

#[tokio::test]
async fn invalid_select_is_rendered_as_sql_error_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    let reply = run_select(&pool, "SELECT nonexistent_column FROM customers").await;
    assert!(reply.starts_with("SQL Error:"), "got: {reply}");

    let reply = run_select(&pool, "SELECT FROM WHERE").await;
    assert!(reply.starts_with("SQL Error:"), "got: {reply}");
}

#[tokio::test]
async fn successful_select_renders_header_and_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    let reply = run_select(
        &pool,
        "SELECT customer_id, monthly_charges FROM customers WHERE churn = 'Yes' \
         ORDER BY customer_id",
    )
    .await;

    let mut lines = reply.lines();
    assert_eq!(lines.next(), Some("customer_id | monthly_charges"));
    assert_eq!(lines.next(), Some("C-003 | 53.85"));
    assert_eq!(lines.next(), Some("C-005 | 99.65"));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn result_rendering_caps_at_fifteen_rows_with_total_suffix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lines: Vec<String> = (0..20)
        .map(|n| {
            customer_line(
                &format!("C-{n:03}"),
                "1",
                "10.0",
                "10.0",
                "Month-to-month",
                "DSL",
                "No",
            )
        })
        .collect();
    let path = write_csv(&dir, "customers.csv", &lines);
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    let reply = run_select(&pool, "SELECT customer_id FROM customers ORDER BY customer_id").await;
    let rendered: Vec<&str> = reply.lines().collect();

    // header + 15 rows + suffix
    assert_eq!(rendered.len(), 17);
    assert_eq!(rendered[0], "customer_id");
    assert_eq!(*rendered.last().expect("suffix"), "... (20 total rows)");
}

#[tokio::test]
async fn count_query_matches_churn_split() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    let reply = run_select(&pool, "SELECT COUNT(*) FROM customers WHERE churn='Yes'").await;
    assert!(reply.contains('2'), "got: {reply}");

    let reply =
        run_select(&pool, "SELECT COUNT(*) FROM customers WHERE internet_service='Fiber optic'")
            .await;
    assert!(reply.contains('2'), "got: {reply}");
}

#[tokio::test]
async fn aggregate_summary_agrees_with_direct_queries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "customers.csv", &small_fixture());
    let pool = memory_pool().await;
    build_from_csv(&pool, &path).await.expect("build");

    let digest = summarize(&pool).await.expect("summarize");
    let total = row_count(&pool).await.expect("count");
    assert!(digest.contains(&format!("Total: {total} customers")));

    let (expected_avg,): (f64,) =
        sqlx::query_as("SELECT ROUND(AVG(monthly_charges), 2) FROM customers")
            .fetch_one(&pool)
            .await
            .expect("avg");
    assert!(digest.contains(&format!("avg ${expected_avg}")), "got: {digest}");

    assert!(digest.contains("\"Yes\": 2"), "got: {digest}");
    assert!(digest.contains("\"No\": 3"), "got: {digest}");
    assert!(digest.contains("\"Fiber optic\": 2"), "got: {digest}");
    assert!(digest.contains("\"Month-to-month\": 3"), "got: {digest}");
}
