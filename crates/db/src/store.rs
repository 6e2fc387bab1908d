use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use telassist_core::{CustomerRecord, DataIntegrityError, RawCustomerRow};

use crate::DbPool;

const CREATE_CUSTOMERS: &str = r#"
CREATE TABLE customers (
    customer_id TEXT PRIMARY KEY,
    gender TEXT,
    senior_citizen INTEGER,
    partner TEXT,
    dependents TEXT,
    tenure INTEGER,
    phone_service TEXT,
    multiple_lines TEXT,
    internet_service TEXT,
    online_security TEXT,
    online_backup TEXT,
    device_protection TEXT,
    tech_support TEXT,
    streaming_tv TEXT,
    streaming_movies TEXT,
    contract TEXT,
    paperless_billing TEXT,
    payment_method TEXT,
    monthly_charges REAL,
    total_charges REAL,
    churn TEXT
)
"#;

const INSERT_CUSTOMER: &str = "INSERT INTO customers VALUES \
    (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)";

/// Rebuilds the `customers` table from the source CSV.
///
/// The rebuild is all-or-nothing: drop, create, and every insert run
/// inside one transaction, so a malformed row or duplicate identifier
/// leaves any pre-existing store untouched.
pub async fn build_from_csv(pool: &DbPool, path: &Path) -> Result<usize, DataIntegrityError> {
    if !path.exists() {
        return Err(DataIntegrityError::MissingSource(path.to_path_buf()));
    }

    let records = read_records(path)?;

    let mut tx = pool.begin().await.map_err(DataIntegrityError::database)?;
    sqlx::query("DROP TABLE IF EXISTS customers")
        .execute(&mut *tx)
        .await
        .map_err(DataIntegrityError::database)?;
    sqlx::query(CREATE_CUSTOMERS)
        .execute(&mut *tx)
        .await
        .map_err(DataIntegrityError::database)?;

    for record in &records {
        sqlx::query(INSERT_CUSTOMER)
            .bind(&record.customer_id)
            .bind(&record.gender)
            .bind(record.senior_citizen)
            .bind(&record.partner)
            .bind(&record.dependents)
            .bind(record.tenure)
            .bind(&record.phone_service)
            .bind(&record.multiple_lines)
            .bind(&record.internet_service)
            .bind(&record.online_security)
            .bind(&record.online_backup)
            .bind(&record.device_protection)
            .bind(&record.tech_support)
            .bind(&record.streaming_tv)
            .bind(&record.streaming_movies)
            .bind(&record.contract)
            .bind(&record.paperless_billing)
            .bind(&record.payment_method)
            .bind(record.monthly_charges)
            .bind(record.total_charges)
            .bind(&record.churn)
            .execute(&mut *tx)
            .await
            .map_err(DataIntegrityError::database)?;
    }

    tx.commit().await.map_err(DataIntegrityError::database)?;

    info!(rows = records.len(), source = %path.display(), "structured store rebuilt");
    Ok(records.len())
}

fn read_records(path: &Path) -> Result<Vec<CustomerRecord>, DataIntegrityError> {
    let mut reader = csv::Reader::from_path(path).map_err(DataIntegrityError::csv)?;
    let mut seen_ids = HashSet::new();
    let mut records = Vec::new();

    for raw in reader.deserialize::<RawCustomerRow>() {
        let raw = raw.map_err(DataIntegrityError::csv)?;
        let record = CustomerRecord::from_raw(raw)?;
        if !seen_ids.insert(record.customer_id.clone()) {
            return Err(DataIntegrityError::DuplicateIdentifier(record.customer_id));
        }
        records.push(record);
    }

    Ok(records)
}

pub async fn row_count(pool: &DbPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM customers").fetch_one(pool).await?;
    Ok(count)
}
