use crate::DbPool;

/// Fixed battery of aggregate queries over the customer store. No
/// inputs, no injection surface; output is one labeled line per
/// aggregate, deterministic for a given store (group-bys are ordered
/// by label).
pub async fn summarize(pool: &DbPool) -> Result<String, sqlx::Error> {
    let mut lines = Vec::with_capacity(5);

    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM customers").fetch_one(pool).await?;
    lines.push(format!("Total: {total} customers"));

    let (avg, min, max): (Option<f64>, Option<f64>, Option<f64>) = sqlx::query_as(
        "SELECT ROUND(AVG(monthly_charges), 2), MIN(monthly_charges), MAX(monthly_charges) \
         FROM customers",
    )
    .fetch_one(pool)
    .await?;
    lines.push(format!(
        "Monthly charges: avg ${}, range ${}-${}",
        avg.unwrap_or(0.0),
        min.unwrap_or(0.0),
        max.unwrap_or(0.0)
    ));

    lines.push(format!("Contracts: {}", group_counts(pool, "contract").await?));
    lines.push(format!("Internet: {}", group_counts(pool, "internet_service").await?));
    lines.push(format!("Churn: {}", group_counts(pool, "churn").await?));

    Ok(lines.join("\n"))
}

async fn group_counts(pool: &DbPool, column: &str) -> Result<String, sqlx::Error> {
    // column names come from the fixed battery above, never from input
    let sql =
        format!("SELECT {column}, COUNT(*) FROM customers GROUP BY {column} ORDER BY {column}");
    let groups: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(pool).await?;

    let rendered = groups
        .iter()
        .map(|(label, count)| format!("\"{label}\": {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("{{{rendered}}}"))
}
