use serde::Deserialize;

use crate::errors::DataIntegrityError;

/// One row of the source customer file, field names exactly as they
/// appear in the CSV header.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawCustomerRow {
    #[serde(rename = "customerID")]
    pub customer_id: String,
    pub gender: String,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: String,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    pub tenure: String,
    #[serde(rename = "PhoneService")]
    pub phone_service: String,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: String,
    #[serde(rename = "OnlineBackup")]
    pub online_backup: String,
    #[serde(rename = "DeviceProtection")]
    pub device_protection: String,
    #[serde(rename = "TechSupport")]
    pub tech_support: String,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: String,
    #[serde(rename = "StreamingMovies")]
    pub streaming_movies: String,
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: String,
    #[serde(rename = "TotalCharges")]
    pub total_charges: String,
    #[serde(rename = "Churn")]
    pub churn: String,
}

/// A typed subscriber record. Identifier is unique and immutable once
/// ingested; the store builder enforces uniqueness with the primary key.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub gender: String,
    pub senior_citizen: i64,
    pub partner: String,
    pub dependents: String,
    pub tenure: i64,
    pub phone_service: String,
    pub multiple_lines: String,
    pub internet_service: String,
    pub online_security: String,
    pub online_backup: String,
    pub device_protection: String,
    pub tech_support: String,
    pub streaming_tv: String,
    pub streaming_movies: String,
    pub contract: String,
    pub paperless_billing: String,
    pub payment_method: String,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub churn: String,
}

impl CustomerRecord {
    /// Coerces the raw row's numeric fields. A failed coercion fails
    /// the whole ingestion run, naming the offending record.
    pub fn from_raw(raw: RawCustomerRow) -> Result<Self, DataIntegrityError> {
        let senior_citizen = parse_int(&raw.customer_id, "senior_citizen", &raw.senior_citizen)?;
        let tenure = parse_int(&raw.customer_id, "tenure", &raw.tenure)?;
        let monthly_charges =
            parse_float(&raw.customer_id, "monthly_charges", &raw.monthly_charges)?;
        let total_charges = parse_float(&raw.customer_id, "total_charges", &raw.total_charges)?;

        Ok(Self {
            customer_id: raw.customer_id,
            gender: raw.gender,
            senior_citizen,
            partner: raw.partner,
            dependents: raw.dependents,
            tenure,
            phone_service: raw.phone_service,
            multiple_lines: raw.multiple_lines,
            internet_service: raw.internet_service,
            online_security: raw.online_security,
            online_backup: raw.online_backup,
            device_protection: raw.device_protection,
            tech_support: raw.tech_support,
            streaming_tv: raw.streaming_tv,
            streaming_movies: raw.streaming_movies,
            contract: raw.contract,
            paperless_billing: raw.paperless_billing,
            payment_method: raw.payment_method,
            monthly_charges,
            total_charges,
            churn: raw.churn,
        })
    }
}

fn parse_int(
    record: &str,
    field: &'static str,
    value: &str,
) -> Result<i64, DataIntegrityError> {
    value.trim().parse::<i64>().map_err(|_| DataIntegrityError::MalformedNumericField {
        record: record.to_string(),
        field,
        value: value.to_string(),
    })
}

fn parse_float(
    record: &str,
    field: &'static str,
    value: &str,
) -> Result<f64, DataIntegrityError> {
    value.trim().parse::<f64>().map_err(|_| DataIntegrityError::MalformedNumericField {
        record: record.to_string(),
        field,
        value: value.to_string(),
    })
}
