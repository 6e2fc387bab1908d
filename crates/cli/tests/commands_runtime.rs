use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;

use telassist_cli::commands::{ask, doctor, init};

const CUSTOMERS_HEADER: &str = "customerID,gender,SeniorCitizen,Partner,Dependents,tenure,\
PhoneService,MultipleLines,InternetService,OnlineSecurity,OnlineBackup,DeviceProtection,\
TechSupport,StreamingTV,StreamingMovies,Contract,PaperlessBilling,PaymentMethod,\
MonthlyCharges,TotalCharges,Churn";

const CUSTOMERS_ROW: &str = "C-001,Female,0,Yes,No,12,Yes,No,DSL,No,Yes,No,No,No,No,\
Month-to-month,Yes,Electronic check,29.85,358.2,No";

fn write_data_files(dir: &tempfile::TempDir) {
    fs::write(
        dir.path().join("customers.csv"),
        format!("{CUSTOMERS_HEADER}\n{CUSTOMERS_ROW}\n"),
    )
    .expect("write customers fixture");
    fs::write(
        dir.path().join("qna.csv"),
        "question,answer\nHow do I pay my bill?,Use the online portal or any retail store.\n",
    )
    .expect("write faq fixture");
}

#[test]
fn init_fails_cleanly_when_customer_source_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    with_env(
        &[
            ("TELASSIST_DATABASE_URL", "sqlite::memory:"),
            ("TELASSIST_DATA_DIR", &dir.path().display().to_string()),
        ],
        || {
            let result = init::run();
            assert_eq!(result.exit_code, 5, "expected customer ingest failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "init");
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "customer_ingest");
        },
    );
}

#[test]
fn init_reports_index_failure_after_successful_ingest() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_data_files(&dir);
    with_env(
        &[
            ("TELASSIST_DATABASE_URL", "sqlite::memory:"),
            ("TELASSIST_DATA_DIR", &dir.path().display().to_string()),
            // nothing listens here, so embedding calls fail fast
            ("TELASSIST_EMBEDDING_BASE_URL", "http://127.0.0.1:9"),
            ("TELASSIST_EMBEDDING_TIMEOUT_SECS", "1"),
        ],
        || {
            let result = init::run();
            assert_eq!(result.exit_code, 6, "expected faq index failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "init");
            assert_eq!(payload["error_class"], "faq_index");
        },
    );
}

#[test]
fn ask_refuses_to_start_without_an_api_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_data_files(&dir);
    with_env(
        &[
            ("TELASSIST_DATABASE_URL", "sqlite::memory:"),
            ("TELASSIST_DATA_DIR", &dir.path().display().to_string()),
        ],
        || {
            let result = ask::run("How many customers churned?", None, None);
            assert_eq!(result.exit_code, 4, "expected bootstrap failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "ask");
            assert_eq!(payload["error_class"], "bootstrap");
            let message = payload["message"].as_str().unwrap_or_default();
            assert!(message.contains("api_key"), "unexpected message: {message}");
        },
    );
}

#[test]
fn doctor_json_reports_per_check_status() {
    let dir = tempfile::tempdir().expect("tempdir");
    with_env(
        &[
            ("TELASSIST_DATABASE_URL", "sqlite::memory:"),
            ("TELASSIST_DATA_DIR", &dir.path().display().to_string()),
        ],
        || {
            let report = parse_payload(&doctor::run(true));
            assert_eq!(report["overall_status"], "fail");

            let checks = report["checks"].as_array().expect("checks array");
            let status_of = |name: &str| {
                checks
                    .iter()
                    .find(|check| check["name"] == name)
                    .map(|check| check["status"].clone())
                    .unwrap_or(Value::Null)
            };
            assert_eq!(status_of("config_validation"), "pass");
            assert_eq!(status_of("database_connectivity"), "pass");
            // empty data dir and no credentials
            assert_eq!(status_of("data_files"), "fail");
            assert_eq!(status_of("llm_credentials"), "fail");
        },
    );
}

#[test]
fn doctor_passes_with_data_files_and_credentials_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_data_files(&dir);
    with_env(
        &[
            ("TELASSIST_DATABASE_URL", "sqlite::memory:"),
            ("TELASSIST_DATA_DIR", &dir.path().display().to_string()),
            ("TELASSIST_LLM_API_KEY", "gsk-test"),
        ],
        || {
            let report = parse_payload(&doctor::run(true));
            assert_eq!(report["overall_status"], "pass");
            assert_eq!(report["summary"], "doctor: all readiness checks passed");
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TELASSIST_DATABASE_URL",
        "TELASSIST_DATABASE_MAX_CONNECTIONS",
        "TELASSIST_DATABASE_TIMEOUT_SECS",
        "TELASSIST_DATA_DIR",
        "TELASSIST_LLM_API_KEY",
        "TELASSIST_LLM_BASE_URL",
        "TELASSIST_LLM_MODEL",
        "TELASSIST_LLM_TIMEOUT_SECS",
        "TELASSIST_LLM_MAX_RETRIES",
        "TELASSIST_EMBEDDING_API_KEY",
        "TELASSIST_EMBEDDING_BASE_URL",
        "TELASSIST_EMBEDDING_MODEL",
        "TELASSIST_EMBEDDING_TIMEOUT_SECS",
        "TELASSIST_LOGGING_LEVEL",
        "TELASSIST_LOGGING_FORMAT",
        "TELASSIST_LOG_LEVEL",
        "TELASSIST_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
