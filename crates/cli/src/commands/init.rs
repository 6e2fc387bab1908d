use crate::commands::CommandResult;
use telassist_core::config::{AppConfig, LoadOptions};
use telassist_db::connect_with_settings;
use telassist_index::HttpEmbeddingClient;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "init",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "init",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let customers = telassist_db::build_from_csv(&pool, &config.data.customers_path())
            .await
            .map_err(|error| ("customer_ingest", error.to_string(), 5u8))?;

        let embedder = HttpEmbeddingClient::from_config(&config.embedding)
            .map_err(|error| ("embedding_client", error.to_string(), 6u8))?;
        let index = telassist_index::build_from_csv(
            &embedder,
            &config.data.faq_path(),
            &config.data.index_path(),
            &config.embedding.model,
        )
        .await
        .map_err(|error| ("faq_index", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<(usize, usize), (&'static str, String, u8)>((customers, index.len()))
    });

    match result {
        Ok((customers, faq_entries)) => CommandResult::success(
            "init",
            format!("ingested {customers} customers and indexed {faq_entries} FAQ entries"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("init", error_class, message, exit_code)
        }
    }
}
