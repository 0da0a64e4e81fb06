use std::sync::Arc;

use ledger::SplitwiseLedger;
use normalizer::{NormalizerConfig, OpenAiNormalizer};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "romana={level},server={level},normalizer={level},ledger={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let normalizer = OpenAiNormalizer::new(
        reqwest::Client::new(),
        NormalizerConfig {
            api_key: settings.normalizer.api_key,
            model: settings.normalizer.model,
            endpoint: settings.normalizer.endpoint,
        },
    );

    let client = match ledger_client(&settings.ledger.api_key) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("failed to build ledger client: {err}");
            return Ok(());
        }
    };
    let ledger = SplitwiseLedger::new(
        client,
        settings
            .ledger
            .endpoint
            .unwrap_or_else(|| ledger::DEFAULT_ENDPOINT.to_string()),
    );

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return Ok(());
        }
    };

    if let Err(err) = server::run_with_listener(
        Arc::new(normalizer),
        Arc::new(ledger),
        settings.server.api_token,
        listener,
    )
    .await
    {
        tracing::error!("server failed: {err}");
    }

    Ok(())
}

/// Client for the ledger service, carrying its bearer token on every
/// request.
fn ledger_client(
    api_key: &str,
) -> Result<reqwest::Client, Box<dyn std::error::Error + Send + Sync>> {
    let mut token = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))?;
    token.set_sensitive(true);

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(reqwest::header::AUTHORIZATION, token);

    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}
