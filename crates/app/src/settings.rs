///! Handles settings for the application. Configuration is written in
///! `settings.toml`, with `ROMANA__`-prefixed environment variables
///! layered on top (e.g. `ROMANA__SERVER__API_TOKEN`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the env filter, e.g. `info` or `debug`.
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    /// Bearer token clients must present.
    pub api_token: String,
}

#[derive(Debug, Deserialize)]
pub struct Normalizer {
    pub api_key: String,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    pub api_key: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub normalizer: Normalizer,
    pub ledger: Ledger,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("ROMANA")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}
