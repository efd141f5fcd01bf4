// Runtime configuration: defaults, optional config.toml, then RENTALCAR_* env vars

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_API_BASE_URL: &str = "https://car-rental-api.goit.global";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    // Additional attempts after the first one fails
    pub retry_max_retries: u32,
    pub retry_initial_delay_ms: u64,
    // Directory holding favorites-storage.json / car-filters-storage.json
    pub storage_dir: String,
    pub server_address: String,
    // Client sessions kept in memory before the oldest is dropped
    pub max_sessions: usize,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("request_timeout_secs", 10)?
            .set_default("retry_max_retries", 3)?
            .set_default("retry_initial_delay_ms", 1000)?
            .set_default("storage_dir", ".rentalcar")?
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("max_sessions", 1000)?
            .add_source(File::with_name("config").required(false))
            // e.g. RENTALCAR_API_BASE_URL, RENTALCAR_STORAGE_DIR
            .add_source(Environment::with_prefix("RENTALCAR").try_parsing(true));

        let settings = builder
            .build()
            .context("Failed to assemble configuration sources")?
            .try_deserialize()
            .context("Failed to deserialize settings")?;
        Ok(settings)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_retries,
            Duration::from_millis(self.retry_initial_delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 10,
            retry_max_retries: 3,
            retry_initial_delay_ms: 1000,
            storage_dir: ".rentalcar".to_string(),
            server_address: "127.0.0.1:3000".to_string(),
            max_sessions: 1000,
        }
    }
}
