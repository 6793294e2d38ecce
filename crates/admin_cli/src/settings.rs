//! Handles settings for the admin tool. Configuration is read from an
//! optional `settings.toml` and from `DEBTBOOK__<SECTION>__<KEY>` variables.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [database]
//! url = "sqlite:./debtbook.db?mode=rwc"
//!
//! [ledger]
//! tolerance = 1000
//! paid_threshold = 1000
//! ```
use config::{Config, ConfigError, Environment, File};
use engine::LedgerConfig;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./debtbook.db?mode=rwc";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub ledger: LedgerConfig,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(
                Environment::with_prefix("DEBTBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
