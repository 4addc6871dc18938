//! Handles settings for the application.
//!
//! Settings are read from an optional TOML file (`settings.toml` by default)
//! and overridden by `LEDGERLY_*` environment variables, using `__` between
//! sections, e.g. `LEDGERLY_APP__LEVEL=debug`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Rates {
    /// Root of a Frankfurter-compatible service.
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub rates: Rates,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("database", "memory")?
            .set_default("rates.base_url", "https://api.frankfurter.app")?
            .set_default("rates.timeout_secs", 10)?
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(
                Environment::with_prefix("LEDGERLY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let settings = Settings::new(Some("does/not/exist")).unwrap();
        assert_eq!(settings.app.level, "info");
        assert!(matches!(settings.database, Database::Memory));
        assert_eq!(settings.rates.timeout_secs, 10);
    }
}
