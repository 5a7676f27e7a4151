//! Settings of the ledger worker.
//!
//! Read from an optional `settings.toml` next to the binary, overridden by
//! `LEDGER__*` environment variables (`LEDGER__SERVER__PORT=8080`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

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
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub default_currency: String,
    pub seed_mode: worker::SeedMode,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            default_currency: "USD".to_string(),
            seed_mode: worker::SeedMode::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub engine: Engine,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("LEDGER").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(matches!(settings.database, Database::Memory));
        assert_eq!(settings.engine.default_currency, "USD");
        assert_eq!(settings.engine.seed_mode, worker::SeedMode::Inline);
        assert!(settings.server.is_none());
    }

    #[test]
    fn full_file() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [database]
            sqlite = "ledger.db"

            [engine]
            default_currency = "eur"
            seed_mode = "background"

            [server]
            port = 3000
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert!(matches!(settings.database, Database::Sqlite(ref path) if path == "ledger.db"));
        assert_eq!(settings.engine.default_currency, "eur");
        assert_eq!(settings.engine.seed_mode, worker::SeedMode::Background);
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert!(server.bind.is_none());
    }
}
