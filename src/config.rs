use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use mongodb::{Client as MongoClient, Database};
use serde::{Deserialize, Serialize};

use crate::{error::Result, model::mongodb::ensure_indexes_exist};

/// File the configuration is read from, relative to the working directory.
pub const CONFIG_FILE: &str = "Feedback.toml";
/// Prefix of environment variables overriding the file.
pub const ENV_PREFIX: &str = "FEEDBACK_";

/// Application configuration, derived from `Feedback.toml` and `FEEDBACK_*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // secrets
    /// No default; must be configured.
    #[serde(default)]
    db_uri: String,
    // non-secrets
    database: String,
    log_config: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_uri: String::new(),
            database: "feedback".to_string(),
            log_config: "log4rs.yaml".to_string(),
        }
    }
}

impl Config {
    /// The layered configuration sources, lowest priority first.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the configuration, failing if `db_uri` is unset.
    pub fn load() -> std::result::Result<Self, figment::Error> {
        Self::from_figment(&Self::figment())
    }

    pub fn from_figment(figment: &Figment) -> std::result::Result<Self, figment::Error> {
        let config: Config = figment.extract()?;
        if config.db_uri.is_empty() {
            return Err(figment::Error::from("`db_uri` not set".to_string()));
        }
        Ok(config)
    }

    /// URI of the MongoDB deployment.
    pub fn db_uri(&self) -> &str {
        &self.db_uri
    }

    /// Name of the database holding every collection.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Path of the log4rs configuration file.
    pub fn log_config(&self) -> &str {
        &self.log_config
    }

    /// Connect to the configured database and ensure the required indexes exist.
    pub async fn connect(&self) -> Result<Database> {
        info!("Loaded database config, connecting...");
        let client = MongoClient::with_uri_str(&self.db_uri).await?;
        let db = client.database(&self.database);
        ensure_indexes_exist(&db).await?;
        info!("...database connection online!");
        Ok(db)
    }
}
