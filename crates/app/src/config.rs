//! Layered settings for the desktop binary.
//!
//! Sources, lowest precedence first: built-in defaults, `feedback.toml` in the
//! working directory, `~/.config/feedback/feedback.toml`, an explicit
//! `--config` file, `FEEDBACK__*` environment variables and finally CLI flags.

use std::path::{Path, PathBuf};

use ::config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

pub const FILE_NAME: &str = "feedback.toml";
pub const ENV_PREFIX: &str = "FEEDBACK";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AvatarConfig {
    pub dir: PathBuf,
    pub public_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub avatars: AvatarConfig,
    pub logging: LoggingConfig,
}

/// Values given on the command line. They win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database_url: Option<String>,
    pub config_file: Option<PathBuf>,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if a present file cannot be parsed, the explicit
    /// `--config` file is missing, or a value has the wrong type.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut files = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            files.push(cwd.join(FILE_NAME));
        }
        if let Some(dir) = dirs::config_dir() {
            files.push(dir.join("feedback").join(FILE_NAME));
        }
        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::from_sources(&files, env, overrides)
    }

    /// Build from optional `files` (skipped when absent), an environment
    /// source and CLI overrides.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::load`].
    pub fn from_sources(
        files: &[PathBuf],
        env: Environment,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .set_default("database.url", "sqlite://feedback.sqlite3")?
            .set_default("database.max_connections", 5)?
            .set_default("avatars.dir", "avatars")?
            .set_default("avatars.public_base_url", "file://avatars")?
            .set_default("logging.level", "info")?;

        for path in files {
            builder = builder.add_source(File::from(path.as_path()).required(false));
        }
        if let Some(path) = overrides.config_file.as_deref() {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(env);
        if let Some(url) = overrides.database_url.as_deref() {
            builder = builder.set_override("database.url", url)?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        if config.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    #[must_use]
    pub fn avatar_dir(&self) -> &Path {
        &self.avatars.dir
    }
}
