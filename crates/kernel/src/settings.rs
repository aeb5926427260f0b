use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "STACKS_ENV";
const CONFIG_DIR_ENV: &str = "STACKS_CONFIG_DIR";
const ENV_PREFIX: &str = "STACKS";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub library: LibrarySettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    ///
    /// `STACKS__*` variables still override file values; nested keys are
    /// separated by a double underscore (`STACKS__CATALOG__PAGE_SIZE`).
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_env = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selected environment wins over anything written in the files.
        settings.environment = parsed_env;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings for the book lending module.
#[derive(Debug, Clone, Deserialize)]
pub struct LibrarySettings {
    /// User that is signed in when the module starts.
    #[serde(default = "LibrarySettings::default_user")]
    pub default_user: Option<String>,
}

impl LibrarySettings {
    fn default_user() -> Option<String> {
        Some("user1".to_string())
    }
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            default_user: Self::default_user(),
        }
    }
}

/// Settings for the product catalog module.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "CatalogSettings::default_page_size")]
    pub page_size: usize,
    /// Artificial delay before a scroll-triggered page load.
    #[serde(default = "CatalogSettings::default_load_more_delay_ms")]
    pub load_more_delay_ms: u64,
    /// How close to the end of the list the last visible row must be before
    /// another page is requested.
    #[serde(default = "CatalogSettings::default_prefetch_distance")]
    pub prefetch_distance: usize,
}

impl CatalogSettings {
    fn default_page_size() -> usize {
        10
    }

    fn default_load_more_delay_ms() -> u64 {
        1500
    }

    fn default_prefetch_distance() -> usize {
        1
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            page_size: Self::default_page_size(),
            load_more_delay_ms: Self::default_load_more_delay_ms(),
            prefetch_distance: Self::default_prefetch_distance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_catalog_pages_by_ten() {
        let settings = Settings::default();
        assert_eq!(settings.catalog.page_size, 10);
        assert_eq!(settings.catalog.load_more_delay_ms, 1500);
    }

    #[test]
    fn default_library_user_is_user1() {
        let settings = Settings::default();
        assert_eq!(settings.library.default_user.as_deref(), Some("user1"));
    }

    #[test]
    fn environment_overlay_wins_over_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.toml"),
            "[catalog]\npage_size = 20\nload_more_delay_ms = 10\n",
        )
        .unwrap();
        fs::write(dir.path().join("staging.toml"), "[catalog]\npage_size = 5\n").unwrap();

        let settings = Settings::load_from(dir.path(), "staging").unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.catalog.page_size, 5);
        assert_eq!(settings.catalog.load_more_delay_ms, 10);
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(dir.path(), "local").unwrap();
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);
        assert_eq!(settings.catalog.prefetch_distance, 1);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_from(dir.path(), "qa").unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }
}
