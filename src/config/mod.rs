use crate::models::DashboardConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// File name of the dashboard settings inside the config directory
pub const CONFIG_FILE_NAME: &str = "TrafficDash Config.yaml";

/// Prefix of environment overrides, e.g. `TRAFFICDASH__BACKEND__BASE_URL`
pub const ENV_PREFIX: &str = "TRAFFICDASH";

/// Configuration manager for loading and saving the dashboard settings.
///
/// Settings live in `TrafficDash Config.yaml`. Environment variables of the
/// form `TRAFFICDASH__<SECTION>__<KEY>` override values from the file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing the configuration file (e.g., "TrafficDash Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the dashboard configuration.
    ///
    /// Missing file means defaults; missing keys fall back per field.
    ///
    /// # Errors
    /// Fails if the file exists but cannot be parsed, or an override has the wrong type
    pub fn load_config(&self) -> Result<DashboardConfig> {
        if !self.config_path.exists() {
            tracing::warn!("Config file not found at {}, using defaults", self.config_path);
        }

        let config: DashboardConfig = Config::builder()
            .add_source(File::new(self.config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config (backend: {})", config.backend.base_url);
        Ok(config)
    }

    /// Save the dashboard configuration.
    pub fn save_config(&self, config: &DashboardConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
