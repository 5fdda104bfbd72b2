//! Configuration management for the scoped file manager
//!
//! Separates startup configuration (requires restart) from runtime limits.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Complete server configuration with startup/runtime separation
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub startup: StartupConfig,

    #[serde(flatten)]
    pub runtime: RuntimeConfig,
}

/// Configuration that requires a restart to take effect
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    /// IP address to bind the control listener
    pub bind_address: String,

    /// Port for the control listener
    pub control_port: u16,

    /// Directory every file operation is confined to
    pub storage_root: String,

    /// Maximum command line length in bytes
    pub max_command_length: usize,
}

/// Limits applied per session
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Maximum concurrent clients
    /// Environment: SCOPED_FM_MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum upload payload in MiB
    /// Environment: SCOPED_FM_MAX_UPLOAD_SIZE_MB
    pub max_upload_size_mb: u64,
}

impl ServerConfig {
    /// Load configuration from defaults, config.toml and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Packaged layout first, then the working directory
        let config_paths = ["scoped-fm/config", "config"];

        let mut builder = Self::defaults()?;
        for config_path in &config_paths {
            builder = builder.add_source(File::with_name(config_path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("SCOPED_FM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        Config::builder()
            .set_default("bind_address", "127.0.0.1")?
            .set_default("control_port", 2121)?
            .set_default("storage_root", "./storage")?
            .set_default("max_command_length", 4096)?
            .set_default("max_clients", 10)?
            .set_default("max_upload_size_mb", 50)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.startup.control_port == 0 {
            return Err(config::ConfigError::Message(
                "Control port cannot be 0".into(),
            ));
        }

        if self.startup.storage_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.startup.max_command_length < 64 {
            return Err(config::ConfigError::Message(
                "max_command_length must be at least 64".into(),
            ));
        }

        if self.runtime.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.runtime.max_upload_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            startup: StartupConfig {
                bind_address: "127.0.0.1".to_string(),
                control_port: 2121,
                storage_root: "./storage".to_string(),
                max_command_length: 4096,
            },
            runtime: RuntimeConfig {
                max_clients: 10,
                max_upload_size_mb: 50,
            },
        }
    }
}

impl StartupConfig {
    /// Get bind address and control port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }
}

impl RuntimeConfig {
    /// Get maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}
