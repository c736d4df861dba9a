//! Configuration management for the gateway generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (gateway.toml)
//! - Environment variables (GATEWAY__*)
//!
//! ## Example config file (gateway.toml):
//! ```toml
//! [discovery]
//! document_name = "openapi.yaml"
//! api_prefix = "/api/v1"
//!
//! [merge]
//! paths = "last-wins"
//! schemas = "last-wins"
//! parameters = "first-wins"
//! reference_scope = "service"
//! default_parameters = true
//!
//! [output]
//! file_name = "openapi.yaml"
//! openapi_version = "3.1.0"
//! info_version = "1.0.0"
//! strict_references = true
//!
//! [security]
//! scheme_name = "ApiKeyHeader"
//! header = "X-API-KEY"
//! ```

use std::path::Path;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::merge::MergePolicy;

/// Main configuration for the gateway generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Collision and rewrite policy
    #[serde(default)]
    pub merge: MergePolicy,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// API-key security template (omitted unless configured)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityConfig>,
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// File name of each service's description document
    #[serde(default = "default_document_name")]
    pub document_name: String,

    /// Prefix of every mount path
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File name of the gateway document inside the suite directory
    #[serde(default = "default_document_name")]
    pub file_name: String,

    #[serde(default = "default_openapi_version")]
    pub openapi_version: String,

    /// `info.version` of the gateway document
    #[serde(default = "default_info_version")]
    pub info_version: String,

    /// Fail instead of warn when a schema reference does not resolve
    #[serde(default = "default_true")]
    pub strict_references: bool,
}

/// API-key security scheme injected into the gateway document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_scheme_name")]
    pub scheme_name: String,

    /// Header carrying the key
    #[serde(default = "default_header")]
    pub header: String,

    #[serde(default)]
    pub description: Option<String>,
}

// Default value functions
fn default_document_name() -> String {
    "openapi.yaml".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_openapi_version() -> String {
    "3.1.0".to_string()
}

fn default_info_version() -> String {
    "1.0.0".to_string()
}

fn default_scheme_name() -> String {
    "ApiKeyHeader".to_string()
}

fn default_header() -> String {
    "X-API-KEY".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            document_name: default_document_name(),
            api_prefix: default_api_prefix(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: default_document_name(),
            openapi_version: default_openapi_version(),
            info_version: default_info_version(),
            strict_references: true,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            scheme_name: default_scheme_name(),
            header: default_header(),
            description: None,
        }
    }
}

impl GatewayConfig {
    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["gateway.toml", ".gateway.toml", "config/gateway.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        let project_dirs = directories::ProjectDirs::from("dev", "suite-gateway", "suite-gateway");
        if let Some(dirs) = project_dirs {
            let xdg_config = dirs.config_dir().join("gateway.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // GATEWAY__MERGE__PATHS=first-wins
        builder = builder.add_source(
            Environment::with_prefix("GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_toml()?)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> std::io::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
