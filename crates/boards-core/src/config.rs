//! Configuration management for boards-mcp.
//!
//! Non-secret settings live in a TOML file stored in a platform-specific
//! location:
//!
//! - **macOS/Linux**: `~/.config/boards-mcp/config.toml`
//! - **Windows**: `%APPDATA%\boards-mcp\config.toml`
//!
//! The personal access token is never written to disk. It is read from the
//! `AZURE_DEVOPS_PAT` environment variable (or passed on the command line).
//!
//! # Example
//!
//! ```ignore
//! use boards_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("azure_devops.organization_url", "https://dev.azure.com/contoso")?;
//! config.save()?;
//!
//! let credentials = config.credentials_with(|key| std::env::var(key).ok())?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "boards-mcp";

/// Environment variable holding the organization URL.
pub const ORG_URL_ENV: &str = "AZURE_DEVOPS_ORG_URL";

/// Environment variable holding the personal access token.
pub const TOKEN_ENV: &str = "AZURE_DEVOPS_PAT";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Azure DevOps configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_devops: Option<AzureDevOpsConfig>,
}

/// Azure DevOps organization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureDevOpsConfig {
    /// Organization base URL (e.g., `https://dev.azure.com/contoso`)
    pub organization_url: String,
}

/// Resolved credentials needed to open a connection.
#[derive(Clone)]
pub struct Credentials {
    pub organization_url: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("organization_url", &self.organization_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Resolve credentials from a variable lookup and this config.
    ///
    /// The organization URL comes from `AZURE_DEVOPS_ORG_URL`, falling back
    /// to the config file. The token only comes from `AZURE_DEVOPS_PAT`.
    /// Both must be present and non-empty.
    pub fn credentials_with<F>(&self, lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let organization_url = non_empty(lookup(ORG_URL_ENV))
            .or_else(|| {
                self.azure_devops
                    .as_ref()
                    .and_then(|c| non_empty(Some(c.organization_url.clone())))
            })
            .ok_or_else(|| {
                Error::Config(format!(
                    "Organization URL is not set. Set {} or `azure_devops.organization_url`",
                    ORG_URL_ENV
                ))
            })?;

        let token = non_empty(lookup(TOKEN_ENV)).ok_or_else(|| {
            Error::Config(format!("Access token is not set. Set {}", TOKEN_ENV))
        })?;

        Ok(Credentials {
            organization_url,
            token,
        })
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `azure_devops.organization_url`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match section {
            "azure_devops" => {
                let config = self.azure_devops.get_or_insert_with(|| AzureDevOpsConfig {
                    organization_url: String::new(),
                });
                match field {
                    "organization_url" | "url" => {
                        config.organization_url = value.trim_end_matches('/').to_string()
                    }
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown azure_devops config field: {}",
                            field
                        )))
                    }
                }
            }
            _ => return Err(Error::Config(format!("Unknown config section: {}", section))),
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `azure_devops.organization_url`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match section {
            "azure_devops" => {
                let Some(config) = &self.azure_devops else {
                    return Ok(None);
                };
                match field {
                    "organization_url" | "url" => Ok(Some(config.organization_url.clone())),
                    _ => Err(Error::Config(format!(
                        "Unknown azure_devops config field: {}",
                        field
                    ))),
                }
            }
            _ => Err(Error::Config(format!("Unknown config section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
