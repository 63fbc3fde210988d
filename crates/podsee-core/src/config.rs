//! Application configuration management.
//!
//! Two layers:
//!
//! - `Config`: user settings persisted at `~/.config/podsee/config.json`
//!   (dataset location, remembered username and filters, device location
//!   opt-in).
//! - `ServiceConfig`: hosted service credentials read from the environment
//!   (a `.env` file is loaded by the binary).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::auth::CredentialStore;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "podsee";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Dataset directory used when none is configured.
const DEFAULT_DATASET_DIR: &str = "data";

pub const ENV_SUPABASE_URL: &str = "PODSEE_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "PODSEE_SUPABASE_ANON_KEY";
pub const ENV_SUPABASE_SERVICE_KEY: &str = "PODSEE_SUPABASE_SERVICE_KEY";
pub const ENV_GOOGLE_MAPS_API_KEY: &str = "PODSEE_GOOGLE_MAPS_API_KEY";
pub const ENV_ADMIN_SECRET: &str = "PODSEE_ADMIN_SECRET";

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `centres.csv` and `offerings.csv`.
    pub dataset_dir: Option<PathBuf>,
    pub last_username: Option<String>,
    pub last_level: Option<String>,
    pub last_subject: Option<String>,
    #[serde(default = "default_true")]
    pub allow_device_location: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_dir: None,
            last_username: None,
            last_level: None,
            last_subject: None,
            allow_device_location: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.dataset_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_DIR))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0}. Check your .env file.")]
    MissingVar(&'static str),
}

/// Credentials for the hosted services.
#[derive(Clone, Default)]
pub struct ServiceConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub admin_secret: Option<String>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_service_key", &self.supabase_service_key.is_some())
            .field("google_maps_api_key", &self.google_maps_api_key.is_some())
            .field("admin_secret", &self.admin_secret.is_some())
            .finish()
    }
}

impl ServiceConfig {
    /// Read from the process environment, falling back to the keychain for
    /// the service key.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|name| std::env::var(name).ok())?;
        if config.supabase_service_key.is_none() {
            match CredentialStore::service_key() {
                Ok(key) => config.supabase_service_key = Some(key),
                Err(e) => debug!(error = %e, "No service key in keychain"),
            }
        }
        Ok(config)
    }

    /// Build from any variable source. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let supabase_url = get(ENV_SUPABASE_URL).ok_or(ConfigError::MissingVar(ENV_SUPABASE_URL))?;
        let supabase_anon_key =
            get(ENV_SUPABASE_ANON_KEY).ok_or(ConfigError::MissingVar(ENV_SUPABASE_ANON_KEY))?;

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            supabase_service_key: get(ENV_SUPABASE_SERVICE_KEY),
            google_maps_api_key: get(ENV_GOOGLE_MAPS_API_KEY),
            admin_secret: get(ENV_ADMIN_SECRET),
        })
    }

    /// The Maps key, required once location features are used.
    pub fn google_maps_api_key(&self) -> Result<&str, ConfigError> {
        self.google_maps_api_key
            .as_deref()
            .ok_or(ConfigError::MissingVar(ENV_GOOGLE_MAPS_API_KEY))
    }
}
