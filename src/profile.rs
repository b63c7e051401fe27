//! # Profile Store
//!
//! Loads NetSuite credentials from an INI profile file, with `NETSUITE_*`
//! environment variables taking precedence over file values.
//!
//! ```ini
//! [default]
//! account_id = 1234567_SB1
//! consumer_key = ...
//! consumer_secret = ...
//! token = ...
//! token_secret = ...
//! # optional
//! endpoint = https://1234567-sb1.suitetalk.api.netsuite.com/services/rest/query/v1/suiteql
//! timeout_secs = 30
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use ini::Ini;
use thiserror::Error;
use url::Url;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::executor::ExecutorConfig;

const ACCOUNT_ID: (&str, &str) = ("account_id", "NETSUITE_ACCOUNT_ID");
const CONSUMER_KEY: (&str, &str) = ("consumer_key", "NETSUITE_CONSUMER_KEY");
const CONSUMER_SECRET: (&str, &str) = ("consumer_secret", "NETSUITE_CONSUMER_SECRET");
const TOKEN: (&str, &str) = ("token", "NETSUITE_TOKEN");
const TOKEN_SECRET: (&str, &str) = ("token_secret", "NETSUITE_TOKEN_SECRET");

/// Errors raised while turning a profile into usable settings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid timeout_secs '{0}'")]
    InvalidTimeout(String),
}

/// OAuth 1.0 token-based credentials for one NetSuite account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub account_id: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// Raw key/value pairs of one profile section, before validation
#[derive(Debug, Clone, Default)]
pub struct IniProfile {
    values: Vec<(String, String)>,
}

impl IniProfile {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.retain(|(k, _)| k != key);
        self.values.push((key.to_string(), value.to_string()));
    }

    /// Resolve into executor settings, consulting `env` before the file values
    pub fn resolve<F>(&self, env: F) -> Result<ExecutorConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut lookup = |(key, var): (&str, &str)| -> String {
            let value = env(var)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| self.get(key).map(str::to_string))
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            if value.is_empty() {
                missing.push(var.to_string());
            }
            value
        };

        let credentials = Credentials {
            account_id: lookup(ACCOUNT_ID),
            consumer_key: lookup(CONSUMER_KEY),
            consumer_secret: lookup(CONSUMER_SECRET),
            token: lookup(TOKEN),
            token_secret: lookup(TOKEN_SECRET),
        };
        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing));
        }

        let endpoint = match self.get("endpoint").map(str::trim).filter(|e| !e.is_empty()) {
            Some(raw) => Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint {
                endpoint: raw.to_string(),
                reason: e.to_string(),
            })?,
            None => default_endpoint(&credentials.account_id)?,
        };

        let timeout = match self.get("timeout_secs").map(str::trim) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.to_string()))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(ExecutorConfig {
            credentials,
            endpoint,
            timeout: Duration::from_secs(timeout),
        })
    }
}

/// Build the SuiteQL endpoint for an account.
///
/// Sandbox accounts are written `1234567_SB1` but served from `1234567-sb1`.
pub fn default_endpoint(account_id: &str) -> Result<Url, ConfigError> {
    let host_account = account_id.to_lowercase().replace('_', "-");
    let raw = format!(
        "https://{host_account}.suitetalk.api.netsuite.com/services/rest/query/v1/suiteql"
    );
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEndpoint {
        endpoint: raw,
        reason: e.to_string(),
    })
}

/// INI file holding one section per profile
pub struct IniProfileStore {
    path: String,
}

impl IniProfileStore {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    /// Read the named section. A missing file or section yields `None`.
    pub fn get_profile(&self, name: &str) -> Result<Option<IniProfile>> {
        if !Path::new(&self.path).exists() {
            tracing::debug!("Profile file '{}' does not exist", self.path);
            return Ok(None);
        }

        let ini = Ini::load_from_file(&self.path)
            .with_context(|| format!("Failed to read profile file '{}'", self.path))?;

        Ok(ini.section(Some(name)).map(|section| IniProfile {
            values: section
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }))
    }
}

/// Load the named profile and resolve it against the process environment
pub fn load_settings(profile_name: &str, profile_path: &str) -> Result<ExecutorConfig> {
    tracing::debug!("Loading profile '{}' from '{}'", profile_name, profile_path);

    let profile = match IniProfileStore::new(profile_path).get_profile(profile_name)? {
        Some(p) => p,
        None => {
            tracing::debug!(
                "Profile '{}' not found, relying on environment variables",
                profile_name
            );
            IniProfile::default()
        }
    };

    let settings = profile.resolve(|var| std::env::var(var).ok())?;
    tracing::debug!("Resolved settings: {:?}", settings);
    Ok(settings)
}
