use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::models::{NotificationConfig, NotificationSettings};
use crate::services::credentials::{ChainedResolver, CredentialStore, EnvCredentialStore};
use crate::services::notification::howtank::DEFAULT_TIMEOUT_SECS;
use crate::services::notification::{DispatchError, HowtankNotifier, QueryMode, HOWTANK_BASE_API_URL};

/// Notifier configuration, loaded from a TOML file and environment variables
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    /// Global settings, used when the job leaves a field empty
    #[serde(default)]
    pub defaults: NotificationSettings,
    /// Per-job settings
    #[serde(default)]
    pub notification: NotificationSettings,
    /// Secrets addressable as `id:<name>` access tokens
    #[serde(default)]
    pub credentials: HashMap<String, String>,
}

/// Howtank API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Adds `mode=expert` to the command query
    #[serde(default)]
    pub expert_mode: bool,
}

fn default_base_url() -> String {
    HOWTANK_BASE_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            expert_mode: false,
        }
    }
}

impl ApiConfig {
    /// Overrides fields from `HOWTANK_API_URL`, `HOWTANK_TIMEOUT_SECS` and
    /// `HOWTANK_EXPERT_MODE`. Unparseable values and a zero timeout are
    /// ignored.
    pub fn apply_env(&mut self) {
        if let Ok(base_url) = env::var("HOWTANK_API_URL") {
            if !base_url.is_empty() {
                self.base_url = base_url;
            }
        }
        if let Some(timeout_secs) = env::var("HOWTANK_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&secs: &u64| secs > 0)
        {
            self.timeout_secs = timeout_secs;
        }
        if let Ok(expert_mode) = env::var("HOWTANK_EXPERT_MODE") {
            self.expert_mode = expert_mode == "true" || expert_mode == "1";
        }
    }

    /// A zero timeout would fail every request before it is sent
    pub fn validate(&self) -> AppResult<()> {
        if self.timeout_secs == 0 {
            return Err(AppError::Configuration(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn query_mode(&self) -> QueryMode {
        if self.expert_mode {
            QueryMode::Expert
        } else {
            QueryMode::Standard
        }
    }
}

impl Config {
    /// Parses a TOML document
    pub fn from_toml(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads a TOML file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Loads the optional config file, then applies environment overrides
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.api.validate()?;
        Ok(config)
    }

    /// Applies environment variables.
    ///
    /// `HOWTANK_STREAM_ID`, `HOWTANK_MESSAGE` and `HOWTANK_ACCESS_TOKEN` fill
    /// the global defaults where the file left them empty.
    pub fn apply_env(&mut self) {
        self.api.apply_env();

        fill_from_env(&mut self.defaults.stream_id, "HOWTANK_STREAM_ID");
        fill_from_env(&mut self.defaults.message, "HOWTANK_MESSAGE");
        fill_from_env(&mut self.defaults.access_token, "HOWTANK_ACCESS_TOKEN");
    }

    /// Validated notification config for the job
    pub fn resolve_notification(&self) -> AppResult<NotificationConfig> {
        self.notification.resolve(&self.defaults)
    }

    /// Config file credentials first, then `HOWTANK_CREDENTIAL_*` variables
    pub fn credential_resolver(&self) -> ChainedResolver {
        ChainedResolver::new()
            .with(CredentialStore::new(self.credentials.clone()))
            .with(EnvCredentialStore)
    }

    /// Dispatcher for the configured API
    pub fn dispatcher(&self) -> Result<HowtankNotifier, DispatchError> {
        Ok(HowtankNotifier::with_base_url(&self.api.base_url, self.api.timeout())?
            .with_mode(self.api.query_mode()))
    }
}

fn fill_from_env(field: &mut Option<String>, key: &str) {
    if field.as_deref().is_some_and(|v| !v.is_empty()) {
        return;
    }
    if let Ok(value) = env::var(key) {
        if !value.is_empty() {
            *field = Some(value);
        }
    }
}
