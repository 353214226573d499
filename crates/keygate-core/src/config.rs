//! Licensing client configuration.
//!
//! A [`KeygenConfig`] is normally built once and handed to a client. The
//! process-wide [`ConfigStore`] behind [`set_config`] / [`get_config`] serves
//! callers that prefer to configure once and call the free functions.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Keygen account and product configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeygenConfig {
    /// API base URL, e.g. `https://api.keygen.sh`.
    pub api_url: String,
    /// Path prefix of the API, e.g. `v1`.
    pub api_prefix: String,
    /// Value sent as the `Keygen-Version` header.
    pub api_version: String,
    /// Keygen account ID or slug.
    pub account: String,
    /// Product ID.
    pub product: String,
    /// Release package, when distributing through Keygen.
    #[serde(default)]
    pub package: String,
    /// Environment ID or code.
    #[serde(default)]
    pub environment: Option<String>,
    /// License key to validate.
    #[serde(default)]
    pub license_key: Option<String>,
    /// API token, preferred over license-key authentication when set.
    #[serde(default)]
    pub token: Option<String>,
    /// Hex-encoded Ed25519 verify key of the account.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Platform reported when activating machines.
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Tolerated difference, in minutes, between the local clock and the
    /// service's `Date` header. `None` disables the check.
    #[serde(default = "default_max_clock_drift")]
    pub max_clock_drift: Option<i64>,
}

fn default_max_clock_drift() -> Option<i64> {
    Some(5)
}

impl KeygenConfig {
    pub fn new(
        api_url: impl Into<String>,
        api_prefix: impl Into<String>,
        api_version: impl Into<String>,
        account: impl Into<String>,
        product: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_prefix: api_prefix.into(),
            api_version: api_version.into(),
            account: account.into(),
            product: product.into(),
            package: String::new(),
            environment: None,
            license_key: None,
            token: None,
            public_key: None,
            platform: None,
            user_agent: None,
            max_clock_drift: default_max_clock_drift(),
        }
    }

    pub fn with_license_key(mut self, license_key: impl Into<String>) -> Self {
        self.license_key = Some(license_key.into());
        self
    }

    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_max_clock_drift(mut self, minutes: Option<i64>) -> Self {
        self.max_clock_drift = minutes;
        self
    }
}

/// Holder for a configuration that is written once and read many times.
///
/// Reads hand out an `Arc` snapshot, so a later `set` never changes the
/// configuration seen by a call that is already running.
#[derive(Debug, Default)]
pub struct ConfigStore {
    inner: RwLock<Option<Arc<KeygenConfig>>>,
}

impl ConfigStore {
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Replace the stored configuration.
    pub fn set(&self, config: KeygenConfig) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(config));
    }

    /// Current configuration, or an error if none was ever set.
    pub fn get(&self) -> Result<Arc<KeygenConfig>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| Error::UnexpectedError("configuration has not been set".to_string()))
    }

    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

/// The process-wide store used by the free `verify` / `validate` functions.
static GLOBAL: ConfigStore = ConfigStore::new();

pub fn set_config(config: KeygenConfig) {
    GLOBAL.set(config);
}

pub fn get_config() -> Result<Arc<KeygenConfig>> {
    GLOBAL.get()
}

pub fn reset_config() {
    GLOBAL.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeygenConfig {
        KeygenConfig::new("https://api.keygen.sh", "v1", "1.7", "acct", "prod")
    }

    #[test]
    fn test_get_before_set_fails() {
        let store = ConfigStore::new();
        let err = store.get().unwrap_err();
        assert_eq!(err.tag(), "UnexpectedError");
        assert!(!store.is_set());
    }

    #[test]
    fn test_last_writer_wins() {
        let store = ConfigStore::new();
        store.set(sample());
        let first = store.get().unwrap();

        store.set(sample().with_license_key("KEY-2"));
        assert_eq!(first.license_key, None);
        assert_eq!(store.get().unwrap().license_key.as_deref(), Some("KEY-2"));

        store.clear();
        assert!(store.get().is_err());
    }

    #[test]
    fn test_optional_fields_default() {
        let config = sample();
        assert_eq!(config.api_url, "https://api.keygen.sh");
        assert!(config.user_agent.is_none());
        assert_eq!(config.max_clock_drift, Some(5));

        let parsed: KeygenConfig = serde_json::from_str(
            r#"{"api_url":"https://api.keygen.sh","api_prefix":"v1","api_version":"1.7","account":"a","product":"p"}"#,
        )
        .unwrap();
        assert_eq!(parsed, KeygenConfig::new("https://api.keygen.sh", "v1", "1.7", "a", "p"));
    }
}
