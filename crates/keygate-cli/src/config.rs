//! CLI configuration from the environment.

use anyhow::{Context, Result, bail};
use config::{Config, Environment};
use keygate_core::KeygenConfig;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.keygen.sh";
pub const DEFAULT_API_PREFIX: &str = "v1";
pub const DEFAULT_API_VERSION: &str = "1.7";

/// Load `KEYGEN_*` variables, after a `.env` file if one exists.
pub fn load() -> Result<KeygenConfig> {
    check_dotenv(dotenvy::dotenv())?;
    from_source(Environment::with_prefix("KEYGEN"))
}

/// An unreadable or absent `.env` is skipped; a malformed one is reported.
fn check_dotenv(loaded: std::result::Result<PathBuf, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(_) | Err(dotenvy::Error::Io(_)) => Ok(()),
        Err(e) => Err(e).context("Failed to parse .env"),
    }
}

/// Online commands need an account; offline verification does not.
pub fn require_account(config: &KeygenConfig) -> Result<()> {
    if config.account.trim().is_empty() {
        bail!("KEYGEN_ACCOUNT must be set");
    }
    Ok(())
}

fn from_source(source: Environment) -> Result<KeygenConfig> {
    Config::builder()
        .set_default("api_url", DEFAULT_API_URL)?
        .set_default("api_prefix", DEFAULT_API_PREFIX)?
        .set_default("api_version", DEFAULT_API_VERSION)?
        .set_default("account", "")?
        .set_default("product", "")?
        .add_source(source)
        .build()
        .context("Failed to read KEYGEN_* environment")?
        .try_deserialize::<KeygenConfig>()
        .context("Invalid KEYGEN_* configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("KEYGEN").source(Some(map))
    }

    #[test]
    fn test_defaults_apply() {
        let config = from_source(env(&[
            ("KEYGEN_ACCOUNT", "acct-1"),
            ("KEYGEN_LICENSE_KEY", "KEY-1"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_prefix, DEFAULT_API_PREFIX);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.account, "acct-1");
        assert_eq!(config.license_key.as_deref(), Some("KEY-1"));
        assert_eq!(config.max_clock_drift, Some(5));
    }

    #[test]
    fn test_environment_overrides() {
        let config = from_source(env(&[
            ("KEYGEN_ACCOUNT", "acct-1"),
            ("KEYGEN_PRODUCT", "prod-1"),
            ("KEYGEN_API_URL", "http://localhost:3000"),
            ("KEYGEN_PUBLIC_KEY", "abcd"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.product, "prod-1");
        assert_eq!(config.public_key.as_deref(), Some("abcd"));
    }

    #[test]
    fn test_public_key_alone_is_enough_for_verify() {
        let public_key = "a".repeat(64);
        let config = from_source(env(&[("KEYGEN_PUBLIC_KEY", public_key.as_str())])).unwrap();

        assert_eq!(config.public_key.as_deref(), Some(public_key.as_str()));
        assert_eq!(config.account, "");
        assert!(require_account(&config).is_err());
    }

    #[test]
    fn test_account_required_online() {
        let config = from_source(env(&[("KEYGEN_ACCOUNT", "acct-1")])).unwrap();
        assert!(require_account(&config).is_ok());

        let err = require_account(&from_source(env(&[])).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "KEYGEN_ACCOUNT must be set");
    }

    #[test]
    fn test_bad_value_reports_configuration_error() {
        let err = from_source(env(&[
            ("KEYGEN_ACCOUNT", "acct-1"),
            ("KEYGEN_MAX_CLOCK_DRIFT", "soon"),
        ]))
        .unwrap_err();

        assert!(err.to_string().starts_with("Invalid KEYGEN_* configuration"));
    }

    #[test]
    fn test_dotenv_errors() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, ".env");
        assert!(check_dotenv(Err(dotenvy::Error::Io(missing))).is_ok());
        assert!(check_dotenv(Ok(PathBuf::from(".env"))).is_ok());

        let malformed = dotenvy::Error::LineParse("KEY VALUE".to_string(), 4);
        let err = check_dotenv(Err(malformed)).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse .env");
    }
}
