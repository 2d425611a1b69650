//! Extension adding backend settings to meloconfig

use crate::user::IdentityKey;
use anyhow::Result;
use meloconfig::Config;
use std::time::Duration;
use tracing::warn;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = crate::api::DEFAULT_REQUEST_TIMEOUT_SECS;

/// Extension trait for backend settings in `meloconfig::Config`
///
/// ```rust,ignore
/// use meloconfig::get_config;
/// use meloapi::ApiConfigExt;
///
/// let config = get_config();
/// println!("Backend: {}", config.get_api_base_url());
/// ```
pub trait ApiConfigExt {
    /// Base URL of the REST API (`api.base_url`)
    fn get_api_base_url(&self) -> String;

    fn set_api_base_url(&self, url: &str) -> Result<()>;

    /// Per-request timeout (`api.timeout_secs`)
    fn get_api_timeout(&self) -> Duration;

    fn set_api_timeout(&self, timeout: Duration) -> Result<()>;

    /// Identity-key strategy for user endpoints (`api.identity_key`)
    ///
    /// Unknown values fall back to `subject` with a warning.
    fn get_identity_key(&self) -> IdentityKey;

    fn set_identity_key(&self, key: IdentityKey) -> Result<()>;
}

impl ApiConfigExt for Config {
    fn get_api_base_url(&self) -> String {
        self.get_string(&["api", "base_url"], DEFAULT_BASE_URL)
    }

    fn set_api_base_url(&self, url: &str) -> Result<()> {
        self.set_string(&["api", "base_url"], url)
    }

    fn get_api_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64(&["api", "timeout_secs"], DEFAULT_TIMEOUT_SECS))
    }

    fn set_api_timeout(&self, timeout: Duration) -> Result<()> {
        self.set_u64(&["api", "timeout_secs"], timeout.as_secs())
    }

    fn get_identity_key(&self) -> IdentityKey {
        let raw = self.get_string(&["api", "identity_key"], "subject");
        raw.parse().unwrap_or_else(|e| {
            warn!("{}, using subject", e);
            IdentityKey::Subject
        })
    }

    fn set_identity_key(&self, key: IdentityKey) -> Result<()> {
        self.set_string(&["api", "identity_key"], key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_api_settings() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

        assert_eq!(config.get_api_base_url(), "http://localhost:3000");
        assert_eq!(config.get_api_timeout(), Duration::from_secs(30));
        assert_eq!(config.get_identity_key(), IdentityKey::Subject);

        config.set_api_base_url("https://api.example.org").unwrap();
        config.set_api_timeout(Duration::from_secs(3)).unwrap();
        config.set_identity_key(IdentityKey::Username).unwrap();

        assert_eq!(config.get_api_base_url(), "https://api.example.org");
        assert_eq!(config.get_api_timeout(), Duration::from_secs(3));
        assert_eq!(config.get_identity_key(), IdentityKey::Username);
    }

    #[test]
    fn test_bad_identity_key_falls_back() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        config.set_string(&["api", "identity_key"], "email").unwrap();
        assert_eq!(config.get_identity_key(), IdentityKey::Subject);
    }
}
