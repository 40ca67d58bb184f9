use crate::{FailerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_SITE_HOST: &str = "www.furaffinity.net";
const DEFAULT_LOGIN_URL: &str = "https://www.furaffinity.net/login";
const DEFAULT_CDN_HOST: &str = "d.facdn.net";
const DEFAULT_ASSET_SCHEME_PREFIX: &str = "https:";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; U; Linux i686; en-US; rv:1.9.0.1) Gecko/2008071615 Fedora/3.0.1-1.fc9 Firefox/3.0.1";
const DEFAULT_SAFE_RATING_LABEL: &str = "General rating";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the site lives and how it labels things.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Host of submission pages (e.g. "www.furaffinity.net").
    pub site_host: String,
    /// Login page; a failed login redirects to `<login_url>/?msg=1`.
    pub login_url: String,
    /// Host serving raw media under `/art/`.
    pub cdn_host: String,
    /// Prepended to the scheme-relative download link found on the page.
    pub asset_scheme_prefix: String,
    pub user_agent: String,
    /// Rating label that counts as safe for work.
    pub safe_rating_label: String,
    pub request_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_host: DEFAULT_SITE_HOST.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            cdn_host: DEFAULT_CDN_HOST.to_string(),
            asset_scheme_prefix: DEFAULT_ASSET_SCHEME_PREFIX.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            safe_rating_label: DEFAULT_SAFE_RATING_LABEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SiteConfig {
    /// URL the login form lands on when the credentials are rejected.
    pub fn login_failure_url(&self) -> String {
        format!("{}/?msg=1", self.login_url)
    }
}

pub fn load_site_config(path: &Path) -> Result<SiteConfig> {
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    let bytes = std::fs::read(path).map_err(|e| FailerError::filesystem(path, e))?;
    let parsed: SiteConfig = serde_json::from_slice(&bytes).map_err(|e| {
        FailerError::InvalidConfig(format!(
            "failed to parse site config at {}: {e}",
            path.to_string_lossy()
        ))
    })?;
    if parsed.site_host.trim().is_empty() || parsed.cdn_host.trim().is_empty() {
        return Err(FailerError::InvalidConfig(
            "site_host and cdn_host must not be empty".to_string(),
        ));
    }
    Ok(parsed)
}

pub fn save_site_config(path: &Path, config: &SiteConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FailerError::filesystem(parent, e))?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| FailerError::InvalidConfig(e.to_string()))?;
    std::fs::write(path, format!("{json}\n")).map_err(|e| FailerError::filesystem(path, e))?;
    Ok(())
}
