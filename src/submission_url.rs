use crate::config::SiteConfig;
use crate::{FailerError, Result};
use regex::Regex;

/// Pulls the numeric submission id out of a `/view/<id>/` or `/full/<id>/`
/// link on the configured site host.
pub fn parse_submission_id(url: &str, config: &SiteConfig) -> Result<String> {
    let pattern = format!(
        r"^https?://{}/(?:view|full)/(?P<number>[0-9]+)/",
        regex::escape(&config.site_host)
    );
    let submission_re =
        Regex::new(&pattern).map_err(|e| FailerError::InvalidConfig(e.to_string()))?;

    submission_re
        .captures(url)
        .and_then(|caps| caps.name("number"))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| FailerError::InvalidUrl(url.to_string()))
}
