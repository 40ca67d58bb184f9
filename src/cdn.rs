//! Decomposition of CDN media links.
//!
//! The CDN stores every upload as
//! `https://<cdn_host>/art/<artist><category><date>.<artist>_<name>.<ext>`
//! where `<category>` is `/`, `/stories/` or `/music/`. The artist name is
//! repeated in the filename; both copies are captured without checking that
//! they agree.

use crate::category::{classify_category, SubmissionType};
use crate::config::SiteConfig;
use crate::{FailerError, Result};
use regex::Regex;
use serde::Serialize;

/// Characters the CDN allows in a user name.
const USER_CHARS: &str = r"[A-Za-z0-9_\[\]~.-]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CdnLink {
    pub artist: String,
    pub category: String,
    pub date_token: String,
    pub qualifier: String,
    pub base_name: String,
    pub extension: String,
}

impl CdnLink {
    /// `<date>.<qualifier>_<base>.<ext>`, the name the file is saved under.
    pub fn display_filename(&self) -> String {
        format!(
            "{}.{}_{}.{}",
            self.date_token, self.qualifier, self.base_name, self.extension
        )
    }

    pub fn submission_type(&self) -> Result<SubmissionType> {
        classify_category(&self.category)
    }
}

fn cdn_link_regex(cdn_host: &str) -> Result<Regex> {
    let pattern = format!(
        r"^https?://{host}/art/(?P<user>{u}+?)(?P<category>/stories/|/music/|/)(?P<date>[0-9]+)\.(?P<useragain>{u}+?)_(?P<name>\S+)\.(?P<ext>[A-Za-z0-9_]{{2,4}})",
        host = regex::escape(cdn_host),
        u = USER_CHARS,
    );
    Regex::new(&pattern).map_err(|e| FailerError::InvalidConfig(e.to_string()))
}

/// Anything after the extension is ignored; a link that does not fit the
/// layout fails outright.
pub fn parse_cdn_link(link: &str, config: &SiteConfig) -> Result<CdnLink> {
    let cdn_re = cdn_link_regex(&config.cdn_host)?;
    let caps = cdn_re
        .captures(link)
        .ok_or_else(|| FailerError::UnparseableAssetLink(link.to_string()))?;

    let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
    match (
        group("user"),
        group("category"),
        group("date"),
        group("useragain"),
        group("name"),
        group("ext"),
    ) {
        (
            Some(artist),
            Some(category),
            Some(date_token),
            Some(qualifier),
            Some(base_name),
            Some(extension),
        ) => Ok(CdnLink {
            artist,
            category,
            date_token,
            qualifier,
            base_name,
            extension,
        }),
        _ => Err(FailerError::UnparseableAssetLink(link.to_string())),
    }
}
