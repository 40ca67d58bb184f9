use crate::category::SubmissionType;
use crate::cdn::CdnLink;
use crate::config::SiteConfig;
use crate::download::{download_asset, DownloadOutcome};
use crate::extract::{extract_metadata, ExtractedMetadata};
use crate::fetch::fetch_submission_page;
use crate::logging::redact_url_for_log;
use crate::session::Session;
use crate::submission_url::parse_submission_id;
use crate::Result;
use chrono::{DateTime, Utc};
use scraper::Html;
use serde::Serialize;
use std::path::Path;

/// One resolved submission. Only [`SubmissionResolver::resolve`] builds
/// these, and always whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    id: String,
    source_link: String,
    asset_link: String,
    #[serde(flatten)]
    cdn: CdnLink,
    submission_type: SubmissionType,
    title: String,
    rating: String,
    is_safe_for_work: bool,
    keywords: Vec<String>,
}

impl Submission {
    fn assemble(id: String, source_link: &str, extracted: ExtractedMetadata) -> Self {
        let ExtractedMetadata {
            asset_link,
            cdn,
            submission_type,
            rating,
            is_safe_for_work,
            title,
            keywords,
        } = extracted;
        Self {
            id,
            source_link: source_link.to_string(),
            asset_link,
            cdn,
            submission_type,
            title,
            rating,
            is_safe_for_work,
            keywords,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_link(&self) -> &str {
        &self.source_link
    }

    pub fn asset_link(&self) -> &str {
        &self.asset_link
    }

    pub fn artist(&self) -> &str {
        &self.cdn.artist
    }

    /// Upload time as Unix seconds, as written in the CDN filename.
    pub fn date_token(&self) -> &str {
        &self.cdn.date_token
    }

    /// `None` when the token does not fit a timestamp.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.cdn.date_token.parse().ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Raw category segment from the CDN link (`/`, `/stories/`, `/music/`).
    pub fn category(&self) -> &str {
        &self.cdn.category
    }

    pub fn base_name(&self) -> &str {
        &self.cdn.base_name
    }

    pub fn qualifier(&self) -> &str {
        &self.cdn.qualifier
    }

    pub fn extension(&self) -> &str {
        &self.cdn.extension
    }

    pub fn submission_type(&self) -> SubmissionType {
        self.submission_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rating(&self) -> &str {
        &self.rating
    }

    pub fn is_safe_for_work(&self) -> bool {
        self.is_safe_for_work
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn display_filename(&self) -> String {
        self.cdn.display_filename()
    }

    /// Save the media file into `directory`, under `filename` or the
    /// CDN-derived name.
    pub fn download(
        &self,
        session: &Session,
        directory: &Path,
        filename: Option<&str>,
    ) -> Result<DownloadOutcome> {
        let default_name = self.display_filename();
        download_asset(
            session,
            &self.asset_link,
            directory,
            filename.unwrap_or(&default_name),
        )
    }
}

impl std::fmt::Display for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source_link)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionResolver {
    config: SiteConfig,
}

impl SubmissionResolver {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Validate the link, fetch the page over `session` and read it into a
    /// [`Submission`]. The first failing step aborts the whole call.
    pub fn resolve(&self, url: &str, session: &Session) -> Result<Submission> {
        let id = parse_submission_id(url, &self.config)?;
        tracing::info!(
            id = %id,
            url = %redact_url_for_log(url),
            authenticated = session.is_authenticated(),
            "resolving submission"
        );

        let body = fetch_submission_page(session, url)?;
        let extracted = {
            let document = Html::parse_document(&body);
            extract_metadata(&document, url, &self.config)
        };
        let extracted = extracted.map_err(|err| {
            tracing::warn!(id = %id, error = %err, "submission page did not parse");
            err
        })?;

        Ok(Submission::assemble(id, url, extracted))
    }
}
