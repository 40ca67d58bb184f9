use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FailerError {
    #[error("unsupported or unparseable submission url: {0}")]
    InvalidUrl(String),

    #[error("site unreachable: {url} ({reason})")]
    TransportUnavailable { url: String, reason: String },

    #[error("username and password rejected by the login form")]
    AuthenticationFailed,

    #[error("submission blocked for this session, log in to view it: {url}")]
    AccessDenied { url: String },

    #[error("no download link found on the submission page")]
    AssetLinkNotFound,

    #[error("could not parse cdn link: {0}")]
    UnparseableAssetLink(String),

    #[error("no rating found on the submission page")]
    RatingNotFound,

    #[error("no title found on the submission page")]
    TitleNotFound,

    #[error("unknown submission category segment: {0}")]
    UnknownCategory(String),

    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid site config: {0}")]
    InvalidConfig(String),
}

/// Coarse grouping callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Credentials were rejected or the content needs a logged-in session.
    Auth,
    /// Bad input, unreachable site, or a page/link that did not parse.
    Resolution,
    /// Writing the downloaded file failed.
    Filesystem,
}

impl FailerError {
    pub fn category(&self) -> FailureCategory {
        match self {
            FailerError::AuthenticationFailed | FailerError::AccessDenied { .. } => {
                FailureCategory::Auth
            }
            FailerError::Filesystem { .. } => FailureCategory::Filesystem,
            _ => FailureCategory::Resolution,
        }
    }

    /// True for network failures, the only kind worth retrying later.
    pub fn is_transport(&self) -> bool {
        matches!(self, FailerError::TransportUnavailable { .. })
    }

    pub(crate) fn transport(url: &str, reason: impl ToString) -> Self {
        FailerError::TransportUnavailable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FailerError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FailerError>;
