use crate::logging::redact_url_for_log;
use crate::session::Session;
use crate::{FailerError, Result};

/// GET the submission page. A page that loads but hides the submission
/// from this session is not an error here; the extractor reports it.
pub fn fetch_submission_page(session: &Session, url: &str) -> Result<String> {
    let page = session.transport().get(url).map_err(|err| {
        tracing::warn!(url = %redact_url_for_log(url), error = %err, "submission page fetch failed");
        err
    })?;

    if page.status >= 400 {
        tracing::warn!(
            url = %redact_url_for_log(url),
            status = page.status,
            "submission page returned an error status"
        );
        return Err(FailerError::transport(url, format!("status={}", page.status)));
    }

    tracing::debug!(
        url = %redact_url_for_log(url),
        bytes = page.body.len(),
        "submission page fetched"
    );
    Ok(page.body)
}
