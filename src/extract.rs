//! Reads submission metadata out of a fetched page.
//!
//! The page is third-party HTML, so every lookup is tolerant about
//! surrounding markup and only the handful of elements below are relied on:
//!
//! - `div#submission` wraps the submission; it is missing when the session
//!   may not see the content.
//! - an `a` whose text reads "Download" points at the CDN file, written as a
//!   scheme-relative link.
//! - an `img` with alt text like "General rating" carries the rating.
//! - `img#submissionImg` carries the title in its alt text.
//! - keyword links point at `/search/@keywords ...`.

use crate::category::SubmissionType;
use crate::cdn::{parse_cdn_link, CdnLink};
use crate::config::SiteConfig;
use crate::{FailerError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub asset_link: String,
    pub cdn: CdnLink,
    pub submission_type: SubmissionType,
    pub rating: String,
    pub is_safe_for_work: bool,
    pub title: String,
    pub keywords: Vec<String>,
}

/// `page_url` is the link the page was fetched from; it is only used to
/// report a gated page.
pub fn extract_metadata(
    document: &Html,
    page_url: &str,
    config: &SiteConfig,
) -> Result<ExtractedMetadata> {
    if !has_submission_container(document) {
        return Err(FailerError::AccessDenied {
            url: page_url.to_string(),
        });
    }

    let asset_link = find_asset_link(document, config)?;
    let cdn = parse_cdn_link(&asset_link, config)?;
    let submission_type = cdn.submission_type()?;

    let rating = find_rating(document).ok_or(FailerError::RatingNotFound)?;
    let is_safe_for_work = rating == config.safe_rating_label;
    let title = find_title(document).ok_or(FailerError::TitleNotFound)?;
    let keywords = collect_keywords(document);

    tracing::debug!(
        artist = %cdn.artist,
        kind = submission_type.as_str(),
        rating = %rating,
        keywords = keywords.len(),
        "submission metadata extracted"
    );

    Ok(ExtractedMetadata {
        asset_link,
        cdn,
        submission_type,
        rating,
        is_safe_for_work,
        title,
        keywords,
    })
}

fn has_submission_container(document: &Html) -> bool {
    let selector_container = Selector::parse("div#submission").expect("container selector");
    document.select(&selector_container).next().is_some()
}

/// Absolute link behind the first "Download" anchor.
pub fn find_asset_link(document: &Html, config: &SiteConfig) -> Result<String> {
    static DOWNLOAD_RE: OnceLock<Regex> = OnceLock::new();
    let download_re = DOWNLOAD_RE.get_or_init(|| Regex::new(r"\bDownload\b").unwrap());
    let selector_anchor = Selector::parse("a").expect("anchor selector");

    let anchor = document
        .select(&selector_anchor)
        .find(|a| download_re.is_match(&element_text(a)))
        .ok_or(FailerError::AssetLinkNotFound)?;
    let href = anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or(FailerError::AssetLinkNotFound)?;

    if href.starts_with("//") {
        Ok(format!("{}{href}", config.asset_scheme_prefix))
    } else {
        Ok(href.to_string())
    }
}

fn find_rating(document: &Html) -> Option<String> {
    static RATING_RE: OnceLock<Regex> = OnceLock::new();
    let rating_re = RATING_RE.get_or_init(|| Regex::new(r"\w rating").unwrap());
    let selector_img = Selector::parse("img[alt]").expect("img selector");

    document
        .select(&selector_img)
        .filter_map(|img| img.value().attr("alt"))
        .find(|alt| rating_re.is_match(alt))
        .map(str::to_string)
}

fn find_title(document: &Html) -> Option<String> {
    let selector_title = Selector::parse("img#submissionImg").expect("title selector");
    document
        .select(&selector_title)
        .next()
        .and_then(|img| img.value().attr("alt"))
        .map(str::to_string)
}

fn collect_keywords(document: &Html) -> Vec<String> {
    static KEYWORD_HREF_RE: OnceLock<Regex> = OnceLock::new();
    let keyword_href_re =
        KEYWORD_HREF_RE.get_or_init(|| Regex::new(r"/search/@keywords").unwrap());
    let selector_anchor = Selector::parse("a[href]").expect("anchor selector");

    document
        .select(&selector_anchor)
        .filter(|a| {
            a.value()
                .attr("href")
                .map(|href| keyword_href_re.is_match(href))
                .unwrap_or(false)
        })
        .map(|a| element_text(&a))
        .collect()
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn submission_page(download_href: &str, rating: &str, title: &str) -> String {
        format!(
            r#"
        <html><head><link rel="canonical" href="https://www.example-source.net/view/123456/" /></head>
        <body>
          <div id="submission">
            <div class="actions">
              <a href="/fav/123456/">+Add to Favorites</a>
              <a href="{download_href}">&nbsp;Download</a>
            </div>
            <img id="submissionImg" src="//d.cdn.example.net/art/alice/1700000000.alice_mydrawing.png" alt="{title}" />
            <img src="/themes/classic/img/labels/general.gif" alt="{rating}" />
            <div id="keywords">
              <a href="/search/@keywords sketch">sketch</a>
              <a href="/search/@keywords alice">alice</a>
              <a href="/user/alice/">alice's page</a>
              <a href="/search/@keywords sketch">sketch</a>
            </div>
          </div>
        </body></html>
        "#
        )
    }

    pub(crate) fn example_site() -> SiteConfig {
        SiteConfig {
            site_host: "www.example-source.net".to_string(),
            login_url: "https://www.example-source.net/login".to_string(),
            cdn_host: "d.cdn.example.net".to_string(),
            ..SiteConfig::default()
        }
    }

    const ASSET_HREF: &str = "//d.cdn.example.net/art/alice/1700000000.alice_mydrawing.png";
    const PAGE_URL: &str = "https://www.example-source.net/view/123456/";

    #[test]
    fn full_page_extracts_every_field() {
        let doc = Html::parse_document(&submission_page(
            ASSET_HREF,
            "General rating",
            "My Drawing",
        ));
        let out = extract_metadata(&doc, PAGE_URL, &example_site()).expect("extract");

        assert_eq!(
            out.asset_link,
            "https://d.cdn.example.net/art/alice/1700000000.alice_mydrawing.png"
        );
        assert_eq!(out.cdn.artist, "alice");
        assert_eq!(out.cdn.date_token, "1700000000");
        assert_eq!(out.submission_type, SubmissionType::Visual);
        assert_eq!(out.rating, "General rating");
        assert!(out.is_safe_for_work);
        assert_eq!(out.title, "My Drawing");
        assert_eq!(out.keywords, vec!["sketch", "alice", "sketch"]);
    }

    #[test]
    fn only_the_exact_safe_label_is_safe_for_work() {
        for rating in ["Mature rating", "Adult rating", "general rating", "Odd rating"] {
            let doc = Html::parse_document(&submission_page(ASSET_HREF, rating, "t"));
            let out = extract_metadata(&doc, PAGE_URL, &example_site()).expect("extract");
            assert_eq!(out.rating, rating);
            assert!(!out.is_safe_for_work, "rating={rating}");
        }
    }

    #[test]
    fn missing_container_is_access_denied() {
        let doc = Html::parse_document(
            r#"<html><body><div id="standardpage">This submission contains Mature or Adult content. Log in to view.</div></body></html>"#,
        );
        let err = extract_metadata(&doc, PAGE_URL, &example_site()).expect_err("gated");
        assert!(
            matches!(&err, FailerError::AccessDenied { url } if url == PAGE_URL),
            "{err}"
        );
    }

    #[test]
    fn missing_download_anchor_is_reported() {
        let html = submission_page(ASSET_HREF, "General rating", "t")
            .replace("&nbsp;Download", "Share");
        let doc = Html::parse_document(&html);
        assert!(matches!(
            extract_metadata(&doc, PAGE_URL, &example_site()),
            Err(FailerError::AssetLinkNotFound)
        ));
    }

    #[test]
    fn foreign_download_link_is_unparseable() {
        let doc = Html::parse_document(&submission_page(
            "//mirror.example.org/files/mydrawing.png",
            "General rating",
            "t",
        ));
        assert!(matches!(
            extract_metadata(&doc, PAGE_URL, &example_site()),
            Err(FailerError::UnparseableAssetLink(link)) if link == "https://mirror.example.org/files/mydrawing.png"
        ));
    }

    #[test]
    fn missing_rating_and_title_are_reported() {
        let html = submission_page(ASSET_HREF, "General rating", "t");

        let no_rating = html.replace(r#"alt="General rating""#, r#"alt="label""#);
        assert!(matches!(
            extract_metadata(&Html::parse_document(&no_rating), PAGE_URL, &example_site()),
            Err(FailerError::RatingNotFound)
        ));

        let no_title = html.replace(r#"id="submissionImg""#, r#"id="preview""#);
        assert!(matches!(
            extract_metadata(&Html::parse_document(&no_title), PAGE_URL, &example_site()),
            Err(FailerError::TitleNotFound)
        ));
    }

    #[test]
    fn page_without_keywords_yields_empty_list() {
        let html = submission_page(ASSET_HREF, "General rating", "t")
            .replace("/search/@keywords", "/browse/");
        let out = extract_metadata(&Html::parse_document(&html), PAGE_URL, &example_site())
            .expect("extract");
        assert!(out.keywords.is_empty());
    }

    #[test]
    fn absolute_download_links_are_kept() {
        let doc = Html::parse_document(&submission_page(
            "http://d.cdn.example.net/art/alice/music/1700000000.alice_song.mp3",
            "General rating",
            "t",
        ));
        let out = extract_metadata(&doc, PAGE_URL, &example_site()).expect("extract");
        assert_eq!(
            out.asset_link,
            "http://d.cdn.example.net/art/alice/music/1700000000.alice_song.mp3"
        );
        assert_eq!(out.submission_type, SubmissionType::Audio);
    }
}
