use crate::config::SiteConfig;
use crate::{FailerError, Result};
use std::io::Read;
use std::time::Duration;
use ureq::ResponseExt;

const MAX_REDIRECTS: u32 = 10;

/// A fetched HTML page and where the request finally landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// URL after following redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

/// HTTP capability the session runs on. Implementations keep cookies
/// between calls and follow redirects.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<Page>;

    fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<Page>;

    /// Open a body for streaming. Statuses >= 400 are errors here.
    fn open(&self, url: &str) -> Result<Box<dyn Read>>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get(&self, url: &str) -> Result<Page> {
        (**self).get(url)
    }

    fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<Page> {
        (**self).post_form(url, fields)
    }

    fn open(&self, url: &str) -> Result<Box<dyn Read>> {
        (**self).open(url)
    }
}

/// `ureq` agent with a cookie jar. It never consults robots.txt.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: &SiteConfig) -> Self {
        let mut builder = ureq::Agent::config_builder();
        builder = builder
            .http_status_as_error(false)
            .max_redirects(MAX_REDIRECTS)
            .timeout_global(Some(Duration::from_secs(config.request_timeout_secs)))
            .user_agent(config.user_agent.clone());
        let agent: ureq::Agent = builder.build().into();
        Self { agent }
    }
}

fn read_page(url: &str, mut response: ureq::http::Response<ureq::Body>) -> Result<Page> {
    let final_url = response.get_uri().to_string();
    let status = response.status().as_u16();

    let mut html_buf = Vec::new();
    response
        .body_mut()
        .as_reader()
        .read_to_end(&mut html_buf)
        .map_err(|e| FailerError::transport(url, e))?;

    Ok(Page {
        final_url,
        status,
        body: String::from_utf8_lossy(&html_buf).into_owned(),
    })
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Page> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| FailerError::transport(url, e))?;
        read_page(url, response)
    }

    fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<Page> {
        let response = self
            .agent
            .post(url)
            .send_form(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .map_err(|e| FailerError::transport(url, e))?;
        read_page(url, response)
    }

    fn open(&self, url: &str) -> Result<Box<dyn Read>> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| FailerError::transport(url, e))?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FailerError::transport(url, format!("status={status}")));
        }
        Ok(Box::new(response.into_body().into_reader()))
    }
}
