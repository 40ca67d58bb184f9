use crate::config::SiteConfig;
use crate::logging::redact_url_for_log;
use crate::transport::{HttpTransport, Transport};
use crate::{FailerError, Result};
use scraper::{ElementRef, Html, Selector};

const USERNAME_FIELD: &str = "name";
const PASSWORD_FIELD: &str = "pass";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Transport plus cookie state, logged in or anonymous.
pub struct Session {
    transport: Box<dyn Transport>,
    authenticated: bool,
}

impl Session {
    /// Wrap a transport the caller already prepared (e.g. one carrying
    /// cookies from an earlier login). Nothing about it is checked.
    pub fn new(transport: Box<dyn Transport>, authenticated: bool) -> Self {
        Self {
            transport,
            authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

/// Builds the session on first use and hands the same one out afterwards.
/// There is no re-login when the site expires the cookies.
pub struct SessionManager {
    config: SiteConfig,
    credentials: Option<Credentials>,
    pending_transport: Option<Box<dyn Transport>>,
    session: Option<Session>,
}

impl SessionManager {
    pub fn new(config: SiteConfig, credentials: Option<Credentials>) -> Self {
        Self {
            config,
            credentials,
            pending_transport: None,
            session: None,
        }
    }

    /// Like [`SessionManager::new`] but logs in over the given transport
    /// instead of a fresh [`HttpTransport`].
    pub fn with_transport(
        config: SiteConfig,
        credentials: Option<Credentials>,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            config,
            credentials,
            pending_transport: Some(transport),
            session: None,
        }
    }

    /// Use a session built elsewhere. `acquire` returns it as is.
    pub fn with_session(config: SiteConfig, session: Session) -> Self {
        Self {
            config,
            credentials: None,
            pending_transport: None,
            session: Some(session),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn acquire(&mut self) -> Result<&Session> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.open_session()?,
        };
        let session: &Session = self.session.insert(session);
        Ok(session)
    }

    fn open_session(&mut self) -> Result<Session> {
        let transport: Box<dyn Transport> = match self.pending_transport.take() {
            Some(transport) => transport,
            None => Box::new(HttpTransport::new(&self.config)),
        };
        let authenticated = match &self.credentials {
            Some(credentials) => {
                if let Err(err) = log_in(transport.as_ref(), &self.config, credentials) {
                    // Keep the caller's transport for the next attempt.
                    self.pending_transport = Some(transport);
                    return Err(err);
                }
                true
            }
            None => {
                tracing::debug!("no credentials supplied, using an anonymous session");
                false
            }
        };
        Ok(Session::new(transport, authenticated))
    }
}

fn inside_form(input: &ElementRef<'_>) -> bool {
    input
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "form")
}

/// Fields of the login page's global form (inputs outside any `<form>`)
/// with their default values, with the username and password filled in.
fn login_form_fields(login_page: &str, credentials: &Credentials) -> Vec<(String, String)> {
    let document = Html::parse_document(login_page);
    let selector_input = Selector::parse("input[name]").expect("input selector");

    let mut fields: Vec<(String, String)> = Vec::new();
    for input in document.select(&selector_input) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        if name == USERNAME_FIELD || name == PASSWORD_FIELD || inside_form(&input) {
            continue;
        }
        let kind = input
            .value()
            .attr("type")
            .unwrap_or("text")
            .to_ascii_lowercase();
        let default_value = match kind.as_str() {
            "submit" | "button" | "image" | "reset" => continue,
            "checkbox" | "radio" if input.value().attr("checked").is_none() => continue,
            "checkbox" | "radio" => input.value().attr("value").unwrap_or("on"),
            _ => input.value().attr("value").unwrap_or(""),
        };
        if fields.iter().any(|(existing, _)| existing == name) {
            continue;
        }
        fields.push((name.to_string(), default_value.to_string()));
    }

    fields.push((USERNAME_FIELD.to_string(), credentials.username.clone()));
    fields.push((PASSWORD_FIELD.to_string(), credentials.password.clone()));
    fields
}

fn log_in(transport: &dyn Transport, config: &SiteConfig, credentials: &Credentials) -> Result<()> {
    let login_url = config.login_url.as_str();
    tracing::debug!(
        url = %redact_url_for_log(login_url),
        username = %credentials.username,
        "opening login page"
    );

    let page = transport.get(login_url)?;
    if page.status >= 400 {
        return Err(FailerError::transport(
            login_url,
            format!("status={}", page.status),
        ));
    }

    let fields = login_form_fields(&page.body, credentials);
    let landed = transport.post_form(login_url, &fields)?;
    if landed.status >= 400 {
        return Err(FailerError::transport(
            login_url,
            format!("status={}", landed.status),
        ));
    }

    // Only the exact failure redirect counts as a rejected login.
    if landed.final_url == config.login_failure_url() {
        tracing::warn!(username = %credentials.username, "login rejected");
        return Err(FailerError::AuthenticationFailed);
    }

    tracing::info!(username = %credentials.username, "logged in");
    Ok(())
}
