use std::sync::Mutex as StdMutex;
use std::time::Duration;

use reqwest::header::{COOKIE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::logger::MessageLogger;
use crate::protocol::{
    LOGIN_PATH, cookie_header, extract_form_token, is_login_page, login_form, session_cookie,
};
use crate::types::Credentials;
use crate::{Error, Result};

pub(crate) const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(15);
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Re-authentications allowed per authenticated call.
const MAX_AUTH_RETRIES: u32 = 1;

#[derive(Debug, Default)]
struct Session {
    id: Option<String>,
    valid: bool,
}

impl Session {
    fn active_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|_| self.valid)
    }
}

/// Body and status of an authenticated call the portal accepted.
pub(crate) struct PortalResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Owns the portal login session of one client.
///
/// All access to the session goes through one async mutex; a login runs while
/// holding it, so concurrent callers that find the session invalid wait for
/// that login instead of starting their own.
pub struct SessionManager {
    http: reqwest::Client,
    /// Sends the login POST; must not follow redirects, the renewed cookie
    /// rides on the 302 itself.
    login_http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    login_timeout: Duration,
    request_timeout: Duration,
    session: Mutex<Session>,
    logger: Option<StdMutex<MessageLogger>>,
}

impl SessionManager {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self> {
        let login_http = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            http,
            login_http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session: Mutex::new(Session::default()),
            logger: None,
        })
    }

    pub(crate) fn with_timeouts(mut self, login: Duration, request: Duration) -> Self {
        self.login_timeout = login;
        self.request_timeout = request;
        self
    }

    pub(crate) fn with_logger(mut self, logger: MessageLogger) -> Self {
        self.logger = Some(StdMutex::new(logger));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Log in from scratch. Never fails past this point: any error is logged
    /// and leaves the session invalid.
    pub async fn login(&self) -> bool {
        let mut session = self.session.lock().await;
        self.authenticate(&mut session).await.is_ok()
    }

    /// Log in if the session is not currently valid.
    pub async fn ensure_valid(&self) -> bool {
        self.valid_session_id().await.is_ok()
    }

    /// Force the next authenticated call to log in again.
    pub async fn invalidate(&self) {
        let mut session = self.session.lock().await;
        if session.valid {
            debug!("session invalidated");
        }
        session.valid = false;
    }

    pub async fn is_valid(&self) -> bool {
        self.session.lock().await.valid
    }

    pub(crate) async fn valid_session_id(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        if let Some(id) = session.active_id() {
            return Ok(id.to_string());
        }
        self.authenticate(&mut session).await
    }

    /// Only drop the session if it still carries the id the portal rejected;
    /// another caller may already have logged in again.
    async fn invalidate_rejected(&self, rejected_id: &str) {
        let mut session = self.session.lock().await;
        if session.id.as_deref() == Some(rejected_id) {
            session.valid = false;
        }
    }

    async fn authenticate(&self, session: &mut Session) -> Result<String> {
        // Session state is only touched once the handshake has finished, so a
        // cancelled login leaves it as it was.
        let outcome = match tokio::time::timeout(self.login_timeout, self.handshake()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        };

        match outcome {
            Ok(id) => {
                session.id = Some(id.clone());
                session.valid = true;
                info!(user = %self.credentials.username, "logged in to portal");
                Ok(id)
            }
            Err(e) => {
                session.valid = false;
                error!(error = %e, "portal login failed");
                Err(e)
            }
        }
    }

    /// GET the login page for a form token and session id, then POST the
    /// credentials. Success is a redirect, or a 2xx page without the login form.
    async fn handshake(&self) -> Result<String> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        debug!(url = %url, "fetching login page");
        self.log(|l| l.log_request("GET", LOGIN_PATH, None));

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let issued_id = session_cookie(resp.headers());
        let page = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let token = extract_form_token(&page).ok_or(Error::TokenNotFound)?;
        let session_id = issued_id.ok_or(Error::NoSessionCookie)?;

        self.log(|l| {
            let fields = json!({ "username": self.credentials.username, "token": token });
            l.log_request("POST", LOGIN_PATH, Some(&fields));
        });

        let resp = self
            .login_http
            .post(&url)
            .header(COOKIE, cookie_header(&session_id))
            .form(&login_form(&self.credentials, &token))
            .send()
            .await?;
        let status = resp.status();
        // PHP may regenerate the id on login
        let renewed_id = session_cookie(resp.headers());
        let location = resp.headers().get(LOCATION).cloned();
        let body = resp.text().await?;

        if status.is_redirection() {
            debug!(status = status.as_u16(), location = ?location, "login redirected");
        } else if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }
        if is_login_page(&body) {
            return Err(Error::LoginRejected);
        }
        Ok(renewed_id.unwrap_or(session_id))
    }

    /// Send a request with the session cookie attached.
    ///
    /// A 401/403, or the login page served in place of the expected reply,
    /// invalidates the session; the call is then repeated once after a fresh
    /// login. A second rejection is `Error::SessionRejected`. Every attempt
    /// gets its own `req` line in the message log.
    pub(crate) async fn send_authenticated<F>(&self, what: &str, build: F) -> Result<PortalResponse>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        for attempt in 0..=MAX_AUTH_RETRIES {
            let session_id = self.valid_session_id().await?;

            let request = build(&self.http)
                .header(COOKIE, cookie_header(&session_id))
                .timeout(self.request_timeout)
                .build()?;
            self.log(|l| {
                let url = request.url();
                let target = match url.query() {
                    Some(query) => format!("{}?{query}", url.path()),
                    None => url.path().to_string(),
                };
                l.log_request(request.method().as_str(), &target, None);
            });

            let resp = self.http.execute(request).await?;
            let status = resp.status();
            let body = resp.text().await?;

            let rejected = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
                || is_login_page(&body);
            if rejected {
                warn!(call = what, attempt, status = status.as_u16(), "portal rejected session");
                self.invalidate_rejected(&session_id).await;
                continue;
            }

            return Ok(PortalResponse { status, body });
        }

        Err(Error::SessionRejected)
    }

    pub(crate) fn log(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            f(&mut logger);
        }
    }
}
