use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::directory::DeviceDirectory;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::mapper::{derive_state, mode_code_for, mode_code_for_preset};
use crate::protocol::{ATTR_MODE_CODE, ATTR_TARGET_TEMP, DEFAULT_BASE_URL};
use crate::session::{DEFAULT_LOGIN_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, SessionManager};
use crate::types::*;
use crate::writer::AttributeWriter;
use crate::Result;

pub struct NgbsClientBuilder {
    credentials: Credentials,
    base_url: String,
    http: Option<reqwest::Client>,
    login_timeout: Duration,
    request_timeout: Duration,
    mode_encoding: ModeEncoding,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl NgbsClientBuilder {
    /// The mode encoding has no default: the two portal revisions disagree on
    /// code 1, and a wrong guess swaps off and auto.
    ///
    /// ```no_run
    /// use ngbs_icon::{Credentials, ModeEncoding, NgbsClient};
    ///
    /// let creds = Credentials::new("user", "pass", "ICON1");
    /// let client = NgbsClient::builder(creds, ModeEncoding::RunOffEco).build();
    /// ```
    ///
    /// ```compile_fail
    /// use ngbs_icon::{Credentials, NgbsClient};
    ///
    /// let creds = Credentials::new("user", "pass", "ICON1");
    /// let client = NgbsClient::builder(creds).build();
    /// ```
    pub fn new(credentials: Credentials, mode_encoding: ModeEncoding) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: None,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            mode_encoding,
            log_mode: None,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Use a caller-owned connection pool instead of a private one. The login
    /// POST still goes through a private client that does not follow redirects.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Upper bound for the whole login handshake.
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// Upper bound for each authenticated request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<NgbsClient> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder().build()?,
        };

        let icon_id = self.credentials.icon_id.clone();
        let mut session = SessionManager::new(http, self.base_url, self.credentials)?
            .with_timeouts(self.login_timeout, self.request_timeout);
        if let (Some(mode), Some(path)) = (self.log_mode, self.log_path) {
            session = session.with_logger(MessageLogger::new(mode, &path)?);
        }
        let session = Arc::new(session);

        Ok(NgbsClient {
            directory: DeviceDirectory::new(session.clone()),
            writer: AttributeWriter::new(session.clone(), icon_id.clone()),
            session,
            icon_id,
            mode_encoding: self.mode_encoding,
        })
    }
}

/// Client for one installation: session, device list, writes and state mapping.
///
/// Methods take `&self`; one client may be shared between tasks.
pub struct NgbsClient {
    session: Arc<SessionManager>,
    directory: DeviceDirectory,
    writer: AttributeWriter,
    icon_id: String,
    mode_encoding: ModeEncoding,
}

impl NgbsClient {
    pub fn builder(credentials: Credentials, mode_encoding: ModeEncoding) -> NgbsClientBuilder {
        NgbsClientBuilder::new(credentials, mode_encoding)
    }

    pub fn installation_id(&self) -> &str {
        &self.icon_id
    }

    pub fn mode_encoding(&self) -> ModeEncoding {
        self.mode_encoding
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub async fn login(&self) -> bool {
        self.session.login().await
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.is_valid().await
    }

    pub async fn invalidate(&self) {
        self.session.invalidate().await
    }

    /// Thermostats of the configured installation; empty on any failure.
    pub async fn fetch(&self) -> Vec<DeviceRecord> {
        self.directory.fetch(&self.icon_id).await
    }

    pub async fn fetch_installation(&self, installation_id: &str) -> Vec<DeviceRecord> {
        self.directory.fetch(installation_id).await
    }

    pub async fn set_attribute(&self, device_id: &str, attr: &str, value: impl Display) -> bool {
        self.writer.set_attribute(device_id, attr, value).await
    }

    pub fn derive_state(&self, record: &DeviceRecord) -> DerivedState {
        derive_state(record, self.mode_encoding)
    }

    /// Write a new setpoint, rounded to half degrees. `None` does nothing.
    pub async fn set_temperature(&self, device_id: &str, temp: Option<Temperature>) -> bool {
        let Some(temp) = temp else {
            debug!(device = device_id, "no setpoint given, nothing to write");
            return true;
        };
        self.set_attribute(device_id, ATTR_TARGET_TEMP, temp.to_portal_celsius())
            .await
    }

    /// Heat and cool select the same running mode; which one applies is set
    /// installation-wide by the season.
    pub async fn set_hvac_mode(&self, device_id: &str, mode: HvacMode) -> bool {
        match self.mode_encoding.encode(mode_code_for(mode)) {
            Some(code) => self.set_attribute(device_id, ATTR_MODE_CODE, code).await,
            None => {
                warn!(device = device_id, mode = mode.as_str(), encoding = ?self.mode_encoding, "mode not supported");
                false
            }
        }
    }

    pub async fn set_preset(&self, device_id: &str, preset: Preset) -> bool {
        match self.mode_encoding.encode(mode_code_for_preset(preset)) {
            Some(code) => self.set_attribute(device_id, ATTR_MODE_CODE, code).await,
            None => {
                warn!(device = device_id, preset = preset.as_str(), encoding = ?self.mode_encoding, "preset not supported");
                false
            }
        }
    }

    pub fn supported_hvac_modes(&self) -> &'static [HvacMode] {
        self.mode_encoding.supported_hvac_modes()
    }

    pub fn supported_presets(&self) -> &'static [Preset] {
        self.mode_encoding.supported_presets()
    }
}
