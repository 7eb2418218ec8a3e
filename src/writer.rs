use std::fmt::Display;
use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::protocol::{AJAX_PATH, set_thermostat_form};
use crate::session::SessionManager;
use crate::{Error, Result};

/// Pushes single attribute changes to thermostats of one installation.
///
/// Each call is one independent round trip; the portal has no transactional
/// write, so callers issuing several changes get them applied in order but
/// not atomically.
#[derive(Clone)]
pub struct AttributeWriter {
    session: Arc<SessionManager>,
    installation_id: String,
}

impl AttributeWriter {
    pub fn new(session: Arc<SessionManager>, installation_id: impl Into<String>) -> Self {
        Self {
            session,
            installation_id: installation_id.into(),
        }
    }

    /// Write `attr = value` on `device_id`. True only on HTTP 200.
    pub async fn set_attribute(&self, device_id: &str, attr: &str, value: impl Display) -> bool {
        let value = value.to_string();
        let outcome = self.try_set(device_id, attr, &value).await;

        let status = match &outcome {
            Ok(()) => Some(200),
            Err(Error::Status(code)) => Some(*code),
            Err(_) => None,
        };
        self.session
            .log(|l| l.log_write(device_id, attr, &value, status));

        match outcome {
            Ok(()) => {
                debug!(device = device_id, attr, value = %value, "attribute written");
                true
            }
            Err(e) => {
                warn!(device = device_id, attr, error = %e, "attribute write failed");
                false
            }
        }
    }

    async fn try_set(&self, device_id: &str, attr: &str, value: &str) -> Result<()> {
        let url = format!("{}{}", self.session.base_url(), AJAX_PATH);
        let form = set_thermostat_form(&self.installation_id, device_id, attr, value);

        let resp = self
            .session
            .send_authenticated("setThermostat", |http| http.post(&url).form(&form))
            .await?;

        if resp.status != StatusCode::OK {
            return Err(Error::Status(resp.status.as_u16()));
        }
        Ok(())
    }
}
