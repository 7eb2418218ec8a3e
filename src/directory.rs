use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::protocol::{DEVICE_LIST_PATH, parse_icon_list};
use crate::session::SessionManager;
use crate::types::DeviceRecord;
use crate::{Error, Result};

/// Reads the thermostats of an installation through a shared session.
#[derive(Clone)]
pub struct DeviceDirectory {
    session: Arc<SessionManager>,
}

impl DeviceDirectory {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Current records of every thermostat in `installation_id`.
    ///
    /// Every failure yields an empty list and a log line. Pollers should read
    /// an empty result as "no data right now" and keep their last state.
    pub async fn fetch(&self, installation_id: &str) -> Vec<DeviceRecord> {
        match self.try_fetch(installation_id).await {
            Ok(devices) => {
                debug!(installation = installation_id, count = devices.len(), "fetched devices");
                devices
            }
            Err(e) => {
                warn!(installation = installation_id, error = %e, "device fetch failed");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, installation_id: &str) -> Result<Vec<DeviceRecord>> {
        let url = format!("{}{}", self.session.base_url(), DEVICE_LIST_PATH);

        let resp = self
            .session
            .send_authenticated("iconList", |http| http.get(&url))
            .await?;

        self.session.log(|l| {
            let body = serde_json::from_str(&resp.body).unwrap_or(Value::Null);
            l.log_fetch(resp.status.as_u16(), &body);
        });

        if !resp.status.is_success() {
            return Err(Error::Status(resp.status.as_u16()));
        }
        parse_icon_list(&resp.body, installation_id)
    }
}
