use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::types::{Credentials, DeviceRecord, value_as_f64};
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://enzoldhazam.hu";

pub const SESSION_COOKIE: &str = "PHPSESSID";

/// Title of the localized login page. Its presence means we are not logged in.
pub const LOGIN_PAGE_MARKER: &str = "Bejelentkezés";

pub const LOGIN_PATH: &str = "/";
pub const AJAX_PATH: &str = "/Ax";
pub const DEVICE_LIST_PATH: &str = "/Ax?action=iconList";

pub const ATTR_TARGET_TEMP: &str = "target_temp";
pub const ATTR_MODE_CODE: &str = "CE";
pub const ATTR_OUTPUT: &str = "OUT";

static INPUT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("static regex"));
static TOKEN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bname\s*=\s*["']token["']"#).expect("static regex"));
static VALUE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bvalue\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("static regex")
});

/// Pull the single-use form token out of the login page.
pub fn extract_form_token(html: &str) -> Option<String> {
    INPUT_TAG
        .find_iter(html)
        .map(|m| m.as_str())
        .find(|tag| TOKEN_NAME.is_match(tag))
        .and_then(|tag| VALUE_ATTR.captures(tag))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .filter(|token| !token.is_empty())
}

/// Session id from the response's `Set-Cookie` headers, if the server issued one.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn cookie_header(session_id: &str) -> String {
    format!("{SESSION_COOKIE}={session_id}")
}

pub fn is_login_page(body: &str) -> bool {
    body.contains(LOGIN_PAGE_MARKER)
}

pub fn login_form<'a>(credentials: &'a Credentials, token: &'a str) -> [(&'static str, &'a str); 4] {
    [
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
        ("token", token),
        ("x-email", ""),
    ]
}

pub fn set_thermostat_form(
    icon_id: &str,
    device_id: &str,
    attr: &str,
    value: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("action", "setThermostat".to_string()),
        ("icon", icon_id.to_string()),
        ("thermostat", device_id.to_string()),
        ("attr", attr.to_string()),
        ("value", value.to_string()),
    ]
}

/// Parse an `iconList` body into the device records of one installation.
///
/// `{ICONS: {<id>: {DP: [...], CON_VALUE: int}}}`. `CON_VALUE == 0` (or absent)
/// means heating season and is stamped onto every record of the batch.
/// Devices that fail to parse are skipped.
pub fn parse_icon_list(body: &str, installation_id: &str) -> Result<Vec<DeviceRecord>> {
    let parsed: Value = serde_json::from_str(body)?;

    let installation = parsed
        .get("ICONS")
        .and_then(|icons| icons.get(installation_id))
        .ok_or_else(|| Error::Schema(format!("installation {installation_id} not in ICONS")))?;

    let devices = match installation.get("DP") {
        Some(Value::Array(devices)) => devices,
        _ => {
            return Err(Error::Schema(format!(
                "installation {installation_id} has no DP list"
            )));
        }
    };

    let con_value = installation
        .get("CON_VALUE")
        .and_then(value_as_f64)
        .unwrap_or(0.0);
    let is_winter = con_value == 0.0;

    Ok(devices
        .iter()
        .filter_map(|raw| match DeviceRecord::deserialize(raw) {
            Ok(mut record) => {
                record.is_winter = is_winter;
                Some(record)
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed device entry");
                None
            }
        })
        .collect())
}
