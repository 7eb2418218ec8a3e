use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login identity for one installation on the portal.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub icon_id: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        icon_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            icon_id: icon_id.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("icon_id", &self.icon_id)
            .finish()
    }
}

/// Temperature in Celsius.
/// The portal accepts setpoints in 0.5 degree steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(f64);

impl Temperature {
    pub fn from_celsius(c: f64) -> Self {
        Self(c)
    }

    pub fn celsius(&self) -> f64 {
        self.0
    }

    /// Round to portal precision (0.5 increments).
    pub fn to_portal_celsius(&self) -> f64 {
        (self.0 * 2.0).round() / 2.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\u{00b0}C", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    Auto,
}

impl HvacMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::Auto => "auto",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "off" => Some(HvacMode::Off),
            "heat" => Some(HvacMode::Heat),
            "cool" => Some(HvacMode::Cool),
            "auto" => Some(HvacMode::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HvacAction {
    Off,
    #[default]
    Idle,
    Heating,
    Cooling,
}

impl HvacAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacAction::Off => "off",
            HvacAction::Idle => "idle",
            HvacAction::Heating => "heating",
            HvacAction::Cooling => "cooling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    None,
    Comfort,
    Eco,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::None => "none",
            Preset::Comfort => "comfort",
            Preset::Eco => "eco",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Preset::None),
            "comfort" => Some(Preset::Comfort),
            "eco" => Some(Preset::Eco),
            _ => None,
        }
    }
}

/// Meaning of a `CE` mode code, independent of how a portal revision numbers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCode {
    /// Manual setpoint, running.
    Run,
    Auto,
    Eco,
    Off,
    Unknown(i64),
}

/// How the portal numbers `CE`. Portal revisions disagree, so the host picks
/// one; there is no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeEncoding {
    /// 0 = manual, 1 = auto, 2 = eco
    ManualAutoEco,
    /// 0 = run, 1 = off, 2 = eco
    RunOffEco,
}

impl ModeEncoding {
    pub fn decode(&self, code: i64) -> ModeCode {
        match (self, code) {
            (_, 0) => ModeCode::Run,
            (ModeEncoding::ManualAutoEco, 1) => ModeCode::Auto,
            (ModeEncoding::RunOffEco, 1) => ModeCode::Off,
            (_, 2) => ModeCode::Eco,
            (_, other) => ModeCode::Unknown(other),
        }
    }

    /// `None` when this encoding has no code for `mode`.
    pub fn encode(&self, mode: ModeCode) -> Option<i64> {
        match (self, mode) {
            (_, ModeCode::Run) => Some(0),
            (ModeEncoding::ManualAutoEco, ModeCode::Auto) => Some(1),
            (ModeEncoding::RunOffEco, ModeCode::Off) => Some(1),
            (_, ModeCode::Eco) => Some(2),
            _ => None,
        }
    }

    pub fn supported_hvac_modes(&self) -> &'static [HvacMode] {
        match self {
            ModeEncoding::ManualAutoEco => &[HvacMode::Heat, HvacMode::Cool, HvacMode::Auto],
            ModeEncoding::RunOffEco => &[HvacMode::Off, HvacMode::Heat, HvacMode::Cool],
        }
    }

    pub fn supported_presets(&self) -> &'static [Preset] {
        match self {
            ModeEncoding::ManualAutoEco => &[Preset::None, Preset::Comfort, Preset::Eco],
            ModeEncoding::RunOffEco => &[Preset::None, Preset::Eco],
        }
    }
}

/// One thermostat as reported by a single device-list fetch.
///
/// Absent upstream fields are defaulted (`OUT` and `CE` to 0, the rest to
/// `None`); present values, including an explicit 0, are kept as sent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeviceRecord {
    #[serde(rename = "ID", deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "room_temp", default, deserialize_with = "lenient::number")]
    pub current_temperature: Option<f64>,
    #[serde(rename = "target_temp", default, deserialize_with = "lenient::number")]
    pub target_temperature: Option<f64>,
    /// Raw relative humidity; see [`crate::valid_humidity`] for the validated value.
    #[serde(rename = "RH", default, deserialize_with = "lenient::number")]
    pub humidity: Option<f64>,
    #[serde(rename = "OUT", default, deserialize_with = "lenient::flag")]
    pub output: bool,
    #[serde(rename = "CE", default, deserialize_with = "lenient::integer")]
    pub mode_code: i64,
    /// Installation-wide, copied from `CON_VALUE` at fetch time.
    #[serde(skip_deserializing)]
    pub is_winter: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceRecord {
    pub fn name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Presentation state of one thermostat, recomputed from a [`DeviceRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedState {
    pub hvac_mode: HvacMode,
    pub hvac_action: HvacAction,
    pub preset: Preset,
    pub humidity: Option<f64>,
    pub current_temperature: Option<Temperature>,
    pub target_temperature: Option<Temperature>,
}

pub(crate) fn value_as_f64(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

mod lenient {
    use serde::{Deserialize, Deserializer, de};
    use serde_json::Value;

    use super::value_as_f64;

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(de::Error::custom(format!("unsupported device id: {other}"))),
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(value_as_f64(&Value::deserialize(d)?))
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(value_as_f64(&Value::deserialize(d)?).map_or(0, |f| f as i64))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::String(s) if s.eq_ignore_ascii_case("true") => true,
            other => value_as_f64(&other).is_some_and(|f| f != 0.0),
        })
    }
}
