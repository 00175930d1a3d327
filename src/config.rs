//! Device configuration record and timing parameters.
//!
//! [`DeviceConfig`] is the single persisted record.  Its serialised field
//! names are the on-flash JSON schema, so renaming a field here is a
//! schema change that requires a reset on deployed devices.
//!
//! ```text
//! {
//!   "WIFI_SSID": "Home", "WIFI_PASS": "secret",
//!   "API_URL": "https://api.example.com/", "TYPE": 1,
//!   "TOKEN": "abc123", "DEVICE_NAME": "Sensor1",
//!   "DEVICE_ID": 42, "CREATED": true,
//!   "SETTINGS": [{"type":1,"type_name":"temp","unit":"C","value":21.5}]
//! }
//! ```

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fixed constants
// ---------------------------------------------------------------------------

/// Name of the persisted configuration file.
pub const CONFIG_FILE: &str = "config.json";

/// SSID broadcast while in access-point mode.
pub const AP_SSID: &str = "ESP32";
/// Passphrase of the provisioning access point.
pub const AP_PASSWORD: &str = "password";

/// TCP port of the provisioning line protocol.
pub const PROVISIONING_PORT: u16 = 8080;

/// Sentinel for "not yet registered with the backend".
pub const UNREGISTERED_ID: i32 = -1;

/// Device class code reported at registration.
pub const DEFAULT_DEVICE_KIND: i32 = 1;

/// Backend base address baked in at build time.
pub const DEFAULT_API_URL: &str = match option_env!("SENSORNODE_API_URL") {
    Some(url) => url,
    None => "",
};

/// Measurement channel codes understood by the backend.
pub mod channel {
    pub const TEMPERATURE: i32 = 1;
    pub const HUMIDITY: i32 = 2;
}

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// One remotely managed setting, replaced wholesale on every settings sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub unit: String,
    pub value: f32,
}

/// The live configuration, mirrored one-to-one in `config.json`.
///
/// Every field has a default so that a partially written record still
/// loads; missing fields take the factory value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    #[serde(rename = "WIFI_SSID")]
    pub wifi_ssid: String,
    #[serde(rename = "WIFI_PASS")]
    pub wifi_password: String,
    #[serde(rename = "API_URL")]
    pub api_url: String,
    #[serde(rename = "TYPE")]
    pub device_kind: i32,
    #[serde(rename = "TOKEN")]
    pub token: String,
    #[serde(rename = "DEVICE_NAME")]
    pub device_name: String,
    #[serde(rename = "DEVICE_ID")]
    pub device_id: i32,
    #[serde(rename = "CREATED")]
    pub created: bool,
    #[serde(rename = "SETTINGS")]
    pub settings: Vec<Setting>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            api_url: DEFAULT_API_URL.into(),
            device_kind: DEFAULT_DEVICE_KIND,
            token: String::new(),
            device_name: String::new(),
            device_id: UNREGISTERED_ID,
            created: false,
            settings: Vec::new(),
        }
    }
}

impl DeviceConfig {
    /// Factory record that keeps the backend address and device class.
    pub fn factory(api_url: &str, device_kind: i32) -> Self {
        Self {
            api_url: api_url.into(),
            device_kind,
            ..Self::default()
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    /// True once the backend has assigned an identity.
    pub fn is_registered(&self) -> bool {
        self.created && self.device_id != UNREGISTERED_ID
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// All periods and timeouts, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Supervisor tick: connectivity check, registration, job polling.
    pub supervisor_ms: u64,
    /// Measurement upload period.
    pub telemetry_ms: u64,
    /// Remote settings fetch period.
    pub settings_ms: u64,
    /// Ceiling on a single managed-network join attempt.
    pub join_timeout_ms: u64,
    /// Interval between join status checks.
    pub join_poll_ms: u64,
    /// Background reconnect period while provisioning.
    pub reconnect_ms: u64,
    /// Sleep between provisioning listener polls.
    pub provisioning_poll_ms: u64,
    /// How long a connected provisioning client may take to send its line.
    pub client_read_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            supervisor_ms: 2_000,
            telemetry_ms: 30 * 60 * 1_000,
            settings_ms: 60 * 60 * 1_000,
            join_timeout_ms: 10_000,
            join_poll_ms: 500,
            reconnect_ms: 10 * 60 * 1_000,
            provisioning_poll_ms: 50,
            client_read_timeout_ms: 10_000,
        }
    }
}
