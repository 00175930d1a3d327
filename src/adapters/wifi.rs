//! WiFi adapter: station join plus the provisioning soft-AP.
//!
//! Implements [`NetworkPort`].  Station and access point can run at the
//! same time (mixed mode), which is what lets the background reconnect
//! try the managed network while the provisioning AP stays up.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use log::{info, warn};
#[cfg(target_os = "espidf")]
use log::debug;

use crate::app::ports::NetworkPort;
use crate::error::NetworkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::EspWifi;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), NetworkError> {
    if ssid.is_empty() {
        return Err(NetworkError::NoCredentials);
    }
    if ssid.len() > 32 {
        return Err(NetworkError::InvalidCredentials);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), NetworkError> {
    // Empty means an open network; otherwise WPA2 wants 8..=64 bytes.
    if password.is_empty() || (8..=64).contains(&password.len()) {
        Ok(())
    } else {
        Err(NetworkError::InvalidCredentials)
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl Credentials {
    fn new(ssid: &str, password: &str) -> Result<Self, NetworkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut c = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        c.ssid
            .push_str(ssid)
            .map_err(|()| NetworkError::InvalidCredentials)?;
        c.password
            .push_str(password)
            .map_err(|()| NetworkError::InvalidCredentials)?;
        Ok(c)
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    station: Option<Credentials>,
    access_point: Option<Credentials>,
    /// Simulation: whether a join to the stored SSID will come up.
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_joined: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            wifi,
            station: None,
            access_point: None,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            station: None,
            access_point: None,
            sim_reachable: true,
            sim_joined: false,
        }
    }

    /// Simulation: make the managed network (un)reachable.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
        if !reachable {
            self.sim_joined = false;
        }
    }

    pub fn is_access_point_active(&self) -> bool {
        self.access_point.is_some()
    }

    // ── Platform-specific ─────────────────────────────────────

    /// Push the current station/AP combination to the driver.
    #[cfg(target_os = "espidf")]
    fn platform_configure(&mut self) -> Result<(), NetworkError> {
        use embedded_svc::wifi::{
            AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration,
        };

        let auth = |password: &str| {
            if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            }
        };
        let client = self.station.as_ref().map(|c| ClientConfiguration {
            ssid: c.ssid.clone(),
            password: c.password.clone(),
            auth_method: auth(&c.password),
            ..Default::default()
        });
        let ap = self.access_point.as_ref().map(|c| AccessPointConfiguration {
            ssid: c.ssid.clone(),
            password: c.password.clone(),
            auth_method: auth(&c.password),
            channel: 1,
            ..Default::default()
        });
        let conf = match (client, ap) {
            (Some(c), Some(a)) => Configuration::Mixed(c, a),
            (Some(c), None) => Configuration::Client(c),
            (None, Some(a)) => Configuration::AccessPoint(a),
            (None, None) => Configuration::None,
        };

        self.wifi.set_configuration(&conf).map_err(|e| {
            debug!("WiFi: set_configuration failed: {:?}", e);
            NetworkError::Driver
        })?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|e| {
                debug!("WiFi: start failed: {:?}", e);
                NetworkError::Driver
            })?;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_configure(&mut self) -> Result<(), NetworkError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), NetworkError> {
        // Non-blocking: completion shows up through is_joined().
        self.wifi.connect().map_err(|e| {
            debug!("WiFi: connect failed: {:?}", e);
            NetworkError::Driver
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), NetworkError> {
        self.sim_joined = self.sim_reachable;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed: {:?}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_joined = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_joined(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_joined(&self) -> bool {
        self.sim_joined && self.sim_reachable
    }

    #[cfg(target_os = "espidf")]
    fn log_access_point(&self) {
        match self.wifi.ap_netif().get_ip_info() {
            Ok(ip) => info!("WiFi: AP IP address {}", ip.ip),
            Err(e) => warn!("WiFi: AP IP unavailable: {:?}", e),
        }
        info!(
            "WiFi: MAC {}",
            crate::app::registration::format_mac(&self.mac_address())
        );
    }

    #[cfg(not(target_os = "espidf"))]
    fn log_access_point(&self) {
        if let Some(ap) = &self.access_point {
            info!("WiFi(sim): AP '{}' up ({} byte passphrase)", ap.ssid, ap.password.len());
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkPort for WifiAdapter {
    fn begin_join(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        self.station = Some(Credentials::new(ssid, password)?);
        self.platform_configure()?;
        self.platform_connect()?;
        info!("WiFi: join to '{}' started", ssid);
        Ok(())
    }

    fn is_joined(&mut self) -> bool {
        self.station.is_some() && self.platform_is_joined()
    }

    fn leave(&mut self) {
        if self.station.take().is_some() {
            self.platform_disconnect();
            if let Err(e) = self.platform_configure() {
                warn!("WiFi: reconfigure after leave failed ({})", e);
            }
            info!("WiFi: station left");
        }
    }

    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        self.access_point = Some(Credentials::new(ssid, password)?);
        if let Err(e) = self.platform_configure() {
            self.access_point = None;
            return Err(e);
        }
        self.log_access_point();
        Ok(())
    }

    fn stop_access_point(&mut self) {
        if self.access_point.take().is_some() {
            if let Err(e) = self.platform_configure() {
                warn!("WiFi: reconfigure after AP stop failed ({})", e);
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn mac_address(&self) -> [u8; 6] {
        self.wifi
            .sta_netif()
            .get_mac()
            .unwrap_or_else(|_| super::device_id::read_mac())
    }

    #[cfg(not(target_os = "espidf"))]
    fn mac_address(&self) -> [u8; 6] {
        super::device_id::read_mac()
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::config::{AP_PASSWORD, AP_SSID};

    #[test]
    fn credentials_are_validated() {
        assert_eq!(validate_ssid(""), Err(NetworkError::NoCredentials));
        assert_eq!(validate_ssid(&"s".repeat(33)), Err(NetworkError::InvalidCredentials));
        assert!(validate_ssid("Home").is_ok());
        assert!(validate_password("").is_ok());
        assert_eq!(validate_password("short"), Err(NetworkError::InvalidCredentials));
        assert!(validate_password("password").is_ok());
    }

    #[test]
    fn sim_join_and_leave() {
        let mut wifi = WifiAdapter::new();
        assert!(!wifi.is_joined());
        wifi.begin_join("Home", "secret99").unwrap();
        assert!(wifi.is_joined());
        wifi.leave();
        assert!(!wifi.is_joined());
    }

    #[test]
    fn unreachable_network_never_joins() {
        let mut wifi = WifiAdapter::new();
        wifi.set_reachable(false);
        wifi.begin_join("Home", "").unwrap();
        assert!(!wifi.is_joined());
    }

    #[test]
    fn access_point_coexists_with_station() {
        let mut wifi = WifiAdapter::new();
        wifi.start_access_point(AP_SSID, AP_PASSWORD).unwrap();
        wifi.begin_join("Home", "secret99").unwrap();
        assert!(wifi.is_access_point_active());
        assert!(wifi.is_joined());
        wifi.stop_access_point();
        assert!(!wifi.is_access_point_active());
        assert!(wifi.is_joined());
    }

    #[test]
    fn refused_credentials_leave_state_untouched() {
        let mut wifi = WifiAdapter::new();
        assert_eq!(wifi.begin_join("Home", "bad"), Err(NetworkError::InvalidCredentials));
        assert!(!wifi.is_joined());
    }
}
