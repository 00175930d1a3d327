//! Periodic telemetry upload and remote settings sync.

use log::{info, warn};

use super::backend::BackendClient;
use super::ports::{FilePort, HttpPort, Reading, SensorPort};
use super::store::ConfigStore;
use crate::config::channel;
use crate::error::{Error, SensorError};

/// Read the sensor once and POST one measurement per channel.
///
/// An unusable reading aborts the cycle before any request goes out.
/// The POSTs are fire-and-forget: their failures are logged only.
pub fn send_measurements<S, H, F>(
    sensor: &mut S,
    http: &mut H,
    store: &ConfigStore<F>,
) -> Result<Reading, SensorError>
where
    S: SensorPort,
    H: HttpPort,
    F: FilePort,
{
    let reading = sensor.read().and_then(|r| {
        if r.is_valid() {
            Ok(r)
        } else {
            Err(SensorError::NotANumber)
        }
    });
    let reading = match reading {
        Ok(r) => r,
        Err(e) => {
            warn!("Telemetry: sensor read failed ({}), skipping cycle", e);
            return Err(e);
        }
    };
    info!(
        "Telemetry: T={:.1}\u{00b0}C RH={:.1}%",
        reading.temperature_c, reading.humidity_pct
    );

    let mut client = BackendClient::new(http);
    for (code, value) in [
        (channel::TEMPERATURE, reading.temperature_c),
        (channel::HUMIDITY, reading.humidity_pct),
    ] {
        if let Err(e) = client.post_measurement(store.config(), code, value) {
            warn!("Telemetry: measurement type={} not sent ({})", code, e);
        }
    }
    Ok(reading)
}

/// Fetch the settings array and replace the stored one wholesale.
///
/// Returns the number of settings now held.  Any failure leaves the
/// previous settings untouched.
pub fn sync_settings<H: HttpPort, F: FilePort>(
    http: &mut H,
    store: &mut ConfigStore<F>,
) -> Result<usize, Error> {
    let settings = match BackendClient::new(http).fetch_settings(store.config()) {
        Ok(s) => s,
        Err(e) => {
            warn!("Settings: fetch failed ({}), keeping previous settings", e);
            return Err(e);
        }
    };

    let count = settings.len();
    for s in &settings {
        info!(
            "Settings: type={} name='{}' unit='{}' value={}",
            s.kind, s.type_name, s.unit, s.value
        );
    }
    if let Err(e) = store.replace_settings(settings) {
        // Memory already holds the new settings.
        warn!("Settings: not persisted ({})", e);
    }
    Ok(count)
}
