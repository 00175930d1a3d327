//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing node events to the ESP-IDF logger
//! (UART / USB-CDC in production) as one `TAG | key=value` line each.
//! Failure events log at `info!`: the failing layer has already warned.

use log::info;

use crate::app::events::NodeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`NodeEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &NodeEvent) {
        match event {
            NodeEvent::Booted { registered } => {
                info!("BOOT  | registered={}", registered);
            }
            NodeEvent::LinkChanged { from, to } => {
                info!("LINK  | {:?} -> {:?}", from, to);
            }
            NodeEvent::Registered { device_id } => {
                info!("REG   | device_id={}", device_id);
            }
            NodeEvent::RegistrationFailed => {
                info!("REG   | failed, retry next tick");
            }
            NodeEvent::MeasurementsSent {
                temperature_c,
                humidity_pct,
            } => {
                info!(
                    "TELEM | T={:.1}\u{00b0}C | RH={:.1}%",
                    temperature_c, humidity_pct
                );
            }
            NodeEvent::SensorReadFailed => {
                info!("TELEM | sensor read failed, cycle skipped");
            }
            NodeEvent::SettingsUpdated { count } => {
                info!("SETS  | count={}", count);
            }
            NodeEvent::ProvisioningStarted => {
                info!("PROV  | access point and listener up");
            }
            NodeEvent::ProvisioningRejected => {
                info!("PROV  | request rejected");
            }
            NodeEvent::ProvisioningApplied { action } => {
                info!("PROV  | applied action={}", action);
            }
            NodeEvent::Restarting => {
                info!("SYS   | restarting");
            }
        }
    }
}
