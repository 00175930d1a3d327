//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Node (domain)
//! ```
//!
//! The radio, HTTP client, flash storage, sensor, indicator LED and clock
//! all sit behind these traits.  The [`Node`](super::node::Node) consumes
//! them via generics, so the domain core never touches hardware directly
//! and every workflow runs on the host against mocks.
//!
//! ## Resource scoping
//!
//! - **HttpPort** opens a connection per request and releases it before
//!   returning, on success and on error alike.
//! - **FilePort** writes replace the whole named file; a failed write
//!   leaves the previous content in place.

use crate::error::{NetworkError, SensorError, StorageError, TransportError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl Reading {
    /// A reading is usable only if neither channel is NaN.
    pub fn is_valid(&self) -> bool {
        !self.temperature_c.is_nan() && !self.humidity_pct.is_nan()
    }
}

pub trait SensorPort {
    fn read(&mut self) -> Result<Reading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Station and soft-AP primitives of the radio.
pub trait NetworkPort {
    /// Start a station-mode join.  Returns once the attempt is under way;
    /// completion is observed through [`is_joined`](Self::is_joined).
    fn begin_join(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError>;

    /// Station associated and holding an address.
    fn is_joined(&mut self) -> bool;

    /// Drop the station link (abandons an in-progress join).
    fn leave(&mut self);

    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError>;

    fn stop_access_point(&mut self);

    /// Hardware address of the station interface.
    fn mac_address(&self) -> [u8; 6];
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → status LED)
// ───────────────────────────────────────────────────────────────

/// Active whenever the node is off the managed network.
pub trait IndicatorPort {
    fn set_active(&mut self, active: bool);
}

// ───────────────────────────────────────────────────────────────
// HTTP port (driven adapter: domain ↔ backend)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully formed backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

/// Any response that came back, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpPort {
    /// Perform one request.  `Err` means no response was received.
    fn request(&mut self, req: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// File port (driven adapter: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Named-file storage.  Only the config store touches it.
pub trait FilePort {
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace the file's full contents atomically.
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Clock / system ports
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Monotonic milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the (only) thread of execution.
    fn delay_ms(&mut self, ms: u64);
}

pub trait SystemPort {
    /// Process-level reset.  On hardware this does not return.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`NodeEvent`](super::events::NodeEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::NodeEvent);
}
