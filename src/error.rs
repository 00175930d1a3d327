//! Unified error types for the sensor node firmware.
//!
//! Each subsystem has a small `Copy` error enum; all of them convert into
//! the top-level [`Error`] so the supervisor can log and record any
//! failure the same way.  None of these are fatal: the node logs them and
//! carries on with its next scheduled tick.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Persistent storage missing, unreadable or unwritable.
    Storage(StorageError),
    /// Malformed JSON from storage or from the backend.
    Parse(ParseError),
    /// Managed-network join failed or timed out.
    Network(NetworkError),
    /// HTTP transport failure.
    Transport(TransportError),
    /// Malformed provisioning request.
    Protocol(ProtocolError),
    /// The sensor could not produce a reading.
    Sensor(SensorError),
    /// The backend answered but refused the request.
    Backend(BackendError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Backend(e) => write!(f, "backend: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The named file does not exist yet (first boot).
    NotFound,
    /// The record does not fit the storage backend.
    TooLarge,
    /// Generic I/O error from the storage backend.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::TooLarge => write!(f, "record too large"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Syntax or type error at the given position.
    Json { line: usize, column: usize },
    /// Valid JSON, but a required field is missing or has the wrong value.
    MissingField(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { line, column } => write!(f, "invalid JSON at {line}:{column}"),
            Self::MissingField(name) => write!(f, "missing or invalid field '{name}'"),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json {
            line: e.line(),
            column: e.column(),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Config store errors
// ---------------------------------------------------------------------------

/// Failure of a [`ConfigStore`](crate::app::store::ConfigStore) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    Storage(StorageError),
    Parse(ParseError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ParseError> for StoreError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Storage(e) => Self::Storage(e),
            StoreError::Parse(e) => Self::Parse(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// No SSID stored; nothing to join.
    NoCredentials,
    /// SSID or passphrase rejected by the radio driver.
    InvalidCredentials,
    /// The join did not complete before the timeout.
    JoinTimeout,
    /// The radio driver reported an error.
    Driver,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials rejected"),
            Self::JoinTimeout => write!(f, "WiFi join timed out"),
            Self::Driver => write!(f, "WiFi driver error"),
        }
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Could not open a connection to the backend.
    Connect,
    /// Connection dropped or timed out mid-request.
    Io,
    /// The request URL or a header value was rejected.
    InvalidRequest,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connection failed"),
            Self::Io => write!(f, "I/O error"),
            Self::InvalidRequest => write!(f, "invalid request"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Backend errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendError {
    /// The backend answered with an error status.
    Status(u16),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {code}"),
        }
    }
}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

// ---------------------------------------------------------------------------
// Provisioning protocol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line exceeded the decoder buffer.
    LineTooLong,
    /// The line is not valid UTF-8.
    InvalidEncoding,
    /// A field has no `=` separator.
    MalformedField,
    /// A key outside the known field set.
    UnknownKey,
    /// The same key appeared twice.
    DuplicateKey(&'static str),
    /// A required key is absent.
    MissingKey(&'static str),
    /// `ACTION` is not a decimal integer.
    InvalidAction,
    /// The client closed or timed out before sending a full line.
    Incomplete,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineTooLong => write!(f, "request line too long"),
            Self::InvalidEncoding => write!(f, "request is not UTF-8"),
            Self::MalformedField => write!(f, "field without '='"),
            Self::UnknownKey => write!(f, "unknown key"),
            Self::DuplicateKey(k) => write!(f, "duplicate key {k}"),
            Self::MissingKey(k) => write!(f, "missing key {k}"),
            Self::InvalidAction => write!(f, "ACTION is not an integer"),
            Self::Incomplete => write!(f, "no complete request line received"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer within its protocol timing.
    Timeout,
    /// Checksum mismatch on the received frame.
    Checksum,
    /// A channel came back as not-a-number.
    NotANumber,
    /// GPIO read or write failed.
    Gpio,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor timeout"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::NotANumber => write!(f, "reading is NaN"),
            Self::Gpio => write!(f, "GPIO error"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
