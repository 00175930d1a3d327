//! Provisioning line codec.
//!
//! Wire format (one request per connection):
//! ```text
//! ACTION=<int>;SSID=<str>;PASSWORD=<str>;DEVICE_NAME=<str>;TOKEN=<str>\n
//! ```
//!
//! - Fields may come in any order, each key exactly once, no other keys.
//! - A value runs to the next `;`.  `TOKEN`'s value runs to end of line,
//!   so `TOKEN` has to be the last field.
//! - A trailing `\r` before the `\n` is dropped and does not count toward
//!   [`MAX_LINE_LEN`].
//!
//! [`LineDecoder`] accumulates partial reads until the newline arrives;
//! [`parse_request`] turns the line into a [`ProvisionRequest`].

use crate::error::ProtocolError;

/// Longest accepted request line, line ending (`\n` or `\r\n`) excluded.
pub const MAX_LINE_LEN: usize = 512;

/// Reply sent before closing a rejected connection.
pub const FAILURE_REPLY: &[u8] = b"Failed to configure Wi-Fi\r\n";

// ---------------------------------------------------------------------------
// Line decoder
// ---------------------------------------------------------------------------

/// Streaming decoder that yields the first complete line.
pub struct LineDecoder {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
    /// A `\r` seen but not yet stored; dropped if `\n` follows.
    pending_cr: bool,
    complete: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            pending_cr: false,
            complete: false,
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// Returns `Ok(Some(line))` once a newline has been seen (line without
    /// the newline or a trailing `\r`).  Bytes after the newline are
    /// ignored.  The returned slice is valid until the next call.
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<&[u8]>, ProtocolError> {
        if !self.complete {
            for &b in data {
                if b == b'\n' {
                    self.complete = true;
                    break;
                }
                if core::mem::take(&mut self.pending_cr) {
                    self.buf.push(b'\r').map_err(|_| ProtocolError::LineTooLong)?;
                }
                if b == b'\r' {
                    self.pending_cr = true;
                } else {
                    self.buf.push(b).map_err(|_| ProtocolError::LineTooLong)?;
                }
            }
        }
        if !self.complete {
            return Ok(None);
        }
        Ok(Some(self.buf.as_slice()))
    }

    /// Reset decoder state for the next client.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pending_cr = false;
        self.complete = false;
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `ACTION=0`: factory reset, then take name, token and credentials.
    NewDevice,
    /// Any other code: take the network credentials only.
    UpdateCredentials(i32),
}

impl Action {
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            Self::NewDevice
        } else {
            Self::UpdateCredentials(code)
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::NewDevice => 0,
            Self::UpdateCredentials(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub action: Action,
    pub ssid: String,
    pub password: String,
    pub device_name: String,
    pub token: String,
}

#[derive(Clone, Copy)]
enum Key {
    Action,
    Ssid,
    Password,
    DeviceName,
    Token,
}

impl Key {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "ACTION" => Self::Action,
            "SSID" => Self::Ssid,
            "PASSWORD" => Self::Password,
            "DEVICE_NAME" => Self::DeviceName,
            "TOKEN" => Self::Token,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Action => "ACTION",
            Self::Ssid => "SSID",
            Self::Password => "PASSWORD",
            Self::DeviceName => "DEVICE_NAME",
            Self::Token => "TOKEN",
        }
    }
}

/// Parse one request line (newline already removed).
pub fn parse_request(line: &str) -> Result<ProvisionRequest, ProtocolError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields: [Option<&str>; 5] = [None; 5];

    let mut rest = line;
    while !rest.is_empty() {
        let (raw_key, after) = rest.split_once('=').ok_or(ProtocolError::MalformedField)?;
        let key = Key::parse(raw_key).ok_or(ProtocolError::UnknownKey)?;

        let (value, tail) = match key {
            Key::Token => (after, ""),
            _ => after.split_once(';').unwrap_or((after, "")),
        };

        let slot = &mut fields[key as usize];
        if slot.is_some() {
            return Err(ProtocolError::DuplicateKey(key.name()));
        }
        *slot = Some(value);
        rest = tail;
    }

    let take = |key: Key| fields[key as usize].ok_or(ProtocolError::MissingKey(key.name()));

    let code = take(Key::Action)?
        .parse::<i32>()
        .map_err(|_| ProtocolError::InvalidAction)?;

    Ok(ProvisionRequest {
        action: Action::from_code(code),
        ssid: take(Key::Ssid)?.into(),
        password: take(Key::Password)?.into(),
        device_name: take(Key::DeviceName)?.into(),
        token: take(Key::Token)?.into(),
    })
}
