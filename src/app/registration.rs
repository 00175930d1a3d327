//! One-shot device registration with the backend.
//!
//! Runs whenever the link is up and the record has no identity.  Every
//! failure is non-fatal: the supervisor simply calls again on its next
//! tick.

use core::fmt::Write as _;

use log::{info, warn};

use super::backend::BackendClient;
use super::ports::{FilePort, HttpPort};
use super::store::ConfigStore;
use crate::error::{Error, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Identity already present; no network call was made.
    AlreadyRegistered,
    /// The backend assigned this id just now.
    Registered(i32),
}

/// `AA:BB:CC:DD:EE:FF`.
pub fn format_mac(mac: &[u8; 6]) -> String {
    let mut s = String::with_capacity(17);
    for (i, b) in mac.iter().enumerate() {
        if i > 0 {
            s.push(':');
        }
        let _ = write!(s, "{b:02X}");
    }
    s
}

pub fn register_device<F: FilePort, H: HttpPort>(
    store: &mut ConfigStore<F>,
    http: &mut H,
    mac: &[u8; 6],
) -> Result<Registration, Error> {
    if store.config().is_registered() {
        return Ok(Registration::AlreadyRegistered);
    }

    let mac = format_mac(mac);
    info!("Backend: registering '{}' ({})", store.config().device_name, mac);

    let id = match BackendClient::new(http).register(store.config(), &mac) {
        Ok(id) => id,
        Err(e) => {
            warn!("Backend: registration failed ({}), retrying next tick", e);
            return Err(e);
        }
    };

    match store.record_identity(id) {
        Ok(()) => {}
        // The identity is live in memory; the next save persists it.
        Err(StoreError::Storage(e)) => warn!("Backend: id {} not persisted ({})", id, e),
        Err(e) => return Err(e.into()),
    }
    info!("Backend: registered with id {}", id);
    Ok(Registration::Registered(id))
}
