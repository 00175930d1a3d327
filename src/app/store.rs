//! Config store — sole owner of the persisted [`DeviceConfig`].
//!
//! The in-memory record is the live configuration; every mutation goes
//! through this type and is written straight through to `config.json`
//! as a full-record rewrite.  A failed write is logged and returned, but
//! the in-memory change stands until the next successful save.
//!
//! ```text
//!   update(|cfg| …) ──▶ enforce invariants ──▶ serialise ──▶ FilePort::write
//! ```

use log::{debug, error, info, warn};

use crate::app::ports::FilePort;
use crate::config::{CONFIG_FILE, DeviceConfig, Setting, UNREGISTERED_ID};
use crate::error::{ParseError, StorageError, StoreError};

pub struct ConfigStore<F: FilePort> {
    files: F,
    config: DeviceConfig,
}

impl<F: FilePort> ConfigStore<F> {
    /// A store holding factory defaults.  Call [`load`](Self::load) next.
    pub fn new(files: F) -> Self {
        Self {
            files,
            config: DeviceConfig::default(),
        }
    }

    /// The live configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut F {
        &mut self.files
    }

    /// Read `config.json` into memory.
    ///
    /// On any error the current in-memory record is kept and the error is
    /// returned for the caller to log; nothing here is fatal.
    pub fn load(&mut self) -> Result<&DeviceConfig, StoreError> {
        let bytes = self.files.read(CONFIG_FILE)?;
        debug!("Store: read {} ({} bytes)", CONFIG_FILE, bytes.len());

        let mut loaded: DeviceConfig =
            serde_json::from_slice(&bytes).map_err(ParseError::from)?;
        debug!("Store: {} = {}", CONFIG_FILE, redacted(&loaded));
        enforce_identity_invariant(&mut loaded);

        self.config = loaded;
        self.log_summary();
        Ok(&self.config)
    }

    /// Serialise the full record and overwrite the file.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&self.config).map_err(|e| {
            error!("Store: serialise failed: {}", e);
            StoreError::Storage(StorageError::Io)
        })?;
        match self.files.write(CONFIG_FILE, &bytes) {
            Ok(()) => {
                info!("Store: configuration saved ({} bytes)", bytes.len());
                Ok(())
            }
            Err(e) => {
                error!("Store: write failed ({}), keeping in-memory state", e);
                Err(e.into())
            }
        }
    }

    /// Factory reset: empty credentials, token, name and settings, no
    /// identity.  The backend address and device class survive.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.config = DeviceConfig::factory(&self.config.api_url, self.config.device_kind);
        info!("Store: configuration reset");
        self.save()
    }

    /// Mutate the live record and write it through.
    pub fn update(&mut self, f: impl FnOnce(&mut DeviceConfig)) -> Result<(), StoreError> {
        f(&mut self.config);
        enforce_identity_invariant(&mut self.config);
        self.save()
    }

    /// Record the identity assigned by the backend.
    ///
    /// The sentinel id is refused without touching the record.
    pub fn record_identity(&mut self, device_id: i32) -> Result<(), StoreError> {
        if device_id == UNREGISTERED_ID {
            return Err(ParseError::MissingField("id").into());
        }
        self.update(|c| {
            c.device_id = device_id;
            c.created = true;
        })
    }

    /// Replace the settings sequence wholesale.
    pub fn replace_settings(&mut self, settings: Vec<Setting>) -> Result<(), StoreError> {
        self.update(|c| c.settings = settings)
    }

    fn log_summary(&self) {
        let c = &self.config;
        info!(
            "Store: ssid='{}' pass=<{} bytes> api='{}' type={} token=<{} bytes> name='{}' id={} created={}",
            c.wifi_ssid,
            c.wifi_password.len(),
            c.api_url,
            c.device_kind,
            c.token.len(),
            c.device_name,
            c.device_id,
            c.created
        );
        for s in &c.settings {
            info!(
                "Store: setting type={} name='{}' unit='{}' value={}",
                s.kind, s.type_name, s.unit, s.value
            );
        }
    }
}

/// The record as JSON, with the WiFi passphrase and the API token replaced
/// by their lengths.
pub fn redacted(c: &DeviceConfig) -> String {
    let shown = DeviceConfig {
        wifi_password: format!("<{} bytes>", c.wifi_password.len()),
        token: format!("<{} bytes>", c.token.len()),
        ..c.clone()
    };
    serde_json::to_string(&shown).unwrap_or_default()
}

/// `created` implies a real identity.
fn enforce_identity_invariant(c: &mut DeviceConfig) {
    if c.created && c.device_id == UNREGISTERED_ID {
        warn!("Store: CREATED set without DEVICE_ID, clearing");
        c.created = false;
    }
}
