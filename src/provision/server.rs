//! Provisioning line-protocol server.
//!
//! Bound only while the node is in provisioning mode.  One client at a
//! time: accept, read one line (bounded by a deadline), parse, then
//! either apply the request to the config store or send the failure
//! reply.  The connection is closed in every case.
//!
//! ```text
//!   accept ─▶ read ≤ deadline ─▶ parse ─┬─▶ apply ─▶ Applied (caller restarts)
//!                                       └─▶ "Failed to configure Wi-Fi" ─▶ Rejected
//! ```

use log::{debug, info, warn};

use super::codec::{Action, FAILURE_REPLY, LineDecoder, ProvisionRequest, parse_request};
use super::transport::Transport;
use crate::app::ports::{ClockPort, FilePort};
use crate::app::store::ConfigStore;
use crate::config::Timing;
use crate::error::{ProtocolError, StoreError};

/// Result of one [`ProvisioningServer::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum ServeOutcome {
    /// No client was waiting (or the listener is down).
    Idle,
    /// A client sent a bad or incomplete request; nothing was changed.
    Rejected(ProtocolError),
    /// The request was applied to memory.  `saved` carries the persist
    /// result; a restart is due either way.
    Applied {
        request: ProvisionRequest,
        saved: Result<(), StoreError>,
    },
}

pub struct ProvisioningServer<T: Transport> {
    transport: T,
    decoder: LineDecoder,
    read_timeout_ms: u64,
    poll_ms: u64,
}

impl<T: Transport> ProvisioningServer<T> {
    pub fn new(transport: T, timing: &Timing) -> Self {
        Self {
            transport,
            decoder: LineDecoder::new(),
            read_timeout_ms: timing.client_read_timeout_ms,
            poll_ms: timing.provisioning_poll_ms,
        }
    }

    /// Bind the listener.  Idempotent.
    pub fn start(&mut self) -> Result<(), T::Error> {
        if self.transport.is_listening() {
            return Ok(());
        }
        self.transport.listen()?;
        info!("Provision: server started, waiting for clients");
        Ok(())
    }

    /// Close the listener (and any client).  Idempotent.
    pub fn stop(&mut self) {
        if self.transport.is_listening() {
            self.transport.shutdown();
            info!("Provision: server stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.transport.is_listening()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Serve at most one client.  Blocks while that client is sending.
    pub fn poll<F: FilePort, C: ClockPort + ?Sized>(
        &mut self,
        store: &mut ConfigStore<F>,
        clock: &mut C,
    ) -> ServeOutcome {
        if !self.transport.is_listening() || !self.transport.accept() {
            return ServeOutcome::Idle;
        }
        info!("Provision: client connected");

        let outcome = match self.read_request(clock) {
            Ok(request) => {
                let saved = apply(&request, store);
                ServeOutcome::Applied { request, saved }
            }
            Err(e) => {
                warn!("Provision: request rejected ({})", e);
                self.reply(FAILURE_REPLY);
                ServeOutcome::Rejected(e)
            }
        };

        self.transport.disconnect();
        info!("Provision: client disconnected");
        outcome
    }

    fn read_request<C: ClockPort + ?Sized>(
        &mut self,
        clock: &mut C,
    ) -> Result<ProvisionRequest, ProtocolError> {
        self.decoder.reset();
        let deadline = clock.now_ms().saturating_add(self.read_timeout_ms);
        let mut buf = [0u8; 64];

        loop {
            let n = match self.transport.read(&mut buf) {
                Ok(n) => n,
                Err(e) => {
                    debug!("Provision: client read ended: {:?}", e);
                    return Err(ProtocolError::Incomplete);
                }
            };
            if n == 0 {
                if clock.now_ms() >= deadline {
                    return Err(ProtocolError::Incomplete);
                }
                clock.delay_ms(self.poll_ms);
                continue;
            }
            if let Some(line) = self.decoder.feed(&buf[..n])? {
                let text = core::str::from_utf8(line).map_err(|_| ProtocolError::InvalidEncoding)?;
                return parse_request(text);
            }
        }
    }

    fn reply(&mut self, data: &[u8]) {
        let mut sent = 0;
        // Bounded: a stalled peer gets a truncated reply.
        for _ in 0..8 {
            match self.transport.write(&data[sent..]) {
                Ok(n) => sent += n,
                Err(e) => {
                    debug!("Provision: reply failed: {:?}", e);
                    return;
                }
            }
            if sent >= data.len() {
                break;
            }
        }
        let _ = self.transport.flush();
    }
}

/// Apply an accepted request: reset first for a new device, then write the
/// new credentials (and name/token) through in one save.
fn apply<F: FilePort>(req: &ProvisionRequest, store: &mut ConfigStore<F>) -> Result<(), StoreError> {
    info!(
        "Provision: action={} ssid='{}' pass=<{} bytes>",
        req.action.code(),
        req.ssid,
        req.password.len()
    );

    let new_device = req.action == Action::NewDevice;
    if new_device {
        info!(
            "Provision: new device name='{}' token=<{} bytes>",
            req.device_name,
            req.token.len()
        );
        if let Err(e) = store.reset() {
            warn!("Provision: reset not persisted ({})", e);
        }
    }

    store.update(|c| {
        if new_device {
            c.device_name.clone_from(&req.device_name);
            c.token.clone_from(&req.token);
        }
        c.wifi_ssid.clone_from(&req.ssid);
        c.wifi_password.clone_from(&req.password);
    })
}
