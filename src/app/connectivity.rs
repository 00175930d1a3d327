//! Connectivity manager: drives the link state table against the radio.
//!
//! ```text
//!   NetworkPort ──▶ LinkInputs ──▶ Fsm::tick ──▶ LinkCommands ──▶ NetworkPort
//!                                                             ├──▶ IndicatorPort
//!                                                             └──▶ ProvisioningServer
//! ```
//!
//! Joins are blocking: [`supervise`](ConnectivityManager::supervise)
//! returns only once the attempt has either joined or given up, and
//! [`retry_join`](ConnectivityManager::retry_join) does the same from
//! provisioning mode with the access point still up.

use log::{debug, info, warn};

use super::ports::{ClockPort, FilePort, IndicatorPort, NetworkPort};
use super::store::ConfigStore;
use crate::config::{AP_PASSWORD, AP_SSID, DeviceConfig, Timing};
use crate::error::NetworkError;
use crate::fsm::context::{LinkCommands, LinkContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, LinkState};
use crate::provision::server::{ProvisioningServer, ServeOutcome};
use crate::provision::transport::Transport;

/// Transitions recorded since the last [`take_changes`](ConnectivityManager::take_changes).
pub type LinkChanges = heapless::Vec<(LinkState, LinkState), 8>;

pub struct ConnectivityManager<N: NetworkPort, I: IndicatorPort, T: Transport> {
    fsm: Fsm,
    ctx: LinkContext,
    /// Commands as last pushed to the hardware.
    applied: LinkCommands,
    network: N,
    indicator: I,
    server: ProvisioningServer<T>,
    join_poll_ms: u64,
    changes: LinkChanges,
}

impl<N: NetworkPort, I: IndicatorPort, T: Transport> ConnectivityManager<N, I, T> {
    pub fn new(network: N, indicator: I, transport: T, timing: &Timing) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), LinkState::Disconnected),
            ctx: LinkContext::new(timing.join_timeout_ms),
            applied: LinkCommands::default(),
            network,
            indicator,
            server: ProvisioningServer::new(transport, timing),
            join_poll_ms: timing.join_poll_ms.max(1),
            changes: LinkChanges::new(),
        }
    }

    /// Enter the initial state and drive the indicator to match.
    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
        let level = self.ctx.commands.indicator_active;
        self.indicator.set_active(level);
        self.applied.indicator_active = level;
        self.apply_commands();
    }

    pub fn state(&self) -> LinkState {
        self.fsm.current_state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn server(&self) -> &ProvisioningServer<T> {
        &self.server
    }

    /// Drain the transitions taken since the previous call.
    pub fn take_changes(&mut self) -> LinkChanges {
        core::mem::take(&mut self.changes)
    }

    /// One supervisor tick.
    ///
    /// - `Connected`: sample the link; a drop moves to `Disconnected`.
    /// - `Disconnected`: run one bounded join (blocking).
    /// - `Provisioning`: pick up a link restored behind our back.
    ///
    /// Returns the join failure when this tick gave up on the network.
    pub fn supervise<C: ClockPort + ?Sized>(
        &mut self,
        cfg: &DeviceConfig,
        clock: &mut C,
    ) -> Option<NetworkError> {
        match self.state() {
            LinkState::Connected | LinkState::Provisioning => {
                self.ctx.inputs.joined = self.network.is_joined();
                self.step();
                None
            }
            LinkState::Disconnected | LinkState::Connecting => self.join(cfg, clock),
        }
    }

    /// Background join attempt while provisioning.  The access point and
    /// listener stay up unless the join succeeds.
    pub fn retry_join<C: ClockPort + ?Sized>(&mut self, cfg: &DeviceConfig, clock: &mut C) -> bool {
        if self.state() != LinkState::Provisioning {
            return self.is_connected();
        }
        if !cfg.has_credentials() {
            debug!("Link: no credentials, skipping background join");
            return false;
        }

        info!("Link: background join to '{}'", cfg.wifi_ssid);
        let joined = match self.network.begin_join(&cfg.wifi_ssid, &cfg.wifi_password) {
            Ok(()) => self.wait_for_join(clock),
            Err(e) => {
                warn!("Link: background join refused ({})", e);
                false
            }
        };

        self.ctx.inputs.joined = joined;
        if !joined {
            self.network.leave();
        }
        self.step();
        self.is_connected()
    }

    /// Serve one provisioning client, if any is waiting.
    pub fn serve_provisioning<F: FilePort, C: ClockPort + ?Sized>(
        &mut self,
        store: &mut ConfigStore<F>,
        clock: &mut C,
    ) -> ServeOutcome {
        if self.state() != LinkState::Provisioning {
            return ServeOutcome::Idle;
        }
        self.server.poll(store, clock)
    }

    // ── internals ─────────────────────────────────────────────

    fn join<C: ClockPort + ?Sized>(&mut self, cfg: &DeviceConfig, clock: &mut C) -> Option<NetworkError> {
        self.ctx.inputs.has_credentials = cfg.has_credentials();
        self.ctx.inputs.joined = false;
        if self.state() == LinkState::Disconnected {
            self.step();
        }

        let mut failure = None;
        if core::mem::take(&mut self.ctx.commands.begin_join) {
            info!("Link: joining '{}'", cfg.wifi_ssid);
            if let Err(e) = self.network.begin_join(&cfg.wifi_ssid, &cfg.wifi_password) {
                warn!("Link: join refused ({})", e);
                self.ctx.inputs.join_failed = true;
                failure = Some(e);
            }
        }

        let started = clock.now_ms();
        loop {
            self.ctx.inputs.joined = self.network.is_joined();
            self.ctx.inputs.join_elapsed_ms = clock.now_ms().saturating_sub(started);
            self.step();
            if self.state() != LinkState::Connecting {
                break;
            }
            clock.delay_ms(self.join_poll_ms);
        }

        if self.is_connected() {
            info!("Link: joined after {} ms", self.ctx.inputs.join_elapsed_ms);
            return None;
        }

        self.network.leave();
        Some(failure.unwrap_or(if cfg.has_credentials() {
            NetworkError::JoinTimeout
        } else {
            NetworkError::NoCredentials
        }))
    }

    fn wait_for_join<C: ClockPort + ?Sized>(&mut self, clock: &mut C) -> bool {
        let started = clock.now_ms();
        loop {
            if self.network.is_joined() {
                return true;
            }
            if clock.now_ms().saturating_sub(started) >= self.ctx.join_timeout_ms {
                return false;
            }
            clock.delay_ms(self.join_poll_ms);
        }
    }

    fn step(&mut self) {
        let from = self.state();
        if let Some(to) = self.fsm.tick(&mut self.ctx) {
            if self.changes.push((from, to)).is_err() {
                debug!("Link: change log full, dropping {:?} -> {:?}", from, to);
            }
            self.apply_commands();
        }
    }

    /// Push command edges to the hardware.  Teardown runs listener first,
    /// bring-up runs access point first.
    fn apply_commands(&mut self) {
        let want = self.ctx.commands;
        let have = self.applied;

        if have.provisioning_server && !want.provisioning_server {
            self.server.stop();
        }
        if have.access_point && !want.access_point {
            self.network.stop_access_point();
            info!("Link: access point stopped");
        }

        if want.access_point && !have.access_point {
            match self.network.start_access_point(AP_SSID, AP_PASSWORD) {
                Ok(()) => info!("Link: access point '{}' up", AP_SSID),
                Err(e) => warn!("Link: access point failed ({})", e),
            }
        }
        if want.provisioning_server && !have.provisioning_server {
            if let Err(e) = self.server.start() {
                warn!("Link: provisioning listener failed: {:?}", e);
            }
        }

        if want.indicator_active != have.indicator_active {
            self.indicator.set_active(want.indicator_active);
        }

        self.applied = LinkCommands {
            begin_join: false,
            ..want
        };
    }
}
