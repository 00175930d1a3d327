//! The node orchestrator — the top-level cooperative loop body.
//!
//! [`Node`] owns the config store, connectivity manager, scheduler and
//! every port.  The firmware calls [`poll`](Node::poll) from its main
//! loop; everything else is driven from the scheduler's supervisor tick.
//!
//! ```text
//!  poll ─▶ Supervisor due? ─▶ link.supervise
//!                               ├─ Connected, no id ──▶ register_device
//!                               ├─ Connected, id ─────▶ Telemetry / SettingsSync due?
//!                               └─ Provisioning ──────▶ run_provisioning (blocks)
//! ```

use log::{error, info, warn};

use super::connectivity::ConnectivityManager;
use super::events::NodeEvent;
use super::ports::{
    ClockPort, EventSink, FilePort, HttpPort, IndicatorPort, NetworkPort, SensorPort, SystemPort,
};
use super::registration::{Registration, register_device};
use super::store::ConfigStore;
use super::sync::{send_measurements, sync_settings};
use crate::config::Timing;
use crate::error::Error;
use crate::fsm::LinkState;
use crate::provision::server::ServeOutcome;
use crate::provision::transport::Transport;
use crate::scheduler::{Job, Scheduler};

/// Bundle of concrete port types for one hardware target.
pub trait Board {
    type Network: NetworkPort;
    type Indicator: IndicatorPort;
    type Http: HttpPort;
    type Files: FilePort;
    type Transport: Transport;
    type Sensor: SensorPort;
    type Clock: ClockPort;
    type System: SystemPort;
    type Sink: EventSink;
}

/// Port instances handed to [`Node::new`].
pub struct Parts<B: Board> {
    pub network: B::Network,
    pub indicator: B::Indicator,
    pub http: B::Http,
    pub files: B::Files,
    pub transport: B::Transport,
    pub sensor: B::Sensor,
    pub clock: B::Clock,
    pub system: B::System,
    pub sink: B::Sink,
}

/// What the main loop should do after a [`Node::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A restart was requested.  On hardware it never returns here.
    Restart,
}

pub struct Node<B: Board> {
    store: ConfigStore<B::Files>,
    link: ConnectivityManager<B::Network, B::Indicator, B::Transport>,
    scheduler: Scheduler,
    timing: Timing,
    http: B::Http,
    sensor: B::Sensor,
    clock: B::Clock,
    system: B::System,
    sink: B::Sink,
    last_error: Option<Error>,
}

impl<B: Board> Node<B> {
    pub fn new(parts: Parts<B>, timing: Timing) -> Self {
        Self {
            store: ConfigStore::new(parts.files),
            link: ConnectivityManager::new(parts.network, parts.indicator, parts.transport, &timing),
            scheduler: Scheduler::new(),
            timing,
            http: parts.http,
            sensor: parts.sensor,
            clock: parts.clock,
            system: parts.system,
            sink: parts.sink,
            last_error: None,
        }
    }

    /// Load the configuration, arm the schedules and enter `Disconnected`.
    pub fn boot(&mut self) {
        if let Err(e) = self.store.load() {
            warn!("Store: load failed ({}), using defaults", e);
            self.last_error = Some(e.into());
        }

        let t = self.timing;
        for (job, period) in [
            (Job::Supervisor, t.supervisor_ms),
            (Job::Telemetry, t.telemetry_ms),
            (Job::SettingsSync, t.settings_ms),
            (Job::Reconnect, t.reconnect_ms),
        ] {
            if !self.scheduler.add(job, period) {
                error!("Node: schedule entry {} not created", job.label());
            }
        }
        let now = self.clock.now_ms();
        self.scheduler.start(Job::Supervisor, now);
        self.scheduler.start(Job::Telemetry, now);
        self.scheduler.start(Job::SettingsSync, now);

        self.link.start();
        self.sink.emit(&NodeEvent::Booted {
            registered: self.store.config().is_registered(),
        });
        info!("Node: booted, {} schedules active", self.scheduler.active_count());
    }

    /// One pass of the main loop.
    pub fn poll(&mut self) -> Flow {
        let now = self.clock.now_ms();
        if self.scheduler.poll(Job::Supervisor, now) {
            return self.supervise();
        }
        Flow::Continue
    }

    // ── accessors ─────────────────────────────────────────────

    pub fn store(&self) -> &ConfigStore<B::Files> {
        &self.store
    }

    pub fn link(&self) -> &ConnectivityManager<B::Network, B::Indicator, B::Transport> {
        &self.link
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn http(&self) -> &B::Http {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut B::Http {
        &mut self.http
    }

    pub fn sensor_mut(&mut self) -> &mut B::Sensor {
        &mut self.sensor
    }

    pub fn clock(&self) -> &B::Clock {
        &self.clock
    }

    pub fn system(&self) -> &B::System {
        &self.system
    }

    pub fn sink(&self) -> &B::Sink {
        &self.sink
    }

    /// Most recent non-fatal failure, already logged.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    // ── supervisor ────────────────────────────────────────────

    fn supervise(&mut self) -> Flow {
        if let Some(e) = self.link.supervise(self.store.config(), &mut self.clock) {
            self.last_error = Some(e.into());
        }
        self.emit_link_changes();

        match self.link.state() {
            LinkState::Connected => {
                self.ensure_registered();
                if self.store.config().is_registered() {
                    self.run_due_jobs();
                }
                Flow::Continue
            }
            LinkState::Provisioning => self.run_provisioning(),
            LinkState::Disconnected | LinkState::Connecting => Flow::Continue,
        }
    }

    fn ensure_registered(&mut self) {
        let mac = self.link.network().mac_address();
        match register_device(&mut self.store, &mut self.http, &mac) {
            Ok(Registration::Registered(device_id)) => {
                self.sink.emit(&NodeEvent::Registered { device_id });
            }
            Ok(Registration::AlreadyRegistered) => {}
            Err(e) => {
                self.last_error = Some(e);
                self.sink.emit(&NodeEvent::RegistrationFailed);
            }
        }
    }

    fn run_due_jobs(&mut self) {
        let now = self.clock.now_ms();

        if self.scheduler.poll(Job::Telemetry, now) {
            match send_measurements(&mut self.sensor, &mut self.http, &self.store) {
                Ok(r) => self.sink.emit(&NodeEvent::MeasurementsSent {
                    temperature_c: r.temperature_c,
                    humidity_pct: r.humidity_pct,
                }),
                Err(e) => {
                    self.last_error = Some(e.into());
                    self.sink.emit(&NodeEvent::SensorReadFailed);
                }
            }
        }

        if self.scheduler.poll(Job::SettingsSync, now) {
            match sync_settings(&mut self.http, &mut self.store) {
                Ok(count) => self.sink.emit(&NodeEvent::SettingsUpdated { count }),
                Err(e) => self.last_error = Some(e),
            }
        }
    }

    /// Block in provisioning mode until a client reconfigures the node
    /// (restart) or the background reconnect restores the link.
    fn run_provisioning(&mut self) -> Flow {
        info!("Node: provisioning on AP, waiting for a client");
        self.sink.emit(&NodeEvent::ProvisioningStarted);
        let now = self.clock.now_ms();
        self.scheduler.start(Job::Reconnect, now);

        loop {
            match self.link.serve_provisioning(&mut self.store, &mut self.clock) {
                ServeOutcome::Idle => {}
                ServeOutcome::Rejected(e) => {
                    self.last_error = Some(e.into());
                    self.sink.emit(&NodeEvent::ProvisioningRejected);
                }
                ServeOutcome::Applied { request, saved } => {
                    if let Err(e) = saved {
                        self.last_error = Some(e.into());
                    }
                    self.sink.emit(&NodeEvent::ProvisioningApplied {
                        action: request.action.code(),
                    });
                    self.scheduler.pause(Job::Reconnect);
                    self.sink.emit(&NodeEvent::Restarting);
                    info!("Node: configuration applied, restarting");
                    self.system.restart();
                    return Flow::Restart;
                }
            }

            let now = self.clock.now_ms();
            if self.scheduler.poll(Job::Reconnect, now) {
                let joined = self.link.retry_join(self.store.config(), &mut self.clock);
                self.emit_link_changes();
                if joined {
                    self.scheduler.pause(Job::Reconnect);
                    info!("Node: link restored, leaving provisioning");
                    return Flow::Continue;
                }
            }

            self.clock.delay_ms(self.timing.provisioning_poll_ms);
        }
    }

    fn emit_link_changes(&mut self) {
        for (from, to) in self.link.take_changes() {
            self.sink.emit(&NodeEvent::LinkChanged { from, to });
        }
    }
}
