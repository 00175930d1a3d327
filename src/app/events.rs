//! Outbound node events.
//!
//! The [`Node`](super::node::Node) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The production sink logs
//! them; tests record them to assert on the workflow.

use crate::fsm::LinkState;

/// Structured events emitted by the node core.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// Configuration loaded (or defaults kept) and schedules armed.
    Booted { registered: bool },

    /// The connectivity state machine moved.
    LinkChanged { from: LinkState, to: LinkState },

    /// The backend assigned an identity.
    Registered { device_id: i32 },

    /// A registration attempt failed; retried on the next supervisor tick.
    RegistrationFailed,

    /// Both measurement POSTs were issued (their outcome is not tracked).
    MeasurementsSent { temperature_c: f32, humidity_pct: f32 },

    /// The sensor gave no usable reading; the telemetry cycle was skipped.
    SensorReadFailed,

    /// Remote settings replaced the stored ones.
    SettingsUpdated { count: usize },

    /// Access point and provisioning listener are up.
    ProvisioningStarted,

    /// A provisioning client sent a bad request.
    ProvisioningRejected,

    /// A provisioning request was applied; a restart follows.
    ProvisioningApplied { action: i32 },

    /// Process restart requested.
    Restarting,
}
