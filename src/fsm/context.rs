//! Shared mutable context threaded through every link-state handler.
//!
//! `LinkContext` is the blackboard between the connectivity manager and
//! the state table: the manager writes the latest radio observations into
//! [`LinkInputs`], handlers read them and write the desired radio, access
//! point and indicator configuration into [`LinkCommands`], and the manager
//! applies those commands to the hardware after every tick.

// ---------------------------------------------------------------------------
// Observations (written by the connectivity manager)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkInputs {
    /// Station associated and holding an address.
    pub joined: bool,
    /// A non-empty SSID is stored.
    pub has_credentials: bool,
    /// The radio refused to start the join outright.
    pub join_failed: bool,
    /// Time spent in the current join attempt.
    pub join_elapsed_ms: u64,
}

// ---------------------------------------------------------------------------
// Commands (written by state handlers; applied by the connectivity manager)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkCommands {
    /// One-shot request to start a station join.  Cleared once applied.
    pub begin_join: bool,
    /// Soft access point should be broadcasting.
    pub access_point: bool,
    /// Provisioning listener should be bound.
    pub provisioning_server: bool,
    /// Indicator output level.
    pub indicator_active: bool,
}

// ---------------------------------------------------------------------------
// LinkContext
// ---------------------------------------------------------------------------

pub struct LinkContext {
    pub inputs: LinkInputs,
    pub commands: LinkCommands,
    /// Ceiling on one join attempt.
    pub join_timeout_ms: u64,
}

impl LinkContext {
    pub fn new(join_timeout_ms: u64) -> Self {
        Self {
            inputs: LinkInputs::default(),
            commands: LinkCommands::default(),
            join_timeout_ms,
        }
    }

    /// The join attempt is over without success.
    pub fn join_exhausted(&self) -> bool {
        !self.inputs.has_credentials
            || self.inputs.join_failed
            || self.inputs.join_elapsed_ms >= self.join_timeout_ms
    }
}
