//! Function-pointer finite state machine engine for the network link.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌──────────────┬───────────┬──────────┬───────────────────┐ │
//! │  │ LinkState    │ on_enter  │ on_exit  │ on_update         │ │
//! │  ├──────────────┼───────────┼──────────┼───────────────────┤ │
//! │  │ Disconnected │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Connecting   │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Connected    │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Provisioning │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  └──────────────┴───────────┴──────────┴───────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next)`, the engine runs `on_exit` for the current
//! state, then `on_enter` for the next, and updates the current pointer.
//! Handlers only touch the [`LinkContext`]; the
//! [`ConnectivityManager`](crate::app::connectivity::ConnectivityManager)
//! turns the resulting commands into radio calls.

pub mod context;
pub mod states;

use context::LinkContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Connectivity state of the node.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LinkState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Provisioning = 3,
}

impl LinkState {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `LinkState`.  Out-of-range indices map to
    /// `Disconnected`, the state every boot starts from.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Provisioning,
            0 => Self::Disconnected,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Disconnected
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut LinkContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut LinkContext) -> Option<LinkState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single link state.
pub struct StateDescriptor {
    pub id: LinkState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `LinkState as usize`.
    table: [StateDescriptor; LinkState::COUNT],
    current: usize,
    /// Number of transitions taken since start.
    transitions: u32,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; LinkState::COUNT], initial: LinkState) -> Self {
        Self {
            table,
            current: initial as usize,
            transitions: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut LinkContext) {
        info!("Link: starting in state {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance by one step.  Returns the new state if a transition happened.
    pub fn tick(&mut self, ctx: &mut LinkContext) -> Option<LinkState> {
        let next = (self.table[self.current].on_update)(ctx)?;
        self.transition(next, ctx);
        Some(next)
    }

    /// Jump straight to `next`, running exit/enter actions.
    pub fn force_transition(&mut self, next: LinkState, ctx: &mut LinkContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> LinkState {
        LinkState::from_index(self.current)
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    fn transition(&mut self, next: LinkState, ctx: &mut LinkContext) {
        let next_idx = next as usize;

        info!(
            "Link: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.transitions = self.transitions.wrapping_add(1);

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
