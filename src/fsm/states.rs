//! Concrete link-state handler functions and table builder.
//!
//! ```text
//!  DISCONNECTED ──[tick]──▶ CONNECTING ──[joined]──▶ CONNECTED
//!        ▲                      │                      │  ▲
//!        │       [timeout / no creds / refused]        │  │
//!        │                      ▼                      │  │
//!        │                 PROVISIONING ──[joined]─────┼──┘
//!        │                                             │
//!        └────────────────[link lost]──────────────────┘
//! ```
//!
//! Leaving PROVISIONING through an applied request is a process restart,
//! not a table transition.

use super::context::LinkContext;
use super::{LinkState, StateDescriptor};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; LinkState::COUNT] {
    [
        StateDescriptor {
            id: LinkState::Disconnected,
            name: "Disconnected",
            on_enter: Some(disconnected_enter),
            on_exit: None,
            on_update: disconnected_update,
        },
        StateDescriptor {
            id: LinkState::Connecting,
            name: "Connecting",
            on_enter: Some(connecting_enter),
            on_exit: None,
            on_update: connecting_update,
        },
        StateDescriptor {
            id: LinkState::Connected,
            name: "Connected",
            on_enter: Some(connected_enter),
            on_exit: None,
            on_update: connected_update,
        },
        StateDescriptor {
            id: LinkState::Provisioning,
            name: "Provisioning",
            on_enter: Some(provisioning_enter),
            on_exit: Some(provisioning_exit),
            on_update: provisioning_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISCONNECTED
// ═══════════════════════════════════════════════════════════════════════════

fn disconnected_enter(ctx: &mut LinkContext) {
    ctx.commands.indicator_active = true;
}

fn disconnected_update(_ctx: &mut LinkContext) -> Option<LinkState> {
    // Every supervisor tick spent here starts a join.
    Some(LinkState::Connecting)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING — one bounded join attempt
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut LinkContext) {
    ctx.commands.indicator_active = true;
    ctx.inputs.join_elapsed_ms = 0;
    ctx.inputs.join_failed = false;
    ctx.commands.begin_join = ctx.inputs.has_credentials;
    if !ctx.inputs.has_credentials {
        info!("CONNECTING: no stored credentials");
    }
}

fn connecting_update(ctx: &mut LinkContext) -> Option<LinkState> {
    if ctx.inputs.joined {
        return Some(LinkState::Connected);
    }
    if ctx.join_exhausted() {
        warn!(
            "CONNECTING: join gave up after {} ms",
            ctx.inputs.join_elapsed_ms
        );
        return Some(LinkState::Provisioning);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTED
// ═══════════════════════════════════════════════════════════════════════════

fn connected_enter(ctx: &mut LinkContext) {
    ctx.commands.indicator_active = false;
}

fn connected_update(ctx: &mut LinkContext) -> Option<LinkState> {
    if !ctx.inputs.joined {
        warn!("CONNECTED: link lost");
        return Some(LinkState::Disconnected);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PROVISIONING — access point up, line-protocol listener bound
// ═══════════════════════════════════════════════════════════════════════════

fn provisioning_enter(ctx: &mut LinkContext) {
    ctx.commands.access_point = true;
    ctx.commands.provisioning_server = true;
    ctx.commands.indicator_active = true;
}

fn provisioning_exit(ctx: &mut LinkContext) {
    ctx.commands.access_point = false;
    ctx.commands.provisioning_server = false;
}

fn provisioning_update(ctx: &mut LinkContext) -> Option<LinkState> {
    if ctx.inputs.joined {
        info!("PROVISIONING: network restored in the background");
        return Some(LinkState::Connected);
    }
    None
}
