//! Application core — the node's domain logic, no direct I/O.
//!
//! Configuration ownership, connectivity supervision, registration and
//! the periodic backend exchange live here.  All interaction with the
//! radio, flash, sensor and HTTP stack happens through the **port traits**
//! in [`ports`], so every workflow runs on the host against mocks.

pub mod backend;
pub mod connectivity;
pub mod events;
pub mod node;
pub mod ports;
pub mod registration;
pub mod store;
pub mod sync;
