//! Local provisioning over a raw TCP line protocol.
//!
//! ```text
//!   TCP client ──▶ Transport ──▶ LineDecoder ──▶ parse_request ──▶ ConfigStore
//! ```

pub mod codec;
pub mod server;
pub mod transport;
