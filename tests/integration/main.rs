//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the node against the
//! shared mock board.  All tests run on the host (x86_64) with no real
//! hardware required.

mod mock_board;
mod node_tests;
mod provisioning_flow_tests;
