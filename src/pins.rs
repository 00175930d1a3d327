//! GPIO assignments for the sensor node board.
//!
//! Single source of truth; change a pin here and it propagates to the
//! firmware wiring in `main.rs`.

/// Status LED, active HIGH.  Lit while off the managed network.
pub const LED_GPIO: i32 = 2;

/// DHT22 single-wire data line (open-drain, external pull-up).
pub const DHT_GPIO: i32 = 23;
