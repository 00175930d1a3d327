//! Single-colour status LED.
//!
//! Implements [`IndicatorPort`]: lit while the node is off the managed
//! network.  Generic over any `embedded-hal` output pin, so the host tests
//! drive it with a fake pin and the firmware with an ESP-IDF `PinDriver`.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::IndicatorPort;

pub struct StatusLed<P: OutputPin> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Takes the pin and drives it low.
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin, lit: true };
        led.set(false);
        led
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn set(&mut self, on: bool) {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        match res {
            Ok(()) => self.lit = on,
            Err(e) => warn!("LED: pin write failed: {:?}", e),
        }
    }
}

impl<P: OutputPin> IndicatorPort for StatusLed<P> {
    fn set_active(&mut self, active: bool) {
        if active != self.lit {
            self.set(active);
        }
    }
}
