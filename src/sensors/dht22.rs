//! DHT22 (AM2302) temperature / humidity sensor.
//!
//! Single-wire protocol on one open-drain GPIO:
//!
//! ```text
//!  host:   ▔▔▔╲____≥1ms____╱▔▔ 40µs ▔▔
//!  sensor:                            ╲__80µs__╱▔▔80µs▔▔╲ 40 bits …
//!  bit:    ╲__50µs__╱▔▔ 26-28µs = 0 | 70µs = 1 ▔▔╲
//! ```
//!
//! Frame: humidity ×10 (u16), temperature ×10 (sign bit 15), checksum.
//! Generic over `embedded-hal` 1.0 pins and delays so the decoder runs on
//! the host; the firmware passes an open-drain `PinDriver` and `Ets`.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{Reading, SensorPort};
use crate::error::SensorError;

/// Longest wait for any single edge.
const EDGE_TIMEOUT_US: u32 = 100;
/// Sample point after a bit's rising edge.
const BIT_SAMPLE_US: u32 = 35;

/// Decode a 5-byte frame.
pub fn decode(frame: &[u8; 5]) -> Result<Reading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let humidity = u16::from_be_bytes([frame[0], frame[1]]);
    let raw_temp = u16::from_be_bytes([frame[2], frame[3]]);
    let magnitude = f32::from(raw_temp & 0x7FFF) / 10.0;
    let temperature = if raw_temp & 0x8000 != 0 { -magnitude } else { magnitude };

    Ok(Reading {
        temperature_c: temperature,
        humidity_pct: f32::from(humidity) / 10.0,
    })
}

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// The line idles high.
    pub fn new(mut pin: P, delay: D) -> Self {
        let _ = pin.set_high();
        Self { pin, delay }
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        // Start signal.
        self.pin.set_low().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(1_100);
        self.pin.set_high().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(40);

        // Response: 80 µs low, 80 µs high.
        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut frame = [0u8; 5];
        for byte in &mut frame {
            for _ in 0..8 {
                self.wait_for(true)?;
                self.delay.delay_us(BIT_SAMPLE_US);
                let bit = self.pin.is_high().map_err(|_| SensorError::Gpio)?;
                *byte = (*byte << 1) | u8::from(bit);
                if bit {
                    self.wait_for(false)?;
                }
            }
        }
        Ok(frame)
    }

    fn wait_for(&mut self, high: bool) -> Result<(), SensorError> {
        for _ in 0..EDGE_TIMEOUT_US {
            if self.pin.is_high().map_err(|_| SensorError::Gpio)? == high {
                return Ok(());
            }
            self.delay.delay_us(1);
        }
        Err(SensorError::Timeout)
    }
}

impl<P, D> SensorPort for Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<Reading, SensorError> {
        let frame = self.read_frame();
        // Release the line whatever happened.
        let _ = self.pin.set_high();
        decode(&frame?)
    }
}
