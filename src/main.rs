//! Sensor node firmware — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter   HttpAdapter   NvsFiles     TcpTransport         │
//! │  (Network)     (Http)        (Files)      (provisioning)       │
//! │  StatusLed     Dht22         SystemClock  LogEventSink         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Node: ConfigStore · ConnectivityManager · Scheduler   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, InputOutput, Output, PinDriver};
use esp_idf_hal::prelude::Peripherals;
use esp_idf_svc::wifi::EspWifi;

use sensornode::adapters::http::HttpAdapter;
use sensornode::adapters::log_sink::LogEventSink;
use sensornode::adapters::nvs::NvsFiles;
use sensornode::adapters::system::SystemAdapter;
use sensornode::adapters::tcp_transport::TcpTransport;
use sensornode::adapters::time::SystemClock;
use sensornode::adapters::wifi::WifiAdapter;
use sensornode::app::node::{Board, Flow, Node, Parts};
use sensornode::config::{PROVISIONING_PORT, Timing};
use sensornode::drivers::status_led::StatusLed;
use sensornode::pins;
use sensornode::sensors::dht22::Dht22;

/// Main-loop yield between node polls.
const LOOP_YIELD_MS: u32 = 10;

struct Esp32Board;

impl Board for Esp32Board {
    type Network = WifiAdapter;
    type Indicator = StatusLed<PinDriver<'static, AnyOutputPin, Output>>;
    type Http = HttpAdapter;
    type Files = NvsFiles;
    type Transport = TcpTransport;
    type Sensor = Dht22<PinDriver<'static, AnyIOPin, InputOutput>, Ets>;
    type Clock = SystemClock;
    type System = SystemAdapter;
    type Sink = LogEventSink;
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SensorNode v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Storage ────────────────────────────────────────────
    // Without NVS there is nowhere to keep credentials; fail the boot.
    let files = NvsFiles::new().map_err(sensornode::error::Error::from)?;

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let wifi = EspWifi::new(peripherals.modem, sysloop, None)?;

    // SAFETY: pins.rs is the only place these GPIO numbers are assigned
    // and nothing else in the firmware claims them.
    let led_pin = unsafe { AnyOutputPin::new(pins::LED_GPIO) };
    let dht_pin = unsafe { AnyIOPin::new(pins::DHT_GPIO) };

    let indicator = StatusLed::new(PinDriver::output(led_pin)?);
    let sensor = Dht22::new(PinDriver::input_output_od(dht_pin)?, Ets);

    // ── 4. Node ───────────────────────────────────────────────
    let parts = Parts::<Esp32Board> {
        network: WifiAdapter::new(wifi),
        indicator,
        http: HttpAdapter::new(),
        files,
        transport: TcpTransport::new(PROVISIONING_PORT),
        sensor,
        clock: SystemClock::new(),
        system: SystemAdapter::new(),
        sink: LogEventSink::new(),
    };
    let mut node = Node::new(parts, Timing::default());
    node.boot();

    // ── 5. Cooperative main loop ──────────────────────────────
    loop {
        if node.poll() == Flow::Restart {
            break;
        }
        FreeRtos::delay_ms(LOOP_YIELD_MS);
    }

    // Only reached if the chip reset returned.
    warn!("Restart did not take effect, halting");
    Ok(())
}
