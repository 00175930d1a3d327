//! Mock board for integration tests.
//!
//! Every port shares one [`World`] so a test can script the radio,
//! backend and provisioning clients, then inspect what the node did
//! after the [`Node`] has taken ownership of the adapters.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use sensornode::app::events::NodeEvent;
use sensornode::app::node::{Board, Flow, Node, Parts};
use sensornode::app::ports::{
    ClockPort, EventSink, FilePort, HttpPort, HttpRequest, HttpResponse, IndicatorPort, Method,
    NetworkPort, Reading, SensorPort, SystemPort,
};
use sensornode::config::{CONFIG_FILE, DeviceConfig, Timing};
use sensornode::error::{NetworkError, SensorError, StorageError, TransportError};
use sensornode::provision::transport::Transport;

pub const MAC: [u8; 6] = [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE];

// ── Recorded backend call ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub method: Method,
    pub url: String,
    pub auth: String,
    pub body: serde_json::Value,
}

// ── World ─────────────────────────────────────────────────────

pub struct World {
    pub now_ms: u64,
    /// The managed network answers joins from this time on.
    pub reachable_from_ms: Option<u64>,
    pub joined: bool,
    pub join_attempts: Vec<String>,
    pub ap_active: bool,
    pub led: bool,
    pub requests: Vec<Sent>,
    pub register_reply: (u16, String),
    pub settings_reply: (u16, String),
    pub files: HashMap<String, Vec<u8>>,
    pub writes: Vec<DeviceConfig>,
    pub listening: bool,
    /// Request bytes of clients waiting to connect, in order.
    pub clients: VecDeque<Vec<u8>>,
    pub client: Option<Vec<u8>>,
    pub replies: Vec<u8>,
    pub reading: Result<Reading, SensorError>,
    pub restarts: u32,
    pub events: Vec<NodeEvent>,
}

impl World {
    pub fn reachable(&self) -> bool {
        self.reachable_from_ms.is_some_and(|t| self.now_ms >= t)
    }

    pub fn requests_to(&self, path: &str) -> Vec<&Sent> {
        self.requests.iter().filter(|r| r.url.contains(path)).collect()
    }

    pub fn stored_config(&self) -> Option<DeviceConfig> {
        self.files
            .get(CONFIG_FILE)
            .map(|b| serde_json::from_slice(b).unwrap())
    }
}

impl Default for World {
    fn default() -> Self {
        Self {
            now_ms: 0,
            reachable_from_ms: Some(0),
            joined: false,
            join_attempts: Vec::new(),
            ap_active: false,
            led: false,
            requests: Vec::new(),
            register_reply: (201, r#"{"id": 7}"#.into()),
            settings_reply: (200, "[]".into()),
            files: HashMap::new(),
            writes: Vec::new(),
            listening: false,
            clients: VecDeque::new(),
            client: None,
            replies: Vec::new(),
            reading: Ok(Reading {
                temperature_c: 21.5,
                humidity_pct: 40.0,
            }),
            restarts: 0,
            events: Vec::new(),
        }
    }
}

pub type Shared = Rc<RefCell<World>>;

pub fn world() -> Shared {
    Rc::new(RefCell::new(World::default()))
}

/// Write `cfg` as the persisted record, as a previous boot would have.
pub fn seed_config(world: &Shared, cfg: &DeviceConfig) {
    world
        .borrow_mut()
        .files
        .insert(CONFIG_FILE.into(), serde_json::to_vec(cfg).unwrap());
}

/// A provisioned, registered node pointing at the mock backend.
pub fn registered_config() -> DeviceConfig {
    DeviceConfig {
        wifi_ssid: "Home".into(),
        wifi_password: "secret99".into(),
        api_url: "http://api.test".into(),
        token: "abc123".into(),
        device_name: "Sensor1".into(),
        device_id: 42,
        created: true,
        ..DeviceConfig::default()
    }
}

pub fn fast_timing() -> Timing {
    Timing {
        supervisor_ms: 10,
        telemetry_ms: 100,
        settings_ms: 200,
        join_timeout_ms: 50,
        join_poll_ms: 10,
        reconnect_ms: 100,
        provisioning_poll_ms: 5,
        client_read_timeout_ms: 50,
    }
}

// ── Adapters ──────────────────────────────────────────────────

pub struct MockNetwork(Shared);

impl NetworkPort for MockNetwork {
    fn begin_join(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        let mut w = self.0.borrow_mut();
        w.join_attempts.push(ssid.into());
        if ssid.is_empty() {
            return Err(NetworkError::NoCredentials);
        }
        if password.len() > 64 {
            return Err(NetworkError::InvalidCredentials);
        }
        w.joined = w.reachable();
        Ok(())
    }

    fn is_joined(&mut self) -> bool {
        let mut w = self.0.borrow_mut();
        if !w.reachable() {
            w.joined = false;
        }
        w.joined
    }

    fn leave(&mut self) {
        self.0.borrow_mut().joined = false;
    }

    fn start_access_point(&mut self, _ssid: &str, _password: &str) -> Result<(), NetworkError> {
        self.0.borrow_mut().ap_active = true;
        Ok(())
    }

    fn stop_access_point(&mut self) {
        self.0.borrow_mut().ap_active = false;
    }

    fn mac_address(&self) -> [u8; 6] {
        MAC
    }
}

pub struct MockLed(Shared);

impl IndicatorPort for MockLed {
    fn set_active(&mut self, active: bool) {
        self.0.borrow_mut().led = active;
    }
}

pub struct MockHttp(Shared);

impl HttpPort for MockHttp {
    fn request(&mut self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut w = self.0.borrow_mut();
        if !w.joined {
            return Err(TransportError::Connect);
        }
        let auth = req
            .headers
            .iter()
            .find(|(k, _)| *k == "Authorization")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        let body = if req.body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&req.body).unwrap()
        };
        w.requests.push(Sent {
            method: req.method,
            url: req.url.clone(),
            auth,
            body,
        });

        let (status, body) = if req.url.contains("devices/") {
            w.register_reply.clone()
        } else if req.url.contains("settings/") {
            w.settings_reply.clone()
        } else {
            (201, "{}".into())
        };
        Ok(HttpResponse {
            status,
            body: body.into_bytes(),
        })
    }
}

pub struct MockFiles(Shared);

impl FilePort for MockFiles {
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.0
            .borrow()
            .files
            .get(name)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut w = self.0.borrow_mut();
        w.writes.push(serde_json::from_slice(data).unwrap());
        w.files.insert(name.into(), data.to_vec());
        Ok(())
    }
}

pub struct MockTransport(Shared);

impl Transport for MockTransport {
    type Error = ();

    fn listen(&mut self) -> Result<(), ()> {
        self.0.borrow_mut().listening = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        let mut w = self.0.borrow_mut();
        w.client = None;
        w.listening = false;
    }

    fn accept(&mut self) -> bool {
        let mut w = self.0.borrow_mut();
        if !w.listening || w.client.is_some() {
            return false;
        }
        w.client = w.clients.pop_front();
        w.client.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let mut w = self.0.borrow_mut();
        let data = w.client.as_mut().ok_or(())?;
        if data.is_empty() {
            // Everything sent; the peer hangs up.
            return Err(());
        }
        let n = buf.len().min(data.len());
        buf[..n].copy_from_slice(&data[..n]);
        data.drain(..n);
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.0.borrow_mut().replies.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn disconnect(&mut self) {
        self.0.borrow_mut().client = None;
    }

    fn is_listening(&self) -> bool {
        self.0.borrow().listening
    }
}

pub struct MockSensor(Shared);

impl SensorPort for MockSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        self.0.borrow().reading
    }
}

pub struct MockClock(Shared);

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.0.borrow().now_ms
    }

    fn delay_ms(&mut self, ms: u64) {
        self.0.borrow_mut().now_ms += ms;
    }
}

pub struct MockSystem(Shared);

impl SystemPort for MockSystem {
    fn restart(&mut self) {
        self.0.borrow_mut().restarts += 1;
    }
}

pub struct EventLog(Shared);

impl EventSink for EventLog {
    fn emit(&mut self, event: &NodeEvent) {
        self.0.borrow_mut().events.push(event.clone());
    }
}

// ── Board ─────────────────────────────────────────────────────

pub struct MockBoard;

impl Board for MockBoard {
    type Network = MockNetwork;
    type Indicator = MockLed;
    type Http = MockHttp;
    type Files = MockFiles;
    type Transport = MockTransport;
    type Sensor = MockSensor;
    type Clock = MockClock;
    type System = MockSystem;
    type Sink = EventLog;
}

/// Booted node wired to `world`.
pub fn boot(world: &Shared) -> Node<MockBoard> {
    let parts = Parts::<MockBoard> {
        network: MockNetwork(world.clone()),
        indicator: MockLed(world.clone()),
        http: MockHttp(world.clone()),
        files: MockFiles(world.clone()),
        transport: MockTransport(world.clone()),
        sensor: MockSensor(world.clone()),
        clock: MockClock(world.clone()),
        system: MockSystem(world.clone()),
        sink: EventLog(world.clone()),
    };
    let mut node = Node::new(parts, fast_timing());
    node.boot();
    node
}

/// Drive the main loop for `ms` of simulated time, 1 ms per pass.
/// Stops early on a restart.
pub fn run(node: &mut Node<MockBoard>, world: &Shared, ms: u64) -> Flow {
    let until = world.borrow().now_ms + ms;
    while world.borrow().now_ms < until {
        if node.poll() == Flow::Restart {
            return Flow::Restart;
        }
        world.borrow_mut().now_ms += 1;
    }
    Flow::Continue
}
