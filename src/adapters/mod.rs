//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements    | Connects to                      |
//! |-----------------|---------------|----------------------------------|
//! | `device_id`     | -             | eFuse factory MAC                |
//! | `http`          | HttpPort      | ESP-IDF HTTP(S) client           |
//! | `log_sink`      | EventSink     | Serial log output                |
//! | `nvs`           | FilePort      | NVS blobs / in-memory store      |
//! | `system`        | SystemPort    | Chip reset                       |
//! | `tcp_transport` | Transport     | TCP listener (provisioning)      |
//! | `time`          | ClockPort     | ESP32 system timer               |
//! | `wifi`          | NetworkPort   | ESP-IDF WiFi STA + soft-AP       |

pub mod device_id;
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod system;
pub mod tcp_transport;
pub mod time;
pub mod wifi;
