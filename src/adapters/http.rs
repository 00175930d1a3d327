//! HTTP(S) client adapter.
//!
//! Implements [`HttpPort`] with the ESP-IDF HTTP client.  Each request
//! opens its own connection and drops it before returning, so nothing is
//! held between backend calls.
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection`, 15 s timeout, body
//!   capped at 4 KiB.  HTTPS servers are not authenticated: no CA store is
//!   attached and `sdkconfig.defaults` enables
//!   `CONFIG_ESP_TLS_SKIP_SERVER_CERT_VERIFY`.
//! - **all other targets**: no network; every request fails with
//!   [`TransportError::Connect`].
//!
//! Failures are returned, not warned about; the caller logs them once.

use log::debug;

use crate::app::ports::{HttpPort, HttpRequest, HttpResponse};
use crate::error::TransportError;

/// Response bytes kept; the rest is drained and dropped.
pub const MAX_RESPONSE_BODY: usize = 4096;

/// Per-request timeout.
pub const REQUEST_TIMEOUT_MS: u64 = 15_000;

#[derive(Default)]
pub struct HttpAdapter;

impl HttpAdapter {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "espidf")]
    fn platform_request(&mut self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        use core::time::Duration;
        use embedded_svc::http::client::Client;
        use embedded_svc::http::{Method, Status};
        use embedded_svc::io::{Read, Write};
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let conf = Configuration {
            timeout: Some(Duration::from_millis(REQUEST_TIMEOUT_MS)),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|e| {
            debug!("Backend: connection setup failed: {:?}", e);
            TransportError::Connect
        })?;
        let mut client = Client::wrap(conn);

        let method = match req.method {
            crate::app::ports::Method::Get => Method::Get,
            crate::app::ports::Method::Post => Method::Post,
        };
        let content_length = req.body.len().to_string();
        let mut headers: Vec<(&str, &str)> =
            req.headers.iter().map(|(k, v)| (*k, v.as_str())).collect();
        if !req.body.is_empty() {
            headers.push(("Content-Length", content_length.as_str()));
        }

        let mut request = client.request(method, &req.url, &headers).map_err(|e| {
            debug!("Backend: request to {} failed: {:?}", req.url, e);
            TransportError::Connect
        })?;
        if !req.body.is_empty() {
            request.write_all(&req.body).map_err(|_| TransportError::Io)?;
            request.flush().map_err(|_| TransportError::Io)?;
        }
        let mut response = request.submit().map_err(|e| {
            debug!("Backend: submit to {} failed: {:?}", req.url, e);
            TransportError::Io
        })?;

        let status = response.status();
        let mut body = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let n = response.read(&mut chunk).map_err(|_| TransportError::Io)?;
            if n == 0 {
                break;
            }
            let room = MAX_RESPONSE_BODY.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..n.min(room)]);
        }
        Ok(HttpResponse { status, body })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_request(&mut self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!("Backend(sim): no network for {:?} {}", req.method, req.url);
        Err(TransportError::Connect)
    }
}

impl HttpPort for HttpAdapter {
    fn request(&mut self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if !(req.url.starts_with("http://") || req.url.starts_with("https://")) {
            debug!("Backend: refusing URL without scheme: '{}'", req.url);
            return Err(TransportError::InvalidRequest);
        }
        self.platform_request(req)
    }
}
