//! Backend REST client.
//!
//! Builds the three backend calls from the live configuration and hands
//! them to an [`HttpPort`].  Every call carries
//! `Authorization: Token <token>` and a JSON content type.
//!
//! | Call             | Request                               | Reply           |
//! |------------------|---------------------------------------|-----------------|
//! | register         | `POST {base}devices/`                 | `{"id": n}`     |
//! | post_measurement | `POST {base}measurements/`            | logged only     |
//! | fetch_settings   | `GET  {base}settings/?device={id}`    | `[Setting, …]`  |

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::ports::{HttpPort, HttpRequest, HttpResponse, Method};
use crate::config::{DeviceConfig, Setting, UNREGISTERED_ID};
use crate::error::{BackendError, Error, ParseError};

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    mac_address: &'a str,
    #[serde(rename = "type")]
    kind: i32,
}

#[derive(Deserialize)]
struct RegisterReply {
    #[serde(default)]
    id: Option<i32>,
}

#[derive(Serialize)]
struct MeasurementBody {
    device: i32,
    value: f32,
    #[serde(rename = "type")]
    channel: i32,
}

/// `base` + `path`, inserting the `/` separator when `base` lacks it.
pub fn endpoint(base: &str, path: &str) -> String {
    let mut url = String::with_capacity(base.len() + path.len() + 1);
    url.push_str(base);
    if !base.is_empty() && !base.ends_with('/') {
        url.push('/');
    }
    url.push_str(path);
    url
}

/// Borrowed view of the HTTP port plus the request-building rules.
pub struct BackendClient<'a, H: HttpPort> {
    http: &'a mut H,
}

impl<'a, H: HttpPort> BackendClient<'a, H> {
    pub fn new(http: &'a mut H) -> Self {
        Self { http }
    }

    /// `POST devices/`.  Returns the assigned id.
    ///
    /// Only a `400` counts as a refusal; any other status with a JSON body
    /// carrying a real `id` is accepted.
    pub fn register(&mut self, cfg: &DeviceConfig, mac_address: &str) -> Result<i32, Error> {
        let body = RegisterBody {
            name: &cfg.device_name,
            mac_address,
            kind: cfg.device_kind,
        };
        let resp = self.send(cfg, Method::Post, "devices/", Some(&body))?;
        if resp.status == 400 {
            debug!("Backend: register refused: {}", String::from_utf8_lossy(&resp.body));
            return Err(BackendError::Status(resp.status).into());
        }

        let reply: RegisterReply = serde_json::from_slice(&resp.body).map_err(ParseError::from)?;
        match reply.id {
            Some(id) if id != UNREGISTERED_ID => Ok(id),
            _ => Err(ParseError::MissingField("id").into()),
        }
    }

    /// `POST measurements/`.  The reply is logged, never interpreted.
    pub fn post_measurement(&mut self, cfg: &DeviceConfig, channel: i32, value: f32) -> Result<u16, Error> {
        let body = MeasurementBody {
            device: cfg.device_id,
            value,
            channel,
        };
        let resp = self.send(cfg, Method::Post, "measurements/", Some(&body))?;
        debug!(
            "Backend: measurement type={} -> {} {}",
            channel,
            resp.status,
            String::from_utf8_lossy(&resp.body)
        );
        if !resp.is_success() {
            warn!("Backend: measurement type={} answered {}", channel, resp.status);
        }
        Ok(resp.status)
    }

    /// `GET settings/?device={id}`.
    pub fn fetch_settings(&mut self, cfg: &DeviceConfig) -> Result<Vec<Setting>, Error> {
        let path = format!("settings/?device={}", cfg.device_id);
        let resp = self.send::<()>(cfg, Method::Get, &path, None)?;
        if !resp.is_success() {
            return Err(BackendError::Status(resp.status).into());
        }
        let settings = serde_json::from_slice(&resp.body).map_err(ParseError::from)?;
        Ok(settings)
    }

    fn send<B: Serialize>(
        &mut self,
        cfg: &DeviceConfig,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpResponse, Error> {
        let body = match body {
            Some(b) => serde_json::to_vec(b).map_err(ParseError::from)?,
            None => Vec::new(),
        };
        let req = HttpRequest {
            method,
            url: endpoint(&cfg.api_url, path),
            headers: vec![
                ("Content-Type", "application/json".into()),
                ("Authorization", format!("Token {}", cfg.token)),
            ],
            body,
        };
        debug!("Backend: {:?} {}", req.method, req.url);
        let resp = self.http.request(&req)?;
        debug!("Backend: {} <- {}", resp.status, req.url);
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    struct OneShot {
        reply: Result<HttpResponse, TransportError>,
        seen: Vec<HttpRequest>,
    }

    impl OneShot {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                reply: Ok(HttpResponse {
                    status,
                    body: body.as_bytes().to_vec(),
                }),
                seen: Vec::new(),
            }
        }
    }

    impl HttpPort for OneShot {
        fn request(&mut self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.push(req.clone());
            self.reply.clone()
        }
    }

    fn cfg() -> DeviceConfig {
        DeviceConfig {
            api_url: "http://api.local/".into(),
            token: "abc123".into(),
            device_name: "Sensor1".into(),
            device_kind: 3,
            device_id: 42,
            created: true,
            ..DeviceConfig::default()
        }
    }

    fn body_json(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(&req.body).unwrap()
    }

    #[test]
    fn endpoint_inserts_missing_slash() {
        assert_eq!(endpoint("http://a/", "devices/"), "http://a/devices/");
        assert_eq!(endpoint("http://a", "devices/"), "http://a/devices/");
        assert_eq!(endpoint("", "devices/"), "devices/");
    }

    #[test]
    fn register_posts_identity_with_token() {
        let mut http = OneShot::answering(201, r#"{"id": 7, "name": "Sensor1"}"#);
        let id = BackendClient::new(&mut http)
            .register(&cfg(), "AA:BB:CC:DD:EE:FF")
            .unwrap();
        assert_eq!(id, 7);

        let req = &http.seen[0];
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "http://api.local/devices/");
        assert!(req.headers.contains(&("Authorization", "Token abc123".into())));
        assert!(req.headers.contains(&("Content-Type", "application/json".into())));
        assert_eq!(
            body_json(req),
            serde_json::json!({"name": "Sensor1", "mac_address": "AA:BB:CC:DD:EE:FF", "type": 3})
        );
    }

    #[test]
    fn register_400_is_refusal() {
        let mut http = OneShot::answering(400, r#"{"id": 7}"#);
        let err = BackendClient::new(&mut http).register(&cfg(), "m").unwrap_err();
        assert_eq!(err, Error::Backend(BackendError::Status(400)));
    }

    #[test]
    fn register_without_usable_id_is_parse_failure() {
        for body in ["not json", "{}", r#"{"id": -1}"#, r#"{"id": "x"}"#] {
            let mut http = OneShot::answering(201, body);
            let err = BackendClient::new(&mut http).register(&cfg(), "m").unwrap_err();
            assert!(matches!(err, Error::Parse(_)), "body {body:?} gave {err:?}");
        }
    }

    #[test]
    fn transport_failure_surfaces() {
        let mut http = OneShot {
            reply: Err(TransportError::Connect),
            seen: Vec::new(),
        };
        let err = BackendClient::new(&mut http).register(&cfg(), "m").unwrap_err();
        assert_eq!(err, Error::Transport(TransportError::Connect));
    }

    #[test]
    fn measurement_payload() {
        let mut http = OneShot::answering(201, "{}");
        let status = BackendClient::new(&mut http)
            .post_measurement(&cfg(), 2, 40.5)
            .unwrap();
        assert_eq!(status, 201);
        let req = &http.seen[0];
        assert_eq!(req.url, "http://api.local/measurements/");
        assert_eq!(body_json(req), serde_json::json!({"device": 42, "value": 40.5, "type": 2}));
    }

    #[test]
    fn settings_fetch_parses_array() {
        let mut http =
            OneShot::answering(200, r#"[{"type":1,"type_name":"temp","unit":"C","value":21.5}]"#);
        let settings = BackendClient::new(&mut http).fetch_settings(&cfg()).unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].kind, 1);
        assert_eq!(settings[0].value, 21.5);

        let req = &http.seen[0];
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url, "http://api.local/settings/?device=42");
        assert!(req.body.is_empty());
    }

    #[test]
    fn settings_error_status_is_not_parsed() {
        let mut http = OneShot::answering(500, "[]");
        let err = BackendClient::new(&mut http).fetch_settings(&cfg()).unwrap_err();
        assert_eq!(err, Error::Backend(BackendError::Status(500)));
    }
}
