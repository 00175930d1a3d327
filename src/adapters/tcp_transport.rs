//! Plain TCP transport for the provisioning listener.
//!
//! Implements [`Transport`] over `std::net`, which ESP-IDF backs with
//! lwIP, so the same code runs on the device and on the host.
//!
//! ## Connection model
//!
//! 1. `listen()` binds `0.0.0.0:<port>` in non-blocking mode.
//! 2. `accept()` polls for a client; only one client at a time.
//! 3. `read()` returns `Ok(0)` when no data is waiting and
//!    `Err(NotConnected)` once the peer has closed.
//! 4. `disconnect()` drops the client and keeps listening;
//!    `shutdown()` closes the listener too.

use core::fmt;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use log::{debug, info, warn};

use crate::provision::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpTransportError {
    /// Socket I/O failure.
    Io,
    /// No client (or no listener) for this operation.
    NotConnected,
}

impl fmt::Display for TcpTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "TCP/socket I/O error"),
            Self::NotConnected => write!(f, "no client connected"),
        }
    }
}

pub struct TcpTransport {
    port: u16,
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Unbound transport; the socket is created by [`Transport::listen`].
    /// Port `0` lets the OS pick (see [`local_addr`](Self::local_addr)).
    pub fn new(port: u16) -> Self {
        Self {
            port,
            listener: None,
            stream: None,
        }
    }

    /// The actual bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl Transport for TcpTransport {
    type Error = TcpTransportError;

    fn listen(&mut self) -> Result<(), TcpTransportError> {
        if self.listener.is_some() {
            return Ok(());
        }
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).map_err(|e| {
            debug!("Provision: bind {} failed: {}", addr, e);
            TcpTransportError::Io
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|_| TcpTransportError::Io)?;
        info!("Provision: listening on port {}", self.port);
        self.listener = Some(listener);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.disconnect();
        if self.listener.take().is_some() {
            info!("Provision: listener closed");
        }
    }

    fn accept(&mut self) -> bool {
        if self.stream.is_some() {
            return false;
        }
        let Some(listener) = self.listener.as_ref() else {
            return false;
        };
        match listener.accept() {
            Ok((stream, addr)) => {
                if stream.set_nonblocking(true).is_err() {
                    warn!("Provision: failed to set non-blocking on client socket");
                    return false;
                }
                info!("Provision: client from {}", addr);
                self.stream = Some(stream);
                true
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => false,
            Err(e) => {
                warn!("Provision: accept error: {}", e);
                false
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TcpTransportError> {
        let stream = self.stream.as_mut().ok_or(TcpTransportError::NotConnected)?;
        match stream.read(buf) {
            Ok(0) => {
                self.stream.take();
                Err(TcpTransportError::NotConnected)
            }
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(_) => {
                self.stream.take();
                Err(TcpTransportError::Io)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TcpTransportError> {
        let stream = self.stream.as_mut().ok_or(TcpTransportError::NotConnected)?;
        match stream.write(data) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(_) => {
                self.stream.take();
                Err(TcpTransportError::Io)
            }
        }
    }

    fn flush(&mut self) -> Result<(), TcpTransportError> {
        let stream = self.stream.as_mut().ok_or(TcpTransportError::NotConnected)?;
        stream.flush().map_err(|_| TcpTransportError::Io)
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }

    fn is_listening(&self) -> bool {
        self.listener.is_some()
    }
}
