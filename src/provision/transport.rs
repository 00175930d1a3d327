//! Byte-oriented stream transport for the provisioning listener.
//!
//! The listener side is explicit (`listen` / `shutdown`) because the
//! socket only exists while the node is in provisioning mode.  Concrete
//! implementation: [`TcpTransport`](crate::adapters::tcp_transport::TcpTransport).

/// A single-client, non-blocking stream server.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Bind the listening socket.
    fn listen(&mut self) -> Result<(), Self::Error>;

    /// Drop any client and close the listening socket.
    fn shutdown(&mut self);

    /// Poll for an incoming client.  Returns `true` if one was accepted.
    fn accept(&mut self) -> bool;

    /// Read up to `buf.len()` bytes.  Returns 0 if no data is available
    /// yet; an error once the peer has gone.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`.  Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Close the current client, keep listening.
    fn disconnect(&mut self);

    fn is_listening(&self) -> bool;
}
