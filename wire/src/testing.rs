//! In-memory transport for testing.

use tokio::io::{duplex, DuplexStream};

use crate::transport::Transport;

/// An in-memory transport for exercising the protocol without sockets.
///
/// `MemoryTransport` uses tokio's [`DuplexStream`] to provide a
/// bidirectional channel that can be split into read and write halves,
/// simulating one debuggee connection.
///
/// # Example
///
/// ```
/// use wire::testing::MemoryTransport;
///
/// let (debuggee_side, host_side) = MemoryTransport::pair();
/// let (debuggee_reader, debuggee_writer) = wire::split(debuggee_side);
/// let (host_reader, host_writer) = wire::split(host_side);
/// // host_writer -> debuggee_reader and debuggee_writer -> host_reader
/// ```
pub struct MemoryTransport {
    read: DuplexStream,
    write: DuplexStream,
}

impl MemoryTransport {
    /// Create a connected pair of in-memory transports.
    ///
    /// Uses a 64KB buffer for each direction.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_buffer_size(64 * 1024)
    }

    /// Create a connected pair with a custom buffer size.
    ///
    /// Smaller buffers are useful for exercising backpressure.
    pub fn pair_with_buffer_size(buffer_size: usize) -> (Self, Self) {
        let (a_to_b_write, a_to_b_read) = duplex(buffer_size);
        let (b_to_a_write, b_to_a_read) = duplex(buffer_size);

        let transport_a = MemoryTransport {
            read: b_to_a_read,
            write: a_to_b_write,
        };

        let transport_b = MemoryTransport {
            read: a_to_b_read,
            write: b_to_a_write,
        };

        (transport_a, transport_b)
    }
}

impl Transport for MemoryTransport {
    type Read = DuplexStream;
    type Write = DuplexStream;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.read, self.write)
    }
}
