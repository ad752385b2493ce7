//! The transport seam.
//!
//! Anything that can be split into an async read half and an async write
//! half can carry the debugger protocol. Production uses TCP; tests use an
//! in-memory duplex pair.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::reader::CommandReader;
use crate::writer::CommandWriter;

/// A duplex byte stream that can carry debugger messages.
pub trait Transport {
    type Read: AsyncRead + Unpin;
    type Write: AsyncWrite + Unpin;

    /// Split the transport into its read and write halves.
    fn into_split(self) -> (Self::Read, Self::Write);
}

impl Transport for TcpStream {
    type Read = tokio::net::tcp::OwnedReadHalf;
    type Write = tokio::net::tcp::OwnedWriteHalf;

    fn into_split(self) -> (Self::Read, Self::Write) {
        TcpStream::into_split(self)
    }
}

/// Split a transport into a framed reader/writer pair.
pub fn split<T: Transport>(transport: T) -> (CommandReader<T::Read>, CommandWriter<T::Write>) {
    let (read, write) = transport.into_split();
    (CommandReader::new(read), CommandWriter::new(write))
}
