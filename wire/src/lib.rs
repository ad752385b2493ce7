//! Async wire protocol for the game runtime debugger.
//!
//! A debuggee and the debugger host exchange one JSON object per logical
//! message over a persistent duplex byte stream. Each message carries a
//! `"command"` tag; frames are newline-delimited.
//!
//! # Architecture
//!
//! The crate is designed around the tokio-util codec pattern:
//!
//! - [`CommandCodec`] implements both `Encoder` and `Decoder` for debugger
//!   messages
//! - [`CommandReader`] wraps an `AsyncRead` to produce a `Stream` of
//!   [`Frame`]s
//! - [`CommandWriter`] wraps an `AsyncWrite` to provide a `Sink` for
//!   outgoing commands
//!
//! A malformed frame decodes to [`Frame::Malformed`] rather than an error,
//! so one bad message never tears down the connection: receivers log it and
//! keep reading.
//!
//! # Scope
//!
//! This crate intentionally handles only transport concerns: framing,
//! encoding and decoding. Connection lifecycle, routing and command
//! dispatch belong in the `agent` and `server` crates.

mod codec;
mod error;
mod message;
mod reader;
mod transport;
mod writer;

pub mod testing;

pub use codec::CommandCodec;
pub use error::CodecError;
pub use message::{Command, Frame};
pub use reader::CommandReader;
pub use transport::{split, Transport};
pub use writer::CommandWriter;

use std::io;
use tokio::net::{TcpStream, ToSocketAddrs};

/// Well-known port the debugger host listens on.
pub const DEFAULT_DEBUGGER_PORT: u16 = 3030;

/// Connect to the debugger host and return a reader/writer pair.
///
/// This is the convenience entry point for a debuggee: the debuggee always
/// initiates the connection, the host accepts arbitrarily many.
pub async fn connect(
    addr: impl ToSocketAddrs,
) -> io::Result<(
    CommandReader<tokio::net::tcp::OwnedReadHalf>,
    CommandWriter<tokio::net::tcp::OwnedWriteHalf>,
)> {
    let stream = TcpStream::connect(addr).await?;
    Ok(split(stream))
}
