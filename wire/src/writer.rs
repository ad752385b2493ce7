//! Debugger message writer.
//!
//! This module provides [`CommandWriter`], a typed wrapper around a framed
//! async writer for sending debugger messages.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Sink;
use pin_project_lite::pin_project;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;

use crate::codec::CommandCodec;
use crate::error::CodecError;
use crate::message::Command;

pin_project! {
    /// An async sink for outgoing debugger messages.
    ///
    /// `CommandWriter` wraps an [`AsyncWrite`] destination and encodes
    /// messages to the wire format. The [`send`](CommandWriter::send)
    /// method handles the full feed/flush cycle.
    pub struct CommandWriter<W> {
        #[pin]
        inner: FramedWrite<W, CommandCodec>,
    }
}

impl<W> CommandWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a new writer from an async write destination.
    pub fn new(writer: W) -> Self {
        Self {
            inner: FramedWrite::new(writer, CommandCodec::new()),
        }
    }

    /// Create a new writer with a custom codec.
    pub fn with_codec(writer: W, codec: CommandCodec) -> Self {
        Self {
            inner: FramedWrite::new(writer, codec),
        }
    }

    /// Send a single message, flushing it to the transport.
    pub async fn send(&mut self, command: Command) -> Result<(), CodecError> {
        use futures::SinkExt;
        SinkExt::send(&mut self.inner, command).await
    }

    /// Consume the writer and return the underlying destination.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W> Sink<Command> for CommandWriter<W>
where
    W: AsyncWrite + Unpin,
{
    type Error = CodecError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Command) -> Result<(), Self::Error> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}
