//! Debugger message reader.
//!
//! This module provides [`CommandReader`], a typed wrapper around a framed
//! async reader that produces a stream of decoded [`Frame`]s.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::CommandCodec;
use crate::error::CodecError;
use crate::message::Frame;

pin_project! {
    /// An async stream of incoming debugger frames.
    ///
    /// `CommandReader` wraps an [`AsyncRead`] source and decodes frames
    /// from the byte stream. It implements [`Stream`], allowing it to be
    /// used with async iteration patterns.
    pub struct CommandReader<R> {
        #[pin]
        inner: FramedRead<R, CommandCodec>,
    }
}

impl<R> CommandReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Create a new reader from an async read source.
    pub fn new(reader: R) -> Self {
        Self {
            inner: FramedRead::new(reader, CommandCodec::new()),
        }
    }

    /// Create a new reader with a custom codec.
    ///
    /// This allows configuring options like maximum frame size.
    pub fn with_codec(reader: R, codec: CommandCodec) -> Self {
        Self {
            inner: FramedRead::new(reader, codec),
        }
    }

    /// Consume the reader and return the underlying source.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R> Stream for CommandReader<R>
where
    R: AsyncRead + Unpin,
{
    type Item = Result<Frame, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}
