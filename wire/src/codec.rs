//! Debugger message codec using tokio-util.
//!
//! This module provides [`CommandCodec`], which implements both the
//! `Encoder` and `Decoder` traits from tokio-util for debugger messages.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;
use crate::message::{Command, Frame};

/// Default maximum frame size (16 MB). Dumps of a full game state are big.
const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Codec for encoding and decoding debugger messages.
///
/// Framing is one JSON object per line:
/// ```text
/// {"command":"pause"}\n
/// ```
///
/// A line that is not a valid message decodes to [`Frame::Malformed`] so
/// the read loop can log it and keep going; only oversized frames are hard
/// errors.
#[derive(Debug, Clone)]
pub struct CommandCodec {
    /// Maximum allowed frame size in bytes.
    max_frame_size: usize,
}

impl CommandCodec {
    /// Create a new codec with default settings.
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Create a new codec with a custom maximum frame size.
    ///
    /// Frames larger than this are rejected with [`CodecError::FrameTooLarge`].
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CommandCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(newline) = src.iter().position(|&b| b == b'\n') else {
                // No complete frame yet. Refuse to buffer without bound.
                if src.len() > self.max_frame_size {
                    return Err(CodecError::FrameTooLarge {
                        size: src.len(),
                        max: self.max_frame_size,
                    });
                }
                return Ok(None);
            };

            if newline > self.max_frame_size {
                return Err(CodecError::FrameTooLarge {
                    size: newline,
                    max: self.max_frame_size,
                });
            }

            let line = src.split_to(newline + 1);
            let line = trim_line(&line);
            if line.is_empty() {
                continue;
            }

            return match serde_json::from_slice::<Command>(line) {
                Ok(command) => Ok(Some(Frame::Command(command))),
                Err(e) => Ok(Some(Frame::Malformed {
                    error: e.to_string(),
                })),
            };
        }
    }
}

impl Encoder<Command> for CommandCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item).map_err(CodecError::JsonSerialize)?;
        if json.len() > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: json.len(),
                max: self.max_frame_size,
            });
        }

        dst.reserve(json.len() + 1);
        dst.put_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Strip the trailing newline and an optional carriage return.
fn trim_line(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
