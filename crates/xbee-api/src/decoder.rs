//! Streaming API frame decoder.
//!
//! The decoder is fed one raw byte at a time, typically straight from a UART
//! receive FIFO. It never blocks and never allocates; each call does a bounded
//! amount of branch-only work and reports whether a frame completed, failed,
//! or needs more bytes.
//!
//! ```text
//! WaitingStart -> ReadingLength (2 bytes) -> ReadingType -> ReadingPayload
//!                                                             |
//!                                                  Complete | Failed
//! ```
//!
//! `Complete` and `Failed` are terminal until the next [`FrameDecoder::feed`],
//! which clears the old frame before looking at the new byte. The decoded frame
//! therefore stays readable until the following byte arrives.

use crate::constants::*;
use crate::error::FrameError;
use crate::transport::ByteSource;
use crate::types::{ApiId, ApiMode};

/// Decides which part of a frame is extracted as the message, per frame type.
pub trait PayloadExtractor {
    /// Frame position where the message starts for frames of type `api_id`,
    /// or None if the frame type carries no message.
    fn message_offset(&self, api_id: ApiId) -> Option<usize>;
}

/// Extracts the RF data of ZigBee Receive Packet frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceivePacketExtractor;

impl PayloadExtractor for ReceivePacketExtractor {
    fn message_offset(&self, api_id: ApiId) -> Option<usize> {
        match api_id {
            ApiId::ReceivePacket => Some(RECEIVED_DATA_IDX),
            _ => None,
        }
    }
}

/// What the decoder does with a start delimiter that interrupts a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StartRecovery {
    /// The delimiter begins the next frame.
    #[default]
    Resync,
    /// The delimiter is dropped along with the aborted frame. The next frame
    /// needs a fresh delimiter.
    Discard,
}

/// Parsing phase of the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Discarding bytes until a start delimiter.
    WaitingStart,
    /// Reading the two length bytes.
    ReadingLength,
    /// Reading the frame type byte.
    ReadingType,
    /// Reading frame data and checksum.
    ReadingPayload,
    /// A valid frame was decoded.
    Complete,
    /// The last frame was rejected.
    Failed(FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    InProgress,
    Complete,
    Failed(FrameError),
}

/// A validated frame, borrowed from the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedFrame<'a> {
    /// Frame type.
    pub api_id: ApiId,
    /// Extracted message; empty for frame types without one.
    pub message: &'a [u8],
    /// Unescaped frame bytes from the start delimiter through the last payload
    /// byte.
    pub data: &'a [u8],
    /// Checksum byte as received.
    pub checksum: u8,
}

impl ReceivedFrame<'_> {
    /// Bytes following the frame type byte, checksum excluded.
    pub fn body(&self) -> &[u8] {
        self.data.get(FRAME_TYPE_IDX + 1..).unwrap_or(&[])
    }
}

/// Result of feeding the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderEvent<'a> {
    /// The frame is incomplete.
    NeedMore,
    /// A frame was received and its checksum validated.
    FrameReady(ReceivedFrame<'a>),
    /// The frame in progress was dropped.
    Error(FrameError),
}

impl DecoderEvent<'_> {
    /// Returns true if a frame ended, successfully or not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DecoderEvent::NeedMore)
    }
}

/// Incremental decoder for API frames.
///
/// Each decoder owns its state; independent streams need independent
/// decoders.
#[derive(Debug, Clone)]
pub struct FrameDecoder<E = ReceivePacketExtractor> {
    /// Unescaped frame bytes, starting at the start delimiter.
    buffer: [u8; MAX_FRAME_SIZE],
    /// Number of bytes stored in `buffer`.
    position: usize,
    /// Low byte of the length field.
    declared_length: usize,
    /// Frame type byte.
    api_id: u8,
    /// Sum of every byte from the frame type through the checksum.
    checksum_total: u16,
    /// Received checksum byte.
    checksum: u8,
    /// Previous byte was an escape marker.
    escape_pending: bool,
    status: Status,
    /// Where the message starts, once the frame type is known.
    message_offset: Option<usize>,
    message: [u8; MAX_MESSAGE_SIZE],
    message_len: usize,
    /// Seed the next frame with the start delimiter that aborted the last one.
    resync_pending: bool,
    mode: ApiMode,
    start_recovery: StartRecovery,
    extractor: E,
}

impl FrameDecoder<ReceivePacketExtractor> {
    /// Create a decoder for escaped API mode that extracts Receive Packet data.
    pub fn new() -> Self {
        Self::with_extractor(ReceivePacketExtractor)
    }
}

impl Default for FrameDecoder<ReceivePacketExtractor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PayloadExtractor> FrameDecoder<E> {
    /// Create a decoder with a custom message extraction rule.
    pub fn with_extractor(extractor: E) -> Self {
        FrameDecoder {
            buffer: [0; MAX_FRAME_SIZE],
            position: 0,
            declared_length: 0,
            api_id: 0,
            checksum_total: 0,
            checksum: 0,
            escape_pending: false,
            status: Status::InProgress,
            message_offset: None,
            message: [0; MAX_MESSAGE_SIZE],
            message_len: 0,
            resync_pending: false,
            mode: ApiMode::default(),
            start_recovery: StartRecovery::default(),
            extractor,
        }
    }

    /// Set the API mode. In unescaped mode the decoder relies on the length
    /// field alone and treats `0x7D`/`0x7E` inside a frame as data.
    pub fn with_mode(mut self, mode: ApiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set what happens to a start delimiter that interrupts a frame.
    pub fn with_start_recovery(mut self, recovery: StartRecovery) -> Self {
        self.start_recovery = recovery;
        self
    }

    /// Feed one raw byte from the wire.
    pub fn feed(&mut self, byte: u8) -> DecoderEvent<'_> {
        let status = self.advance(byte);
        self.event_for(status)
    }

    /// Pull bytes from `source` until a frame ends or the source runs dry.
    ///
    /// Returns [`DecoderEvent::NeedMore`] if the source was exhausted
    /// mid-frame. Bytes after the end of a frame are left in the source.
    pub fn poll<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> DecoderEvent<'_> {
        let mut status = Status::InProgress;
        while let Some(byte) = source.next_byte() {
            status = self.advance(byte);
            if status != Status::InProgress {
                break;
            }
        }
        self.event_for(status)
    }

    /// Drop any frame in progress and return to waiting for a start delimiter.
    pub fn reset(&mut self) {
        self.clear();
        self.resync_pending = false;
    }

    /// Current parsing phase.
    pub fn state(&self) -> DecoderState {
        match self.status {
            Status::Complete => DecoderState::Complete,
            Status::Failed(e) => DecoderState::Failed(e),
            Status::InProgress => match self.position {
                0 => DecoderState::WaitingStart,
                1 | 2 => DecoderState::ReadingLength,
                FRAME_TYPE_IDX => DecoderState::ReadingType,
                _ => DecoderState::ReadingPayload,
            },
        }
    }

    /// Number of unescaped bytes stored for the current frame.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Low byte of the length field, once it has been received.
    pub fn declared_length(&self) -> Option<usize> {
        (self.position > 2).then_some(self.declared_length)
    }

    /// Frame type, once it has been received.
    pub fn api_id(&self) -> Option<ApiId> {
        (self.position > FRAME_TYPE_IDX).then(|| ApiId::from(self.api_id))
    }

    /// Message bytes extracted so far.
    pub fn message(&self) -> &[u8] {
        &self.message[..self.message_len]
    }

    /// Unescaped bytes stored so far, starting at the start delimiter.
    pub fn frame_data(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// Returns true if the last byte was an escape marker.
    pub fn is_escape_pending(&self) -> bool {
        self.escape_pending
    }

    /// API mode the decoder expects.
    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    fn advance(&mut self, raw: u8) -> Status {
        if self.status != Status::InProgress {
            self.start_next_frame();
        }

        let escaped = self.mode.is_escaped();

        // An unescaped delimiter always means a frame boundary; an escaped
        // 0x7E (0x7D 0x5E) is payload.
        if escaped && self.position > 0 && raw == START_BYTE {
            return self.fail(FrameError::UnexpectedStart {
                position: self.position,
            });
        }

        let mut byte = raw;
        if escaped && self.position > 0 {
            if raw == ESCAPE_BYTE {
                self.escape_pending = true;
                return Status::InProgress;
            }
            if self.escape_pending {
                byte ^= ESCAPE_XOR;
                self.escape_pending = false;
            }
        }

        if self.position >= FRAME_TYPE_IDX {
            self.checksum_total = self.checksum_total.wrapping_add(u16::from(byte));
        }

        match self.position {
            0 => {
                if byte != START_BYTE {
                    return Status::InProgress;
                }
            }
            1 => {
                // High length byte; frames never exceed 255 bytes.
            }
            2 => {
                self.declared_length = usize::from(byte);
                if self.declared_length > MAX_DECLARED_LENGTH {
                    return self.fail(FrameError::FrameTooLarge {
                        declared: self.declared_length,
                        max: MAX_DECLARED_LENGTH,
                    });
                }
            }
            FRAME_TYPE_IDX => {
                self.api_id = byte;
                self.message_offset = self.extractor.message_offset(ApiId::from(byte));
            }
            position => {
                if position == self.declared_length + FRAME_TYPE_IDX {
                    return self.finish(byte);
                }
                if position >= MAX_FRAME_SIZE {
                    return self.fail(FrameError::FrameTooLarge {
                        declared: self.declared_length,
                        max: MAX_DECLARED_LENGTH,
                    });
                }
                if let Some(offset) = self.message_offset {
                    if position >= offset && self.message_len < MAX_MESSAGE_SIZE {
                        self.message[self.message_len] = byte;
                        self.message_len += 1;
                    }
                }
            }
        }

        self.buffer[self.position] = byte;
        self.position += 1;
        Status::InProgress
    }

    /// Validate the checksum byte, which is already in `checksum_total`.
    fn finish(&mut self, checksum: u8) -> Status {
        self.checksum = checksum;
        let accumulated = (self.checksum_total & 0xFF) as u8;
        if accumulated != CHECKSUM_VALID {
            return self.fail(FrameError::ChecksumFailure { accumulated });
        }

        log::trace!(
            "Decoded frame type 0x{:02X}, length {}, message {} bytes",
            self.api_id,
            self.declared_length,
            self.message_len
        );
        self.status = Status::Complete;
        self.status
    }

    fn fail(&mut self, error: FrameError) -> Status {
        log::debug!("Dropping frame at position {}: {}", self.position, error);
        self.resync_pending = matches!(error, FrameError::UnexpectedStart { .. })
            && self.start_recovery == StartRecovery::Resync;
        self.status = Status::Failed(error);
        self.status
    }

    fn start_next_frame(&mut self) {
        self.clear();
        if self.resync_pending {
            self.resync_pending = false;
            self.buffer[0] = START_BYTE;
            self.position = 1;
        }
    }

    fn clear(&mut self) {
        self.buffer.fill(0);
        self.position = 0;
        self.declared_length = 0;
        self.api_id = 0;
        self.checksum_total = 0;
        self.checksum = 0;
        self.escape_pending = false;
        self.status = Status::InProgress;
        self.message_offset = None;
        self.message.fill(0);
        self.message_len = 0;
    }

    fn event_for(&self, status: Status) -> DecoderEvent<'_> {
        match status {
            Status::InProgress => DecoderEvent::NeedMore,
            Status::Failed(e) => DecoderEvent::Error(e),
            Status::Complete => DecoderEvent::FrameReady(ReceivedFrame {
                api_id: ApiId::from(self.api_id),
                message: self.message(),
                data: self.frame_data(),
                checksum: self.checksum,
            }),
        }
    }
}
