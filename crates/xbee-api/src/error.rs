//! Protocol error types.

use thiserror::Error;

use crate::constants::*;

/// Reasons a frame was rejected by the decoder.
///
/// None of these are fatal: the decoder drops the frame in progress and
/// resynchronises on the next start delimiter.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// A start delimiter arrived before the current frame finished.
    #[error("unexpected start delimiter at position {position}")]
    UnexpectedStart {
        /// Position in the aborted frame where the delimiter was seen.
        position: usize,
    },

    /// The checksum byte did not validate.
    #[error("checksum failure: accumulated 0x{accumulated:02X}, expected 0xFF")]
    ChecksumFailure {
        /// Low byte of the sum over frame type through checksum.
        accumulated: u8,
    },

    /// The frame does not fit in the receive buffer.
    #[error("frame too large: declared length {declared}, maximum {max}")]
    FrameTooLarge {
        /// Declared length (low byte) of the rejected frame.
        declared: usize,
        /// Largest declared length the decoder accepts.
        max: usize,
    },
}

impl FrameError {
    /// Numeric error code.
    pub fn code(&self) -> u8 {
        match self {
            FrameError::ChecksumFailure { .. } => ERR_CHECKSUM_FAILURE,
            FrameError::FrameTooLarge { .. } => ERR_FRAME_TOO_LARGE,
            FrameError::UnexpectedStart { .. } => ERR_UNEXPECTED_START,
        }
    }

    /// Short name of the error kind, for logs and metric labels.
    pub fn kind_str(&self) -> &'static str {
        match self {
            FrameError::ChecksumFailure { .. } => "checksum_failure",
            FrameError::FrameTooLarge { .. } => "frame_too_large",
            FrameError::UnexpectedStart { .. } => "unexpected_start",
        }
    }
}

/// Failure of the underlying byte transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The other end of the transport has gone away.
    #[error("transport closed")]
    Closed,

    /// I/O error writing to the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while encoding and sending a frame.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The byte sink refused a byte.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The frame would not fit in the peer's receive buffer.
    #[error("frame too large: length {length}, maximum {max}")]
    FrameTooLarge {
        /// Length field the frame would carry.
        length: usize,
        /// Largest length a receiver accepts.
        max: usize,
    },
}

/// Errors interpreting the fields of a decoded frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is too short for its type.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Frame has a different type than the one being parsed.
    #[error("unexpected frame type 0x{actual:02X}, expected 0x{expected:02X}")]
    UnexpectedApiId {
        /// Frame type being parsed.
        expected: u8,
        /// Frame type found.
        actual: u8,
    },
}
