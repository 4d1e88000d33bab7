//! XBee ZigBee API Frame Protocol
//!
//! This crate provides the frame model, a streaming decoder and an escaping
//! encoder for the serial "API frame" protocol spoken by XBee ZigBee radio
//! modules.
//!
//! # Protocol Overview
//!
//! Every frame on the wire has the same envelope:
//!
//! ```text
//! +------+-------+-------+-------+-------------------+----------+
//! | 0x7E | len_hi| len_lo| api_id| payload[..]       | checksum |
//! +------+-------+-------+-------+-------------------+----------+
//! ```
//!
//! - The length covers `api_id` through the last payload byte.
//! - The checksum is `0xFF - (sum(api_id..payload) & 0xFF)`.
//! - In escaped API mode every byte after the start delimiter that collides
//!   with a control byte (`0x7E`, `0x7D`, `0x11`, `0x13`) is sent as
//!   `0x7D, byte ^ 0x20`.
//!
//! # Example
//!
//! ```rust,ignore
//! use xbee_api::{ApiId, DecoderEvent, FrameDecoder, FrameEncoder};
//!
//! // Send a command string to the coordinator
//! let mut encoder = FrameEncoder::new(Vec::new());
//! encoder.encode(ApiId::TransmitRequest, b"on")?;
//!
//! // Feed received bytes one at a time
//! let mut decoder = FrameDecoder::new();
//! for byte in received {
//!     if let DecoderEvent::FrameReady(frame) = decoder.feed(byte) {
//!         println!("{:?}: {:?}", frame.api_id, frame.message);
//!     }
//! }
//! ```

mod constants;
mod decoder;
mod encoder;
mod error;
mod transport;
mod types;

pub use constants::*;
pub use decoder::*;
pub use encoder::*;
pub use error::*;
pub use transport::*;
pub use types::*;
