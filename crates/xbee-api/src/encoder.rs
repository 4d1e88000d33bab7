//! API frame encoder.
//!
//! Frames are written byte by byte straight into a [`ByteSink`]; nothing is
//! buffered beyond the frame body. In escaped mode every byte after the start
//! delimiter, the length and checksum included, is escaped when it collides
//! with a control byte. The checksum is computed over the unescaped values.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::*;
use crate::error::{EncodeError, TransportError};
use crate::transport::ByteSink;
use crate::types::{Address16, Address64, ApiFrame, ApiId, ApiMode};

/// Checksum over the frame type and frame data: `0xFF - (sum & 0xFF)`.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    CHECKSUM_VALID - sum
}

/// Writes API frames to a byte sink.
#[derive(Debug)]
pub struct FrameEncoder<S> {
    sink: S,
    mode: ApiMode,
    /// Reused frame body buffer.
    body: BytesMut,
}

impl<S: ByteSink> FrameEncoder<S> {
    /// Create an encoder for escaped API mode.
    pub fn new(sink: S) -> Self {
        FrameEncoder {
            sink,
            mode: ApiMode::default(),
            body: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Set the API mode.
    pub fn with_mode(mut self, mode: ApiMode) -> Self {
        self.mode = mode;
        self
    }

    /// API mode frames are written in.
    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    /// Get a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get a mutable reference to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Unwrap the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Send `payload` to the coordinator with a transmit-request style header:
    /// frame id 0, 64-bit destination 0, network address 0xFFFE, broadcast
    /// radius 0, options 0.
    ///
    /// Returns the number of bytes written to the sink.
    pub fn encode(&mut self, api_id: ApiId, payload: &[u8]) -> Result<usize, EncodeError> {
        self.body.clear();
        self.body.put_u8(0);
        self.body.put_slice(Address64::COORDINATOR.as_bytes());
        self.body.put_u16(Address16::UNKNOWN.0);
        self.body.put_u8(0);
        self.body.put_u8(0);
        self.body.put_slice(payload);
        write_frame(&mut self.sink, self.mode, api_id, &self.body)
    }

    /// Send a typed frame.
    pub fn send<F: ApiFrame + ?Sized>(&mut self, frame: &F) -> Result<usize, EncodeError> {
        self.body.clear();
        frame.write_body(&mut self.body);
        write_frame(&mut self.sink, self.mode, frame.api_id(), &self.body)
    }

    /// Send a frame from its type and the bytes that follow the type byte.
    pub fn send_raw(&mut self, api_id: ApiId, body: &[u8]) -> Result<usize, EncodeError> {
        write_frame(&mut self.sink, self.mode, api_id, body)
    }
}

impl FrameEncoder<BytesMut> {
    /// Encode a single frame into memory.
    pub fn to_bytes<F: ApiFrame + ?Sized>(frame: &F, mode: ApiMode) -> Result<Bytes, EncodeError> {
        let mut encoder = FrameEncoder::new(BytesMut::new()).with_mode(mode);
        encoder.send(frame)?;
        Ok(encoder.into_sink().freeze())
    }
}

/// Tracks escaping and the running checksum while a frame is written.
struct FrameWriter<'a, S: ?Sized> {
    sink: &'a mut S,
    escape: bool,
    sum: u8,
    written: usize,
}

impl<S: ByteSink + ?Sized> FrameWriter<'_, S> {
    fn raw(&mut self, byte: u8) -> Result<(), TransportError> {
        self.sink.write_byte(byte)?;
        self.written += 1;
        Ok(())
    }

    fn put(&mut self, byte: u8) -> Result<(), TransportError> {
        if self.escape && needs_escape(byte) {
            self.raw(ESCAPE_BYTE)?;
            self.raw(byte ^ ESCAPE_XOR)
        } else {
            self.raw(byte)
        }
    }

    fn put_summed(&mut self, byte: u8) -> Result<(), TransportError> {
        self.sum = self.sum.wrapping_add(byte);
        self.put(byte)
    }
}

fn write_frame<S: ByteSink + ?Sized>(
    sink: &mut S,
    mode: ApiMode,
    api_id: ApiId,
    body: &[u8],
) -> Result<usize, EncodeError> {
    let length = body.len() + 1;
    if length > MAX_DECLARED_LENGTH {
        return Err(EncodeError::FrameTooLarge {
            length,
            max: MAX_DECLARED_LENGTH,
        });
    }

    let mut writer = FrameWriter {
        sink,
        escape: mode.is_escaped(),
        sum: 0,
        written: 0,
    };

    writer.raw(START_BYTE)?;
    let [length_hi, length_lo] = (length as u16).to_be_bytes();
    writer.put(length_hi)?;
    writer.put(length_lo)?;
    writer.put_summed(api_id.into())?;
    for &byte in body {
        writer.put_summed(byte)?;
    }
    writer.put(CHECKSUM_VALID - writer.sum)?;
    writer.sink.flush()?;

    log::trace!(
        "Encoded {} frame, length {}, {} bytes on the wire",
        api_id.name(),
        length,
        writer.written
    );
    Ok(writer.written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReceivePacket, TransmitRequest};

    fn coordinator_header() -> Vec<u8> {
        let mut header = vec![0x00];
        header.extend_from_slice(&[0; 8]);
        header.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x00]);
        header
    }

    #[test]
    fn test_encode_on_command() {
        let mut encoder = FrameEncoder::new(Vec::new());
        let written = encoder
            .encode(ApiId::TransmitRequest, b"on")
            .expect("encode should succeed");

        let expected = [
            0x7E, 0x00, 0x10, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF,
            0xFE, 0x00, 0x00, 0x6F, 0x6E, 0x15,
        ];
        assert_eq!(encoder.sink(), &expected.to_vec());
        assert_eq!(written, expected.len());
    }

    #[test]
    fn test_checksum_formula() {
        let mut summed = vec![ZB_TRANSMIT_REQUEST];
        summed.extend(coordinator_header());
        summed.extend_from_slice(b"on");
        assert_eq!(checksum(&summed), 0x15);

        // Adding the checksum to the sum always yields 0xFF.
        let total = summed
            .iter()
            .fold(checksum(&summed), |acc, &b| acc.wrapping_add(b));
        assert_eq!(total, 0xFF);
    }

    #[test]
    fn test_reserved_bytes_are_escaped() {
        let payload = [START_BYTE, ESCAPE_BYTE, XON_BYTE, XOFF_BYTE, 0x41];
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder
            .encode(ApiId::TransmitRequest, &payload)
            .expect("encode should succeed");

        // Length 0x13 collides with XOFF and is escaped too.
        let mut expected = vec![0x7E, 0x00, 0x7D, 0x33, 0x10];
        expected.extend(coordinator_header());
        expected.extend_from_slice(&[0x7D, 0x5E, 0x7D, 0x5D, 0x7D, 0x31, 0x7D, 0x33, 0x41, 0x92]);
        assert_eq!(encoder.into_sink(), expected);
    }

    #[test]
    fn test_checksum_is_escaped() {
        // 0x10 + 0xFF + 0xFE + 'u' leaves a checksum of 0x7D.
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder
            .encode(ApiId::TransmitRequest, b"u")
            .expect("encode should succeed");

        let bytes = encoder.into_sink();
        assert_eq!(&bytes[bytes.len() - 2..], &[0x7D, 0x5D]);
    }

    #[test]
    fn test_unescaped_mode() {
        let payload = [START_BYTE, ESCAPE_BYTE];
        let mut encoder = FrameEncoder::new(Vec::new()).with_mode(ApiMode::Unescaped);
        encoder
            .encode(ApiId::TransmitRequest, &payload)
            .expect("encode should succeed");

        let bytes = encoder.into_sink();
        assert_eq!(bytes.len(), 3 + 14 + 2 + 1);
        assert_eq!(&bytes[17..19], &payload);
    }

    #[test]
    fn test_plain_bytes_not_escaped() {
        let payload: Vec<u8> = (0..=u8::MAX).filter(|&b| !needs_escape(b)).take(200).collect();
        let mut encoder = FrameEncoder::new(Vec::new()).with_mode(ApiMode::Escaped);
        encoder
            .send_raw(ApiId::Unknown(0x42), &payload)
            .expect("encode should succeed");

        let bytes = encoder.into_sink();
        assert_eq!(&bytes[4..4 + payload.len()], &payload[..]);
    }

    #[test]
    fn test_send_typed_frames() {
        let request = TransmitRequest::to_coordinator(&b"on"[..]);
        let typed = FrameEncoder::to_bytes(&request, ApiMode::Escaped).expect("encode should succeed");

        let mut encoder = FrameEncoder::new(Vec::new());
        encoder
            .encode(ApiId::TransmitRequest, b"on")
            .expect("encode should succeed");
        assert_eq!(&typed[..], &encoder.sink()[..]);

        let packet = ReceivePacket::from_coordinator(&b"off"[..]);
        let bytes = FrameEncoder::to_bytes(&packet, ApiMode::Escaped).expect("encode should succeed");
        assert_eq!(bytes[3], ZB_RECEIVE_PACKET);
        assert_eq!(usize::from(bytes[2]), RECEIVE_PACKET_OVERHEAD + 3);
    }

    #[test]
    fn test_frame_too_large() {
        let payload = vec![0u8; MAX_DECLARED_LENGTH - TRANSMIT_REQUEST_OVERHEAD + 1];
        let mut encoder = FrameEncoder::new(Vec::new());
        let result = encoder.encode(ApiId::TransmitRequest, &payload);

        assert!(matches!(
            result,
            Err(EncodeError::FrameTooLarge { length: 253, max: 252 })
        ));
        assert!(encoder.sink().is_empty());
    }

    #[test]
    fn test_transport_failure() {
        struct Closed;
        impl ByteSink for Closed {
            fn write_byte(&mut self, _: u8) -> Result<(), TransportError> {
                Err(TransportError::Closed)
            }
        }

        let mut encoder = FrameEncoder::new(Closed);
        let result = encoder.encode(ApiId::TransmitRequest, b"on");
        assert!(matches!(result, Err(EncodeError::Transport(TransportError::Closed))));
    }
}
