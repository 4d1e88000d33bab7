//! Protocol constants
//!
//! Frame layout offsets, control bytes and API frame type codes used by the
//! XBee ZigBee API protocol.

// ============================================================================
// Frame Layout
// ============================================================================

/// Capacity of the receive buffer, in unescaped bytes.
pub const MAX_FRAME_SIZE: usize = 255;
/// Position of the frame type byte within a frame.
pub const FRAME_TYPE_IDX: usize = 3;
/// Position of the first data byte within a ZigBee Receive Packet frame.
pub const RECEIVED_DATA_IDX: usize = 15;
/// Capacity of the extracted message buffer.
pub const MAX_MESSAGE_SIZE: usize = MAX_FRAME_SIZE - RECEIVED_DATA_IDX;
/// Largest declared length that still fits in the receive buffer.
pub const MAX_DECLARED_LENGTH: usize = MAX_FRAME_SIZE - FRAME_TYPE_IDX;

/// Header bytes of a ZigBee Transmit Request between the length field and the
/// payload: frame type, frame id, 64-bit address, 16-bit address, broadcast
/// radius and options.
pub const TRANSMIT_REQUEST_OVERHEAD: usize = 14;
/// Header bytes of a ZigBee Receive Packet between the length field and the
/// data: frame type, 64-bit address, 16-bit address and receive options.
pub const RECEIVE_PACKET_OVERHEAD: usize = 12;

// ============================================================================
// Control Bytes
// ============================================================================

/// Start delimiter. Never escaped.
pub const START_BYTE: u8 = 0x7E;
/// Escape marker. The following byte is XOR'ed with [`ESCAPE_XOR`].
pub const ESCAPE_BYTE: u8 = 0x7D;
/// Software flow control XON.
pub const XON_BYTE: u8 = 0x11;
/// Software flow control XOFF.
pub const XOFF_BYTE: u8 = 0x13;
/// Value XOR'ed into an escaped byte.
pub const ESCAPE_XOR: u8 = 0x20;

/// Value the checksum accumulator must reach (low 8 bits) for a valid frame.
pub const CHECKSUM_VALID: u8 = 0xFF;

/// Returns true if `byte` must be escaped in escaped API mode.
pub const fn needs_escape(byte: u8) -> bool {
    matches!(byte, START_BYTE | ESCAPE_BYTE | XON_BYTE | XOFF_BYTE)
}

// ============================================================================
// Error Codes (numeric)
// ============================================================================

/// Frame received and validated.
pub const NO_ERROR: u8 = 0;
/// Checksum did not validate.
pub const ERR_CHECKSUM_FAILURE: u8 = 1;
/// Frame does not fit in the receive buffer.
pub const ERR_FRAME_TOO_LARGE: u8 = 2;
/// Start delimiter arrived before the current frame finished.
pub const ERR_UNEXPECTED_START: u8 = 3;

// ============================================================================
// Frame Types, host → module
// ============================================================================

/// Local AT command.
pub const AT_COMMAND: u8 = 0x08;
/// Local AT command, parameter queued.
pub const AT_COMMAND_QUEUE_PARAMETER: u8 = 0x09;
/// ZigBee Transmit Request.
pub const ZB_TRANSMIT_REQUEST: u8 = 0x10;
/// Explicit Addressing ZigBee Command Frame.
pub const EXPLICIT_ADDRESSING_ZB_COMMAND: u8 = 0x11;
/// Remote AT Command Request.
pub const REMOTE_AT_COMMAND_REQUEST: u8 = 0x17;
/// Create Source Route.
pub const CREATE_SOURCE_ROUTE: u8 = 0x21;

// ============================================================================
// Frame Types, module → host
// ============================================================================

/// AT Command Response.
pub const AT_COMMAND_RESPONSE: u8 = 0x88;
/// Modem Status.
pub const MODEM_STATUS: u8 = 0x8A;
/// ZigBee Transmit Status.
pub const ZB_TRANSMIT_STATUS: u8 = 0x8B;
/// ZigBee Receive Packet.
pub const ZB_RECEIVE_PACKET: u8 = 0x90;
/// ZigBee Explicit Rx Indicator.
pub const ZB_EXPLICIT_RX_INDICATOR: u8 = 0x91;
/// ZigBee IO Data Sample Rx Indicator.
pub const ZB_IO_DATA_SAMPLE_RX_INDICATOR: u8 = 0x92;
/// Node Identification Indicator.
pub const NODE_IDENTIFICATION_INDICATOR: u8 = 0x95;
/// Remote Command Response.
pub const REMOTE_COMMAND_RESPONSE: u8 = 0x97;
/// Route Record Indicator.
pub const ROUTE_RECORD_INDICATOR: u8 = 0xA1;
/// Many-to-One Route Request Indicator.
pub const MANY_TO_ONE_ROUTE_REQUEST_INDICATOR: u8 = 0xA3;

// ============================================================================
// Addressing
// ============================================================================

/// Size of a 64-bit IEEE address.
pub const ADDRESS_64_SIZE: usize = 8;
/// 16-bit network address used when the destination's is not known.
pub const ADDRESS_16_UNKNOWN: u16 = 0xFFFE;
/// Receive option bit: packet was acknowledged.
pub const RX_OPTION_ACKNOWLEDGED: u8 = 0x01;
/// Receive option bit: packet was a broadcast.
pub const RX_OPTION_BROADCAST: u8 = 0x02;
