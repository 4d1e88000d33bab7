//! Common types used in the protocol.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::*;
use crate::error::ProtocolError;

/// API frame type tag.
///
/// Only [`ApiId::TransmitRequest`] and [`ApiId::ReceivePacket`] have typed
/// payloads in this crate; the remaining tags are recognised by value only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiId {
    /// Local AT command (0x08).
    AtCommand,
    /// Local AT command with queued parameter (0x09).
    AtCommandQueueParameter,
    /// ZigBee Transmit Request (0x10).
    TransmitRequest,
    /// Explicit Addressing ZigBee Command Frame (0x11).
    ExplicitAddressingCommand,
    /// Remote AT Command Request (0x17).
    RemoteAtCommandRequest,
    /// Create Source Route (0x21).
    CreateSourceRoute,
    /// AT Command Response (0x88).
    AtCommandResponse,
    /// Modem Status (0x8A).
    ModemStatus,
    /// ZigBee Transmit Status (0x8B).
    TransmitStatus,
    /// ZigBee Receive Packet (0x90).
    ReceivePacket,
    /// ZigBee Explicit Rx Indicator (0x91).
    ExplicitRxIndicator,
    /// ZigBee IO Data Sample Rx Indicator (0x92).
    IoDataSampleRxIndicator,
    /// Node Identification Indicator (0x95).
    NodeIdentificationIndicator,
    /// Remote Command Response (0x97).
    RemoteCommandResponse,
    /// Route Record Indicator (0xA1).
    RouteRecordIndicator,
    /// Many-to-One Route Request Indicator (0xA3).
    ManyToOneRouteRequestIndicator,
    /// Any other frame type.
    Unknown(u8),
}

impl ApiId {
    /// Returns true for frame types the host sends to the module.
    pub fn is_request(&self) -> bool {
        u8::from(*self) < 0x80
    }

    /// Short human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ApiId::AtCommand => "at_command",
            ApiId::AtCommandQueueParameter => "at_command_queue_parameter",
            ApiId::TransmitRequest => "transmit_request",
            ApiId::ExplicitAddressingCommand => "explicit_addressing_command",
            ApiId::RemoteAtCommandRequest => "remote_at_command_request",
            ApiId::CreateSourceRoute => "create_source_route",
            ApiId::AtCommandResponse => "at_command_response",
            ApiId::ModemStatus => "modem_status",
            ApiId::TransmitStatus => "transmit_status",
            ApiId::ReceivePacket => "receive_packet",
            ApiId::ExplicitRxIndicator => "explicit_rx_indicator",
            ApiId::IoDataSampleRxIndicator => "io_data_sample_rx_indicator",
            ApiId::NodeIdentificationIndicator => "node_identification_indicator",
            ApiId::RemoteCommandResponse => "remote_command_response",
            ApiId::RouteRecordIndicator => "route_record_indicator",
            ApiId::ManyToOneRouteRequestIndicator => "many_to_one_route_request_indicator",
            ApiId::Unknown(_) => "unknown",
        }
    }
}

impl std::fmt::Display for ApiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), u8::from(*self))
    }
}

impl From<u8> for ApiId {
    fn from(code: u8) -> Self {
        match code {
            AT_COMMAND => ApiId::AtCommand,
            AT_COMMAND_QUEUE_PARAMETER => ApiId::AtCommandQueueParameter,
            ZB_TRANSMIT_REQUEST => ApiId::TransmitRequest,
            EXPLICIT_ADDRESSING_ZB_COMMAND => ApiId::ExplicitAddressingCommand,
            REMOTE_AT_COMMAND_REQUEST => ApiId::RemoteAtCommandRequest,
            CREATE_SOURCE_ROUTE => ApiId::CreateSourceRoute,
            AT_COMMAND_RESPONSE => ApiId::AtCommandResponse,
            MODEM_STATUS => ApiId::ModemStatus,
            ZB_TRANSMIT_STATUS => ApiId::TransmitStatus,
            ZB_RECEIVE_PACKET => ApiId::ReceivePacket,
            ZB_EXPLICIT_RX_INDICATOR => ApiId::ExplicitRxIndicator,
            ZB_IO_DATA_SAMPLE_RX_INDICATOR => ApiId::IoDataSampleRxIndicator,
            NODE_IDENTIFICATION_INDICATOR => ApiId::NodeIdentificationIndicator,
            REMOTE_COMMAND_RESPONSE => ApiId::RemoteCommandResponse,
            ROUTE_RECORD_INDICATOR => ApiId::RouteRecordIndicator,
            MANY_TO_ONE_ROUTE_REQUEST_INDICATOR => ApiId::ManyToOneRouteRequestIndicator,
            _ => ApiId::Unknown(code),
        }
    }
}

impl From<ApiId> for u8 {
    fn from(id: ApiId) -> Self {
        match id {
            ApiId::AtCommand => AT_COMMAND,
            ApiId::AtCommandQueueParameter => AT_COMMAND_QUEUE_PARAMETER,
            ApiId::TransmitRequest => ZB_TRANSMIT_REQUEST,
            ApiId::ExplicitAddressingCommand => EXPLICIT_ADDRESSING_ZB_COMMAND,
            ApiId::RemoteAtCommandRequest => REMOTE_AT_COMMAND_REQUEST,
            ApiId::CreateSourceRoute => CREATE_SOURCE_ROUTE,
            ApiId::AtCommandResponse => AT_COMMAND_RESPONSE,
            ApiId::ModemStatus => MODEM_STATUS,
            ApiId::TransmitStatus => ZB_TRANSMIT_STATUS,
            ApiId::ReceivePacket => ZB_RECEIVE_PACKET,
            ApiId::ExplicitRxIndicator => ZB_EXPLICIT_RX_INDICATOR,
            ApiId::IoDataSampleRxIndicator => ZB_IO_DATA_SAMPLE_RX_INDICATOR,
            ApiId::NodeIdentificationIndicator => NODE_IDENTIFICATION_INDICATOR,
            ApiId::RemoteCommandResponse => REMOTE_COMMAND_RESPONSE,
            ApiId::RouteRecordIndicator => ROUTE_RECORD_INDICATOR,
            ApiId::ManyToOneRouteRequestIndicator => MANY_TO_ONE_ROUTE_REQUEST_INDICATOR,
            ApiId::Unknown(code) => code,
        }
    }
}

/// Serial API operating mode of the radio module (`AP` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ApiMode {
    /// API mode 1: control bytes are never escaped.
    Unescaped,
    /// API mode 2: control bytes after the start delimiter are escaped.
    #[default]
    Escaped,
}

impl ApiMode {
    /// Returns true if control bytes are escaped on the wire.
    pub fn is_escaped(&self) -> bool {
        matches!(self, ApiMode::Escaped)
    }
}

/// A 64-bit IEEE device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address64(pub [u8; ADDRESS_64_SIZE]);

impl Address64 {
    /// The network coordinator.
    pub const COORDINATOR: Address64 = Address64([0; ADDRESS_64_SIZE]);
    /// Broadcast to every device on the PAN.
    pub const BROADCAST: Address64 = Address64([0, 0, 0, 0, 0, 0, 0xFF, 0xFF]);

    /// Create an address from its big-endian integer value.
    pub fn from_u64(value: u64) -> Self {
        Address64(value.to_be_bytes())
    }

    /// Get the big-endian integer value.
    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Create from a slice. Returns None if the slice is too short.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; ADDRESS_64_SIZE] = slice.get(..ADDRESS_64_SIZE)?.try_into().ok()?;
        Some(Address64(bytes))
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_64_SIZE] {
        &self.0
    }
}

impl std::fmt::Display for Address64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016X}", self.as_u64())
    }
}

/// A 16-bit ZigBee network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address16(pub u16);

impl Address16 {
    /// Address used when the destination's network address is not known.
    pub const UNKNOWN: Address16 = Address16(ADDRESS_16_UNKNOWN);

    /// Get the big-endian bytes.
    pub fn to_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl Default for Address16 {
    fn default() -> Self {
        Address16::UNKNOWN
    }
}

/// A frame type that can be serialised by the encoder.
pub trait ApiFrame {
    /// Frame type tag.
    fn api_id(&self) -> ApiId;

    /// Append the bytes that follow the frame type byte.
    fn write_body(&self, buf: &mut BytesMut);
}

/// ZigBee Transmit Request (0x10): send data to a remote device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitRequest {
    /// Frame id for the transmit status response. Zero disables the response.
    pub frame_id: u8,
    /// 64-bit destination address.
    pub destination: Address64,
    /// 16-bit destination network address.
    pub network_address: Address16,
    /// Maximum hops for a broadcast. Zero uses the network maximum.
    pub broadcast_radius: u8,
    /// Transmit options bitfield.
    pub options: u8,
    /// RF data.
    pub payload: Bytes,
}

impl TransmitRequest {
    /// A request with no status response, addressed to the coordinator.
    pub fn to_coordinator(payload: impl Into<Bytes>) -> Self {
        TransmitRequest {
            frame_id: 0,
            destination: Address64::COORDINATOR,
            network_address: Address16::UNKNOWN,
            broadcast_radius: 0,
            options: 0,
            payload: payload.into(),
        }
    }

    /// Same request with a different 64-bit destination.
    pub fn with_destination(mut self, destination: Address64) -> Self {
        self.destination = destination;
        self
    }

    /// Same request with a frame id.
    pub fn with_frame_id(mut self, frame_id: u8) -> Self {
        self.frame_id = frame_id;
        self
    }

    /// Parse from unescaped frame bytes (start delimiter through last payload byte).
    pub fn from_frame_data(frame: &[u8]) -> Result<Self, ProtocolError> {
        let header = FRAME_TYPE_IDX + TRANSMIT_REQUEST_OVERHEAD;
        check_frame(frame, ZB_TRANSMIT_REQUEST, header)?;
        let body = &frame[FRAME_TYPE_IDX + 1..];
        Ok(TransmitRequest {
            frame_id: body[0],
            destination: Address64::from_slice(&body[1..]).unwrap_or_default(),
            network_address: Address16(u16::from_be_bytes([body[9], body[10]])),
            broadcast_radius: body[11],
            options: body[12],
            payload: Bytes::copy_from_slice(&body[13..]),
        })
    }
}

impl ApiFrame for TransmitRequest {
    fn api_id(&self) -> ApiId {
        ApiId::TransmitRequest
    }

    fn write_body(&self, buf: &mut BytesMut) {
        buf.put_u8(self.frame_id);
        buf.put_slice(self.destination.as_bytes());
        buf.put_u16(self.network_address.0);
        buf.put_u8(self.broadcast_radius);
        buf.put_u8(self.options);
        buf.put_slice(&self.payload);
    }
}

/// ZigBee Receive Packet (0x90): data received from a remote device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivePacket {
    /// 64-bit address of the sender.
    pub source: Address64,
    /// 16-bit network address of the sender.
    pub network_address: Address16,
    /// Receive options bitfield.
    pub options: u8,
    /// RF data.
    pub data: Bytes,
}

impl ReceivePacket {
    /// A packet from the coordinator carrying `data`.
    pub fn from_coordinator(data: impl Into<Bytes>) -> Self {
        ReceivePacket {
            source: Address64::COORDINATOR,
            network_address: Address16(0),
            options: RX_OPTION_ACKNOWLEDGED,
            data: data.into(),
        }
    }

    /// Returns true if the packet was sent as a broadcast.
    pub fn is_broadcast(&self) -> bool {
        self.options & RX_OPTION_BROADCAST != 0
    }

    /// Parse from unescaped frame bytes (start delimiter through last payload byte).
    pub fn from_frame_data(frame: &[u8]) -> Result<Self, ProtocolError> {
        check_frame(frame, ZB_RECEIVE_PACKET, RECEIVED_DATA_IDX)?;
        let body = &frame[FRAME_TYPE_IDX + 1..];
        Ok(ReceivePacket {
            source: Address64::from_slice(body).unwrap_or_default(),
            network_address: Address16(u16::from_be_bytes([body[8], body[9]])),
            options: body[10],
            data: Bytes::copy_from_slice(&frame[RECEIVED_DATA_IDX..]),
        })
    }
}

impl ApiFrame for ReceivePacket {
    fn api_id(&self) -> ApiId {
        ApiId::ReceivePacket
    }

    fn write_body(&self, buf: &mut BytesMut) {
        buf.put_slice(self.source.as_bytes());
        buf.put_u16(self.network_address.0);
        buf.put_u8(self.options);
        buf.put_slice(&self.data);
    }
}

fn check_frame(frame: &[u8], expected: u8, min_len: usize) -> Result<(), ProtocolError> {
    if frame.len() < min_len {
        return Err(ProtocolError::FrameTooShort {
            expected: min_len,
            actual: frame.len(),
        });
    }
    if frame[FRAME_TYPE_IDX] != expected {
        return Err(ProtocolError::UnexpectedApiId {
            expected,
            actual: frame[FRAME_TYPE_IDX],
        });
    }
    Ok(())
}
