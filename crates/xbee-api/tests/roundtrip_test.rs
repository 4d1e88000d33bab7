//! Integration tests for encoder/decoder interoperability.
//!
//! These tests push encoder output through the streaming decoder the way the
//! node receives it from the UART: one byte at a time, sometimes with several
//! frames and line noise back to back.

use xbee_api::{
    needs_escape, Address16, Address64, ApiId, ApiMode, DecoderEvent, FrameDecoder, FrameEncoder,
    FrameError, ReceivePacket, TransmitRequest, ESCAPE_BYTE, ESCAPE_XOR, MAX_MESSAGE_SIZE,
    START_BYTE,
};

/// Decode every frame in `bytes`, collecting `(api_id, message)` or the error.
fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Result<(ApiId, Vec<u8>), FrameError>> {
    let mut results = Vec::new();
    for &byte in bytes {
        match decoder.feed(byte) {
            DecoderEvent::NeedMore => {}
            DecoderEvent::FrameReady(frame) => results.push(Ok((frame.api_id, frame.message.to_vec()))),
            DecoderEvent::Error(e) => results.push(Err(e)),
        }
    }
    results
}

/// Remove escaping from an encoded frame.
fn unescape(wire: &[u8]) -> Vec<u8> {
    let mut raw = vec![wire[0]];
    let mut escape = false;
    for &b in &wire[1..] {
        if b == ESCAPE_BYTE {
            escape = true;
        } else if escape {
            raw.push(b ^ ESCAPE_XOR);
            escape = false;
        } else {
            raw.push(b);
        }
    }
    raw
}

/// Apply escaping to an unescaped frame.
fn escape(raw: &[u8]) -> Vec<u8> {
    let mut wire = vec![raw[0]];
    for &b in &raw[1..] {
        if needs_escape(b) {
            wire.push(ESCAPE_BYTE);
            wire.push(b ^ ESCAPE_XOR);
        } else {
            wire.push(b);
        }
    }
    wire
}

fn encode_receive_packet(data: &[u8]) -> Vec<u8> {
    let packet = ReceivePacket::from_coordinator(data.to_vec());
    FrameEncoder::to_bytes(&packet, ApiMode::Escaped)
        .expect("encode should succeed")
        .to_vec()
}

#[test]
fn test_roundtrip_command_strings() {
    let mut decoder = FrameDecoder::new();
    for command in ["on", "off", "help", "set rate 10", "t20.50|p1013.25|h45.10|l180.00"] {
        let wire = encode_receive_packet(command.as_bytes());
        let results = decode_all(&mut decoder, &wire);
        assert_eq!(results, vec![Ok((ApiId::ReceivePacket, command.as_bytes().to_vec()))]);
    }
}

#[test]
fn test_roundtrip_every_byte_value() {
    // Covers each reserved value, both in the data and in the checksum.
    let data: Vec<u8> = (0..=u8::MAX).collect();
    let mut decoder = FrameDecoder::new();
    for chunk in data.chunks(60) {
        let wire = encode_receive_packet(chunk);
        let results = decode_all(&mut decoder, &wire);
        assert_eq!(results, vec![Ok((ApiId::ReceivePacket, chunk.to_vec()))]);
    }
}

#[test]
fn test_roundtrip_maximum_message() {
    let data = vec![0x7E; MAX_MESSAGE_SIZE];
    let wire = encode_receive_packet(&data);
    // Every data byte is escaped; nothing else is.
    assert_eq!(wire.len(), 3 + 12 + 2 * MAX_MESSAGE_SIZE + 1);

    let mut decoder = FrameDecoder::new();
    let results = decode_all(&mut decoder, &wire);
    assert_eq!(results, vec![Ok((ApiId::ReceivePacket, data))]);
}

#[test]
fn test_roundtrip_receive_packet_fields() {
    let packet = ReceivePacket {
        source: Address64::from_u64(0x0013_A200_4052_9F3C),
        network_address: Address16(0x7D11),
        options: 0x02,
        data: "light".into(),
    };
    let wire = FrameEncoder::to_bytes(&packet, ApiMode::Escaped).expect("encode should succeed");

    let mut decoder = FrameDecoder::new();
    let mut decoded = None;
    for &byte in wire.iter() {
        if let DecoderEvent::FrameReady(frame) = decoder.feed(byte) {
            decoded = Some(ReceivePacket::from_frame_data(frame.data).expect("should parse"));
        }
    }
    assert_eq!(decoded, Some(packet));
}

#[test]
fn test_transmit_request_decodes_with_full_frame_access() {
    let request = TransmitRequest::to_coordinator("t21.03|p1009.87|h40.12|l95.50")
        .with_destination(Address64::from_u64(0x0013_A200_1111_1313))
        .with_frame_id(0x11);
    let wire = FrameEncoder::to_bytes(&request, ApiMode::Escaped).expect("encode should succeed");

    let mut decoder = FrameDecoder::new();
    let mut decoded = None;
    for &byte in wire.iter() {
        if let DecoderEvent::FrameReady(frame) = decoder.feed(byte) {
            // Transmit requests carry no extracted message.
            assert!(frame.message.is_empty());
            decoded = Some(TransmitRequest::from_frame_data(frame.data).expect("should parse"));
        }
    }
    assert_eq!(decoded, Some(request));
}

#[test]
fn test_single_byte_mutation_fails_checksum() {
    let data = b"t20.50|h45.10";
    let raw = unescape(&encode_receive_packet(data));
    let data_start = 15;

    for i in data_start..raw.len() - 1 {
        let mut mutated = raw.clone();
        mutated[i] ^= 0x01;
        if mutated[i] == START_BYTE {
            continue;
        }

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &escape(&mutated));
        assert!(
            matches!(results[..], [Err(FrameError::ChecksumFailure { .. })]),
            "mutation at {} gave {:?}",
            i,
            results
        );
    }
}

#[test]
fn test_escape_inverse() {
    for reserved in [0x7E, 0x7D, 0x11, 0x13] {
        let wire = encode_receive_packet(&[reserved]);
        assert!(wire.windows(2).any(|w| w == [ESCAPE_BYTE, reserved ^ ESCAPE_XOR]));

        let mut decoder = FrameDecoder::new();
        assert_eq!(
            decode_all(&mut decoder, &wire),
            vec![Ok((ApiId::ReceivePacket, vec![reserved]))]
        );
    }
}

#[test]
fn test_stream_with_noise_and_aborted_frame() {
    let first = encode_receive_packet(b"on");
    let second = encode_receive_packet(b"off");

    let mut stream = vec![0x00, 0xFF, 0x13];
    stream.extend_from_slice(&first);
    stream.extend_from_slice(&second[..9]);
    stream.extend_from_slice(&second);
    stream.extend_from_slice(&first);

    let mut decoder = FrameDecoder::new();
    let results = decode_all(&mut decoder, &stream);
    assert_eq!(
        results,
        vec![
            Ok((ApiId::ReceivePacket, b"on".to_vec())),
            Err(FrameError::UnexpectedStart { position: 9 }),
            Ok((ApiId::ReceivePacket, b"off".to_vec())),
            Ok((ApiId::ReceivePacket, b"on".to_vec())),
        ]
    );
}

#[test]
fn test_unescaped_mode_roundtrip() {
    let packet = ReceivePacket::from_coordinator(vec![0x7E, 0x7D, 0x11, 0x13]);
    let wire = FrameEncoder::to_bytes(&packet, ApiMode::Unescaped).expect("encode should succeed");

    let mut decoder = FrameDecoder::new().with_mode(ApiMode::Unescaped);
    assert_eq!(
        decode_all(&mut decoder, &wire),
        vec![Ok((ApiId::ReceivePacket, vec![0x7E, 0x7D, 0x11, 0x13]))]
    );
}
