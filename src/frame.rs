//! HTTP/2 wire format: the 9-byte frame header, per-frame payload layouts,
//! and byte-exact frame writers (RFC 7540 Sections 4 and 6).
//!
//! Everything in this module is stateless. Parsers take a borrowed payload
//! slice and return either the decoded structure or an HTTP/2 error code;
//! writers append a complete frame to a caller-owned buffer and return the
//! number of bytes written. Connection-level sequencing (preface,
//! CONTINUATION discipline, settings bookkeeping) lives in [`crate::codec`].

/// HTTP/2 frame types (RFC 7540 Section 6)
pub mod frame_type {
    pub const DATA: u8 = 0x0;
    pub const HEADERS: u8 = 0x1;
    pub const PRIORITY: u8 = 0x2;
    pub const RST_STREAM: u8 = 0x3;
    pub const SETTINGS: u8 = 0x4;
    pub const PUSH_PROMISE: u8 = 0x5;
    pub const PING: u8 = 0x6;
    pub const GOAWAY: u8 = 0x7;
    pub const WINDOW_UPDATE: u8 = 0x8;
    pub const CONTINUATION: u8 = 0x9;
}

/// HTTP/2 frame flags
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    /// Same bit as END_STREAM, but on SETTINGS and PING frames.
    pub const ACK: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// HTTP/2 SETTINGS identifiers (RFC 7540 Section 6.5.2)
pub mod settings_id {
    pub const HEADER_TABLE_SIZE: u16 = 0x1;
    pub const ENABLE_PUSH: u16 = 0x2;
    pub const MAX_CONCURRENT_STREAMS: u16 = 0x3;
    pub const INITIAL_WINDOW_SIZE: u16 = 0x4;
    pub const MAX_FRAME_SIZE: u16 = 0x5;
    pub const MAX_HEADER_LIST_SIZE: u16 = 0x6;
}

/// HTTP/2 error codes (RFC 7540 Section 7)
pub mod error_code {
    pub const NO_ERROR: u32 = 0x0;
    pub const PROTOCOL_ERROR: u32 = 0x1;
    pub const INTERNAL_ERROR: u32 = 0x2;
    pub const FLOW_CONTROL_ERROR: u32 = 0x3;
    pub const SETTINGS_TIMEOUT: u32 = 0x4;
    pub const STREAM_CLOSED: u32 = 0x5;
    pub const FRAME_SIZE_ERROR: u32 = 0x6;
    pub const REFUSED_STREAM: u32 = 0x7;
    pub const CANCEL: u32 = 0x8;
    pub const COMPRESSION_ERROR: u32 = 0x9;
    pub const CONNECT_ERROR: u32 = 0xa;
    pub const ENHANCE_YOUR_CALM: u32 = 0xb;
    pub const INADEQUATE_SECURITY: u32 = 0xc;
    pub const HTTP_1_1_REQUIRED: u32 = 0xd;

    /// Human-readable name for logging.
    pub fn name(code: u32) -> &'static str {
        match code {
            NO_ERROR => "NO_ERROR",
            PROTOCOL_ERROR => "PROTOCOL_ERROR",
            INTERNAL_ERROR => "INTERNAL_ERROR",
            FLOW_CONTROL_ERROR => "FLOW_CONTROL_ERROR",
            SETTINGS_TIMEOUT => "SETTINGS_TIMEOUT",
            STREAM_CLOSED => "STREAM_CLOSED",
            FRAME_SIZE_ERROR => "FRAME_SIZE_ERROR",
            REFUSED_STREAM => "REFUSED_STREAM",
            CANCEL => "CANCEL",
            COMPRESSION_ERROR => "COMPRESSION_ERROR",
            CONNECT_ERROR => "CONNECT_ERROR",
            ENHANCE_YOUR_CALM => "ENHANCE_YOUR_CALM",
            INADEQUATE_SECURITY => "INADEQUATE_SECURITY",
            HTTP_1_1_REQUIRED => "HTTP_1_1_REQUIRED",
            _ => "UNKNOWN",
        }
    }
}

/// The HTTP/2 connection preface (24 bytes)
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Size of the common frame header.
pub const FRAME_HEADER_SIZE: usize = 9;

/// Largest frame payload the wire format can express (2^24 - 1).
pub const MAX_FRAME_PAYLOAD: u32 = (1 << 24) - 1;

/// Smallest value SETTINGS_MAX_FRAME_SIZE may take, and the initial
/// max frame size before any SETTINGS exchange.
pub const MIN_MAX_FRAME_SIZE: u32 = 16_384;

/// Largest flow-control window / stream identifier (2^31 - 1).
pub const MAX_WINDOW_SIZE: u32 = 0x7FFF_FFFF;

const STREAM_ID_MASK: u32 = 0x7FFF_FFFF;

/// A parsed HTTP/2 frame header (9 bytes)
#[derive(Debug, Clone, Default)]
pub struct FrameHeader {
    pub length: u32, // 24 bits
    pub frame_type: u8,
    pub flags: u8,
    pub stream_id: u32, // 31 bits (high bit reserved)
}

impl FrameHeader {
    /// Parse a 9-byte frame header
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FRAME_HEADER_SIZE {
            return None;
        }

        let length = ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | (data[2] as u32);
        let frame_type = data[3];
        let flags = data[4];
        let stream_id = u32::from_be_bytes([data[5], data[6], data[7], data[8]]) & STREAM_ID_MASK;

        Some(Self {
            length,
            frame_type,
            flags,
            stream_id,
        })
    }

    pub fn is_end_stream(&self) -> bool {
        self.flags & flags::END_STREAM != 0
    }

    pub fn is_end_headers(&self) -> bool {
        self.flags & flags::END_HEADERS != 0
    }

    pub fn is_ack(&self) -> bool {
        self.flags & flags::ACK != 0
    }

    pub fn is_padded(&self) -> bool {
        self.flags & flags::PADDED != 0
    }

    pub fn has_priority(&self) -> bool {
        self.flags & flags::PRIORITY != 0
    }
}

/// HEADERS / PRIORITY frame priority fields: a 31-bit stream dependency,
/// exclusive bit, and weight byte. Parsed for wire correctness, then
/// discarded by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub dependency: u32,
    pub exclusive: bool,
    pub weight: u8,
}

/// True for the frame types that carry header-block fragments and therefore
/// participate in CONTINUATION sequencing.
pub fn affects_compression(frame_type_byte: u8) -> bool {
    matches!(
        frame_type_byte,
        frame_type::HEADERS | frame_type::PUSH_PROMISE | frame_type::CONTINUATION
    )
}

/// Strip PADDED framing from a DATA/HEADERS/PUSH_PROMISE payload: consume the
/// pad-length byte and drop that many trailing bytes. Padding that swallows
/// the whole remainder is a connection error.
pub fn strip_padding(frame_flags: u8, payload: &[u8]) -> Result<&[u8], u32> {
    if frame_flags & flags::PADDED == 0 {
        return Ok(payload);
    }
    let Some((&pad_len, rest)) = payload.split_first() else {
        return Err(error_code::PROTOCOL_ERROR);
    };
    let pad_len = pad_len as usize;
    if pad_len > rest.len() {
        return Err(error_code::PROTOCOL_ERROR);
    }
    Ok(&rest[..rest.len() - pad_len])
}

fn parse_priority_fields(data: &[u8]) -> Priority {
    let word = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    Priority {
        dependency: word & STREAM_ID_MASK,
        exclusive: word & 0x8000_0000 != 0,
        weight: data[4],
    }
}

/// Decode a DATA payload down to the application bytes.
pub fn parse_data<'a>(header: &FrameHeader, payload: &'a [u8]) -> Result<&'a [u8], u32> {
    strip_padding(header.flags, payload)
}

/// Decode a HEADERS payload into its optional priority section and the
/// header-block fragment.
pub fn parse_headers<'a>(
    header: &FrameHeader,
    payload: &'a [u8],
) -> Result<(Option<Priority>, &'a [u8]), u32> {
    let unpadded = strip_padding(header.flags, payload)?;
    if header.has_priority() {
        if unpadded.len() < 5 {
            return Err(error_code::FRAME_SIZE_ERROR);
        }
        Ok((Some(parse_priority_fields(unpadded)), &unpadded[5..]))
    } else {
        Ok((None, unpadded))
    }
}

/// Decode a PRIORITY payload (exactly 5 bytes).
pub fn parse_priority(payload: &[u8]) -> Result<Priority, u32> {
    if payload.len() != 5 {
        return Err(error_code::FRAME_SIZE_ERROR);
    }
    Ok(parse_priority_fields(payload))
}

/// Decode a RST_STREAM payload (exactly 4 bytes) into the error code.
pub fn parse_rst_stream(payload: &[u8]) -> Result<u32, u32> {
    if payload.len() != 4 {
        return Err(error_code::FRAME_SIZE_ERROR);
    }
    Ok(u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]))
}

/// Decode a SETTINGS payload into (identifier, value) pairs, in frame order.
pub fn parse_settings(payload: &[u8]) -> Result<Vec<(u16, u32)>, u32> {
    if payload.len() % 6 != 0 {
        return Err(error_code::FRAME_SIZE_ERROR);
    }
    Ok(payload
        .chunks_exact(6)
        .map(|entry| {
            let id = u16::from_be_bytes([entry[0], entry[1]]);
            let value = u32::from_be_bytes([entry[2], entry[3], entry[4], entry[5]]);
            (id, value)
        })
        .collect())
}

/// Decode a PUSH_PROMISE payload into the promised stream id and the
/// header-block fragment.
pub fn parse_push_promise<'a>(
    header: &FrameHeader,
    payload: &'a [u8],
) -> Result<(u32, &'a [u8]), u32> {
    let unpadded = strip_padding(header.flags, payload)?;
    if unpadded.len() < 4 {
        return Err(error_code::FRAME_SIZE_ERROR);
    }
    let promised =
        u32::from_be_bytes([unpadded[0], unpadded[1], unpadded[2], unpadded[3]]) & STREAM_ID_MASK;
    Ok((promised, &unpadded[4..]))
}

/// Decode a PING payload (exactly 8 bytes) into the opaque value.
pub fn parse_ping(payload: &[u8]) -> Result<u64, u32> {
    if payload.len() != 8 {
        return Err(error_code::FRAME_SIZE_ERROR);
    }
    let mut opaque = [0u8; 8];
    opaque.copy_from_slice(payload);
    Ok(u64::from_be_bytes(opaque))
}

/// Decode a GOAWAY payload into (last stream id, error code). Trailing debug
/// data is accepted and skipped.
pub fn parse_goaway(payload: &[u8]) -> Result<(u32, u32), u32> {
    if payload.len() < 8 {
        return Err(error_code::FRAME_SIZE_ERROR);
    }
    let last_stream =
        u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) & STREAM_ID_MASK;
    let code = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
    Ok((last_stream, code))
}

/// Decode a WINDOW_UPDATE payload (exactly 4 bytes) into the 31-bit delta.
pub fn parse_window_update(payload: &[u8]) -> Result<u32, u32> {
    if payload.len() != 4 {
        return Err(error_code::FRAME_SIZE_ERROR);
    }
    Ok(u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) & STREAM_ID_MASK)
}

fn write_frame_header(out: &mut Vec<u8>, length: usize, frame_type_byte: u8, flag_bits: u8, stream_id: u32) {
    debug_assert!(length <= MAX_FRAME_PAYLOAD as usize);
    out.push((length >> 16) as u8);
    out.push((length >> 8) as u8);
    out.push(length as u8);
    out.push(frame_type_byte);
    out.push(flag_bits);
    out.extend_from_slice(&(stream_id & STREAM_ID_MASK).to_be_bytes());
}

/// Write a DATA frame.
pub fn write_data(out: &mut Vec<u8>, stream_id: u32, data: &[u8], end_stream: bool) -> usize {
    let flag_bits = if end_stream { flags::END_STREAM } else { 0 };
    write_frame_header(out, data.len(), frame_type::DATA, flag_bits, stream_id);
    out.extend_from_slice(data);
    FRAME_HEADER_SIZE + data.len()
}

/// Write a HEADERS frame carrying one header-block chunk.
pub fn write_headers(out: &mut Vec<u8>, stream_id: u32, block: &[u8], end_headers: bool) -> usize {
    let flag_bits = if end_headers { flags::END_HEADERS } else { 0 };
    write_frame_header(out, block.len(), frame_type::HEADERS, flag_bits, stream_id);
    out.extend_from_slice(block);
    FRAME_HEADER_SIZE + block.len()
}

/// Write a PUSH_PROMISE frame on `assoc_stream` promising `promised_stream`.
pub fn write_push_promise(
    out: &mut Vec<u8>,
    assoc_stream: u32,
    promised_stream: u32,
    block: &[u8],
    end_headers: bool,
) -> usize {
    let flag_bits = if end_headers { flags::END_HEADERS } else { 0 };
    write_frame_header(
        out,
        4 + block.len(),
        frame_type::PUSH_PROMISE,
        flag_bits,
        assoc_stream,
    );
    out.extend_from_slice(&(promised_stream & STREAM_ID_MASK).to_be_bytes());
    out.extend_from_slice(block);
    FRAME_HEADER_SIZE + 4 + block.len()
}

/// Write a CONTINUATION frame carrying one header-block chunk.
pub fn write_continuation(
    out: &mut Vec<u8>,
    stream_id: u32,
    block: &[u8],
    end_headers: bool,
) -> usize {
    let flag_bits = if end_headers { flags::END_HEADERS } else { 0 };
    write_frame_header(out, block.len(), frame_type::CONTINUATION, flag_bits, stream_id);
    out.extend_from_slice(block);
    FRAME_HEADER_SIZE + block.len()
}

/// Write a RST_STREAM frame.
pub fn write_rst_stream(out: &mut Vec<u8>, stream_id: u32, code: u32) -> usize {
    write_frame_header(out, 4, frame_type::RST_STREAM, 0, stream_id);
    out.extend_from_slice(&code.to_be_bytes());
    FRAME_HEADER_SIZE + 4
}

/// Write a SETTINGS frame from (identifier, value) pairs.
pub fn write_settings(out: &mut Vec<u8>, settings: &[(u16, u32)]) -> usize {
    write_frame_header(out, settings.len() * 6, frame_type::SETTINGS, 0, 0);
    for (id, value) in settings {
        out.extend_from_slice(&id.to_be_bytes());
        out.extend_from_slice(&value.to_be_bytes());
    }
    FRAME_HEADER_SIZE + settings.len() * 6
}

/// Write an empty SETTINGS frame with the ACK flag.
pub fn write_settings_ack(out: &mut Vec<u8>) -> usize {
    write_frame_header(out, 0, frame_type::SETTINGS, flags::ACK, 0);
    FRAME_HEADER_SIZE
}

/// Write a PING frame.
pub fn write_ping(out: &mut Vec<u8>, opaque: u64, ack: bool) -> usize {
    let flag_bits = if ack { flags::ACK } else { 0 };
    write_frame_header(out, 8, frame_type::PING, flag_bits, 0);
    out.extend_from_slice(&opaque.to_be_bytes());
    FRAME_HEADER_SIZE + 8
}

/// Write a GOAWAY frame (no debug data).
pub fn write_goaway(out: &mut Vec<u8>, last_stream: u32, code: u32) -> usize {
    write_frame_header(out, 8, frame_type::GOAWAY, 0, 0);
    out.extend_from_slice(&(last_stream & STREAM_ID_MASK).to_be_bytes());
    out.extend_from_slice(&code.to_be_bytes());
    FRAME_HEADER_SIZE + 8
}

/// Write a WINDOW_UPDATE frame.
pub fn write_window_update(out: &mut Vec<u8>, stream_id: u32, delta: u32) -> usize {
    write_frame_header(out, 4, frame_type::WINDOW_UPDATE, 0, stream_id);
    out.extend_from_slice(&(delta & STREAM_ID_MASK).to_be_bytes());
    FRAME_HEADER_SIZE + 4
}
