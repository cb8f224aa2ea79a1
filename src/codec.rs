//! The per-connection HTTP/2 codec: a passive frame parser/emitter driven by
//! the owning session.
//!
//! Ingress is a single [`Http2Codec::feed`] that consumes whole parse units
//! (preface, frame header, frame payload) from a caller buffer and dispatches
//! [`CodecCallbacks`] events. Egress is a family of `generate_*` operations
//! that append RFC 7540 frames to a caller-owned buffer.
//!
//! The codec owns its parse latch, both settings registries, the HPACK
//! encoder/decoder pair, and the header-block accumulator. It performs no
//! I/O, keeps no threads, and never blocks: any transport can drive it.

use log::{debug, trace, warn};
use rand::Rng;

use crate::callbacks::CodecCallbacks;
use crate::error::CodecError;
use crate::frame::{
    self, error_code, frame_type, settings_id, FrameHeader, CONNECTION_PREFACE,
    FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD, MIN_MAX_FRAME_SIZE,
};
use crate::hpack::{Header, HpackDecoder, HpackEncoder};
use crate::message::HttpMessage;
use crate::settings::{self, SettingsRegistry};
use crate::verifier::parse_header_list;

/// Which end of the connection this codec speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client side: sends requests, receives responses and pushes.
    Upstream,
    /// Server side: receives requests, sends responses.
    Downstream,
}

/// Graceful-shutdown progression driven by [`Http2Codec::generate_goaway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClosingState {
    Open,
    FirstGoawaySent,
    Closed,
}

/// Maximum accumulated header-block size (256 KB). Bounds memory growth
/// from CONTINUATION floods.
pub const MAX_HEADER_BLOCK_SIZE: usize = 256 * 1024;

/// Metadata for the header block currently being reassembled.
#[derive(Debug, Clone)]
struct HeaderBlockInfo {
    /// Stream the decoded message belongs to (the promised stream for a
    /// PUSH_PROMISE block).
    stream: u32,
    /// Originating stream of a PUSH_PROMISE block; 0 for plain HEADERS.
    assoc_stream: u32,
    /// END_STREAM was set on the opening HEADERS frame.
    end_stream: bool,
}

/// A bidirectional HTTP/2 frame codec for one connection.
#[derive(Debug)]
pub struct Http2Codec {
    direction: Direction,

    // ingress latch
    need_preface: bool,
    need_header: bool,
    cur_header: FrameHeader,
    expected_continuation_stream: u32,
    header_block: Vec<u8>,
    block_info: Option<HeaderBlockInfo>,
    last_ingress_stream: u32,
    ingress_goaway_ack: u32,
    dead: bool,

    // settings
    ingress_settings: SettingsRegistry,
    egress_settings: SettingsRegistry,

    // header compression
    hpack_decoder: HpackDecoder,
    hpack_encoder: HpackEncoder,

    // egress
    next_egress_stream: u32,
    closing: ClosingState,
    egress_goaway_ack: u32,
    header_split_size: Option<usize>,
}

impl Http2Codec {
    pub fn new(direction: Direction) -> Self {
        debug!("creating {direction:?} HTTP/2 codec");
        Self {
            direction,
            need_preface: direction == Direction::Downstream,
            need_header: true,
            cur_header: FrameHeader::default(),
            expected_continuation_stream: 0,
            header_block: Vec::new(),
            block_info: None,
            last_ingress_stream: 0,
            ingress_goaway_ack: u32::MAX,
            dead: false,
            ingress_settings: SettingsRegistry::new(),
            egress_settings: SettingsRegistry::new(),
            hpack_decoder: HpackDecoder::new(),
            hpack_encoder: HpackEncoder::new(),
            next_egress_stream: match direction {
                Direction::Upstream => 1,
                Direction::Downstream => 2,
            },
            closing: ClosingState::Open,
            egress_goaway_ack: u32::MAX,
            header_split_size: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The peer's settings as received so far.
    pub fn ingress_settings(&self) -> &SettingsRegistry {
        &self.ingress_settings
    }

    /// Our settings as the session has configured them.
    pub fn egress_settings(&self) -> &SettingsRegistry {
        &self.egress_settings
    }

    /// Mutate our settings before serializing them with
    /// [`generate_settings`](Self::generate_settings).
    pub fn egress_settings_mut(&mut self) -> &mut SettingsRegistry {
        &mut self.egress_settings
    }

    /// Cap the header-block chunk size used by
    /// [`generate_header`](Self::generate_header). Defaults to the peer's
    /// MAX_FRAME_SIZE.
    pub fn set_header_split_size(&mut self, size: usize) {
        self.header_split_size = Some(size);
    }

    /// Largest frame payload we accept, per our advertised MAX_FRAME_SIZE.
    fn max_recv_frame_size(&self) -> u32 {
        self.egress_settings
            .get_or(settings_id::MAX_FRAME_SIZE, MIN_MAX_FRAME_SIZE)
    }

    /// Largest frame payload the peer accepts.
    fn max_send_frame_size(&self) -> usize {
        self.ingress_settings
            .get_or(settings_id::MAX_FRAME_SIZE, MIN_MAX_FRAME_SIZE) as usize
    }

    fn header_split_size(&self) -> usize {
        self.header_split_size
            .unwrap_or_else(|| self.max_send_frame_size().min(MAX_FRAME_PAYLOAD as usize))
            .max(1)
    }

    // ------------------------------------------------------------------
    // Ingress
    // ------------------------------------------------------------------

    /// Consume as many whole parse units as possible from `buf`, dispatching
    /// events to `cb`, and return the number of bytes consumed. A partial
    /// preface, frame header, or payload consumes nothing of that unit; the
    /// caller re-presents the unconsumed tail on the next call.
    pub fn feed(&mut self, buf: &[u8], cb: &mut dyn CodecCallbacks) -> usize {
        if self.dead {
            return 0;
        }
        let mut pos = 0;
        let mut conn_error = error_code::NO_ERROR;

        while conn_error == error_code::NO_ERROR {
            let rest = &buf[pos..];
            if self.need_preface {
                if rest.len() < CONNECTION_PREFACE.len() {
                    break;
                }
                self.need_preface = false;
                if &rest[..CONNECTION_PREFACE.len()] != CONNECTION_PREFACE {
                    debug!("bad connection preface");
                    conn_error = error_code::PROTOCOL_ERROR;
                }
                pos += CONNECTION_PREFACE.len();
            } else if self.need_header {
                if rest.len() < FRAME_HEADER_SIZE {
                    break;
                }
                let Some(header) = FrameHeader::parse(rest) else {
                    break;
                };
                pos += FRAME_HEADER_SIZE;
                self.need_header = false;
                if header.length > self.max_recv_frame_size() {
                    debug!(
                        "frame length {} exceeds advertised max {}",
                        header.length,
                        self.max_recv_frame_size()
                    );
                    conn_error = error_code::FRAME_SIZE_ERROR;
                }
                self.cur_header = header;
            } else {
                let payload_len = self.cur_header.length as usize;
                if rest.len() < payload_len {
                    break;
                }
                let payload = &rest[..payload_len];
                pos += payload_len;
                self.need_header = true;
                if let Err(code) = self.parse_frame(payload, cb) {
                    conn_error = code;
                }
            }
        }

        if conn_error != error_code::NO_ERROR {
            self.dead = true;
            cb.on_error(0, CodecError::connection(conn_error), false);
        }
        pos
    }

    fn parse_frame(&mut self, payload: &[u8], cb: &mut dyn CodecCallbacks) -> Result<(), u32> {
        let header = self.cur_header.clone();

        if self.expected_continuation_stream != 0
            && (header.frame_type != frame_type::CONTINUATION
                || header.stream_id != self.expected_continuation_stream)
        {
            debug!(
                "expected CONTINUATION on stream={}, got type={} stream={}",
                self.expected_continuation_stream, header.frame_type, header.stream_id
            );
            return Err(error_code::PROTOCOL_ERROR);
        }
        if self.expected_continuation_stream == 0
            && header.frame_type == frame_type::CONTINUATION
        {
            debug!("unexpected CONTINUATION on stream={}", header.stream_id);
            return Err(error_code::PROTOCOL_ERROR);
        }

        let result = match header.frame_type {
            frame_type::DATA => self.parse_data(&header, payload, cb),
            frame_type::HEADERS => self.parse_headers(&header, payload, cb),
            frame_type::PRIORITY => self.parse_priority(&header, payload),
            frame_type::RST_STREAM => self.parse_rst_stream(&header, payload, cb),
            frame_type::SETTINGS => self.parse_settings(&header, payload, cb),
            frame_type::PUSH_PROMISE => self.parse_push_promise(&header, payload, cb),
            frame_type::PING => self.parse_ping(&header, payload, cb),
            frame_type::GOAWAY => self.parse_goaway(&header, payload, cb),
            frame_type::WINDOW_UPDATE => self.parse_window_update(&header, payload, cb),
            frame_type::CONTINUATION => self.append_header_fragment(&header, payload, cb),
            other => {
                // Implementations MUST ignore and discard unknown frame types
                debug!("skipping unknown frame type={other} len={}", payload.len());
                Ok(())
            }
        };

        self.expected_continuation_stream =
            if frame::affects_compression(header.frame_type) && !header.is_end_headers() {
                header.stream_id
            } else {
                0
            };
        result
    }

    fn parse_data(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        trace!("parsing DATA frame for stream={}", header.stream_id);
        if header.stream_id == 0 {
            return Err(error_code::PROTOCOL_ERROR);
        }
        let data = frame::parse_data(header, payload)?;
        cb.on_body(header.stream_id, data);
        if header.is_end_stream() {
            cb.on_message_complete(header.stream_id, false);
        }
        Ok(())
    }

    fn parse_headers(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        trace!("parsing HEADERS frame for stream={}", header.stream_id);
        if header.stream_id == 0 {
            return Err(error_code::PROTOCOL_ERROR);
        }
        let (priority, fragment) = frame::parse_headers(header, payload)?;
        if let Some(priority) = priority {
            trace!(
                "stream={} depends on stream={} weight={}",
                header.stream_id,
                priority.dependency,
                priority.weight
            );
        }
        match self.direction {
            Direction::Downstream => self.check_new_stream(header.stream_id)?,
            Direction::Upstream => {
                if header.stream_id & 0x1 == 0 {
                    debug!("invalid HEADERS(reply) stream={}", header.stream_id);
                    return Err(error_code::PROTOCOL_ERROR);
                }
            }
        }
        if self.closing == ClosingState::Closed {
            debug!(
                "dropping HEADERS after final GOAWAY, stream={}",
                header.stream_id
            );
            return Ok(());
        }
        self.block_info = Some(HeaderBlockInfo {
            stream: header.stream_id,
            assoc_stream: 0,
            end_stream: header.is_end_stream(),
        });
        self.append_header_fragment(header, fragment, cb)
    }

    fn parse_push_promise(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        if self.direction != Direction::Upstream {
            debug!("received PUSH_PROMISE on downstream codec");
            return Err(error_code::PROTOCOL_ERROR);
        }
        if self.egress_settings.get_or(settings_id::ENABLE_PUSH, 0) != 1 {
            debug!("received PUSH_PROMISE with push disabled");
            return Err(error_code::PROTOCOL_ERROR);
        }
        if header.stream_id == 0 {
            return Err(error_code::PROTOCOL_ERROR);
        }
        trace!("parsing PUSH_PROMISE frame for stream={}", header.stream_id);
        let (promised_stream, fragment) = frame::parse_push_promise(header, payload)?;
        self.check_new_stream(promised_stream)?;
        if self.closing == ClosingState::Closed {
            debug!(
                "dropping PUSH_PROMISE after final GOAWAY, stream={}",
                header.stream_id
            );
            return Ok(());
        }
        self.block_info = Some(HeaderBlockInfo {
            stream: promised_stream,
            assoc_stream: header.stream_id,
            end_stream: false,
        });
        self.append_header_fragment(header, fragment, cb)
    }

    /// Accumulate one header-block fragment; decode and verify once
    /// END_HEADERS arrives.
    fn append_header_fragment(
        &mut self,
        header: &FrameHeader,
        fragment: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        if self.block_info.is_none() {
            // The opening frame was dropped after the final GOAWAY; swallow
            // the rest of its block the same way.
            if header.is_end_headers() {
                self.header_block.clear();
            }
            return Ok(());
        }
        if self.header_block.len() + fragment.len() > MAX_HEADER_BLOCK_SIZE {
            warn!(
                "header block for stream={} exceeds {MAX_HEADER_BLOCK_SIZE} bytes",
                header.stream_id
            );
            return Err(error_code::ENHANCE_YOUR_CALM);
        }
        self.header_block.extend_from_slice(fragment);
        if !header.is_end_headers() {
            return Ok(());
        }

        let info = self.block_info.take().unwrap_or(HeaderBlockInfo {
            stream: header.stream_id,
            assoc_stream: 0,
            end_stream: false,
        });
        let block = std::mem::take(&mut self.header_block);
        let headers = match self.hpack_decoder.decode(&block) {
            Ok(headers) => headers,
            Err(err) => {
                debug!(
                    "failed decoding header block for stream={}: {err}",
                    info.stream
                );
                return Err(error_code::COMPRESSION_ERROR);
            }
        };

        let is_request = self.direction == Direction::Downstream || info.assoc_stream != 0;
        match parse_header_list(headers, is_request) {
            Ok(msg) => {
                if info.assoc_stream != 0 {
                    cb.on_push_message_begin(info.stream, info.assoc_stream);
                } else {
                    cb.on_message_begin(info.stream);
                }
                cb.on_headers_complete(info.stream, msg);
                if info.end_stream {
                    cb.on_message_complete(info.stream, false);
                }
            }
            Err(reason) => {
                debug!("stream={} malformed header block: {reason}", info.stream);
                cb.on_error(info.stream, CodecError::stream(400, reason), true);
            }
        }
        Ok(())
    }

    fn parse_priority(&mut self, header: &FrameHeader, payload: &[u8]) -> Result<(), u32> {
        if header.stream_id == 0 {
            return Err(error_code::PROTOCOL_ERROR);
        }
        let priority = frame::parse_priority(payload)?;
        // Parsed for wire correctness; prioritization is not acted on here.
        trace!(
            "ignoring PRIORITY for stream={}: dependency={} weight={}",
            header.stream_id,
            priority.dependency,
            priority.weight
        );
        Ok(())
    }

    fn parse_rst_stream(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        if header.stream_id == 0 {
            return Err(error_code::PROTOCOL_ERROR);
        }
        let code = frame::parse_rst_stream(payload)?;
        debug!(
            "stream={} reset with {}",
            header.stream_id,
            error_code::name(code)
        );
        cb.on_abort(header.stream_id, code);
        Ok(())
    }

    fn parse_settings(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        if header.stream_id != 0 {
            return Err(error_code::PROTOCOL_ERROR);
        }
        if header.is_ack() {
            if !payload.is_empty() {
                return Err(error_code::FRAME_SIZE_ERROR);
            }
            cb.on_settings_ack();
            return Ok(());
        }
        let pairs = frame::parse_settings(payload)?;
        let mut applied = Vec::with_capacity(pairs.len());
        for (id, value) in pairs {
            settings::validate_received(id, value).map_err(|code| {
                debug!("invalid setting id={id} value={value}");
                code
            })?;
            if id == settings_id::HEADER_TABLE_SIZE {
                debug!("setting header codec table size={value}");
                self.hpack_encoder.set_table_size(value);
            }
            self.ingress_settings.set(id, value);
            applied.push((id, value));
        }
        debug!("applied {} settings", applied.len());
        cb.on_settings(&applied);
        Ok(())
    }

    fn parse_ping(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        if header.stream_id != 0 {
            return Err(error_code::PROTOCOL_ERROR);
        }
        let opaque = frame::parse_ping(payload)?;
        if header.is_ack() {
            cb.on_ping_reply(opaque);
        } else {
            cb.on_ping_request(opaque);
        }
        Ok(())
    }

    fn parse_goaway(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        if header.stream_id != 0 {
            return Err(error_code::PROTOCOL_ERROR);
        }
        let (last_stream, code) = frame::parse_goaway(payload)?;
        if last_stream < self.ingress_goaway_ack {
            self.ingress_goaway_ack = last_stream;
            debug!(
                "peer going away, last_stream={last_stream} code={}",
                error_code::name(code)
            );
            cb.on_goaway(last_stream, code);
        } else {
            warn!("received multiple GOAWAY with increasing last stream");
        }
        Ok(())
    }

    fn parse_window_update(
        &mut self,
        header: &FrameHeader,
        payload: &[u8],
        cb: &mut dyn CodecCallbacks,
    ) -> Result<(), u32> {
        let delta = frame::parse_window_update(payload)?;
        if delta == 0 {
            if header.stream_id == 0 {
                debug!("zero window update delta on connection");
                return Err(error_code::PROTOCOL_ERROR);
            }
            // Stream-level zero delta: dropped here, the session may choose
            // to reset the stream.
            warn!(
                "dropping zero window update delta for stream={}",
                header.stream_id
            );
            return Ok(());
        }
        cb.on_window_update(header.stream_id, delta);
        Ok(())
    }

    /// A peer-opened stream id must be non-zero, never go backwards, and
    /// carry the parity opposite to our egress parity.
    fn check_new_stream(&mut self, stream_id: u32) -> Result<(), u32> {
        if stream_id == 0 || stream_id < self.last_ingress_stream {
            debug!("invalid new stream={stream_id}");
            return Err(error_code::PROTOCOL_ERROR);
        }
        self.last_ingress_stream = stream_id;
        let odd = stream_id & 0x1 == 1;
        let peer_initiates_even = self.direction == Direction::Upstream;
        if odd == peer_initiates_even {
            debug!("invalid new stream={stream_id}");
            return Err(error_code::PROTOCOL_ERROR);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Egress
    // ------------------------------------------------------------------

    /// Allocate the next locally initiated stream id: odd for upstream, even
    /// for downstream, always increasing.
    pub fn create_stream(&mut self) -> u32 {
        let id = self.next_egress_stream;
        self.next_egress_stream += 2;
        id
    }

    /// Write the 24-byte connection preface. Only the client side sends it.
    pub fn generate_connection_preface(&self, out: &mut Vec<u8>) -> usize {
        match self.direction {
            Direction::Upstream => {
                out.extend_from_slice(CONNECTION_PREFACE);
                CONNECTION_PREFACE.len()
            }
            Direction::Downstream => 0,
        }
    }

    /// Encode `msg`'s headers and write them as a HEADERS (or PUSH_PROMISE,
    /// when `assoc_stream != 0`) frame plus any CONTINUATIONs. Returns the
    /// HPACK-encoded length of the header block.
    pub fn generate_header(
        &mut self,
        out: &mut Vec<u8>,
        stream: u32,
        msg: &HttpMessage,
        assoc_stream: u32,
    ) -> usize {
        debug!(
            "generating {} for stream={stream}",
            if assoc_stream != 0 { "PUSH_PROMISE" } else { "HEADERS" }
        );
        let mut all_headers = Vec::with_capacity(msg.headers().len() + 4);
        if msg.is_request() {
            debug_assert!(
                self.direction == Direction::Upstream || assoc_stream != 0,
                "requests egress on upstream codecs or as push promises"
            );
            all_headers.push(Header::new(":method", msg.method().unwrap_or("")));
            all_headers.push(Header::new(
                ":scheme",
                if msg.is_secure() { "https" } else { "http" },
            ));
            all_headers.push(Header::new(":path", msg.url().unwrap_or("")));
            if let Some(host) = msg.headers().get("host") {
                all_headers.push(Header::new(":authority", host));
            }
        } else {
            debug_assert!(self.direction == Direction::Downstream);
            all_headers.push(Header::new(
                ":status",
                msg.status_code().unwrap_or(200).to_string(),
            ));
        }

        // Skip per-hop headers that have no meaning in HTTP/2; host already
        // egressed as :authority.
        for (name, value) in msg.headers().iter() {
            if name.is_empty() || name.starts_with(':') {
                debug_assert!(!name.is_empty(), "empty header name");
                debug_assert!(!name.starts_with(':'), "invalid header={name}");
                continue;
            }
            if is_per_hop(name) {
                continue;
            }
            debug_assert!(
                !name.eq_ignore_ascii_case("te") || value == "trailers",
                "te header must be 'trailers'"
            );
            all_headers.push(Header::new(name, value));
        }

        let encoded = self.hpack_encoder.encode(&all_headers);
        let encoded_size = self.hpack_encoder.encoded_size();
        let split = self.header_split_size();

        let chunks = encoded.chunks(split);
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.enumerate() {
            let end_headers = i == last;
            if i == 0 {
                if assoc_stream != 0 {
                    debug_assert!(self.direction == Direction::Downstream);
                    frame::write_push_promise(out, assoc_stream, stream, chunk, end_headers);
                } else {
                    frame::write_headers(out, stream, chunk, end_headers);
                }
            } else {
                trace!("generating CONTINUATION for stream={stream}");
                frame::write_continuation(out, stream, chunk, end_headers);
            }
        }
        encoded_size
    }

    /// Write `data` as DATA frames no larger than the peer's MAX_FRAME_SIZE.
    /// END_STREAM is set on the final frame only when `eom`.
    pub fn generate_body(
        &mut self,
        out: &mut Vec<u8>,
        stream: u32,
        mut data: &[u8],
        eom: bool,
    ) -> usize {
        let max = self.max_send_frame_size();
        let mut written = 0;
        while data.len() > max {
            let (chunk, rest) = data.split_at(max);
            written += frame::write_data(out, stream, chunk, false);
            data = rest;
        }
        written + frame::write_data(out, stream, data, eom)
    }

    /// Write an empty DATA frame carrying END_STREAM.
    pub fn generate_eom(&mut self, out: &mut Vec<u8>, stream: u32) -> usize {
        trace!("sending EOM for stream={stream}");
        frame::write_data(out, stream, &[], true)
    }

    pub fn generate_rst_stream(&mut self, out: &mut Vec<u8>, stream: u32, code: u32) -> usize {
        debug!(
            "sending RST_STREAM for stream={stream} with {}",
            error_code::name(code)
        );
        frame::write_rst_stream(out, stream, code)
    }

    /// Drive the graceful-shutdown state machine and write the GOAWAY frame.
    /// Once closed, further calls write nothing and return 0.
    pub fn generate_goaway(&mut self, out: &mut Vec<u8>, last_stream: u32, code: u32) -> usize {
        debug_assert!(
            last_stream <= self.egress_goaway_ack,
            "cannot increase last good stream"
        );
        self.egress_goaway_ack = self.egress_goaway_ack.min(last_stream);
        match self.closing {
            ClosingState::Closed => {
                debug!("not sending GOAWAY for closed session");
                return 0;
            }
            ClosingState::Open => {
                self.closing = if last_stream == i32::MAX as u32 && code == error_code::NO_ERROR {
                    // Graceful drain probe: announce intent, keep accepting
                    ClosingState::FirstGoawaySent
                } else {
                    ClosingState::Closed
                };
            }
            ClosingState::FirstGoawaySent => {
                self.closing = ClosingState::Closed;
            }
        }
        debug!(
            "sending GOAWAY with last_stream={last_stream} code={}",
            error_code::name(code)
        );
        frame::write_goaway(out, last_stream, code)
    }

    /// Write a PING request with fresh random opaque data.
    pub fn generate_ping_request(&mut self, out: &mut Vec<u8>) -> usize {
        let opaque = rand::rng().random::<u64>();
        trace!("generating ping request with opaque={opaque}");
        frame::write_ping(out, opaque, false)
    }

    /// Echo a PING request's opaque data with the ACK flag.
    pub fn generate_ping_reply(&mut self, out: &mut Vec<u8>, opaque: u64) -> usize {
        trace!("generating ping reply with opaque={opaque}");
        frame::write_ping(out, opaque, true)
    }

    /// Serialize every explicitly set egress setting. Advertising
    /// HEADER_TABLE_SIZE also resizes the HPACK decoder's table cap.
    pub fn generate_settings(&mut self, out: &mut Vec<u8>) -> usize {
        let entries: Vec<(u16, u32)> = self.egress_settings.iter().collect();
        for &(id, value) in &entries {
            if id == settings_id::HEADER_TABLE_SIZE {
                self.hpack_decoder.set_max_table_size(value);
            }
        }
        debug!("generating {} settings", entries.len());
        frame::write_settings(out, &entries)
    }

    pub fn generate_settings_ack(&mut self, out: &mut Vec<u8>) -> usize {
        trace!("generating settings ack");
        frame::write_settings_ack(out)
    }

    pub fn generate_window_update(
        &mut self,
        out: &mut Vec<u8>,
        stream: u32,
        delta: u32,
    ) -> usize {
        trace!("generating window update for stream={stream}: {delta} bytes");
        frame::write_window_update(out, stream, delta)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Whether new transactions may still be started on this connection.
    pub fn is_reusable(&self) -> bool {
        (self.closing == ClosingState::Open
            || (self.direction == Direction::Downstream && self.is_waiting_to_drain()))
            && self.ingress_goaway_ack == u32::MAX
    }

    /// Whether we sent the graceful-drain GOAWAY and await its follow-up.
    pub fn is_waiting_to_drain(&self) -> bool {
        self.closing == ClosingState::FirstGoawaySent
    }
}

fn is_per_hop(name: &str) -> bool {
    const PER_HOP: [&str; 6] = [
        "connection",
        "host",
        "keep-alive",
        "proxy-connection",
        "transfer-encoding",
        "upgrade",
    ];
    PER_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NoopCallbacks;

    #[derive(Debug, Default)]
    struct Recorder {
        bodies: Vec<(u32, Vec<u8>)>,
        completed: Vec<u32>,
        settings: Vec<Vec<(u16, u32)>>,
        errors: Vec<(u32, CodecError, bool)>,
    }

    impl CodecCallbacks for Recorder {
        fn on_body(&mut self, stream: u32, data: &[u8]) {
            self.bodies.push((stream, data.to_vec()));
        }
        fn on_message_complete(&mut self, stream: u32, _upgrade: bool) {
            self.completed.push(stream);
        }
        fn on_settings(&mut self, settings: &[(u16, u32)]) {
            self.settings.push(settings.to_vec());
        }
        fn on_error(&mut self, stream: u32, error: CodecError, new_txn: bool) {
            self.errors.push((stream, error, new_txn));
        }
    }

    #[test]
    fn test_create_stream_ids() {
        let mut upstream = Http2Codec::new(Direction::Upstream);
        assert_eq!(upstream.create_stream(), 1);
        assert_eq!(upstream.create_stream(), 3);
        assert_eq!(upstream.create_stream(), 5);

        let mut downstream = Http2Codec::new(Direction::Downstream);
        assert_eq!(downstream.create_stream(), 2);
        assert_eq!(downstream.create_stream(), 4);
    }

    #[test]
    fn test_upstream_skips_preface_phase() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut cb = Recorder::default();

        // DATA frame straight away, no preface
        let mut buf = Vec::new();
        frame::write_data(&mut buf, 1, b"hello", true);
        let consumed = codec.feed(&buf, &mut cb);

        assert_eq!(consumed, buf.len());
        assert_eq!(cb.bodies, vec![(1, b"hello".to_vec())]);
        assert_eq!(cb.completed, vec![1]);
    }

    #[test]
    fn test_preface_mismatch_is_connection_error() {
        let mut codec = Http2Codec::new(Direction::Downstream);
        let mut cb = Recorder::default();

        let consumed = codec.feed(b"POST * HTTP/2.0\r\n\r\nSM\r\n\r\n", &mut cb);

        assert_eq!(consumed, 24);
        assert_eq!(
            cb.errors,
            vec![(0, CodecError::connection(error_code::PROTOCOL_ERROR), false)]
        );
        // Codec is dead: nothing further is consumed
        assert_eq!(codec.feed(&[0, 0, 0, 4, 0, 0, 0, 0, 0], &mut cb), 0);
    }

    #[test]
    fn test_partial_units_consume_nothing() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut cb = Recorder::default();

        let mut buf = Vec::new();
        frame::write_data(&mut buf, 1, b"hello", true);

        assert_eq!(codec.feed(&buf[..5], &mut cb), 0); // partial header
        assert_eq!(codec.feed(&buf[..11], &mut cb), 9); // header, partial payload
        assert_eq!(codec.feed(&buf[9..], &mut cb), 5); // payload
        assert_eq!(cb.bodies, vec![(1, b"hello".to_vec())]);
    }

    #[test]
    fn test_oversized_frame_is_frame_size_error() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut cb = Recorder::default();
        codec.egress_settings_mut().set(settings_id::MAX_FRAME_SIZE, 16_384);

        // Announce a 16385-byte DATA payload
        let header = [0x00, 0x40, 0x01, 0x0, 0x0, 0, 0, 0, 1];
        codec.feed(&header, &mut cb);

        assert_eq!(
            cb.errors,
            vec![(0, CodecError::connection(error_code::FRAME_SIZE_ERROR), false)]
        );
    }

    #[test]
    fn test_frame_at_exactly_max_size_accepted() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut cb = Recorder::default();

        let payload = vec![0xab; 16_384];
        let mut buf = Vec::new();
        frame::write_data(&mut buf, 1, &payload, false);
        let consumed = codec.feed(&buf, &mut cb);

        assert_eq!(consumed, buf.len());
        assert!(cb.errors.is_empty());
        assert_eq!(cb.bodies[0].1.len(), 16_384);
    }

    #[test]
    fn test_goaway_state_machine() {
        let mut codec = Http2Codec::new(Direction::Downstream);
        let mut out = Vec::new();

        assert!(codec.is_reusable());
        assert!(!codec.is_waiting_to_drain());

        // Graceful probe
        let written = codec.generate_goaway(&mut out, i32::MAX as u32, error_code::NO_ERROR);
        assert!(written > 0);
        assert!(codec.is_waiting_to_drain());
        assert!(codec.is_reusable()); // downstream drains gracefully

        // Final goaway
        let written = codec.generate_goaway(&mut out, 17, error_code::NO_ERROR);
        assert!(written > 0);
        assert!(!codec.is_waiting_to_drain());
        assert!(!codec.is_reusable());

        // Closed: nothing further is emitted
        let len_before = out.len();
        assert_eq!(codec.generate_goaway(&mut out, 17, error_code::NO_ERROR), 0);
        assert_eq!(out.len(), len_before);
    }

    #[test]
    fn test_immediate_goaway_closes() {
        let mut codec = Http2Codec::new(Direction::Downstream);
        let mut out = Vec::new();

        codec.generate_goaway(&mut out, 5, error_code::PROTOCOL_ERROR);
        assert!(!codec.is_reusable());
        assert!(!codec.is_waiting_to_drain());
    }

    #[test]
    fn test_upstream_not_reusable_while_draining() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut out = Vec::new();

        codec.generate_goaway(&mut out, i32::MAX as u32, error_code::NO_ERROR);
        assert!(codec.is_waiting_to_drain());
        assert!(!codec.is_reusable());
    }

    #[test]
    fn test_ingress_goaway_clears_reusability() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut cb = Recorder::default();

        let mut buf = Vec::new();
        frame::write_goaway(&mut buf, 3, error_code::NO_ERROR);
        codec.feed(&buf, &mut cb);

        assert!(!codec.is_reusable());
    }

    #[test]
    fn test_settings_applied_to_registry() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut cb = Recorder::default();

        let mut buf = Vec::new();
        frame::write_settings(
            &mut buf,
            &[(settings_id::MAX_FRAME_SIZE, 32_768), (settings_id::ENABLE_PUSH, 0)],
        );
        codec.feed(&buf, &mut cb);

        assert_eq!(
            codec.ingress_settings().get(settings_id::MAX_FRAME_SIZE),
            Some(32_768)
        );
        assert_eq!(codec.ingress_settings().get(settings_id::ENABLE_PUSH), Some(0));
        // Callback list preserves frame order
        assert_eq!(
            cb.settings,
            vec![vec![(settings_id::MAX_FRAME_SIZE, 32_768), (settings_id::ENABLE_PUSH, 0)]]
        );
    }

    #[test]
    fn test_body_split_respects_peer_max_frame_size() {
        let mut codec = Http2Codec::new(Direction::Downstream);
        let mut cb = NoopCallbacks;

        // Peer announces its max frame size
        let mut settings_frame = Vec::new();
        frame::write_settings(&mut settings_frame, &[(settings_id::MAX_FRAME_SIZE, 16_384)]);
        let mut buf = CONNECTION_PREFACE.to_vec();
        buf.extend_from_slice(&settings_frame);
        codec.feed(&buf, &mut cb);

        let mut out = Vec::new();
        codec.generate_body(&mut out, 2, &vec![0u8; 40_000], true);

        // 40000 bytes at <=16384 per frame = 3 DATA frames
        let mut offset = 0;
        let mut frames = Vec::new();
        while offset < out.len() {
            let header = FrameHeader::parse(&out[offset..]).unwrap();
            frames.push((header.length, header.is_end_stream()));
            offset += FRAME_HEADER_SIZE + header.length as usize;
        }
        assert_eq!(
            frames,
            vec![(16_384, false), (16_384, false), (7_232, true)]
        );
    }

    #[test]
    fn test_generate_eom_is_empty_end_stream_data() {
        let mut codec = Http2Codec::new(Direction::Downstream);
        let mut out = Vec::new();
        codec.generate_eom(&mut out, 2);

        let header = FrameHeader::parse(&out).unwrap();
        assert_eq!(header.frame_type, frame_type::DATA);
        assert_eq!(header.length, 0);
        assert!(header.is_end_stream());
    }

    #[test]
    fn test_generate_connection_preface_by_direction() {
        let mut out = Vec::new();
        assert_eq!(
            Http2Codec::new(Direction::Upstream).generate_connection_preface(&mut out),
            24
        );
        assert_eq!(out, CONNECTION_PREFACE);

        out.clear();
        assert_eq!(
            Http2Codec::new(Direction::Downstream).generate_connection_preface(&mut out),
            0
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_generate_ping_request_shape() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut out = Vec::new();
        assert_eq!(codec.generate_ping_request(&mut out), 17);

        let header = FrameHeader::parse(&out).unwrap();
        assert_eq!(header.frame_type, frame_type::PING);
        assert_eq!(header.length, 8);
        assert!(!header.is_ack());
        assert_eq!(header.stream_id, 0);
    }

    #[test]
    fn test_window_update_zero_delta_on_stream_dropped() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut cb = Recorder::default();

        let mut buf = Vec::new();
        frame::write_window_update(&mut buf, 5, 0);
        let consumed = codec.feed(&buf, &mut cb);

        assert_eq!(consumed, buf.len());
        assert!(cb.errors.is_empty());

        // But on stream 0 it is a connection error
        buf.clear();
        frame::write_window_update(&mut buf, 0, 0);
        codec.feed(&buf, &mut cb);
        assert_eq!(
            cb.errors,
            vec![(0, CodecError::connection(error_code::PROTOCOL_ERROR), false)]
        );
    }

    #[test]
    fn test_settings_ack_with_payload_rejected() {
        let mut codec = Http2Codec::new(Direction::Upstream);
        let mut cb = Recorder::default();

        // SETTINGS ACK with 6 payload bytes
        let buf = [0, 0, 6, 4, 1, 0, 0, 0, 0, 0, 2, 0, 0, 0, 1];
        codec.feed(&buf, &mut cb);

        assert_eq!(
            cb.errors,
            vec![(0, CodecError::connection(error_code::FRAME_SIZE_ERROR), false)]
        );
    }
}
