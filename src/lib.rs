//! h2-wire: a sans-I/O HTTP/2 frame codec
//!
//! This crate implements a bidirectional, per-connection HTTP/2 protocol
//! engine: a streaming frame parser that turns wire bytes into semantic
//! events, and a family of frame emitters that produce byte-exact RFC 7540
//! output. It owns no sockets and spawns no tasks; any transport (blocking,
//! async, WASM, test harness) can drive it.
//!
//! # Features
//!
//! - **Sans-I/O design**: no async runtime dependencies (no tokio)
//! - **RFC 7540 compliant**: DATA, HEADERS, PRIORITY, RST_STREAM, SETTINGS,
//!   PUSH_PROMISE, PING, GOAWAY, WINDOW_UPDATE, CONTINUATION
//! - **HPACK support**: header compression via fluke-hpack, with
//!   CONTINUATION reassembly and full pseudo-header verification
//! - **Connection lifecycle**: preface checking, settings registries,
//!   graceful double-GOAWAY shutdown, stream-id allocation
//!
//! # Quick start
//!
//! ```rust
//! use h2_wire::{CodecCallbacks, Direction, Http2Codec, HttpMessage};
//!
//! #[derive(Default)]
//! struct Session {
//!     requests: Vec<(u32, HttpMessage)>,
//! }
//!
//! impl CodecCallbacks for Session {
//!     fn on_headers_complete(&mut self, stream: u32, msg: HttpMessage) {
//!         self.requests.push((stream, msg));
//!     }
//! }
//!
//! // A client encodes a request...
//! let mut client = Http2Codec::new(Direction::Upstream);
//! let mut wire = Vec::new();
//! client.generate_connection_preface(&mut wire);
//! let stream = client.create_stream();
//! let mut msg = HttpMessage::request("GET", "/");
//! msg.headers_mut().add("host", "example.com");
//! client.generate_header(&mut wire, stream, &msg, 0);
//!
//! // ...and a server codec parses it back out.
//! let mut server = Http2Codec::new(Direction::Downstream);
//! let mut session = Session::default();
//! let consumed = server.feed(&wire, &mut session);
//!
//! assert_eq!(consumed, wire.len());
//! assert_eq!(session.requests.len(), 1);
//! assert_eq!(session.requests[0].1.method(), Some("GET"));
//! ```
//!
//! # Architecture
//!
//! Ingress flows one way: transport bytes → [`Http2Codec::feed`] → frame
//! codec → header-block reassembly → HPACK → pseudo-header verification →
//! [`CodecCallbacks`]. Egress mirrors it: a caller-supplied [`HttpMessage`]
//! is verified, HPACK-encoded, chunked into HEADERS/CONTINUATION frames, and
//! appended to a caller-owned buffer.
//!
//! It does NOT provide:
//! - TCP/UDP transport (you provide the bytes)
//! - TLS (use rustls or similar)
//! - Stream multiplexing, flow-control accounting, or prioritization
//!   (the owning session's responsibility)

pub mod callbacks;
pub mod codec;
pub mod error;
pub mod frame;
pub mod hpack;
pub mod message;
pub mod settings;
mod verifier;

pub use callbacks::{CodecCallbacks, NoopCallbacks};
pub use codec::{Direction, Http2Codec, MAX_HEADER_BLOCK_SIZE};
pub use error::CodecError;
pub use frame::{
    error_code, flags, frame_type, settings_id, FrameHeader, CONNECTION_PREFACE,
    FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD, MIN_MAX_FRAME_SIZE,
};
pub use hpack::{Header, HpackDecoder, HpackEncoder, HpackError};
pub use message::{Headers, HttpMessage};
pub use settings::SettingsRegistry;
