//! The semantic event surface of the codec.
//!
//! The owning session implements [`CodecCallbacks`] and passes it to
//! [`Http2Codec::feed`](crate::Http2Codec::feed). Every method defaults to a
//! no-op, so an implementation only overrides the events it cares about.
//!
//! For a single `feed` call, events fire in the order the frames appear on
//! the wire. Within one message the guaranteed prefix is `on_message_begin`
//! (or `on_push_message_begin`) → `on_headers_complete` → zero or more
//! `on_body` → at most one `on_message_complete`.

use crate::error::CodecError;
use crate::message::HttpMessage;

pub trait CodecCallbacks {
    /// A new ingress message is starting on `stream`.
    fn on_message_begin(&mut self, stream: u32) {
        let _ = stream;
    }

    /// The peer promised `promised_stream`, pushed in reply to
    /// `assoc_stream`.
    fn on_push_message_begin(&mut self, promised_stream: u32, assoc_stream: u32) {
        let _ = (promised_stream, assoc_stream);
    }

    /// The full header block for `stream` decoded and verified. Ownership of
    /// the message transfers to the callback.
    fn on_headers_complete(&mut self, stream: u32, msg: HttpMessage) {
        let _ = (stream, msg);
    }

    /// A chunk of body bytes for `stream`. The slice borrows from the `feed`
    /// input; copy it to keep it.
    fn on_body(&mut self, stream: u32, data: &[u8]) {
        let _ = (stream, data);
    }

    /// The peer finished its message on `stream` (END_STREAM).
    fn on_message_complete(&mut self, stream: u32, upgrade: bool) {
        let _ = (stream, upgrade);
    }

    /// A SETTINGS frame was applied; `settings` lists the validated
    /// (identifier, value) pairs in frame order.
    fn on_settings(&mut self, settings: &[(u16, u32)]) {
        let _ = settings;
    }

    /// The peer acknowledged our SETTINGS.
    fn on_settings_ack(&mut self) {}

    fn on_ping_request(&mut self, opaque: u64) {
        let _ = opaque;
    }

    fn on_ping_reply(&mut self, opaque: u64) {
        let _ = opaque;
    }

    /// The peer reset `stream` with `error_code` (RST_STREAM).
    fn on_abort(&mut self, stream: u32, error_code: u32) {
        let _ = (stream, error_code);
    }

    /// The peer is shutting the connection down; streams above `last_stream`
    /// will not be processed.
    fn on_goaway(&mut self, last_stream: u32, error_code: u32) {
        let _ = (last_stream, error_code);
    }

    /// The peer granted `delta` bytes of flow-control window on `stream`
    /// (0 for the connection window). Accounting is the session's job.
    fn on_window_update(&mut self, stream: u32, delta: u32) {
        let _ = (stream, delta);
    }

    /// A connection error (`stream == 0`, codec now unusable) or a stream
    /// error (`new_txn == true`, parsing continues).
    fn on_error(&mut self, stream: u32, error: CodecError, new_txn: bool) {
        let _ = (stream, error, new_txn);
    }
}

/// Callback set that ignores every event. Handy for driving the codec when
/// only its state transitions matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl CodecCallbacks for NoopCallbacks {}
