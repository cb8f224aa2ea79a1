//! Shared test harness: an event-recording callback sink and a session-style
//! feed buffer that re-presents unconsumed bytes.
#![allow(dead_code)]

use h2_wire::{CodecCallbacks, CodecError, Http2Codec, HttpMessage};

/// Every codec callback, reified for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    MessageBegin { stream: u32 },
    PushMessageBegin { promised: u32, assoc: u32 },
    HeadersComplete { stream: u32, msg: HttpMessage },
    Body { stream: u32, data: Vec<u8> },
    MessageComplete { stream: u32 },
    Settings(Vec<(u16, u32)>),
    SettingsAck,
    PingRequest(u64),
    PingReply(u64),
    Abort { stream: u32, code: u32 },
    Goaway { last_stream: u32, code: u32 },
    WindowUpdate { stream: u32, delta: u32 },
    Error { stream: u32, error: CodecError, new_txn: bool },
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoded messages, in arrival order.
    pub fn messages(&self) -> Vec<(u32, &HttpMessage)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::HeadersComplete { stream, msg } => Some((*stream, msg)),
                _ => None,
            })
            .collect()
    }

    /// Concatenated body bytes for `stream`.
    pub fn body(&self, stream: u32) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Body { stream: s, data } if *s == stream => Some(data.as_slice()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .concat()
    }

    pub fn errors(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Error { .. }))
            .collect()
    }

    pub fn completed_streams(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::MessageComplete { stream } => Some(*stream),
                _ => None,
            })
            .collect()
    }
}

impl CodecCallbacks for Recorder {
    fn on_message_begin(&mut self, stream: u32) {
        self.events.push(Event::MessageBegin { stream });
    }

    fn on_push_message_begin(&mut self, promised_stream: u32, assoc_stream: u32) {
        self.events.push(Event::PushMessageBegin {
            promised: promised_stream,
            assoc: assoc_stream,
        });
    }

    fn on_headers_complete(&mut self, stream: u32, msg: HttpMessage) {
        self.events.push(Event::HeadersComplete { stream, msg });
    }

    fn on_body(&mut self, stream: u32, data: &[u8]) {
        self.events.push(Event::Body {
            stream,
            data: data.to_vec(),
        });
    }

    fn on_message_complete(&mut self, stream: u32, _upgrade: bool) {
        self.events.push(Event::MessageComplete { stream });
    }

    fn on_settings(&mut self, settings: &[(u16, u32)]) {
        self.events.push(Event::Settings(settings.to_vec()));
    }

    fn on_settings_ack(&mut self) {
        self.events.push(Event::SettingsAck);
    }

    fn on_ping_request(&mut self, opaque: u64) {
        self.events.push(Event::PingRequest(opaque));
    }

    fn on_ping_reply(&mut self, opaque: u64) {
        self.events.push(Event::PingReply(opaque));
    }

    fn on_abort(&mut self, stream: u32, error_code: u32) {
        self.events.push(Event::Abort {
            stream,
            code: error_code,
        });
    }

    fn on_goaway(&mut self, last_stream: u32, error_code: u32) {
        self.events.push(Event::Goaway {
            last_stream,
            code: error_code,
        });
    }

    fn on_window_update(&mut self, stream: u32, delta: u32) {
        self.events.push(Event::WindowUpdate { stream, delta });
    }

    fn on_error(&mut self, stream: u32, error: CodecError, new_txn: bool) {
        self.events.push(Event::Error {
            stream,
            error,
            new_txn,
        });
    }
}

/// Session-style ingress buffer: collects transport chunks and re-presents
/// whatever the codec left unconsumed.
#[derive(Debug, Default)]
pub struct Feeder {
    pending: Vec<u8>,
}

impl Feeder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, codec: &mut Http2Codec, cb: &mut Recorder, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        let consumed = codec.feed(&self.pending, cb);
        self.pending.drain(..consumed);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
