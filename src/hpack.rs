//! HPACK: Header Compression for HTTP/2 (RFC 7541)
//!
//! Thin wrapper around `fluke-hpack` providing the [`Header`] type and the
//! decoder/encoder interfaces the codec drives: block decode/encode, dynamic
//! table sizing, and the encoded length of the last header block.

use thiserror::Error;

/// A single (name, value) header pair as it crosses the HPACK boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A header block failed to decompress. Always fatal for the connection:
/// the dynamic tables on both sides are out of sync once this happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("hpack decode failed: {0}")]
pub struct HpackError(pub String);

/// HPACK decoder for HTTP/2 header blocks.
/// Wraps `fluke_hpack::Decoder` which maintains dynamic table state
/// per-connection.
pub struct HpackDecoder {
    inner: fluke_hpack::Decoder<'static>,
}

impl std::fmt::Debug for HpackDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackDecoder").finish()
    }
}

impl Default for HpackDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackDecoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Decoder::new(),
        }
    }

    /// Decode an HPACK-encoded header block into header pairs.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Header>, HpackError> {
        let pairs = self
            .inner
            .decode(data)
            .map_err(|e| HpackError(format!("{e:?}")))?;
        Ok(pairs
            .into_iter()
            .map(|(name, value)| {
                Header::new(
                    String::from_utf8_lossy(&name).into_owned(),
                    String::from_utf8_lossy(&value).into_owned(),
                )
            })
            .collect())
    }

    /// Cap the dynamic table size this decoder will allow the peer's encoder
    /// to use. Driven by the HEADER_TABLE_SIZE value we advertise.
    pub fn set_max_table_size(&mut self, size: u32) {
        self.inner.set_max_allowed_table_size(size as usize);
    }
}

/// HPACK encoder for HTTP/2 header blocks.
/// Wraps `fluke_hpack::Encoder` which maintains dynamic table state
/// per-connection.
pub struct HpackEncoder {
    inner: fluke_hpack::Encoder<'static>,
    encoded_size: usize,
}

impl std::fmt::Debug for HpackEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackEncoder")
            .field("encoded_size", &self.encoded_size)
            .finish()
    }
}

impl Default for HpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackEncoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Encoder::new(),
            encoded_size: 0,
        }
    }

    /// Encode headers into an HPACK header block.
    pub fn encode(&mut self, headers: &[Header]) -> Vec<u8> {
        let pairs: Vec<(&[u8], &[u8])> = headers
            .iter()
            .map(|h| (h.name.as_bytes(), h.value.as_bytes()))
            .collect();
        let block = self.inner.encode(pairs);
        self.encoded_size = block.len();
        block
    }

    /// Compressed length of the most recent [`encode`](Self::encode) output.
    pub fn encoded_size(&self) -> usize {
        self.encoded_size
    }

    /// Resize the encoder's dynamic table. Driven by the peer's
    /// HEADER_TABLE_SIZE setting.
    pub fn set_table_size(&mut self, size: u32) {
        self.inner.set_max_table_size(size as usize);
    }
}
