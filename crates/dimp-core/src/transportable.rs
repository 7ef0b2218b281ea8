//! Wire-safe text encoding for binary payloads.
//!
//! Binary fields (file data, thumbnails, key material, signatures) travel as
//! standard base64. Decoding is lenient: padding may be missing, line breaks
//! are ignored and an RFC 2397 `data:` URI prefix is accepted.

use std::fmt;
use std::sync::OnceLock;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use bytes::Bytes;

use crate::error::{CoreError, Result};

/// Canonical encoder: standard alphabet, padded.
const CANONICAL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_encode_padding(true),
);

/// Lenient decoder: standard alphabet, padding optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode binary data into its wire form.
pub fn encode(data: &[u8]) -> String {
    CANONICAL.encode(data)
}

/// Decode the wire form back into binary data.
pub fn decode(text: &str) -> Result<Bytes> {
    let payload = strip_data_uri(text.trim())?;
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT
        .decode(compact)
        .map(Bytes::from)
        .map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Strip a `data:<mime>;base64,` prefix if present.
fn strip_data_uri(text: &str) -> Result<&str> {
    let Some(rest) = text.strip_prefix("data:") else {
        return Ok(text);
    };
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::DecodingError("data URI without payload".into()))?;
    if !header.ends_with(";base64") {
        return Err(CoreError::UnsupportedAlgorithm(format!(
            "data URI encoding `{header}`"
        )));
    }
    Ok(payload)
}

/// Binary data together with an optional media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportableData {
    data: Bytes,
    mime: Option<String>,
}

impl TransportableData {
    /// Wrap raw bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime: None,
        }
    }

    /// Attach a media type; the wire form becomes a `data:` URI.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Parse either plain base64 or a `data:` URI.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let mime = text
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime.to_string())
            .filter(|mime| !mime.is_empty());
        Ok(Self {
            data: decode(text)?,
            mime,
        })
    }

    /// The wire form.
    pub fn to_wire(&self) -> String {
        match &self.mime {
            Some(mime) => format!("data:{};base64,{}", mime, encode(&self.data)),
            None => encode(&self.data),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }
}

/// A binary field kept in wire form and decoded on first read.
///
/// The wire string is the source of truth. The decoded value (including a
/// failed or absent decode, cached as `None`) is memoized in a `OnceLock`, so
/// concurrent first reads at worst decode twice and never touch the wire field.
/// Setting a value rewrites the wire field immediately.
#[derive(Default)]
pub struct LazyBinary {
    wire: Option<String>,
    cache: OnceLock<Option<Bytes>>,
}

impl LazyBinary {
    /// Wrap a wire field as read from a record; nothing is decoded yet.
    pub fn from_wire(wire: Option<String>) -> Self {
        Self {
            wire,
            cache: OnceLock::new(),
        }
    }

    /// Build from a decoded value; the wire form is computed now.
    pub fn from_bytes(value: Option<Bytes>) -> Self {
        let mut lazy = Self::default();
        lazy.set(value);
        lazy
    }

    /// Read the decoded value, decoding the wire field on first access.
    pub fn get(&self) -> Option<&Bytes> {
        self.cache
            .get_or_init(|| {
                let wire = self.wire.as_deref()?;
                match decode(wire) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        tracing::debug!("undecodable binary field: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Replace the value. `None` clears the wire field.
    pub fn set(&mut self, value: Option<Bytes>) {
        self.wire = value.as_deref().map(encode);
        self.cache = OnceLock::new();
        // A fresh lock is never contended, so this cannot fail.
        let _ = self.cache.set(value);
    }

    /// The wire form, if any.
    pub fn wire(&self) -> Option<&str> {
        self.wire.as_deref()
    }

    /// Whether the wire field is present.
    pub fn is_present(&self) -> bool {
        self.wire.is_some()
    }

    /// Whether the decoded value is already memoized.
    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl Clone for LazyBinary {
    fn clone(&self) -> Self {
        let cache = OnceLock::new();
        if let Some(value) = self.cache.get() {
            let _ = cache.set(value.clone());
        }
        Self {
            wire: self.wire.clone(),
            cache,
        }
    }
}

/// Equality follows the wire field only; the cache carries no state of its own.
impl PartialEq for LazyBinary {
    fn eq(&self, other: &Self) -> bool {
        self.wire == other.wire
    }
}

impl fmt::Debug for LazyBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.wire {
            Some(wire) => write!(f, "LazyBinary({} chars)", wire.len()),
            None => write!(f, "LazyBinary(None)"),
        }
    }
}
