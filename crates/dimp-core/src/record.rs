//! Wire records: the attribute maps that carry content.
//!
//! A record is a JSON-compatible map with string keys. Field names are part of
//! the compatibility surface and are collected in [`keys`]. Records serialize
//! deterministically: the map keeps its keys sorted, so the same record always
//! produces the same JSON text and the same CBOR bytes.

use bytes::Bytes;
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::transportable;
use crate::types::{ContentType, Id};

/// An attribute map as it appears on the wire.
pub type Record = serde_json::Map<String, Value>;

/// Wire field names.
pub mod keys {
    // Envelope
    pub const TYPE: &str = "type";
    pub const SN: &str = "sn";
    pub const GROUP: &str = "group";
    pub const TIME: &str = "time";

    // Commands
    pub const COMMAND: &str = "command";
    pub const ID: &str = "ID";
    pub const META: &str = "meta";
    pub const PROFILE: &str = "profile";
    pub const DATA: &str = "data";
    pub const SIGNATURE: &str = "signature";
    pub const MESSAGE: &str = "message";
    pub const SESSION: &str = "session";
    pub const ENVELOPE: &str = "envelope";
    pub const SENDER: &str = "sender";
    pub const RECEIVER: &str = "receiver";

    // Group commands
    pub const MEMBER: &str = "member";
    pub const MEMBERS: &str = "members";
    pub const ADMINISTRATORS: &str = "administrators";
    pub const ASSISTANTS: &str = "assistants";

    // Text and files
    pub const TEXT: &str = "text";
    pub const FILENAME: &str = "filename";
    pub const URL: &str = "URL";
    pub const KEY: &str = "key";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const SNAPSHOT: &str = "snapshot";
    pub const ALGORITHM: &str = "algorithm";

    // Pages and money
    pub const TITLE: &str = "title";
    pub const DESC: &str = "desc";
    pub const ICON: &str = "icon";
    pub const CURRENCY: &str = "currency";
    pub const AMOUNT: &str = "amount";
}

/// Read the content type discriminator.
///
/// Any integer is a valid discriminator; types nobody registered decode as
/// generic content. Integral floats are accepted, fractions are not.
pub fn content_type(record: &Record) -> Result<ContentType> {
    match record.get(keys::TYPE) {
        None | Some(Value::Null) => Err(CoreError::missing(keys::TYPE)),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(ContentType(i));
            }
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| ContentType(f as i64))
                .ok_or_else(|| CoreError::wrong_shape(keys::TYPE, "an integer"))
        }
        Some(_) => Err(CoreError::wrong_shape(keys::TYPE, "an integer")),
    }
}

/// Read an optional string field.
pub fn get_str<'a>(record: &'a Record, key: &str) -> Result<Option<&'a str>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(CoreError::wrong_shape(key, "a string")),
    }
}

/// Read a required string field.
pub fn require_str<'a>(record: &'a Record, key: &str) -> Result<&'a str> {
    get_str(record, key)?.ok_or_else(|| CoreError::missing(key))
}

/// Read an optional owned string field.
pub fn get_string(record: &Record, key: &str) -> Result<Option<String>> {
    Ok(get_str(record, key)?.map(str::to_string))
}

/// Read an optional signed integer.
///
/// Peers written in dynamic languages send timestamps as floats; integral
/// parts of finite floats are accepted.
pub fn get_i64(record: &Record, key: &str) -> Result<Option<i64>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                Ok(Some(f.trunc() as i64))
            } else {
                Err(CoreError::wrong_shape(key, "an integer"))
            }
        }
        Some(_) => Err(CoreError::wrong_shape(key, "an integer")),
    }
}

/// Read an optional floating point number.
pub fn get_f64(record: &Record, key: &str) -> Result<Option<f64>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| CoreError::wrong_shape(key, "a number")),
        Some(_) => Err(CoreError::wrong_shape(key, "a number")),
    }
}

/// Read an optional identifier.
pub fn get_id(record: &Record, key: &str) -> Result<Option<Id>> {
    get_str(record, key)?.map(Id::parse).transpose()
}

/// Read a required identifier.
pub fn require_id(record: &Record, key: &str) -> Result<Id> {
    get_id(record, key)?.ok_or_else(|| CoreError::missing(key))
}

/// Read an optional list of identifiers, preserving order.
pub fn get_ids(record: &Record, key: &str) -> Result<Option<Vec<Id>>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Id::parse(s),
                _ => Err(CoreError::wrong_shape(key, "a list of identifiers")),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(CoreError::wrong_shape(key, "a list of identifiers")),
    }
}

/// Read an optional nested map.
pub fn get_map<'a>(record: &'a Record, key: &str) -> Result<Option<&'a Record>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(CoreError::wrong_shape(key, "a map")),
    }
}

/// Read an optional binary field from its wire-safe text form.
pub fn get_bytes(record: &Record, key: &str) -> Result<Option<Bytes>> {
    get_str(record, key)?.map(transportable::decode).transpose()
}

/// Insert a value only when present.
pub fn put_opt<T: Into<Value>>(record: &mut Record, key: &str, value: Option<T>) {
    if let Some(value) = value {
        record.insert(key.to_string(), value.into());
    }
}

/// Insert a list of identifiers.
pub fn put_ids(record: &mut Record, key: &str, ids: &[Id]) {
    let values = ids.iter().map(|id| Value::String(id.to_string())).collect();
    record.insert(key.to_string(), Value::Array(values));
}

/// Copy every field whose key is not listed in `known`.
///
/// Used to carry forward-compatible extension fields through a decode and
/// re-encode untouched.
pub fn extras(record: &Record, known: &[&[&str]]) -> Record {
    record
        .iter()
        .filter(|(k, _)| !known.iter().any(|set| set.contains(&k.as_str())))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Serialize a record to JSON text.
pub fn to_json(record: &Record) -> String {
    Value::Object(record.clone()).to_string()
}

/// Parse a record from JSON text.
pub fn from_json(text: &str) -> Result<Record> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CoreError::MalformedRecord("expected map".into())),
        Err(e) => Err(CoreError::DecodingError(e.to_string())),
    }
}

/// Serialize a record to CBOR bytes.
pub fn to_cbor(record: &Record) -> Vec<u8> {
    let mut buf = Vec::new();
    ciborium::into_writer(record, &mut buf).expect("CBOR serialization failed");
    buf
}

/// Parse a record from CBOR bytes.
pub fn from_cbor(bytes: &[u8]) -> Result<Record> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}
