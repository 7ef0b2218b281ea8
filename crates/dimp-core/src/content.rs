//! The content model.
//!
//! Every message payload is a [`Content`]: an [`Envelope`] (type, serial
//! number, optional group and time) plus the fields of one concrete variant.
//! Variants are plain values validated at construction; decoding an incoming
//! record and building the same content locally yield identical field sets.
//!
//! Fields a variant does not understand are kept in the envelope's `extra` map
//! and written back on encode, so forward-compatible records survive a
//! decode/re-encode cycle untouched.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::command::Command;
use crate::error::{CoreError, Result};
use crate::file::{AudioContent, FileContent, ImageContent, VideoContent};
use crate::group::GroupCommand;
use crate::record::{self, keys, Record};
use crate::registry;
use crate::transportable::LazyBinary;
use crate::types::{ContentType, Id};

/// Shared fields of every content.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub(crate) content_type: ContentType,
    pub(crate) sn: i64,
    pub(crate) group: Option<Id>,
    pub(crate) time: Option<i64>,
    pub(crate) extra: Record,
}

impl Envelope {
    /// Fields owned by the envelope.
    pub const FIELDS: &'static [&'static str] = &[keys::TYPE, keys::SN, keys::GROUP, keys::TIME];

    /// A fresh envelope: random serial number, stamped with the current time.
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            sn: random_serial_number(),
            group: None,
            time: Some(now()),
            extra: Record::new(),
        }
    }

    /// Read the envelope from a record.
    ///
    /// `fields` lists the keys the variant reads itself; everything else
    /// that is not an envelope field is kept as an extension field.
    pub fn parse(record: &Record, fields: &[&str]) -> Result<Self> {
        Ok(Self {
            content_type: record::content_type(record)?,
            sn: record::get_i64(record, keys::SN)?.ok_or_else(|| CoreError::missing(keys::SN))?,
            group: record::get_id(record, keys::GROUP)?,
            time: record::get_i64(record, keys::TIME)?,
            extra: record::extras(record, &[Self::FIELDS, fields]),
        })
    }

    /// Start a record with the envelope fields and the extension fields.
    pub fn to_record(&self) -> Record {
        let mut map = self.extra.clone();
        map.insert(keys::TYPE.into(), Value::from(self.content_type.raw()));
        map.insert(keys::SN.into(), Value::from(self.sn));
        record::put_opt(&mut map, keys::GROUP, self.group.as_ref().map(Id::to_string));
        record::put_opt(&mut map, keys::TIME, self.time);
        map
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn sn(&self) -> i64 {
        self.sn
    }

    pub fn group(&self) -> Option<&Id> {
        self.group.as_ref()
    }

    pub fn time(&self) -> Option<i64> {
        self.time
    }

    /// Extension fields carried through untouched.
    pub fn extra(&self) -> &Record {
        &self.extra
    }
}

/// Sender-assigned serial numbers are positive and fit in 32 bits.
fn random_serial_number() -> i64 {
    rand::thread_rng().gen_range(1..=i64::from(u32::MAX))
}

/// Current time in seconds since the Unix epoch.
pub(crate) fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Builder methods shared by every outbound constructor.
macro_rules! envelope_builders {
    ($($ty:ty),* $(,)?) => {$(
        impl $ty {
            /// Address this content to a group.
            pub fn with_group(mut self, group: $crate::types::Id) -> Self {
                self.envelope.group = Some(group);
                self
            }

            /// Override the serial number.
            pub fn with_sn(mut self, sn: i64) -> Self {
                self.envelope.sn = sn;
                self
            }

            /// Override the timestamp.
            pub fn with_time(mut self, time: i64) -> Self {
                self.envelope.time = Some(time);
                self
            }
        }
    )*};
}
pub(crate) use envelope_builders;

/// A concrete variant that maps to and from a wire record.
pub trait WireContent: Sized {
    /// Keys this variant reads beyond the envelope.
    const FIELDS: &'static [&'static str];

    /// Decode from a record, validating required fields.
    fn from_record(record: &Record) -> Result<Self>;

    /// Encode to a record.
    fn to_record(&self) -> Record;

    fn envelope(&self) -> &Envelope;
}

/// Content defined outside this crate and installed through the registry.
pub trait CustomContent: fmt::Debug + Send + Sync {
    fn envelope(&self) -> &Envelope;

    fn to_record(&self) -> Record;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

impl PartialEq for dyn CustomContent {
    fn eq(&self, other: &Self) -> bool {
        self.to_record() == other.to_record()
    }
}

/// One message payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(TextContent),
    File(FileContent),
    Image(ImageContent),
    Audio(AudioContent),
    Video(VideoContent),
    Page(PageContent),
    Money(MoneyContent),
    Command(Command),
    /// Installed by an extension.
    Custom(Arc<dyn CustomContent>),
    /// A type this build does not know.
    Generic(GenericContent),
}

impl Content {
    /// Decode a record with the process-wide registry.
    pub fn from_record(record: &Record) -> Result<Self> {
        registry::global().decode(record)
    }

    /// Decode JSON text with the process-wide registry.
    pub fn from_json(text: &str) -> Result<Self> {
        registry::global().decode_json(text)
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            Content::Text(c) => c.envelope(),
            Content::File(c) => c.envelope(),
            Content::Image(c) => c.envelope(),
            Content::Audio(c) => c.envelope(),
            Content::Video(c) => c.envelope(),
            Content::Page(c) => c.envelope(),
            Content::Money(c) => c.envelope(),
            Content::Command(c) => c.envelope(),
            Content::Custom(c) => c.envelope(),
            Content::Generic(c) => c.envelope(),
        }
    }

    pub fn to_record(&self) -> Record {
        match self {
            Content::Text(c) => c.to_record(),
            Content::File(c) => c.to_record(),
            Content::Image(c) => c.to_record(),
            Content::Audio(c) => c.to_record(),
            Content::Video(c) => c.to_record(),
            Content::Page(c) => c.to_record(),
            Content::Money(c) => c.to_record(),
            Content::Command(c) => c.to_record(),
            Content::Custom(c) => c.to_record(),
            Content::Generic(c) => c.to_record(),
        }
    }

    pub fn to_json(&self) -> String {
        record::to_json(&self.to_record())
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        record::to_cbor(&self.to_record())
    }

    pub fn content_type(&self) -> ContentType {
        self.envelope().content_type()
    }

    pub fn sn(&self) -> i64 {
        self.envelope().sn()
    }

    pub fn group(&self) -> Option<&Id> {
        self.envelope().group()
    }

    pub fn time(&self) -> Option<i64> {
        self.envelope().time()
    }

    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Content::Command(command) => Some(command),
            _ => None,
        }
    }

    pub fn as_group_command(&self) -> Option<&GroupCommand> {
        match self {
            Content::Command(Command::Group(command)) => Some(command),
            _ => None,
        }
    }
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = Record::deserialize(deserializer)?;
        registry::global()
            .decode(&record)
            .map_err(serde::de::Error::custom)
    }
}

macro_rules! content_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {$(
        impl From<$ty> for Content {
            fn from(content: $ty) -> Self {
                Content::$variant(content)
            }
        }
    )*};
}

content_from!(
    Text(TextContent),
    File(FileContent),
    Image(ImageContent),
    Audio(AudioContent),
    Video(VideoContent),
    Page(PageContent),
    Money(MoneyContent),
    Command(Command),
    Generic(GenericContent),
);

// ─────────────────────────────────────────────────────────────────────────────
// Text
// ─────────────────────────────────────────────────────────────────────────────

/// Plain text message.
#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    envelope: Envelope,
    text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            envelope: Envelope::new(ContentType::TEXT),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl WireContent for TextContent {
    const FIELDS: &'static [&'static str] = &[keys::TEXT];

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            text: record::require_str(record, keys::TEXT)?.to_string(),
        })
    }

    fn to_record(&self) -> Record {
        let mut map = self.envelope.to_record();
        map.insert(keys::TEXT.into(), Value::String(self.text.clone()));
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Web page
// ─────────────────────────────────────────────────────────────────────────────

/// A shared web page link.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    envelope: Envelope,
    url: String,
    title: Option<String>,
    desc: Option<String>,
    icon: LazyBinary,
}

impl PageContent {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            envelope: Envelope::new(ContentType::PAGE),
            url: url.into(),
            title: None,
            desc: None,
            icon: LazyBinary::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_icon(mut self, icon: bytes::Bytes) -> Self {
        self.icon.set(Some(icon));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Icon image, decoded on first read.
    pub fn icon(&self) -> Option<&bytes::Bytes> {
        self.icon.get()
    }
}

impl WireContent for PageContent {
    const FIELDS: &'static [&'static str] = &[keys::URL, keys::TITLE, keys::DESC, keys::ICON];

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            url: record::require_str(record, keys::URL)?.to_string(),
            title: record::get_string(record, keys::TITLE)?,
            desc: record::get_string(record, keys::DESC)?,
            icon: LazyBinary::from_wire(record::get_string(record, keys::ICON)?),
        })
    }

    fn to_record(&self) -> Record {
        let mut map = self.envelope.to_record();
        map.insert(keys::URL.into(), Value::String(self.url.clone()));
        record::put_opt(&mut map, keys::TITLE, self.title.clone());
        record::put_opt(&mut map, keys::DESC, self.desc.clone());
        record::put_opt(&mut map, keys::ICON, self.icon.wire());
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Money
// ─────────────────────────────────────────────────────────────────────────────

/// An amount of money, or a transfer of one.
///
/// The envelope type tells the two apart: [`ContentType::MONEY`] or
/// [`ContentType::TRANSFER`].
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyContent {
    envelope: Envelope,
    currency: String,
    amount: f64,
}

impl MoneyContent {
    pub fn new(currency: impl Into<String>, amount: f64) -> Self {
        Self::with_type(ContentType::MONEY, currency, amount)
    }

    pub fn transfer(currency: impl Into<String>, amount: f64) -> Self {
        Self::with_type(ContentType::TRANSFER, currency, amount)
    }

    fn with_type(content_type: ContentType, currency: impl Into<String>, amount: f64) -> Self {
        Self {
            envelope: Envelope::new(content_type),
            currency: currency.into(),
            amount,
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn is_transfer(&self) -> bool {
        self.envelope.content_type == ContentType::TRANSFER
    }
}

impl WireContent for MoneyContent {
    const FIELDS: &'static [&'static str] = &[keys::CURRENCY, keys::AMOUNT];

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            currency: record::require_str(record, keys::CURRENCY)?.to_string(),
            amount: record::get_f64(record, keys::AMOUNT)?
                .ok_or_else(|| CoreError::missing(keys::AMOUNT))?,
        })
    }

    fn to_record(&self) -> Record {
        let mut map = self.envelope.to_record();
        map.insert(keys::CURRENCY.into(), Value::String(self.currency.clone()));
        map.insert(keys::AMOUNT.into(), Value::from(self.amount));
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generic
// ─────────────────────────────────────────────────────────────────────────────

/// Content of a type this build does not know.
///
/// Only the envelope is interpreted; every other field is carried in
/// [`Envelope::extra`] and written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericContent {
    envelope: Envelope,
}

impl GenericContent {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.envelope.extra.get(key)
    }
}

impl WireContent for GenericContent {
    const FIELDS: &'static [&'static str] = &[];

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
        })
    }

    fn to_record(&self) -> Record {
        self.envelope.to_record()
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

envelope_builders!(TextContent, PageContent, MoneyContent);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not a map"),
        }
    }

    #[test]
    fn test_new_envelope_has_serial_and_time() {
        let envelope = Envelope::new(ContentType::TEXT);
        assert!(envelope.sn() >= 1);
        assert!(envelope.sn() <= i64::from(u32::MAX));
        assert!(envelope.time().is_some());
    }

    #[test]
    fn test_envelope_requires_sn() {
        let r = record(json!({"type": 1, "text": "hi"}));
        assert!(matches!(
            TextContent::from_record(&r),
            Err(CoreError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_text_roundtrip() {
        let text = TextContent::new("Hey guy!")
            .with_group(Id::parse("group@anywhere").unwrap())
            .with_sn(42)
            .with_time(1_700_000_000);
        let decoded = TextContent::from_record(&text.to_record()).unwrap();
        assert_eq!(decoded, text);
        assert_eq!(decoded.envelope().group().map(Id::as_str), Some("group@anywhere"));
    }

    #[test]
    fn test_text_requires_text() {
        let r = record(json!({"type": 1, "sn": 1}));
        assert!(TextContent::from_record(&r).is_err());
    }

    #[test]
    fn test_extension_fields_survive() {
        let r = record(json!({"type": 1, "sn": 7, "text": "hi", "x-quote": {"sn": 6}}));
        let text = TextContent::from_record(&r).unwrap();
        assert_eq!(text.envelope().extra().len(), 1);
        assert_eq!(text.to_record(), r);
    }

    #[test]
    fn test_page_roundtrip() {
        let page = PageContent::new("https://github.com/dimchat")
            .with_title("DIM")
            .with_desc("Decentralized Instant Messaging")
            .with_icon(bytes::Bytes::from_static(b"icon"));
        let decoded = PageContent::from_record(&page.to_record()).unwrap();
        assert_eq!(decoded, page);
        assert_eq!(decoded.icon().map(|b| b.as_ref()), Some(&b"icon"[..]));
    }

    #[test]
    fn test_money_and_transfer() {
        let money = MoneyContent::new("USD", 12.5);
        assert!(!money.is_transfer());
        let transfer = MoneyContent::transfer("USD", 3.0);
        assert!(transfer.is_transfer());

        let decoded = MoneyContent::from_record(&transfer.to_record()).unwrap();
        assert_eq!(decoded, transfer);
    }

    #[test]
    fn test_generic_keeps_everything() {
        let r = record(json!({"type": 0x77, "sn": 9, "future": [1, 2, 3]}));
        let generic = GenericContent::from_record(&r).unwrap();
        assert_eq!(generic.field("future"), Some(&json!([1, 2, 3])));
        assert_eq!(generic.to_record(), r);
    }

    #[test]
    fn test_content_serde_goes_through_registry() {
        let content = Content::from(TextContent::new("hello").with_sn(5));
        let json = serde_json::to_string(&content).unwrap();
        let decoded: Content = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, content);
        assert_eq!(decoded.sn(), 5);
    }
}
