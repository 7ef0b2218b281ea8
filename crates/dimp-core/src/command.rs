//! Commands: content selected by a secondary `command` name.
//!
//! Plain commands travel as [`ContentType::COMMAND`]; history commands (group
//! membership and anything else that must be replayable) travel as
//! [`ContentType::HISTORY`]. Outbound history commands are stamped with their
//! issuance time; older records without one still decode.

use bytes::Bytes;
use serde_json::Value;

use crate::content::{envelope_builders, Envelope, WireContent};
use crate::crypto::{SignKey, VerifyKey};
use crate::error::{CoreError, Result};
use crate::group::GroupCommand;
use crate::record::{self, keys, Record};
use crate::transportable;
use crate::types::{ContentType, Id};

/// Well-known command names.
pub mod names {
    pub const META: &str = "meta";
    pub const PROFILE: &str = "profile";
    pub const RECEIPT: &str = "receipt";
    pub const HANDSHAKE: &str = "handshake";
    pub const BROADCAST: &str = "broadcast";
    pub const LOGIN: &str = "login";
}

/// A command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Meta(MetaCommand),
    Profile(ProfileCommand),
    Receipt(ReceiptCommand),
    Handshake(HandshakeCommand),
    Group(GroupCommand),
    /// Any command name without a dedicated variant.
    Generic(GenericCommand),
}

impl Command {
    /// The command name as it appears on the wire.
    pub fn name(&self) -> &str {
        match self {
            Command::Meta(_) => names::META,
            Command::Profile(_) => names::PROFILE,
            Command::Receipt(_) => names::RECEIPT,
            Command::Handshake(_) => names::HANDSHAKE,
            Command::Group(c) => c.kind().name(),
            Command::Generic(c) => c.name(),
        }
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            Command::Meta(c) => c.envelope(),
            Command::Profile(c) => c.envelope(),
            Command::Receipt(c) => c.envelope(),
            Command::Handshake(c) => c.envelope(),
            Command::Group(c) => c.envelope(),
            Command::Generic(c) => c.envelope(),
        }
    }

    pub fn to_record(&self) -> Record {
        match self {
            Command::Meta(c) => c.to_record(),
            Command::Profile(c) => c.to_record(),
            Command::Receipt(c) => c.to_record(),
            Command::Handshake(c) => c.to_record(),
            Command::Group(c) => c.to_record(),
            Command::Generic(c) => c.to_record(),
        }
    }

    /// Check if this is a history command.
    pub fn is_history(&self) -> bool {
        self.envelope().content_type() == ContentType::HISTORY
    }
}

/// Start a command record: envelope fields plus the command name.
pub(crate) fn command_record(envelope: &Envelope, name: &str) -> Record {
    let mut map = envelope.to_record();
    map.insert(keys::COMMAND.into(), Value::String(name.to_string()));
    map
}

/// Check that the record names the expected command.
fn expect_name(record: &Record, expected: &str) -> Result<()> {
    let name = record::require_str(record, keys::COMMAND)?;
    if name != expected {
        return Err(CoreError::MalformedRecord(format!(
            "expected `{expected}` command, got `{name}`"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Meta
// ─────────────────────────────────────────────────────────────────────────────

/// Query or respond with the meta of an identifier.
///
/// Without `meta` this is a query.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaCommand {
    envelope: Envelope,
    identifier: Id,
    meta: Option<Record>,
}

impl MetaCommand {
    /// Ask for the meta of `identifier`.
    pub fn query(identifier: Id) -> Self {
        Self {
            envelope: Envelope::new(ContentType::COMMAND),
            identifier,
            meta: None,
        }
    }

    /// Respond with the meta of `identifier`.
    pub fn response(identifier: Id, meta: Record) -> Self {
        Self {
            meta: Some(meta),
            ..Self::query(identifier)
        }
    }

    pub fn identifier(&self) -> &Id {
        &self.identifier
    }

    pub fn meta(&self) -> Option<&Record> {
        self.meta.as_ref()
    }
}

impl WireContent for MetaCommand {
    const FIELDS: &'static [&'static str] = &[keys::COMMAND, keys::ID, keys::META];

    fn from_record(record: &Record) -> Result<Self> {
        expect_name(record, names::META)?;
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            identifier: record::require_id(record, keys::ID)?,
            meta: record::get_map(record, keys::META)?.cloned(),
        })
    }

    fn to_record(&self) -> Record {
        let mut map = command_record(&self.envelope, names::META);
        map.insert(keys::ID.into(), Value::String(self.identifier.to_string()));
        record::put_opt(&mut map, keys::META, self.meta.clone().map(Value::Object));
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// A signed profile document: `{ID, data, signature}`.
///
/// `data` is the profile JSON text exactly as signed; it is never re-serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    identifier: Id,
    data: String,
    signature: Bytes,
    extra: Record,
}

impl Profile {
    const FIELDS: &'static [&'static str] = &[keys::ID, keys::DATA, keys::SIGNATURE];

    /// Sign `data` on behalf of `identifier`.
    pub fn sign<K: SignKey + ?Sized>(identifier: Id, data: impl Into<String>, key: &K) -> Self {
        let data = data.into();
        let signature = Bytes::from(key.sign(data.as_bytes()));
        Self {
            identifier,
            data,
            signature,
            extra: Record::new(),
        }
    }

    pub fn from_record(map: &Record) -> Result<Self> {
        Ok(Self {
            identifier: record::require_id(map, keys::ID)?,
            data: record::require_str(map, keys::DATA)?.to_string(),
            signature: record::get_bytes(map, keys::SIGNATURE)?
                .ok_or_else(|| CoreError::missing(keys::SIGNATURE))?,
            extra: record::extras(map, &[Self::FIELDS]),
        })
    }

    pub fn to_record(&self) -> Record {
        let mut map = self.extra.clone();
        map.insert(keys::ID.into(), Value::String(self.identifier.to_string()));
        map.insert(keys::DATA.into(), Value::String(self.data.clone()));
        map.insert(
            keys::SIGNATURE.into(),
            Value::String(transportable::encode(&self.signature)),
        );
        map
    }

    /// Check the signature over `data`.
    pub fn verify<K: VerifyKey + ?Sized>(&self, key: &K) -> bool {
        key.verify(self.data.as_bytes(), &self.signature)
    }

    pub fn identifier(&self) -> &Id {
        &self.identifier
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn signature(&self) -> &Bytes {
        &self.signature
    }
}

/// Query or respond with the profile of an identifier.
///
/// Legacy peers send the profile as a bare string with the signature at the
/// top level; both shapes are accepted, only the map shape is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCommand {
    envelope: Envelope,
    identifier: Id,
    meta: Option<Record>,
    profile: Option<Profile>,
}

impl ProfileCommand {
    /// Ask for the profile of `identifier`.
    pub fn query(identifier: Id) -> Self {
        Self {
            envelope: Envelope::new(ContentType::COMMAND),
            identifier,
            meta: None,
            profile: None,
        }
    }

    /// Respond with a profile, optionally with the meta that verifies it.
    pub fn response(identifier: Id, profile: Profile, meta: Option<Record>) -> Self {
        Self {
            meta,
            profile: Some(profile),
            ..Self::query(identifier)
        }
    }

    pub fn identifier(&self) -> &Id {
        &self.identifier
    }

    pub fn meta(&self) -> Option<&Record> {
        self.meta.as_ref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }
}

impl WireContent for ProfileCommand {
    const FIELDS: &'static [&'static str] = &[keys::COMMAND, keys::ID, keys::META, keys::PROFILE];

    fn from_record(record: &Record) -> Result<Self> {
        expect_name(record, names::PROFILE)?;
        let mut envelope = Envelope::parse(record, Self::FIELDS)?;
        let identifier = record::require_id(record, keys::ID)?;

        let profile = match record.get(keys::PROFILE) {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(Profile::from_record(map)?),
            Some(Value::String(data)) => {
                let signature = record::get_bytes(record, keys::SIGNATURE)?
                    .ok_or_else(|| CoreError::missing(keys::SIGNATURE))?;
                envelope.extra.remove(keys::SIGNATURE);
                Some(Profile {
                    identifier: identifier.clone(),
                    data: data.clone(),
                    signature,
                    extra: Record::new(),
                })
            }
            Some(_) => return Err(CoreError::wrong_shape(keys::PROFILE, "a map")),
        };

        Ok(Self {
            envelope,
            identifier,
            meta: record::get_map(record, keys::META)?.cloned(),
            profile,
        })
    }

    fn to_record(&self) -> Record {
        let mut map = command_record(&self.envelope, names::PROFILE);
        map.insert(keys::ID.into(), Value::String(self.identifier.to_string()));
        record::put_opt(&mut map, keys::META, self.meta.clone().map(Value::Object));
        record::put_opt(
            &mut map,
            keys::PROFILE,
            self.profile.as_ref().map(|p| Value::Object(p.to_record())),
        );
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Receipt
// ─────────────────────────────────────────────────────────────────────────────

/// The message envelope a receipt refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptOrigin {
    pub sender: Id,
    pub receiver: Id,
    pub time: Option<i64>,
}

impl ReceiptOrigin {
    fn from_record(map: &Record) -> Result<Self> {
        Ok(Self {
            sender: record::require_id(map, keys::SENDER)?,
            receiver: record::require_id(map, keys::RECEIVER)?,
            time: record::get_i64(map, keys::TIME)?,
        })
    }

    fn to_record(&self) -> Record {
        let mut map = Record::new();
        map.insert(keys::SENDER.into(), Value::String(self.sender.to_string()));
        map.insert(keys::RECEIVER.into(), Value::String(self.receiver.to_string()));
        record::put_opt(&mut map, keys::TIME, self.time);
        map
    }
}

/// Acknowledges (or rejects) a message.
///
/// A receipt reuses the serial number of the content it answers, which is how
/// the sender correlates the two.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptCommand {
    envelope: Envelope,
    message: Option<String>,
    origin: Option<ReceiptOrigin>,
    signature: Option<String>,
}

impl ReceiptCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            envelope: Envelope::new(ContentType::COMMAND),
            message: Some(message.into()),
            origin: None,
            signature: None,
        }
    }

    /// A receipt answering `original`, correlated by its serial number.
    pub fn answering(original: &Envelope, message: impl Into<String>) -> Self {
        let mut receipt = Self::new(message);
        receipt.envelope.sn = original.sn();
        receipt.envelope.group = original.group().cloned();
        receipt
    }

    /// A rejection of `original`; `reason` names why it was refused.
    pub fn rejection(original: &Envelope, reason: impl std::fmt::Display) -> Self {
        Self::answering(original, format!("rejected: {reason}"))
    }

    pub fn with_origin(mut self, origin: ReceiptOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn origin(&self) -> Option<&ReceiptOrigin> {
        self.origin.as_ref()
    }

    /// Signature of the original message, if the receipt carries one.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

impl WireContent for ReceiptCommand {
    const FIELDS: &'static [&'static str] =
        &[keys::COMMAND, keys::MESSAGE, keys::ENVELOPE, keys::SIGNATURE];

    fn from_record(record: &Record) -> Result<Self> {
        expect_name(record, names::RECEIPT)?;
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            message: record::get_string(record, keys::MESSAGE)?,
            origin: record::get_map(record, keys::ENVELOPE)?
                .map(ReceiptOrigin::from_record)
                .transpose()?,
            signature: record::get_string(record, keys::SIGNATURE)?,
        })
    }

    fn to_record(&self) -> Record {
        let mut map = command_record(&self.envelope, names::RECEIPT);
        record::put_opt(&mut map, keys::MESSAGE, self.message.clone());
        record::put_opt(
            &mut map,
            keys::ENVELOPE,
            self.origin.as_ref().map(|o| Value::Object(o.to_record())),
        );
        record::put_opt(&mut map, keys::SIGNATURE, self.signature.clone());
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handshake
// ─────────────────────────────────────────────────────────────────────────────

/// Handshake progress, derived from `message` and `session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Nothing sent yet.
    Init,
    /// Client says hello without a session.
    Start,
    /// Station asks the client to try again with the given session.
    Again,
    /// Client says hello with a session.
    Restart,
    /// Station accepted the session.
    Success,
}

impl HandshakeState {
    pub fn derive(message: Option<&str>, session: Option<&str>) -> Self {
        match (message, session) {
            (None, _) => HandshakeState::Init,
            (Some("DIM!" | "OK!"), _) => HandshakeState::Success,
            (Some("DIM?"), _) => HandshakeState::Again,
            (Some(_), None) => HandshakeState::Start,
            (Some(_), Some(_)) => HandshakeState::Restart,
        }
    }
}

/// Session negotiation between a client and a station.
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeCommand {
    envelope: Envelope,
    message: Option<String>,
    session: Option<String>,
}

impl HandshakeCommand {
    const HELLO: &'static str = "Hello world!";

    fn build(message: &str, session: Option<String>) -> Self {
        Self {
            envelope: Envelope::new(ContentType::COMMAND),
            message: Some(message.to_string()),
            session,
        }
    }

    /// First hello from a client.
    pub fn start() -> Self {
        Self::build(Self::HELLO, None)
    }

    /// Hello again, with the session the station handed out.
    pub fn restart(session: impl Into<String>) -> Self {
        Self::build(Self::HELLO, Some(session.into()))
    }

    /// Station: retry with this session.
    pub fn again(session: impl Into<String>) -> Self {
        Self::build("DIM?", Some(session.into()))
    }

    /// Station: handshake accepted.
    pub fn success() -> Self {
        Self::build("DIM!", None)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn state(&self) -> HandshakeState {
        HandshakeState::derive(self.message(), self.session())
    }
}

impl WireContent for HandshakeCommand {
    const FIELDS: &'static [&'static str] = &[keys::COMMAND, keys::MESSAGE, keys::SESSION];

    fn from_record(record: &Record) -> Result<Self> {
        expect_name(record, names::HANDSHAKE)?;
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            message: record::get_string(record, keys::MESSAGE)?,
            session: record::get_string(record, keys::SESSION)?,
        })
    }

    fn to_record(&self) -> Record {
        let mut map = command_record(&self.envelope, names::HANDSHAKE);
        record::put_opt(&mut map, keys::MESSAGE, self.message.clone());
        record::put_opt(&mut map, keys::SESSION, self.session.clone());
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generic
// ─────────────────────────────────────────────────────────────────────────────

/// A command without a dedicated variant (`broadcast`, `login`, unknown names).
#[derive(Debug, Clone, PartialEq)]
pub struct GenericCommand {
    envelope: Envelope,
    name: String,
}

impl GenericCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            envelope: Envelope::new(ContentType::COMMAND),
            name: name.into(),
        }
    }

    /// A history command, logged alongside membership changes.
    pub fn history(name: impl Into<String>) -> Self {
        Self {
            envelope: Envelope::new(ContentType::HISTORY),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.envelope.extra.get(key)
    }

    /// Attach a command-specific field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.envelope.extra.insert(key.into(), value.into());
        self
    }
}

impl WireContent for GenericCommand {
    const FIELDS: &'static [&'static str] = &[keys::COMMAND];

    fn from_record(record: &Record) -> Result<Self> {
        let envelope = Envelope::parse(record, Self::FIELDS)?;
        Ok(Self {
            envelope,
            name: record::require_str(record, keys::COMMAND)?.to_string(),
        })
    }

    fn to_record(&self) -> Record {
        command_record(&self.envelope, &self.name)
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

envelope_builders!(
    MetaCommand,
    ProfileCommand,
    ReceiptCommand,
    HandshakeCommand,
    GenericCommand,
);

macro_rules! command_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {$(
        impl From<$ty> for Command {
            fn from(command: $ty) -> Self {
                Command::$variant(command)
            }
        }

        impl From<$ty> for crate::content::Content {
            fn from(command: $ty) -> Self {
                crate::content::Content::Command(Command::$variant(command))
            }
        }
    )*};
}

command_from!(
    Meta(MetaCommand),
    Profile(ProfileCommand),
    Receipt(ReceiptCommand),
    Handshake(HandshakeCommand),
    Group(GroupCommand),
    Generic(GenericCommand),
);
