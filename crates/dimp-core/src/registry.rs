//! The content registry: wire discriminators to constructors.
//!
//! A registry is assembled once with [`RegistryBuilder`] and then frozen.
//! Decoding dispatches on the numeric `type` first; records that look like
//! commands fall through to a second table keyed by the `command` name.
//! Unknown types and names never fail: they decode to the generic wrappers.
//!
//! ```
//! use dimp_core::registry::RegistryBuilder;
//! use dimp_core::{Content, ContentType};
//!
//! let registry = RegistryBuilder::with_defaults().build();
//! let content = registry
//!     .decode_json(r#"{"type": 1, "sn": 1, "text": "hi"}"#)
//!     .unwrap();
//! assert_eq!(content.content_type(), ContentType::TEXT);
//! assert!(matches!(content, Content::Text(_)));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::command::{
    names, Command, GenericCommand, HandshakeCommand, MetaCommand, ProfileCommand, ReceiptCommand,
};
use crate::content::{Content, GenericContent, MoneyContent, PageContent, TextContent, WireContent};
use crate::error::{CoreError, Result};
use crate::file::{AudioContent, FileContent, ImageContent, VideoContent};
use crate::group::{GroupCommand, GroupCommandKind};
use crate::record::{self, keys, Record};
use crate::types::ContentType;

/// Builds a content from a full wire record.
pub type Constructor = fn(&Record) -> Result<Content>;

/// Collects constructors before the registry is frozen.
#[derive(Clone, Default)]
pub struct RegistryBuilder {
    contents: HashMap<ContentType, Constructor>,
    commands: HashMap<String, Constructor>,
}

impl RegistryBuilder {
    /// An empty builder: everything decodes as generic.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with every built-in content and command installed.
    pub fn with_defaults() -> Self {
        let mut builder = Self::new()
            .register(ContentType::TEXT, |r| TextContent::from_record(r).map(Content::Text))
            .register(ContentType::FILE, |r| FileContent::from_record(r).map(Content::File))
            .register(ContentType::IMAGE, |r| ImageContent::from_record(r).map(Content::Image))
            .register(ContentType::AUDIO, |r| AudioContent::from_record(r).map(Content::Audio))
            .register(ContentType::VIDEO, |r| VideoContent::from_record(r).map(Content::Video))
            .register(ContentType::PAGE, |r| PageContent::from_record(r).map(Content::Page))
            .register(ContentType::MONEY, |r| MoneyContent::from_record(r).map(Content::Money))
            .register(ContentType::TRANSFER, |r| MoneyContent::from_record(r).map(Content::Money))
            .register_command(names::META, |r| MetaCommand::from_record(r).map(Content::from))
            .register_command(names::PROFILE, |r| ProfileCommand::from_record(r).map(Content::from))
            .register_command(names::RECEIPT, |r| ReceiptCommand::from_record(r).map(Content::from))
            .register_command(names::HANDSHAKE, |r| {
                HandshakeCommand::from_record(r).map(Content::from)
            });

        for kind in GroupCommandKind::ALL {
            builder = builder.register_command(kind.name(), |r| {
                GroupCommand::from_record(r).map(Content::from)
            });
        }
        builder
    }

    /// Install a constructor for a content type, replacing any previous one.
    pub fn register(mut self, content_type: ContentType, constructor: Constructor) -> Self {
        self.contents.insert(content_type, constructor);
        self
    }

    /// Install a constructor for a command name, replacing any previous one.
    pub fn register_command(mut self, name: impl Into<String>, constructor: Constructor) -> Self {
        self.commands.insert(name.into(), constructor);
        self
    }

    /// Freeze the tables.
    pub fn build(self) -> ContentRegistry {
        ContentRegistry {
            contents: self.contents,
            commands: self.commands,
        }
    }
}

/// A frozen registry. Safe to share and read from any thread.
#[derive(Clone)]
pub struct ContentRegistry {
    contents: HashMap<ContentType, Constructor>,
    commands: HashMap<String, Constructor>,
}

impl ContentRegistry {
    /// Decode a wire record.
    ///
    /// Only structural errors in fields a variant requires fail; unknown
    /// types and command names degrade to [`GenericContent`] and
    /// [`GenericCommand`].
    pub fn decode(&self, record: &Record) -> Result<Content> {
        let content_type = record::content_type(record)?;
        if let Some(constructor) = self.contents.get(&content_type) {
            return constructor(record);
        }

        let name = record::get_str(record, keys::COMMAND)?;
        if content_type.is_command() || name.is_some() {
            let name = name.ok_or_else(|| CoreError::MalformedRecord("command without name".into()))?;
            return self.decode_command(name, record);
        }

        tracing::debug!("Unknown content type {:?}, decoding as generic", content_type);
        GenericContent::from_record(record).map(Content::Generic)
    }

    fn decode_command(&self, name: &str, record: &Record) -> Result<Content> {
        if let Some(constructor) = self.commands.get(name) {
            return constructor(record);
        }
        tracing::debug!("Unknown command {:?}, decoding as generic", name);
        GenericCommand::from_record(record).map(|c| Content::Command(Command::Generic(c)))
    }

    /// Decode JSON text.
    pub fn decode_json(&self, text: &str) -> Result<Content> {
        self.decode(&record::from_json(text)?)
    }

    /// Decode CBOR bytes.
    pub fn decode_cbor(&self, bytes: &[u8]) -> Result<Content> {
        self.decode(&record::from_cbor(bytes)?)
    }

    pub fn has_content_type(&self, content_type: ContentType) -> bool {
        self.contents.contains_key(&content_type)
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}

impl Default for ContentRegistry {
    fn default() -> Self {
        RegistryBuilder::with_defaults().build()
    }
}

/// Registered discriminators, sorted for stable output.
fn debug_tables(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    contents: &HashMap<ContentType, Constructor>,
    commands: &HashMap<String, Constructor>,
) -> fmt::Result {
    let mut types: Vec<_> = contents.keys().collect();
    types.sort();
    let mut names: Vec<_> = commands.keys().collect();
    names.sort();
    f.debug_struct(name)
        .field("contents", &types)
        .field("commands", &names)
        .finish()
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_tables(f, "RegistryBuilder", &self.contents, &self.commands)
    }
}

impl fmt::Debug for ContentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_tables(f, "ContentRegistry", &self.contents, &self.commands)
    }
}

static GLOBAL: OnceLock<ContentRegistry> = OnceLock::new();

/// The process-wide registry.
///
/// Uses the registry passed to [`install_global`] if that happened first,
/// otherwise the built-in defaults.
pub fn global() -> &'static ContentRegistry {
    GLOBAL.get_or_init(ContentRegistry::default)
}

/// Install the process-wide registry.
///
/// Must run before the first decode; afterwards the registry is frozen and
/// the rejected registry is handed back.
pub fn install_global(registry: ContentRegistry) -> std::result::Result<(), ContentRegistry> {
    GLOBAL.set(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{CustomContent, Envelope};
    use serde_json::{json, Value};
    use std::any::Any;
    use std::sync::Arc;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not a map"),
        }
    }

    #[test]
    fn test_dispatch_on_type() {
        let registry = ContentRegistry::default();
        let content = registry
            .decode(&record(json!({"type": 1, "sn": 3, "text": "hi"})))
            .unwrap();
        assert!(matches!(content, Content::Text(ref t) if t.text() == "hi"));
    }

    #[test]
    fn test_dispatch_on_command_name() {
        let registry = ContentRegistry::default();
        let content = registry
            .decode(&record(json!({"type": 0x88, "sn": 3, "command": "handshake", "message": "DIM!"})))
            .unwrap();
        assert!(matches!(content, Content::Command(Command::Handshake(_))));

        let content = registry
            .decode(&record(json!({
                "type": 0x89, "sn": 3, "time": 1, "group": "g@x",
                "command": "join",
            })))
            .unwrap();
        assert!(content.as_group_command().is_some());
    }

    #[test]
    fn test_unknown_type_degrades_to_generic() {
        let registry = ContentRegistry::default();
        let r = record(json!({"type": 0x77, "sn": 3, "what": "ever"}));
        let content = registry.decode(&r).unwrap();
        assert!(matches!(content, Content::Generic(_)));
        assert_eq!(content.to_record(), r);
    }

    #[test]
    fn test_wide_unknown_type_degrades_to_generic() {
        let registry = ContentRegistry::default();
        let r = record(json!({"type": 256, "sn": 1, "x": 1}));
        let content = registry.decode(&r).unwrap();
        assert!(matches!(content, Content::Generic(_)));
        assert_eq!(content.content_type(), ContentType(256));
        assert_eq!(content.to_record(), r);
    }

    #[test]
    fn test_unknown_command_degrades_to_generic() {
        let registry = ContentRegistry::default();
        let r = record(json!({"type": 0x88, "sn": 3, "command": "mute", "list": []}));
        let content = registry.decode(&r).unwrap();
        match content.as_command() {
            Some(Command::Generic(c)) => assert_eq!(c.name(), "mute"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(content.to_record(), r);
    }

    #[test]
    fn test_command_name_on_unknown_type() {
        let registry = ContentRegistry::default();
        let r = record(json!({"type": 0x70, "sn": 3, "command": "meta", "ID": "moki@anywhere"}));
        assert!(matches!(
            registry.decode(&r).unwrap(),
            Content::Command(Command::Meta(_))
        ));
    }

    #[test]
    fn test_command_type_without_name_is_malformed() {
        let registry = ContentRegistry::default();
        let r = record(json!({"type": 0x88, "sn": 3}));
        assert!(matches!(registry.decode(&r), Err(CoreError::MalformedRecord(_))));
    }

    #[test]
    fn test_malformed_required_field_fails() {
        let registry = ContentRegistry::default();
        let r = record(json!({"type": 1, "sn": 3, "text": 42}));
        assert!(registry.decode(&r).is_err());
    }

    #[test]
    fn test_empty_registry_is_all_generic() {
        let registry = RegistryBuilder::new().build();
        let r = record(json!({"type": 1, "sn": 3, "text": "hi"}));
        assert!(matches!(registry.decode(&r).unwrap(), Content::Generic(_)));
    }

    #[derive(Debug)]
    struct Poke {
        envelope: Envelope,
        strength: i64,
    }

    impl CustomContent for Poke {
        fn envelope(&self) -> &Envelope {
            &self.envelope
        }

        fn to_record(&self) -> Record {
            let mut map = self.envelope.to_record();
            map.insert("strength".into(), Value::from(self.strength));
            map
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn decode_poke(r: &Record) -> Result<Content> {
        let poke = Poke {
            envelope: Envelope::parse(r, &["strength"])?,
            strength: record::get_i64(r, "strength")?.unwrap_or(1),
        };
        Ok(Content::Custom(Arc::new(poke)))
    }

    #[test]
    fn test_third_party_registration() {
        let registry = RegistryBuilder::with_defaults()
            .register(ContentType(0x50), decode_poke)
            .build();
        assert!(registry.has_content_type(ContentType(0x50)));

        let r = record(json!({"type": 0x50, "sn": 3, "strength": 9}));
        let content = registry.decode(&r).unwrap();
        let Content::Custom(custom) = &content else {
            panic!("expected custom content");
        };
        let poke = custom.as_any().downcast_ref::<Poke>().unwrap();
        assert_eq!(poke.strength, 9);
        assert_eq!(content.to_record(), r);
    }

    #[test]
    fn test_cbor_decode() {
        let registry = ContentRegistry::default();
        let text = TextContent::new("over cbor").with_sn(8);
        let bytes = record::to_cbor(&text.to_record());
        let content = registry.decode_cbor(&bytes).unwrap();
        assert_eq!(content, Content::Text(text));
    }
}
