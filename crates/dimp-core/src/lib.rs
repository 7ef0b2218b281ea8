//! # DIMP Core
//!
//! The message-content layer of DIMP: self-describing content records, the
//! registry that decodes them, and the key capabilities content relies on.
//!
//! This crate performs no I/O. Everything here is a pure transformation
//! between wire records and typed values.
//!
//! ## Key Types
//!
//! - [`Content`] - One message payload (text, file family, commands, ...)
//! - [`Envelope`] - Type, serial number, group and time shared by all content
//! - [`GroupCommand`] - Membership commands with normalized member lists
//! - [`ContentRegistry`] - Discriminator to constructor dispatch
//! - [`Id`] - Entity identifier (`name@address/terminal`)
//!
//! ## Wire format
//!
//! Content travels as a JSON-compatible map; see [`record`]. The same map can
//! be carried as deterministic CBOR.

pub mod command;
pub mod content;
pub mod crypto;
pub mod error;
pub mod file;
pub mod group;
pub mod matching;
pub mod record;
pub mod registry;
pub mod transportable;
pub mod types;

pub use command::{
    Command, GenericCommand, HandshakeCommand, HandshakeState, MetaCommand, Profile,
    ProfileCommand, ReceiptCommand, ReceiptOrigin,
};
pub use content::{
    Content, CustomContent, Envelope, GenericContent, MoneyContent, PageContent, TextContent,
    WireContent,
};
pub use crypto::{
    DecryptKey, Ed25519PrivateKey, Ed25519PublicKey, EncryptKey, KeyRecord, PrivateKey, SignKey,
    SymmetricKey, VerifyKey, X25519PrivateKey, X25519PublicKey,
};
pub use error::{CoreError, Result};
pub use file::{AudioContent, FileContent, ImageContent, PortableFile, VideoContent};
pub use group::{GroupCommand, GroupCommandKind};
pub use matching::{match_encrypt_key, match_sign_key, private_key_equals, symmetric_key_equals};
pub use record::Record;
pub use registry::{ContentRegistry, RegistryBuilder};
pub use transportable::{LazyBinary, TransportableData};
pub use types::{ContentType, Id};
