//! Strong type definitions for DIMP.
//!
//! Identifiers and discriminators are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// An entity identifier of the form `name@address/terminal`.
///
/// Only the textual shape is checked here. Address derivation and the
/// meta/key binding behind an address belong to the identity layer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id(String);

impl Id {
    /// Address shared by broadcast identifiers addressed to a single peer.
    pub const ANYWHERE: &'static str = "anywhere";
    /// Address shared by broadcast identifiers addressed to every peer.
    pub const EVERYWHERE: &'static str = "everywhere";

    /// Parse an identifier from its string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidId(s.to_string()));
        }
        if s.matches('@').count() > 1 || s.matches('/').count() > 1 {
            return Err(CoreError::InvalidId(s.to_string()));
        }

        let id = Self(s.to_string());
        if id.address().is_empty() {
            return Err(CoreError::InvalidId(s.to_string()));
        }
        Ok(id)
    }

    /// The broadcast identifier for "any single station".
    pub fn anyone() -> Self {
        Self(format!("anyone@{}", Self::ANYWHERE))
    }

    /// The broadcast identifier for "every user".
    pub fn everyone() -> Self {
        Self(format!("everyone@{}", Self::EVERYWHERE))
    }

    /// Get the string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `@`, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.split_once('@').map(|(name, _)| name)
    }

    /// The address part (between `@` and `/`).
    pub fn address(&self) -> &str {
        let rest = match self.0.split_once('@') {
            Some((_, rest)) => rest,
            None => &self.0,
        };
        match rest.split_once('/') {
            Some((address, _)) => address,
            None => rest,
        }
    }

    /// The part after `/`, if any.
    pub fn terminal(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, terminal)| terminal)
    }

    /// Check if this is a broadcast identifier.
    pub fn is_broadcast(&self) -> bool {
        matches!(self.address(), Self::ANYWHERE | Self::EVERYWHERE)
    }

    /// The same identifier without its terminal.
    pub fn without_terminal(&self) -> Self {
        match self.0.split_once('/') {
            Some((head, _)) => Self(head.to_string()),
            None => self.clone(),
        }
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Id {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Id {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The wire discriminator that selects a content variant.
///
/// Kept open (a newtype rather than an enum) so that records with types this
/// build does not know can still be carried as generic content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentType(pub i64);

impl ContentType {
    // Message kinds (0x00 - 0x3F)
    /// Plain text.
    pub const TEXT: Self = Self(0x01);
    /// Generic file.
    pub const FILE: Self = Self(0x10);
    /// Image file with optional thumbnail.
    pub const IMAGE: Self = Self(0x12);
    /// Voice message with optional transcript.
    pub const AUDIO: Self = Self(0x14);
    /// Video file with optional snapshot.
    pub const VIDEO: Self = Self(0x16);
    /// Web page link.
    pub const PAGE: Self = Self(0x20);

    // Payment kinds (0x40 - 0x4F)
    /// Money amount.
    pub const MONEY: Self = Self(0x40);
    /// Money transfer.
    pub const TRANSFER: Self = Self(0x41);

    // Command kinds (0x88 - 0x89)
    /// Command.
    pub const COMMAND: Self = Self(0x88);
    /// History command (group membership and other logged commands).
    pub const HISTORY: Self = Self(0x89);

    /// Create from the raw discriminator.
    pub const fn from_raw(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw discriminator.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Check if records of this type are commands.
    pub fn is_command(self) -> bool {
        self == Self::COMMAND || self == Self::HISTORY
    }

    /// Check if this type belongs to the file family.
    pub fn is_file(self) -> bool {
        matches!(self, Self::FILE | Self::IMAGE | Self::AUDIO | Self::VIDEO)
    }

    /// Human-readable name for the built-in types.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::TEXT => "text",
            Self::FILE => "file",
            Self::IMAGE => "image",
            Self::AUDIO => "audio",
            Self::VIDEO => "video",
            Self::PAGE => "page",
            Self::MONEY => "money",
            Self::TRANSFER => "transfer",
            Self::COMMAND => "command",
            Self::HISTORY => "history",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "ContentType(0x{:02x} {})", self.0, name),
            None => write!(f, "ContentType(0x{:02x})", self.0),
        }
    }
}

impl From<u8> for ContentType {
    fn from(value: u8) -> Self {
        Self(i64::from(value))
    }
}
