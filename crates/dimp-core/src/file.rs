//! The file content family: generic files, images, audio and video.
//!
//! All four variants share a [`PortableFile`]: inline data (lazily decoded),
//! a filename, a download URL and the decrypt key for the uploaded bytes.
//! Images and videos add a preview binary decoded on first read.

use bytes::Bytes;
use serde_json::Value;

use crate::content::{envelope_builders, Envelope, WireContent};
use crate::crypto::{DecryptKey, EncryptKey, KeyRecord, SymmetricKey};
use crate::error::{CoreError, Result};
use crate::matching;
use crate::record::{self, keys, Record};
use crate::transportable::LazyBinary;
use crate::types::ContentType;

/// The file fields every file variant carries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortableFile {
    data: LazyBinary,
    filename: Option<String>,
    url: Option<String>,
    password: Option<KeyRecord>,
}

impl PortableFile {
    /// Keys read by [`PortableFile::parse`].
    pub const FIELDS: &'static [&'static str] = &[keys::DATA, keys::FILENAME, keys::URL, keys::KEY];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data.set(Some(data));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_password(mut self, password: KeyRecord) -> Self {
        self.password = Some(password);
        self
    }

    /// Read the file fields from a record.
    pub fn parse(record: &Record) -> Result<Self> {
        Ok(Self {
            data: LazyBinary::from_wire(record::get_string(record, keys::DATA)?),
            filename: record::get_string(record, keys::FILENAME)?,
            url: record::get_string(record, keys::URL)?,
            password: record::get_map(record, keys::KEY)?
                .map(KeyRecord::from_record)
                .transpose()?,
        })
    }

    /// Write the file fields into a record.
    pub fn write(&self, map: &mut Record) {
        record::put_opt(map, keys::DATA, self.data.wire());
        record::put_opt(map, keys::FILENAME, self.filename.clone());
        record::put_opt(map, keys::URL, self.url.clone());
        record::put_opt(map, keys::KEY, self.password.as_ref().map(|k| Value::Object(k.to_record())));
    }

    /// Inline data, or `None` when only a URL is present.
    pub fn data(&self) -> Option<&Bytes> {
        self.data.get()
    }

    /// Replace the inline data; the wire form is re-derived immediately.
    pub fn set_data(&mut self, data: Option<Bytes>) {
        self.data.set(data);
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, filename: Option<String>) {
        self.filename = filename;
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: Option<String>) {
        self.url = url;
    }

    /// The full decrypt key record for the uploaded bytes.
    pub fn password(&self) -> Option<&KeyRecord> {
        self.password.as_ref()
    }

    pub fn set_password(&mut self, password: Option<KeyRecord>) {
        self.password = password;
    }

    /// Encrypt the inline data for upload.
    ///
    /// Returns the ciphertext, removes the inline data and stores `key` as the
    /// password so the receiver can open the downloaded bytes.
    pub fn seal(&mut self, key: &SymmetricKey) -> Result<Bytes> {
        let data = self
            .data()
            .ok_or_else(|| CoreError::MalformedRecord("no inline data to seal".into()))?;
        let ciphertext = key.encrypt(data)?;
        self.data.set(None);
        self.password = Some(key.to_key_record());
        Ok(Bytes::from(ciphertext))
    }

    /// Decrypt downloaded bytes with the stored password.
    pub fn open(&self, ciphertext: &[u8]) -> Result<Bytes> {
        let password = self
            .password
            .as_ref()
            .ok_or_else(|| CoreError::missing(keys::KEY))?;
        let key = SymmetricKey::from_key_record(password)?;
        key.decrypt(ciphertext).map(Bytes::from)
    }

    /// Check whether the stored password opens what `key` encrypts.
    pub fn password_matches<K: EncryptKey + ?Sized>(&self, key: &K) -> bool {
        let Some(password) = &self.password else {
            return false;
        };
        match SymmetricKey::from_key_record(password) {
            Ok(stored) => matching::match_encrypt_key(key, &stored),
            Err(_) => false,
        }
    }
}

/// Accessors shared by the file variants.
macro_rules! file_accessors {
    ($($ty:ty),* $(,)?) => {$(
        impl $ty {
            pub fn file(&self) -> &PortableFile {
                &self.file
            }

            pub fn file_mut(&mut self) -> &mut PortableFile {
                &mut self.file
            }
        }
    )*};
}

// ─────────────────────────────────────────────────────────────────────────────
// Variants
// ─────────────────────────────────────────────────────────────────────────────

/// A generic file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileContent {
    envelope: Envelope,
    file: PortableFile,
}

impl FileContent {
    pub fn new(file: PortableFile) -> Self {
        Self {
            envelope: Envelope::new(ContentType::FILE),
            file,
        }
    }
}

impl WireContent for FileContent {
    const FIELDS: &'static [&'static str] = PortableFile::FIELDS;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            file: PortableFile::parse(record)?,
        })
    }

    fn to_record(&self) -> Record {
        let mut map = self.envelope.to_record();
        self.file.write(&mut map);
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

const IMAGE_FIELDS: &[&str] = &[keys::DATA, keys::FILENAME, keys::URL, keys::KEY, keys::THUMBNAIL];

/// An image with an optional thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageContent {
    envelope: Envelope,
    file: PortableFile,
    thumbnail: LazyBinary,
}

impl ImageContent {
    pub fn new(file: PortableFile) -> Self {
        Self {
            envelope: Envelope::new(ContentType::IMAGE),
            file,
            thumbnail: LazyBinary::default(),
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: Bytes) -> Self {
        self.thumbnail.set(Some(thumbnail));
        self
    }

    /// The thumbnail, decoded from the wire field on first read.
    pub fn thumbnail(&self) -> Option<&Bytes> {
        self.thumbnail.get()
    }

    /// Replace the thumbnail; the wire field is rewritten immediately.
    pub fn set_thumbnail(&mut self, thumbnail: Option<Bytes>) {
        self.thumbnail.set(thumbnail);
    }

    /// Whether the thumbnail has already been decoded.
    pub fn is_thumbnail_cached(&self) -> bool {
        self.thumbnail.is_cached()
    }
}

impl WireContent for ImageContent {
    const FIELDS: &'static [&'static str] = IMAGE_FIELDS;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            file: PortableFile::parse(record)?,
            thumbnail: LazyBinary::from_wire(record::get_string(record, keys::THUMBNAIL)?),
        })
    }

    fn to_record(&self) -> Record {
        let mut map = self.envelope.to_record();
        self.file.write(&mut map);
        record::put_opt(&mut map, keys::THUMBNAIL, self.thumbnail.wire());
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

const AUDIO_FIELDS: &[&str] = &[keys::DATA, keys::FILENAME, keys::URL, keys::KEY, keys::TEXT];

/// A voice message with an optional transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioContent {
    envelope: Envelope,
    file: PortableFile,
    text: Option<String>,
}

impl AudioContent {
    pub fn new(file: PortableFile) -> Self {
        Self {
            envelope: Envelope::new(ContentType::AUDIO),
            file,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Speech-to-text transcript.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl WireContent for AudioContent {
    const FIELDS: &'static [&'static str] = AUDIO_FIELDS;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            file: PortableFile::parse(record)?,
            text: record::get_string(record, keys::TEXT)?,
        })
    }

    fn to_record(&self) -> Record {
        let mut map = self.envelope.to_record();
        self.file.write(&mut map);
        record::put_opt(&mut map, keys::TEXT, self.text.clone());
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

const VIDEO_FIELDS: &[&str] = &[keys::DATA, keys::FILENAME, keys::URL, keys::KEY, keys::SNAPSHOT];

/// A video with an optional snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoContent {
    envelope: Envelope,
    file: PortableFile,
    snapshot: LazyBinary,
}

impl VideoContent {
    pub fn new(file: PortableFile) -> Self {
        Self {
            envelope: Envelope::new(ContentType::VIDEO),
            file,
            snapshot: LazyBinary::default(),
        }
    }

    pub fn with_snapshot(mut self, snapshot: Bytes) -> Self {
        self.snapshot.set(Some(snapshot));
        self
    }

    /// The snapshot, decoded from the wire field on first read.
    pub fn snapshot(&self) -> Option<&Bytes> {
        self.snapshot.get()
    }

    /// Replace the snapshot; the wire field is rewritten immediately.
    pub fn set_snapshot(&mut self, snapshot: Option<Bytes>) {
        self.snapshot.set(snapshot);
    }
}

impl WireContent for VideoContent {
    const FIELDS: &'static [&'static str] = VIDEO_FIELDS;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::parse(record, Self::FIELDS)?,
            file: PortableFile::parse(record)?,
            snapshot: LazyBinary::from_wire(record::get_string(record, keys::SNAPSHOT)?),
        })
    }

    fn to_record(&self) -> Record {
        let mut map = self.envelope.to_record();
        self.file.write(&mut map);
        record::put_opt(&mut map, keys::SNAPSHOT, self.snapshot.wire());
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

file_accessors!(FileContent, ImageContent, AudioContent, VideoContent);
envelope_builders!(FileContent, ImageContent, AudioContent, VideoContent);
