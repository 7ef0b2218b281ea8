//! Golden wire records for interoperability checks.
//!
//! Each vector is a JSON record as peers put it on the wire, with the variant
//! it must decode to. Canonical vectors also re-encode to the same map;
//! legacy ones are accepted on input but normalized on output.

use serde_json::Value;

use dimp_core::registry::ContentRegistry;
use dimp_core::{record, Content, ContentType};

/// A golden wire record.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The record as JSON text.
    pub json: &'static str,
    /// The content type the record declares.
    pub content_type: ContentType,
    /// The command name, for commands.
    pub command: Option<&'static str>,
    /// Whether re-encoding reproduces the input exactly.
    pub canonical: bool,
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "text",
            json: r#"{"type": 1, "sn": 412968873, "time": 1545405083, "text": "Hey guy!"}"#,
            content_type: ContentType::TEXT,
            command: None,
            canonical: true,
        },
        GoldenVector {
            name: "text in group with unknown extra field",
            json: r#"{
                "type": 1, "sn": 7, "time": 1545405083,
                "group": "Group-1280719982@7oMeWadRw4qat2sL4mTdcQSDAqZSo7LH5G",
                "text": "hi all", "mentions": ["moki@4WDfe3zZ4T7opFSi3iDAKiuTnUHjxmXekk"]
            }"#,
            content_type: ContentType::TEXT,
            command: None,
            canonical: true,
        },
        GoldenVector {
            name: "file by url with key",
            json: r#"{
                "type": 16, "sn": 8, "filename": "report.pdf",
                "URL": "https://files.example/abc",
                "key": {"algorithm": "ChaCha20-Poly1305", "data": "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8="}
            }"#,
            content_type: ContentType::FILE,
            command: None,
            canonical: true,
        },
        GoldenVector {
            name: "image with inline thumbnail",
            json: r#"{"type": 18, "sn": 9, "filename": "cat.jpg", "data": "/9j/4A==", "thumbnail": "/9j/"}"#,
            content_type: ContentType::IMAGE,
            command: None,
            canonical: true,
        },
        GoldenVector {
            name: "page",
            json: r#"{"type": 32, "sn": 10, "URL": "https://dim.chat/", "title": "DIM", "desc": "secure chat"}"#,
            content_type: ContentType::PAGE,
            command: None,
            canonical: true,
        },
        GoldenVector {
            name: "transfer",
            json: r#"{"type": 65, "sn": 11, "currency": "DIM", "amount": 12.5}"#,
            content_type: ContentType::TRANSFER,
            command: None,
            canonical: true,
        },
        GoldenVector {
            name: "meta query",
            json: r#"{"type": 136, "sn": 12, "command": "meta", "ID": "moki@4WDfe3zZ4T7opFSi3iDAKiuTnUHjxmXekk"}"#,
            content_type: ContentType::COMMAND,
            command: Some("meta"),
            canonical: true,
        },
        GoldenVector {
            name: "handshake start",
            json: r#"{"type": 136, "sn": 13, "command": "handshake", "message": "Hello world!"}"#,
            content_type: ContentType::COMMAND,
            command: Some("handshake"),
            canonical: true,
        },
        GoldenVector {
            name: "receipt with origin",
            json: r#"{
                "type": 136, "sn": 14, "command": "receipt", "message": "Message received",
                "envelope": {
                    "sender": "moki@4WDfe3zZ4T7opFSi3iDAKiuTnUHjxmXekk",
                    "receiver": "hulk@4YeVEN3aUnvC1DNUufCq1bs9zoBSJTzVEj",
                    "time": 1545405083
                }
            }"#,
            content_type: ContentType::COMMAND,
            command: Some("receipt"),
            canonical: true,
        },
        GoldenVector {
            name: "group invite",
            json: r#"{
                "type": 137, "sn": 15, "time": 1545405083, "command": "invite",
                "group": "Group-1280719982@7oMeWadRw4qat2sL4mTdcQSDAqZSo7LH5G",
                "members": ["moki@4WDfe3zZ4T7opFSi3iDAKiuTnUHjxmXekk", "hulk@4YeVEN3aUnvC1DNUufCq1bs9zoBSJTzVEj"]
            }"#,
            content_type: ContentType::HISTORY,
            command: Some("invite"),
            canonical: true,
        },
        GoldenVector {
            name: "legacy singular member",
            json: r#"{
                "type": 137, "sn": 16, "time": 1545405083, "command": "invite",
                "group": "Group-1280719982@7oMeWadRw4qat2sL4mTdcQSDAqZSo7LH5G",
                "member": "moki@4WDfe3zZ4T7opFSi3iDAKiuTnUHjxmXekk"
            }"#,
            content_type: ContentType::HISTORY,
            command: Some("invite"),
            canonical: false,
        },
        GoldenVector {
            name: "deprecated expel",
            json: r#"{
                "type": 137, "sn": 17, "time": 1545405083, "command": "expel",
                "group": "Group-1280719982@7oMeWadRw4qat2sL4mTdcQSDAqZSo7LH5G",
                "members": ["hulk@4YeVEN3aUnvC1DNUufCq1bs9zoBSJTzVEj"]
            }"#,
            content_type: ContentType::HISTORY,
            command: Some("expel"),
            canonical: true,
        },
        GoldenVector {
            name: "unknown command",
            json: r#"{"type": 136, "sn": 18, "command": "mute", "list": ["moki@anywhere"]}"#,
            content_type: ContentType::COMMAND,
            command: Some("mute"),
            canonical: true,
        },
        GoldenVector {
            name: "unknown content type",
            json: r#"{"type": 119, "sn": 19, "sticker": "party-parrot"}"#,
            content_type: ContentType(0x77),
            command: None,
            canonical: true,
        },
    ]
}

/// Decode one vector with `registry` and check it against expectations.
pub fn verify_vector(registry: &ContentRegistry, vector: &GoldenVector) -> Result<Content, String> {
    let input = record::from_json(vector.json).map_err(|e| format!("{}: {e}", vector.name))?;
    let content = registry
        .decode(&input)
        .map_err(|e| format!("{}: {e}", vector.name))?;

    if content.content_type() != vector.content_type {
        return Err(format!(
            "{}: type {:?}, expected {:?}",
            vector.name,
            content.content_type(),
            vector.content_type
        ));
    }

    let command = content.as_command().map(|c| c.name());
    if command != vector.command {
        return Err(format!(
            "{}: command {:?}, expected {:?}",
            vector.name, command, vector.command
        ));
    }

    if vector.canonical && Value::Object(content.to_record()) != Value::Object(input) {
        return Err(format!("{}: re-encoding changed the record", vector.name));
    }
    Ok(content)
}

/// Verify every vector against the default registry.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let registry = ContentRegistry::default();
    let failures: Vec<String> = all_vectors()
        .iter()
        .filter_map(|vector| verify_vector(&registry, vector).err())
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimp_core::{Command, GroupCommandKind};

    #[test]
    fn test_all_vectors() {
        if let Err(failures) = verify_all_vectors() {
            panic!("golden vectors failed:\n{}", failures.join("\n"));
        }
    }

    fn decode(name: &str) -> Content {
        let vector = all_vectors()
            .into_iter()
            .find(|v| v.name == name)
            .unwrap();
        verify_vector(&ContentRegistry::default(), &vector).unwrap()
    }

    #[test]
    fn test_legacy_member_is_normalized() {
        let content = decode("legacy singular member");
        let command = content.as_group_command().unwrap();
        assert_eq!(command.members().unwrap().len(), 1);

        let out = content.to_record();
        assert!(out.get("member").is_none());
        assert_eq!(out["members"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_expel_keeps_its_name() {
        let content = decode("deprecated expel");
        assert_eq!(content.as_group_command().unwrap().kind(), GroupCommandKind::Expel);
    }

    #[test]
    fn test_unknown_command_is_generic() {
        let content = decode("unknown command");
        assert!(matches!(content.as_command(), Some(Command::Generic(_))));
    }

    #[test]
    fn test_unknown_type_is_generic() {
        assert!(matches!(decode("unknown content type"), Content::Generic(_)));
    }

    #[test]
    fn test_file_key_is_readable() {
        let Content::File(file) = decode("file by url with key") else {
            panic!("expected file content");
        };
        let password = file.file().password().unwrap();
        assert_eq!(password.algorithm(), "ChaCha20-Poly1305");
        assert_eq!(password.data().unwrap().len(), 32);
        assert!(file.file().data().is_none());
    }
}
