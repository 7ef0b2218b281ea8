//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;
use proptest::sample::select;

use serde_json::Value;

use dimp_core::{
    AudioContent, Content, FileContent, GenericCommand, GroupCommand, HandshakeCommand, Id,
    ImageContent, MetaCommand, MoneyContent, PageContent, PortableFile, Profile, ProfileCommand,
    ReceiptCommand, ReceiptOrigin, Record, TextContent, VideoContent,
};
use dimp_perms::{GroupAction, MemberType};

use crate::fixtures::seeded_key;

/// Generate a random identifier, with or without a terminal.
pub fn id() -> impl Strategy<Value = Id> {
    (
        proptest::option::of("[a-z][a-z0-9_-]{0,11}"),
        "[1-9A-HJ-NP-Za-km-z]{8,34}",
        proptest::option::of("[a-z0-9]{1,8}"),
    )
        .prop_map(|(name, address, terminal)| {
            let mut s = String::new();
            if let Some(name) = name {
                s.push_str(&name);
                s.push('@');
            }
            s.push_str(&address);
            if let Some(terminal) = terminal {
                s.push('/');
                s.push_str(&terminal);
            }
            Id::parse(&s).unwrap_or_else(|e| panic!("generator produced {s:?}: {e}"))
        })
}

/// Generate a serial number.
pub fn sn() -> impl Strategy<Value = i64> {
    1i64..=i64::from(u32::MAX)
}

/// Generate a reasonable timestamp, in seconds.
pub fn timestamp() -> impl Strategy<Value = i64> {
    1_500_000_000i64..=2_000_000_000
}

/// Generate any valid role.
pub fn member_type() -> impl Strategy<Value = MemberType> {
    select(MemberType::ALL.to_vec())
}

/// Generate any group action.
pub fn group_action() -> impl Strategy<Value = GroupAction> {
    select(GroupAction::ALL.to_vec())
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..=max_len).prop_map(Bytes::from)
}

/// Generate text content, sometimes addressed to a group.
pub fn text_content() -> impl Strategy<Value = TextContent> {
    (any::<String>(), sn(), timestamp(), proptest::option::of(id())).prop_map(
        |(text, sn, time, group)| {
            let content = TextContent::new(text).with_sn(sn).with_time(time);
            match group {
                Some(group) => content.with_group(group),
                None => content,
            }
        },
    )
}

/// Generate file content carrying inline data, a URL, or both.
pub fn file_content() -> impl Strategy<Value = FileContent> {
    (
        proptest::option::of(payload(64)),
        proptest::option::of("https://[a-z]{3,10}\\.example/[a-z0-9]{1,12}"),
        "[a-z]{1,8}\\.(txt|pdf|bin)",
        sn(),
    )
        .prop_map(|(data, url, filename, sn)| {
            let mut file = PortableFile::new().with_filename(filename);
            if let Some(data) = data {
                file = file.with_data(data);
            }
            if let Some(url) = url {
                file = file.with_url(url);
            }
            FileContent::new(file).with_sn(sn)
        })
}

/// Generate an image with a thumbnail.
pub fn image_content() -> impl Strategy<Value = ImageContent> {
    (payload(32), payload(16), sn()).prop_map(|(data, thumbnail, sn)| {
        let file = PortableFile::new().with_filename("photo.jpg").with_data(data);
        ImageContent::new(file).with_thumbnail(thumbnail).with_sn(sn)
    })
}

/// Generate a voice message, sometimes with a transcript.
pub fn audio_content() -> impl Strategy<Value = AudioContent> {
    (payload(48), proptest::option::of("[a-z ]{1,24}"), sn()).prop_map(|(data, text, sn)| {
        let file = PortableFile::new().with_filename("voice.mp4").with_data(data);
        let audio = AudioContent::new(file).with_sn(sn);
        match text {
            Some(text) => audio.with_text(text),
            None => audio,
        }
    })
}

/// Generate a video by URL with a snapshot.
pub fn video_content() -> impl Strategy<Value = VideoContent> {
    ("https://[a-z]{3,10}\\.example/[a-z0-9]{1,12}", payload(16), sn()).prop_map(
        |(url, snapshot, sn)| {
            let file = PortableFile::new().with_filename("clip.mp4").with_url(url);
            VideoContent::new(file).with_snapshot(snapshot).with_sn(sn)
        },
    )
}

/// Generate a web page share.
pub fn page_content() -> impl Strategy<Value = PageContent> {
    (
        "https://[a-z]{3,10}\\.example/[a-z0-9]{0,12}",
        proptest::option::of("[A-Za-z ]{1,20}"),
        sn(),
    )
        .prop_map(|(url, title, sn)| {
            let page = PageContent::new(url).with_sn(sn);
            match title {
                Some(title) => page.with_title(title),
                None => page,
            }
        })
}

/// Generate a money amount; halves are exact in binary.
pub fn money_content() -> impl Strategy<Value = MoneyContent> {
    ("[A-Z]{3}", 0u32..1_000_000, any::<bool>(), sn()).prop_map(
        |(currency, halves, transfer, sn)| {
            let amount = f64::from(halves) / 2.0;
            let money = if transfer {
                MoneyContent::transfer(currency, amount)
            } else {
                MoneyContent::new(currency, amount)
            };
            money.with_sn(sn)
        },
    )
}

/// Generate a group command of any outbound kind.
pub fn group_command() -> impl Strategy<Value = GroupCommand> {
    let members = || prop::collection::vec(id(), 1..5);
    (
        id(),
        sn(),
        timestamp(),
        prop_oneof![
            proptest::option::of(members()).prop_map(|m| (0u8, m)),
            members().prop_map(|m| (1u8, Some(m))),
            members().prop_map(|m| (2u8, Some(m))),
            id().prop_map(|successor| (3u8, Some(vec![successor]))),
            Just((4u8, None::<Vec<Id>>)),
            Just((5u8, None)),
            Just((6u8, None)),
            Just((7u8, None)),
            members().prop_map(|m| (8u8, Some(m))),
            members().prop_map(|m| (9u8, Some(m))),
        ],
    )
        .prop_map(|(group, sn, time, (kind, members))| {
            let command = match (kind, members) {
                (0, members) => GroupCommand::found(group, members),
                (1, Some(members)) => GroupCommand::invite(group, members),
                (2, Some(members)) => GroupCommand::reset(group, members),
                (3, Some(mut successor)) => GroupCommand::abdicate(group, successor.remove(0)),
                (4, _) => GroupCommand::join(group),
                (5, _) => GroupCommand::quit(group),
                (6, _) => GroupCommand::query(group),
                (7, _) => GroupCommand::resign(group),
                (8, admins) => GroupCommand::hire(group, admins, None),
                (_, admins) => GroupCommand::fire(group, admins, None),
            };
            command.with_sn(sn).with_time(time)
        })
}

/// Generate a meta query or a meta response.
pub fn meta_command() -> impl Strategy<Value = MetaCommand> {
    (id(), proptest::option::of("[A-Za-z0-9]{8,32}")).prop_map(|(who, key)| match key {
        Some(key) => {
            let mut meta = Record::new();
            meta.insert("version".into(), Value::from(1));
            meta.insert("key".into(), Value::from(key));
            MetaCommand::response(who, meta)
        }
        None => MetaCommand::query(who),
    })
}

/// Generate a profile query, or a response signed with the owner's seeded key.
pub fn profile_command() -> impl Strategy<Value = ProfileCommand> {
    (id(), proptest::option::of("[ -~]{0,32}")).prop_map(|(who, data)| match data {
        Some(data) => {
            let key = seeded_key(who.as_str());
            let profile = Profile::sign(who.clone(), data, &key);
            ProfileCommand::response(who, profile, None)
        }
        None => ProfileCommand::query(who),
    })
}

/// Generate a receipt, sometimes pointing at the message it answers.
pub fn receipt_command() -> impl Strategy<Value = ReceiptCommand> {
    (
        "[A-Za-z ]{1,24}",
        proptest::option::of((id(), id(), proptest::option::of(timestamp()))),
        sn(),
    )
        .prop_map(|(message, origin, sn)| {
            let receipt = ReceiptCommand::new(message).with_sn(sn);
            match origin {
                Some((sender, receiver, time)) => receipt.with_origin(ReceiptOrigin {
                    sender,
                    receiver,
                    time,
                }),
                None => receipt,
            }
        })
}

/// Generate any step of the handshake.
pub fn handshake_command() -> impl Strategy<Value = HandshakeCommand> {
    let session = || "[a-f0-9]{8,16}";
    prop_oneof![
        Just(HandshakeCommand::start()),
        session().prop_map(|session: String| HandshakeCommand::restart(session)),
        session().prop_map(|session: String| HandshakeCommand::again(session)),
        Just(HandshakeCommand::success()),
    ]
}

/// Generate a command nobody registered, with an extension field.
pub fn generic_command() -> impl Strategy<Value = GenericCommand> {
    ("x-[a-z]{1,8}", "[a-z]{1,8}", sn()).prop_map(|(name, value, sn)| {
        GenericCommand::new(name)
            .with_field("x-value", value)
            .with_sn(sn)
    })
}

/// Generate any built-in command, membership commands included.
pub fn command() -> impl Strategy<Value = Content> {
    prop_oneof![
        meta_command().prop_map(Content::from),
        profile_command().prop_map(Content::from),
        receipt_command().prop_map(Content::from),
        handshake_command().prop_map(Content::from),
        generic_command().prop_map(Content::from),
        group_command().prop_map(Content::from),
    ]
}

/// Generate any built-in content.
pub fn content() -> impl Strategy<Value = Content> {
    prop_oneof![
        text_content().prop_map(Content::from),
        file_content().prop_map(Content::from),
        image_content().prop_map(Content::from),
        audio_content().prop_map(Content::from),
        video_content().prop_map(Content::from),
        page_content().prop_map(Content::from),
        money_content().prop_map(Content::from),
        command(),
    ]
}
