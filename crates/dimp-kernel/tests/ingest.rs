//! End-to-end ingest tests against a populated group.

use std::sync::Arc;

use serde_json::json;

use dimp_kernel::core::{
    Command, ContentType, GroupCommand, GroupCommandKind, ProfileCommand, Profile, Record,
    TextContent, WireContent,
};
use dimp_kernel::perms::{DenyReason, MemberType};
use dimp_kernel::{IngestResult, KernelConfig, KernelError, MemoryDirectory, RoleDirectory};
use dimp_testkit::fixtures::{id, seeded_key, GroupFixture};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("not a map"),
    }
}

#[test]
fn member_cannot_reset_owner_can() {
    init_tracing();
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());

    let reset = GroupCommand::reset(f.group.clone(), vec![f.owner.clone(), f.member.clone()]);
    let result = kernel.ingest(&f.member, &reset.to_record()).unwrap();
    let IngestResult::Rejected { content, receipt } = result else {
        panic!("expected rejection, got {result:?}");
    };
    assert_eq!(receipt.envelope().sn(), content.sn());
    assert_eq!(receipt.envelope().group(), Some(&f.group));
    assert!(receipt.message().unwrap().starts_with("rejected: "));

    let result = kernel.ingest(&f.owner, &reset.to_record()).unwrap();
    assert!(result.is_accepted());
}

#[test]
fn rejection_receipt_round_trips() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());

    let hire = GroupCommand::hire(f.group.clone(), Some(vec![f.member.clone()]), None).with_sn(77);
    let result = kernel.ingest(&f.admin, &hire.to_record()).unwrap();
    let IngestResult::Rejected { receipt, .. } = result else {
        panic!("admin may not hire");
    };

    // The receipt goes back over the wire like any other content
    let echoed = kernel.ingest(&f.owner, &receipt.to_record()).unwrap();
    assert!(echoed.is_accepted());
    match echoed.content().as_command() {
        Some(Command::Receipt(r)) => {
            assert_eq!(r.envelope().sn(), 77);
            assert_eq!(r.message(), receipt.message());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn found_is_idempotent_for_the_founder() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());
    let found = GroupCommand::found(f.group.clone(), Some(vec![f.founder.clone()]));

    let result = kernel.ingest(&f.founder, &found.to_record()).unwrap();
    assert!(matches!(result, IngestResult::Unchanged(_)));

    let result = kernel.ingest(&f.stranger, &found.to_record()).unwrap();
    assert!(matches!(result, IngestResult::Rejected { .. }));
}

#[test]
fn found_on_fresh_group_is_accepted() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());
    let fresh = id("Group-2@anywhere");
    let found = GroupCommand::found(fresh.clone(), None);

    let result = kernel.ingest(&f.stranger, &found.to_record()).unwrap();
    assert!(result.is_accepted());
    // Accepting does not record anything; that is the caller's job
    assert_eq!(f.directory.founder_of(&fresh), None);
}

#[test]
fn join_and_quit_follow_membership() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());

    let join = GroupCommand::join(f.group.clone());
    assert!(kernel.ingest(&f.stranger, &join.to_record()).unwrap().is_accepted());
    assert!(!kernel.ingest(&f.member, &join.to_record()).unwrap().is_accepted());

    let quit = GroupCommand::quit(f.group.clone());
    assert!(kernel.ingest(&f.member, &quit.to_record()).unwrap().is_accepted());
    assert!(kernel.ingest(&f.waiting_member, &quit.to_record()).unwrap().is_accepted());
    assert!(!kernel.ingest(&f.freezing_member, &quit.to_record()).unwrap().is_accepted());
    assert!(!kernel.ingest(&f.owner, &quit.to_record()).unwrap().is_accepted());
}

#[test]
fn query_is_open_to_current_members() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());
    let query = GroupCommand::query(f.group.clone());

    for who in [&f.owner, &f.admin, &f.member, &f.waiting_member, &f.freezing_member] {
        assert!(kernel.ingest(who, &query.to_record()).unwrap().is_accepted(), "{who}");
    }
    assert!(!kernel.ingest(&f.stranger, &query.to_record()).unwrap().is_accepted());
}

#[test]
fn legacy_expel_is_checked_as_reset() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());
    let expel = record(json!({
        "type": 0x89, "sn": 5, "time": 1_545_405_083,
        "group": f.group.to_string(),
        "command": "expel",
        "member": f.member.to_string(),
    }));

    let result = kernel.ingest(&f.owner, &expel).unwrap();
    assert!(result.is_accepted());
    let command = result.content().as_group_command().unwrap();
    assert_eq!(command.kind(), GroupCommandKind::Expel);
    assert_eq!(command.members().unwrap(), &[f.member.clone()]);

    // An admin may not expel another admin
    f.directory.set_role(&f.group, &id("ada2@anywhere"), MemberType::ADMIN);
    let expel_admin = record(json!({
        "type": 0x89, "sn": 6, "time": 1_545_405_083,
        "group": f.group.to_string(),
        "command": "expel",
        "members": ["ada2@anywhere"],
    }));
    let result = kernel.ingest(&f.admin, &expel_admin).unwrap();
    let IngestResult::Rejected { receipt, .. } = result else {
        panic!("expected rejection");
    };
    let reason = DenyReason::InvalidTarget {
        action: dimp_kernel::GroupAction::Reset,
        target: MemberType::ADMIN,
    };
    assert_eq!(receipt.message(), Some(format!("rejected: {reason}").as_str()));
}

#[test]
fn permissions_can_be_disabled() {
    let f = GroupFixture::new();
    let config = KernelConfig {
        enforce_permissions: false,
        ..KernelConfig::default()
    };
    let kernel = f.kernel(config);
    let reset = GroupCommand::reset(f.group.clone(), vec![f.stranger.clone()]);
    assert!(kernel.ingest(&f.stranger, &reset.to_record()).unwrap().is_accepted());
}

#[test]
fn speak_check_is_opt_in() {
    let f = GroupFixture::new();
    let text = TextContent::new("hello").with_group(f.group.clone());

    let kernel = f.kernel(KernelConfig::default());
    assert!(kernel.ingest(&f.stranger, &text.to_record()).unwrap().is_accepted());

    let kernel = f.kernel(KernelConfig {
        check_speak_permission: true,
        ..KernelConfig::default()
    });
    assert!(kernel.ingest(&f.member, &text.to_record()).unwrap().is_accepted());
    assert!(!kernel.ingest(&f.freezing_member, &text.to_record()).unwrap().is_accepted());
    assert!(!kernel.ingest(&f.stranger, &text.to_record()).unwrap().is_accepted());

    // Content outside any group is never checked
    let direct = TextContent::new("psst");
    assert!(kernel.ingest(&f.stranger, &direct.to_record()).unwrap().is_accepted());
}

#[test]
fn history_commands_in_a_group_need_write_history() {
    init_tracing();
    let f = GroupFixture::new();
    let rename = record(json!({
        "type": 0x89, "sn": 21, "time": 1_545_405_083,
        "group": f.group.to_string(),
        "command": "rename",
        "name": "weekend plans",
    }));

    let kernel = f.kernel(KernelConfig::default());
    let result = kernel.ingest(&f.stranger, &rename).unwrap();
    let IngestResult::Rejected { receipt, .. } = result else {
        panic!("a stranger may not write group history");
    };
    assert_eq!(receipt.envelope().sn(), 21);
    assert!(!kernel.ingest(&f.member, &rename).unwrap().is_accepted());
    assert!(!kernel.ingest(&f.admin, &rename).unwrap().is_accepted());
    assert!(kernel.ingest(&f.owner, &rename).unwrap().is_accepted());

    let kernel = f.kernel(KernelConfig {
        enforce_permissions: false,
        ..KernelConfig::default()
    });
    assert!(kernel.ingest(&f.stranger, &rename).unwrap().is_accepted());
}

#[test]
fn group_commands_without_time_are_still_checked() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());
    let invite = record(json!({
        "type": 0x89, "sn": 22,
        "group": f.group.to_string(),
        "command": "invite",
        "members": [f.stranger.to_string()],
    }));

    let result = kernel.ingest(&f.member, &invite).unwrap();
    assert!(result.is_accepted());
    assert_eq!(result.content().as_group_command().unwrap().time(), None);
    assert!(!kernel.ingest(&f.waiting_member, &invite).unwrap().is_accepted());
}

#[test]
fn profiles_must_verify() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());

    let good = f.signed_profile(&f.member, r#"{"name":"mem"}"#);
    let result = kernel.ingest(&f.member, &good.to_record()).unwrap();
    assert_eq!(result.content().content_type(), ContentType::COMMAND);

    let forged = Profile::sign(f.member.clone(), r#"{"name":"evil"}"#, &seeded_key("mallory"));
    let forged = ProfileCommand::response(f.member.clone(), forged, None);
    assert!(matches!(
        kernel.ingest(&f.stranger, &forged.to_record()),
        Err(KernelError::SignatureMismatch(_))
    ));

    let unknown = id("nobody@anywhere");
    let orphan = Profile::sign(unknown.clone(), "{}", &seeded_key("nobody@anywhere"));
    let orphan = ProfileCommand::response(unknown, orphan, None);
    assert!(matches!(
        kernel.ingest(&f.stranger, &orphan.to_record()),
        Err(KernelError::UnknownSigner(_))
    ));
}

#[test]
fn batch_drops_bad_records_and_continues() {
    init_tracing();
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());

    let forged = Profile::sign(f.member.clone(), "{}", &seeded_key("mallory"));
    let records = vec![
        TextContent::new("one").to_record(),
        record(json!({"type": 1, "sn": 2, "text": 42})),
        ProfileCommand::response(f.member.clone(), forged, None).to_record(),
        GroupCommand::join(f.group.clone()).to_record(),
        TextContent::new("two").to_record(),
    ];

    let report = kernel.ingest_batch(&f.member, &records);
    assert_eq!(report.dropped, 2);
    assert_eq!(report.results.len(), 3);
    assert!(report.results[0].is_accepted());
    assert!(matches!(report.results[1], IngestResult::Rejected { .. }));
    assert!(report.results[2].is_accepted());
}

#[test]
fn unknown_content_passes_through() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());

    let text = r#"{"type": 119, "sn": 3, "sticker": "parrot"}"#;
    let result = kernel.ingest_json(&f.stranger, text).unwrap();
    assert!(result.is_accepted());
    assert_eq!(result.content().to_record()["sticker"], "parrot");
}

#[test]
fn malformed_json_is_an_error() {
    let f = GroupFixture::new();
    let kernel = f.kernel(KernelConfig::default());
    assert!(matches!(
        kernel.ingest_json(&f.member, "{not json"),
        Err(KernelError::Core(_))
    ));
}

#[test]
fn directories_can_be_separate() {
    let roles = Arc::new(MemoryDirectory::new());
    let keys = Arc::new(MemoryDirectory::new());
    let group = id("g@anywhere");
    let owner = id("owner@anywhere");
    roles.set_role(&group, &owner, MemberType::OWNER);

    let kernel = dimp_kernel::Kernel::new(roles, keys, KernelConfig::default());
    let invite = GroupCommand::invite(group, vec![id("new@anywhere")]);
    assert!(kernel.ingest(&owner, &invite.to_record()).unwrap().is_accepted());
}

mod proptests {
    use super::*;
    use dimp_testkit::generators;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn every_built_in_content_ingests(content in generators::content()) {
            let f = GroupFixture::new();
            let kernel = f.kernel(KernelConfig::default());
            match kernel.ingest(&f.stranger, &content.to_record()) {
                Ok(result) => {
                    prop_assert_eq!(result.content(), &content);
                    if let IngestResult::Rejected { content, receipt } = &result {
                        prop_assert_eq!(receipt.envelope().sn(), content.sn());
                    }
                }
                // Generated profiles belong to identities the directory has no key for
                Err(e) => prop_assert!(
                    matches!(e, KernelError::UnknownSigner(_)),
                    "unexpected error: {}",
                    e
                ),
            }
        }

        #[test]
        fn strangers_only_join_or_found(command in generators::group_command()) {
            let f = GroupFixture::new();
            let kernel = f.kernel(KernelConfig::default());
            let result = kernel.ingest(&f.stranger, &command.to_record()).unwrap();
            let expected = matches!(
                command.kind(),
                GroupCommandKind::Join | GroupCommandKind::Found
            );
            prop_assert_eq!(result.is_accepted(), expected);
        }
    }
}
