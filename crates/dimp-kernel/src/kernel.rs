//! The Kernel: unified API for receiving DIMP content.
//!
//! The Kernel brings together the content registry, the permission engine
//! and the client's directories. It decodes incoming records, verifies signed
//! profiles, and decides whether group commands may take effect. It never
//! mutates membership: an accepted command is handed back for the caller to
//! apply.

use std::sync::Arc;

use dimp_core::registry::{self, ContentRegistry};
use dimp_core::{
    Command, Content, GroupCommand, GroupCommandKind, Id, ProfileCommand, ReceiptCommand, Record,
};
use dimp_perms::{
    check_founding, evaluate, Decision, DenyReason, FoundingDecision, GroupAction, MemberType,
    PermsError,
};

use crate::directory::{KeyDirectory, RoleDirectory};
use crate::error::{KernelError, Result};

/// Configuration for the Kernel.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Whether to consult the permission engine for group and history commands.
    pub enforce_permissions: bool,
    /// Whether ordinary content sent to a group is checked against `speak`.
    pub check_speak_permission: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            enforce_permissions: true,
            check_speak_permission: false,
        }
    }
}

/// Result of ingesting one record.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestResult {
    /// Decoded and allowed.
    Accepted(Content),
    /// A `found` retransmitted by the group's own founder; nothing to apply.
    Unchanged(Content),
    /// Decoded but refused. `receipt` is the rejection to send back.
    Rejected {
        content: Content,
        receipt: ReceiptCommand,
    },
}

impl IngestResult {
    pub fn content(&self) -> &Content {
        match self {
            IngestResult::Accepted(content)
            | IngestResult::Unchanged(content)
            | IngestResult::Rejected { content, .. } => content,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestResult::Accepted(_))
    }
}

/// Outcome of [`Kernel::ingest_batch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One result per record that decoded, in input order.
    pub results: Vec<IngestResult>,
    /// Records that failed to decode or verify.
    pub dropped: usize,
}

/// Whether a group command may take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    /// Allowed, but already in effect.
    Unchanged,
    Denied(DenyReason),
}

impl From<Decision> for Authorization {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Permit | Decision::PermitOnce => Authorization::Granted,
            Decision::Deny(reason) => Authorization::Denied(reason),
        }
    }
}

/// The main Kernel struct.
///
/// Provides a unified API for:
/// - Decoding single records and batches
/// - Verifying signed profiles
/// - Authorizing group and history commands against the current role snapshot
pub struct Kernel<R: RoleDirectory, K: KeyDirectory> {
    /// Decoder tables.
    registry: Arc<ContentRegistry>,
    /// Current group roles.
    roles: Arc<R>,
    /// Verification keys.
    keys: Arc<K>,
    /// Configuration.
    config: KernelConfig,
}

impl<R: RoleDirectory, K: KeyDirectory> Kernel<R, K> {
    /// Create a new kernel using the process-wide registry.
    pub fn new(roles: Arc<R>, keys: Arc<K>, config: KernelConfig) -> Self {
        Self {
            registry: Arc::new(registry::global().clone()),
            roles,
            keys,
            config,
        }
    }

    /// Decode with `registry` instead of the process-wide one.
    pub fn with_registry(mut self, registry: ContentRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn roles(&self) -> &R {
        &self.roles
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ingest
    // ─────────────────────────────────────────────────────────────────────────

    /// Ingest one record sent by `sender`.
    ///
    /// Fails when the record does not decode or a profile does not verify.
    /// A permission denial is not an error: it yields
    /// [`IngestResult::Rejected`] with the receipt to send back.
    pub fn ingest(&self, sender: &Id, record: &Record) -> Result<IngestResult> {
        let content = self.registry.decode(record)?;

        let authorization = match &content {
            Content::Command(Command::Profile(command)) => {
                self.verify_profile(command)?;
                Authorization::Granted
            }
            Content::Command(Command::Group(command)) if self.config.enforce_permissions => {
                self.authorize(sender, command)
            }
            Content::Command(command)
                if command.is_history() && self.config.enforce_permissions =>
            {
                match content.group() {
                    Some(group) => self.may_write_history(sender, group).into(),
                    None => Authorization::Granted,
                }
            }
            Content::Command(_) => Authorization::Granted,
            _ => match content.group() {
                Some(group) if self.config.check_speak_permission => {
                    self.may_speak(sender, group).into()
                }
                _ => Authorization::Granted,
            },
        };

        Ok(match authorization {
            Authorization::Granted => IngestResult::Accepted(content),
            Authorization::Unchanged => IngestResult::Unchanged(content),
            Authorization::Denied(reason) => {
                tracing::debug!(
                    "Rejecting {:?} sn={} from {}: {}",
                    content.content_type(),
                    content.sn(),
                    sender,
                    reason
                );
                let receipt = ReceiptCommand::rejection(content.envelope(), &reason);
                IngestResult::Rejected { content, receipt }
            }
        })
    }

    /// Ingest JSON text sent by `sender`.
    pub fn ingest_json(&self, sender: &Id, text: &str) -> Result<IngestResult> {
        self.ingest(sender, &dimp_core::record::from_json(text)?)
    }

    /// Ingest a batch of records from one sender.
    ///
    /// A record that fails is logged and dropped; the rest still go through.
    pub fn ingest_batch<'a>(
        &self,
        sender: &Id,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for (index, record) in records.into_iter().enumerate() {
            match self.ingest(sender, record) {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    tracing::warn!("Dropping record {} from {}: {}", index, sender, e);
                    report.dropped += 1;
                }
            }
        }
        report
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────────

    /// Decide whether `sender` may issue `command` given the current roles.
    pub fn authorize(&self, sender: &Id, command: &GroupCommand) -> Authorization {
        let group = command.group();

        if command.kind() == GroupCommandKind::Found {
            let founder = self.roles.founder_of(group);
            return match check_founding(founder.as_ref(), &sender.without_terminal()) {
                FoundingDecision::Accept => {
                    evaluate(MemberType::FOUNDER, GroupAction::Found, None).into()
                }
                FoundingDecision::AlreadyFounded => Authorization::Unchanged,
                FoundingDecision::Deny(reason) => Authorization::Denied(reason),
            };
        }

        let actor = self.roles.role_of(group, sender);
        let action = GroupAction::from(command.kind());

        let mut decision = evaluate(actor, action, None);
        for target in rated_targets(command) {
            if !decision.is_permitted() {
                break;
            }
            decision = evaluate(actor, action, Some(self.roles.role_of(group, target)));
        }
        decision.into()
    }

    /// Like [`authorize`](Self::authorize), for callers that propagate
    /// denials with `?`, e.g. before sending a command of their own.
    pub fn require_authorized(&self, sender: &Id, command: &GroupCommand) -> Result<Authorization> {
        match self.authorize(sender, command) {
            Authorization::Denied(reason) => {
                Err(KernelError::Permission(PermsError::PermissionDenied(reason)))
            }
            authorization => Ok(authorization),
        }
    }

    /// Whether `sender` may post ordinary content to `group`.
    pub fn may_speak(&self, sender: &Id, group: &Id) -> Decision {
        evaluate(self.roles.role_of(group, sender), GroupAction::Speak, None)
    }

    /// Whether `sender` may append a non-membership history command to `group`.
    pub fn may_write_history(&self, sender: &Id, group: &Id) -> Decision {
        evaluate(self.roles.role_of(group, sender), GroupAction::WriteHistory, None)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profiles
    // ─────────────────────────────────────────────────────────────────────────

    /// Check a profile response against its owner's key.
    ///
    /// Queries carry no profile and always pass.
    pub fn verify_profile(&self, command: &ProfileCommand) -> Result<()> {
        let Some(profile) = command.profile() else {
            return Ok(());
        };

        let owner = profile.identifier();
        if owner.without_terminal() != command.identifier().without_terminal() {
            return Err(KernelError::SignatureMismatch(command.identifier().clone()));
        }

        let key = self
            .keys
            .verify_key(owner)
            .ok_or_else(|| KernelError::UnknownSigner(owner.clone()))?;

        if !profile.verify(key.as_ref()) {
            return Err(KernelError::SignatureMismatch(owner.clone()));
        }
        Ok(())
    }
}

/// Participants whose current role constrains the command.
///
/// `reset` and `invite` name the resulting or added members, not the ones
/// affected, so only commands aimed at specific participants are rated.
fn rated_targets(command: &GroupCommand) -> &[Id] {
    match command.kind() {
        GroupCommandKind::Abdicate | GroupCommandKind::Expel => command.members().unwrap_or(&[]),
        GroupCommandKind::Hire | GroupCommandKind::Fire => {
            command.administrators().unwrap_or(&[])
        }
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use dimp_core::{
        Ed25519PrivateKey, GenericCommand, PrivateKey, Profile, TextContent, WireContent,
    };

    fn id(s: &str) -> Id {
        Id::parse(s).unwrap()
    }

    fn kernel(dir: &Arc<MemoryDirectory>) -> Kernel<MemoryDirectory, MemoryDirectory> {
        Kernel::new(dir.clone(), dir.clone(), KernelConfig::default())
    }

    fn group_dir() -> Arc<MemoryDirectory> {
        let dir = Arc::new(MemoryDirectory::new());
        let group = id("group@x");
        dir.set_founder(&group, &id("founder@x"));
        dir.set_role(&group, &id("owner@x"), MemberType::OWNER);
        dir.set_role(&group, &id("admin@x"), MemberType::ADMIN);
        dir.set_role(&group, &id("member@x"), MemberType::MEMBER);
        dir.set_role(&group, &id("leaving@x"), MemberType::MEMBER_FREEZING);
        dir
    }

    #[test]
    fn test_default_config() {
        let config = KernelConfig::default();
        assert!(config.enforce_permissions);
        assert!(!config.check_speak_permission);
    }

    #[test]
    fn test_plain_content_is_accepted() {
        let dir = group_dir();
        let text = TextContent::new("hi").with_group(id("group@x"));
        let result = kernel(&dir).ingest(&id("stranger@x"), &text.to_record()).unwrap();
        assert!(result.is_accepted());
    }

    #[test]
    fn test_speak_check() {
        let dir = group_dir();
        let kernel = kernel(&dir);
        assert!(kernel.may_speak(&id("member@x"), &id("group@x")).is_permitted());
        assert!(!kernel.may_speak(&id("leaving@x"), &id("group@x")).is_permitted());
        assert!(!kernel.may_speak(&id("stranger@x"), &id("group@x")).is_permitted());
    }

    #[test]
    fn test_history_commands_in_a_group_are_checked() {
        let dir = group_dir();
        let kernel = kernel(&dir);
        let rename = GenericCommand::history("rename")
            .with_group(id("group@x"))
            .with_field("name", "new name");

        let result = kernel.ingest(&id("stranger@x"), &rename.to_record()).unwrap();
        assert!(matches!(result, IngestResult::Rejected { .. }));
        let result = kernel.ingest(&id("admin@x"), &rename.to_record()).unwrap();
        assert!(matches!(result, IngestResult::Rejected { .. }));
        let result = kernel.ingest(&id("owner@x"), &rename.to_record()).unwrap();
        assert!(result.is_accepted());
        assert!(kernel.may_write_history(&id("founder@x"), &id("group@x")).is_permitted());
    }

    #[test]
    fn test_history_commands_outside_a_group_pass() {
        let dir = group_dir();
        let rename = GenericCommand::history("rename");
        let result = kernel(&dir).ingest(&id("stranger@x"), &rename.to_record()).unwrap();
        assert!(result.is_accepted());
    }

    #[test]
    fn test_authorize_targets() {
        let dir = group_dir();
        let kernel = kernel(&dir);
        let group = id("group@x");

        let hire = GroupCommand::hire(group.clone(), Some(vec![id("member@x")]), None);
        assert_eq!(kernel.authorize(&id("owner@x"), &hire), Authorization::Granted);

        let hire_admin = GroupCommand::hire(group.clone(), Some(vec![id("admin@x")]), None);
        assert!(matches!(
            kernel.authorize(&id("owner@x"), &hire_admin),
            Authorization::Denied(DenyReason::InvalidTarget { .. })
        ));

        let abdicate = GroupCommand::abdicate(group.clone(), id("stranger@x"));
        assert!(matches!(
            kernel.authorize(&id("owner@x"), &abdicate),
            Authorization::Denied(DenyReason::InvalidTarget { .. })
        ));

        let reset = GroupCommand::reset(group, vec![id("owner@x"), id("member@x")]);
        assert_eq!(kernel.authorize(&id("owner@x"), &reset), Authorization::Granted);
    }

    #[test]
    fn test_authorize_founding() {
        let dir = group_dir();
        let kernel = kernel(&dir);

        let refound = GroupCommand::found(id("group@x"), None);
        assert_eq!(kernel.authorize(&id("founder@x/phone"), &refound), Authorization::Unchanged);
        assert!(matches!(
            kernel.authorize(&id("owner@x"), &refound),
            Authorization::Denied(DenyReason::FoundedByOther { .. })
        ));

        let fresh = GroupCommand::found(id("fresh@x"), Some(vec![id("member@x")]));
        assert_eq!(kernel.authorize(&id("stranger@x"), &fresh), Authorization::Granted);
    }

    #[test]
    fn test_require_authorized() {
        let dir = group_dir();
        let kernel = kernel(&dir);
        let resign = GroupCommand::resign(id("group@x"));
        assert!(kernel.require_authorized(&id("admin@x"), &resign).is_ok());
        assert!(matches!(
            kernel.require_authorized(&id("member@x"), &resign),
            Err(KernelError::Permission(PermsError::PermissionDenied(_)))
        ));
    }

    #[test]
    fn test_verify_profile() {
        let dir = Arc::new(MemoryDirectory::new());
        let key = Ed25519PrivateKey::from_seed(&[1; 32]);
        let moki = id("moki@x");
        dir.set_verify_key(&moki, Arc::new(key.public_key()));
        let kernel = kernel(&dir);

        let profile = Profile::sign(moki.clone(), r#"{"name":"Moki"}"#, &key);
        let good = ProfileCommand::response(moki.clone(), profile.clone(), None);
        assert!(kernel.verify_profile(&good).is_ok());

        let hijacked = ProfileCommand::response(id("hulk@x"), profile, None);
        assert!(matches!(
            kernel.verify_profile(&hijacked),
            Err(KernelError::SignatureMismatch(_))
        ));

        let forged = Profile::sign(moki.clone(), "{}", &Ed25519PrivateKey::from_seed(&[2; 32]));
        let forged = ProfileCommand::response(moki, forged, None);
        assert!(matches!(
            kernel.verify_profile(&forged),
            Err(KernelError::SignatureMismatch(_))
        ));

        assert!(kernel.verify_profile(&ProfileCommand::query(id("hulk@x"))).is_ok());
    }
}
