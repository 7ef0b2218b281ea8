//! Group membership commands.
//!
//! Group commands are history commands: they always carry the group they act
//! on. Outbound commands are stamped with their issuance time; older records
//! without one decode with an unknown time. Member lists are ordered; the
//! first entry matters for commands such as `abdicate`.
//!
//! Legacy records carry a single `member` instead of a `members` list. It is
//! read as a one-element list and never written back.

use crate::command::command_record;
use crate::content::{Envelope, WireContent};
use crate::error::{CoreError, Result};
use crate::record::{self, keys, Record};
use crate::types::{ContentType, Id};

/// The kinds of group command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupCommandKind {
    Found,
    Abdicate,
    Invite,
    /// Superseded by [`GroupCommandKind::Reset`]; accepted on input only.
    ///
    /// No constructor emits it, but a decoded `expel` re-encodes under its own
    /// name: its list holds the removed members, not the new membership.
    Expel,
    Join,
    Quit,
    Query,
    Reset,
    Hire,
    Fire,
    Resign,
}

impl GroupCommandKind {
    pub const ALL: [GroupCommandKind; 11] = [
        GroupCommandKind::Found,
        GroupCommandKind::Abdicate,
        GroupCommandKind::Invite,
        GroupCommandKind::Expel,
        GroupCommandKind::Join,
        GroupCommandKind::Quit,
        GroupCommandKind::Query,
        GroupCommandKind::Reset,
        GroupCommandKind::Hire,
        GroupCommandKind::Fire,
        GroupCommandKind::Resign,
    ];

    /// The command name on the wire.
    pub fn name(self) -> &'static str {
        match self {
            GroupCommandKind::Found => "found",
            GroupCommandKind::Abdicate => "abdicate",
            GroupCommandKind::Invite => "invite",
            GroupCommandKind::Expel => "expel",
            GroupCommandKind::Join => "join",
            GroupCommandKind::Quit => "quit",
            GroupCommandKind::Query => "query",
            GroupCommandKind::Reset => "reset",
            GroupCommandKind::Hire => "hire",
            GroupCommandKind::Fire => "fire",
            GroupCommandKind::Resign => "resign",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether a record of this kind is malformed without a member list.
    pub fn requires_members(self) -> bool {
        matches!(
            self,
            GroupCommandKind::Abdicate
                | GroupCommandKind::Invite
                | GroupCommandKind::Expel
                | GroupCommandKind::Reset
        )
    }

    /// Whether this kind manages administrators or assistants.
    pub fn is_staffing(self) -> bool {
        matches!(self, GroupCommandKind::Hire | GroupCommandKind::Fire)
    }

    pub fn is_deprecated(self) -> bool {
        self == GroupCommandKind::Expel
    }
}

/// A group membership command.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCommand {
    envelope: Envelope,
    kind: GroupCommandKind,
    group: Id,
    members: Option<Vec<Id>>,
    administrators: Option<Vec<Id>>,
    assistants: Option<Vec<Id>>,
}

impl GroupCommand {
    fn build(kind: GroupCommandKind, group: Id) -> Self {
        let mut envelope = Envelope::new(ContentType::HISTORY);
        envelope.group = Some(group.clone());
        Self {
            envelope,
            kind,
            group,
            members: None,
            administrators: None,
            assistants: None,
        }
    }

    fn with_member_list(kind: GroupCommandKind, group: Id, members: Vec<Id>) -> Self {
        Self {
            members: Some(members),
            ..Self::build(kind, group)
        }
    }

    /// Create a group. Initial members are optional.
    pub fn found(group: Id, members: Option<Vec<Id>>) -> Self {
        Self {
            members,
            ..Self::build(GroupCommandKind::Found, group)
        }
    }

    /// Hand ownership to `successor`.
    pub fn abdicate(group: Id, successor: Id) -> Self {
        Self::with_member_list(GroupCommandKind::Abdicate, group, vec![successor])
    }

    pub fn invite(group: Id, members: Vec<Id>) -> Self {
        Self::with_member_list(GroupCommandKind::Invite, group, members)
    }

    /// Replace the whole member list.
    pub fn reset(group: Id, members: Vec<Id>) -> Self {
        Self::with_member_list(GroupCommandKind::Reset, group, members)
    }

    pub fn join(group: Id) -> Self {
        Self::build(GroupCommandKind::Join, group)
    }

    pub fn quit(group: Id) -> Self {
        Self::build(GroupCommandKind::Quit, group)
    }

    /// Ask for the current member list.
    pub fn query(group: Id) -> Self {
        Self::build(GroupCommandKind::Query, group)
    }

    pub fn hire(group: Id, administrators: Option<Vec<Id>>, assistants: Option<Vec<Id>>) -> Self {
        Self {
            administrators,
            assistants,
            ..Self::build(GroupCommandKind::Hire, group)
        }
    }

    pub fn fire(group: Id, administrators: Option<Vec<Id>>, assistants: Option<Vec<Id>>) -> Self {
        Self {
            administrators,
            assistants,
            ..Self::build(GroupCommandKind::Fire, group)
        }
    }

    /// Step down as administrator.
    pub fn resign(group: Id) -> Self {
        Self::build(GroupCommandKind::Resign, group)
    }

    /// Override the serial number.
    pub fn with_sn(mut self, sn: i64) -> Self {
        self.envelope.sn = sn;
        self
    }

    /// Override the issuance time.
    pub fn with_time(mut self, time: i64) -> Self {
        self.envelope.time = Some(time);
        self
    }

    pub fn kind(&self) -> GroupCommandKind {
        self.kind
    }

    pub fn group(&self) -> &Id {
        &self.group
    }

    /// Issuance time, when the sender stamped one.
    pub fn time(&self) -> Option<i64> {
        self.envelope.time
    }

    /// The ordered member list.
    ///
    /// Fails when the command carries neither `members` nor `member`.
    pub fn members(&self) -> Result<&[Id]> {
        self.members
            .as_deref()
            .ok_or_else(|| CoreError::MalformedRecord("group command has no members".into()))
    }

    /// Replace the member list. Any legacy `member` field is dropped.
    pub fn set_members(&mut self, members: Vec<Id>) {
        self.envelope.extra.remove(keys::MEMBER);
        self.members = Some(members);
    }

    pub fn administrators(&self) -> Option<&[Id]> {
        self.administrators.as_deref()
    }

    pub fn assistants(&self) -> Option<&[Id]> {
        self.assistants.as_deref()
    }

    /// Every identifier this command acts upon, in wire order.
    pub fn targets(&self) -> impl Iterator<Item = &Id> {
        let lists = [&self.members, &self.administrators, &self.assistants];
        lists.into_iter().flatten().flatten()
    }
}

impl WireContent for GroupCommand {
    const FIELDS: &'static [&'static str] = &[
        keys::COMMAND,
        keys::MEMBER,
        keys::MEMBERS,
        keys::ADMINISTRATORS,
        keys::ASSISTANTS,
    ];

    fn from_record(record: &Record) -> Result<Self> {
        let name = record::require_str(record, keys::COMMAND)?;
        let kind = GroupCommandKind::from_name(name).ok_or_else(|| {
            CoreError::MalformedRecord(format!("`{name}` is not a group command"))
        })?;

        let envelope = Envelope::parse(record, Self::FIELDS)?;
        let group = envelope.group().cloned().ok_or_else(|| CoreError::missing(keys::GROUP))?;

        let members = match record::get_ids(record, keys::MEMBERS)? {
            Some(members) => Some(members),
            None => record::get_id(record, keys::MEMBER)?.map(|member| vec![member]),
        };
        if kind.requires_members() && members.is_none() {
            return Err(CoreError::MalformedRecord(format!(
                "`{name}` command without `members`"
            )));
        }

        let administrators = record::get_ids(record, keys::ADMINISTRATORS)?;
        let assistants = record::get_ids(record, keys::ASSISTANTS)?;
        if kind.is_staffing() && administrators.is_none() && assistants.is_none() {
            return Err(CoreError::MalformedRecord(format!(
                "`{name}` command without `administrators` or `assistants`"
            )));
        }

        Ok(Self {
            envelope,
            kind,
            group,
            members,
            administrators,
            assistants,
        })
    }

    fn to_record(&self) -> Record {
        let mut map = command_record(&self.envelope, self.kind.name());
        if let Some(members) = &self.members {
            record::put_ids(&mut map, keys::MEMBERS, members);
        }
        if let Some(administrators) = &self.administrators {
            record::put_ids(&mut map, keys::ADMINISTRATORS, administrators);
        }
        if let Some(assistants) = &self.assistants {
            record::put_ids(&mut map, keys::ASSISTANTS, assistants);
        }
        map
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}
