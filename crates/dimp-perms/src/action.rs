//! Actions the permission table rules on.

use std::fmt;

use dimp_core::GroupCommandKind;

/// Something a participant may attempt in a group.
///
/// Every group command maps to an action; `Speak` and `WriteHistory` cover
/// ordinary messages and history entries that are not membership commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupAction {
    Found,
    Abdicate,
    Invite,
    /// Remove or replace members. Deprecated `expel` commands land here too.
    Reset,
    Join,
    Quit,
    Query,
    Hire,
    Fire,
    Resign,
    Speak,
    WriteHistory,
}

impl GroupAction {
    pub const ALL: [GroupAction; 12] = [
        GroupAction::Found,
        GroupAction::Abdicate,
        GroupAction::Invite,
        GroupAction::Reset,
        GroupAction::Join,
        GroupAction::Quit,
        GroupAction::Query,
        GroupAction::Hire,
        GroupAction::Fire,
        GroupAction::Resign,
        GroupAction::Speak,
        GroupAction::WriteHistory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GroupAction::Found => "found",
            GroupAction::Abdicate => "abdicate",
            GroupAction::Invite => "invite",
            GroupAction::Reset => "reset",
            GroupAction::Join => "join",
            GroupAction::Quit => "quit",
            GroupAction::Query => "query",
            GroupAction::Hire => "hire",
            GroupAction::Fire => "fire",
            GroupAction::Resign => "resign",
            GroupAction::Speak => "speak",
            GroupAction::WriteHistory => "write-history",
        }
    }
}

impl From<GroupCommandKind> for GroupAction {
    fn from(kind: GroupCommandKind) -> Self {
        match kind {
            GroupCommandKind::Found => GroupAction::Found,
            GroupCommandKind::Abdicate => GroupAction::Abdicate,
            GroupCommandKind::Invite => GroupAction::Invite,
            GroupCommandKind::Expel | GroupCommandKind::Reset => GroupAction::Reset,
            GroupCommandKind::Join => GroupAction::Join,
            GroupCommandKind::Quit => GroupAction::Quit,
            GroupCommandKind::Query => GroupAction::Query,
            GroupCommandKind::Hire => GroupAction::Hire,
            GroupCommandKind::Fire => GroupAction::Fire,
            GroupCommandKind::Resign => GroupAction::Resign,
        }
    }
}

impl fmt::Display for GroupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
