//! The role × action permission matrix.
//!
//! Columns, left to right: Founder, Owner (Waiting/Normal/Freezing), Admin
//! (W/N/F), Member (W/N/F), Other. A missing row or cell denies.

use crate::action::GroupAction;
use crate::member::{BaseRole, MemberType, RoleModifier};

/// One cell of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Allow,
    Deny,
    /// Allowed a single time per group; the caller tracks whether it happened.
    Once,
}

use Rule::{Allow as A, Deny as D, Once as O};

const COLUMNS: usize = 11;

struct Row {
    action: GroupAction,
    cells: [Rule; COLUMNS],
}

const fn row(action: GroupAction, cells: [Rule; COLUMNS]) -> Row {
    Row { action, cells }
}

#[rustfmt::skip]
static TABLE: [Row; 12] = [
    //                              Fnd  Own W/N/F   Adm W/N/F   Mem W/N/F   Oth
    row(GroupAction::Found,        [O,   D, D, D,    D, D, D,    D, D, D,    D]),
    row(GroupAction::Abdicate,     [D,   D, A, D,    D, D, D,    D, D, D,    D]),
    row(GroupAction::Invite,       [D,   A, A, A,    A, A, A,    D, A, D,    D]),
    row(GroupAction::Reset,        [D,   D, A, A,    D, A, D,    D, D, D,    D]),
    row(GroupAction::Join,         [D,   D, D, D,    D, D, D,    D, D, D,    A]),
    row(GroupAction::Quit,         [D,   D, D, D,    D, D, D,    A, A, D,    D]),
    row(GroupAction::Query,        [D,   A, A, A,    A, A, A,    A, A, A,    D]),
    row(GroupAction::Hire,         [D,   D, A, A,    D, D, D,    D, D, D,    D]),
    row(GroupAction::Fire,         [D,   D, A, A,    D, D, D,    D, D, D,    D]),
    row(GroupAction::Resign,       [D,   D, D, D,    A, A, D,    D, D, D,    D]),
    row(GroupAction::Speak,        [D,   A, A, A,    A, A, A,    A, A, D,    D]),
    row(GroupAction::WriteHistory, [O,   D, A, A,    D, D, D,    D, D, D,    D]),
];

/// Column index for a role.
fn column(role: MemberType) -> usize {
    let state = match role.modifier() {
        RoleModifier::Waiting => 0,
        RoleModifier::Normal => 1,
        RoleModifier::Freezing => 2,
    };
    match role.base() {
        BaseRole::Founder => 0,
        BaseRole::Owner => 1 + state,
        BaseRole::Admin => 4 + state,
        BaseRole::Member => 7 + state,
        BaseRole::Other => 10,
    }
}

/// Look up the rule for `role` attempting `action`.
pub fn rule(role: MemberType, action: GroupAction) -> Rule {
    TABLE
        .iter()
        .find(|row| row.action == action)
        .map(|row| row.cells[column(role)])
        .unwrap_or(Rule::Deny)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_a_row() {
        for action in GroupAction::ALL {
            assert!(TABLE.iter().any(|row| row.action == action), "{action}");
        }
    }

    #[test]
    fn test_columns_are_distinct() {
        let mut seen: Vec<_> = MemberType::ALL.iter().map(|r| column(*r)).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), COLUMNS);
    }

    #[test]
    fn test_selected_cells() {
        assert_eq!(rule(MemberType::FOUNDER, GroupAction::Found), Rule::Once);
        assert_eq!(rule(MemberType::OWNER, GroupAction::Found), Rule::Deny);
        assert_eq!(rule(MemberType::OWNER_WAITING, GroupAction::Abdicate), Rule::Deny);
        assert_eq!(rule(MemberType::OWNER, GroupAction::Abdicate), Rule::Allow);
        assert_eq!(rule(MemberType::MEMBER_WAITING, GroupAction::Invite), Rule::Deny);
        assert_eq!(rule(MemberType::ADMIN_FREEZING, GroupAction::Reset), Rule::Deny);
        assert_eq!(rule(MemberType::OWNER_FREEZING, GroupAction::Reset), Rule::Allow);
        assert_eq!(rule(MemberType::OTHER, GroupAction::Join), Rule::Allow);
        assert_eq!(rule(MemberType::MEMBER, GroupAction::Join), Rule::Deny);
        assert_eq!(rule(MemberType::MEMBER_FREEZING, GroupAction::Quit), Rule::Deny);
        assert_eq!(rule(MemberType::OWNER, GroupAction::Quit), Rule::Deny);
        assert_eq!(rule(MemberType::ADMIN_FREEZING, GroupAction::Resign), Rule::Deny);
        assert_eq!(rule(MemberType::MEMBER_FREEZING, GroupAction::Speak), Rule::Deny);
        assert_eq!(rule(MemberType::FOUNDER, GroupAction::WriteHistory), Rule::Once);
        assert_eq!(rule(MemberType::ADMIN, GroupAction::WriteHistory), Rule::Deny);
    }
}
