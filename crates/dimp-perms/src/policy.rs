//! Permission evaluation.
//!
//! The engine is a pure function of the current role snapshot: it never
//! looks anything up and never changes a role. Callers resolve roles, ask,
//! and render a denial as a protocol-level rejection.

use std::fmt;

use dimp_core::Id;

use crate::action::GroupAction;
use crate::error::{PermsError, Result};
use crate::member::{BaseRole, MemberType};
use crate::table::{self, Rule};

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The table does not allow this role to take this action.
    NotPermitted { actor: MemberType, action: GroupAction },
    /// The action is allowed, but not against a participant with this role.
    InvalidTarget {
        action: GroupAction,
        target: MemberType,
    },
    /// The group already has a different founder.
    FoundedByOther { founder: Id },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NotPermitted { actor, action } => {
                write!(f, "{actor} may not {action}")
            }
            DenyReason::InvalidTarget { action, target } => {
                write!(f, "cannot {action} a participant who is {target}")
            }
            DenyReason::FoundedByOther { founder } => {
                write!(f, "group already founded by {founder}")
            }
        }
    }
}

/// Outcome of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Permit,
    /// Permitted only if it has not happened yet; see [`check_founding`].
    PermitOnce,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_permitted(&self) -> bool {
        !matches!(self, Decision::Deny(_))
    }

    /// Turn a denial into an error, for callers that propagate with `?`.
    pub fn into_result(self) -> Result<Self> {
        match self {
            Decision::Deny(reason) => Err(PermsError::PermissionDenied(reason)),
            decision => Ok(decision),
        }
    }
}

/// Evaluate `actor` taking `action`, optionally against a participant whose
/// role is `target`.
pub fn evaluate(
    actor: MemberType,
    action: impl Into<GroupAction>,
    target: Option<MemberType>,
) -> Decision {
    let action = action.into();
    let decision = match table::rule(actor, action) {
        Rule::Allow => Decision::Permit,
        Rule::Once => Decision::PermitOnce,
        Rule::Deny => return Decision::Deny(DenyReason::NotPermitted { actor, action }),
    };

    match target {
        Some(target) if !target_allowed(actor, action, target) => {
            Decision::Deny(DenyReason::InvalidTarget { action, target })
        }
        _ => decision,
    }
}

/// Whether `actor` may take `action` against `target`.
pub fn can_execute(
    actor: MemberType,
    action: impl Into<GroupAction>,
    target: Option<MemberType>,
) -> bool {
    evaluate(actor, action, target).is_permitted()
}

/// Constraints on who an action may be aimed at.
fn target_allowed(actor: MemberType, action: GroupAction, target: MemberType) -> bool {
    match action {
        GroupAction::Hire => target.base() == BaseRole::Member,
        GroupAction::Fire => target.base() == BaseRole::Admin,
        GroupAction::Abdicate => matches!(target.base(), BaseRole::Member | BaseRole::Admin),
        GroupAction::Reset => match target.base() {
            BaseRole::Owner | BaseRole::Founder => false,
            BaseRole::Admin => actor.base() != BaseRole::Admin,
            BaseRole::Member | BaseRole::Other => true,
        },
        _ => true,
    }
}

/// Outcome of a `found` attempt against the recorded founder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoundingDecision {
    /// No founder yet: record `actor`.
    Accept,
    /// `actor` already founded this group: a retransmission, nothing to do.
    AlreadyFounded,
    Deny(DenyReason),
}

/// Decide a `found` by `actor` given the founder on record, if any.
pub fn check_founding(recorded: Option<&Id>, actor: &Id) -> FoundingDecision {
    match recorded {
        None => FoundingDecision::Accept,
        Some(founder) if founder == actor => FoundingDecision::AlreadyFounded,
        Some(founder) => FoundingDecision::Deny(DenyReason::FoundedByOther {
            founder: founder.clone(),
        }),
    }
}
