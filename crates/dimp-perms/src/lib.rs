//! # DIMP Permissions
//!
//! Group roles and the permission engine for group commands.
//!
//! ## Overview
//!
//! Every participant of a group holds a [`MemberType`]: a base role
//! (Founder, Owner, Admin, Member, Other) and, for the middle three, a
//! Waiting or Freezing state. Whether a role may issue a group command is
//! answered by a static table; absence from the table denies.
//!
//! The engine takes the caller's current role snapshot as input. It does not
//! resolve roles and never applies role transitions; that belongs to whoever
//! stores group membership.
//!
//! ## Usage
//!
//! ```rust
//! use dimp_core::GroupCommandKind;
//! use dimp_perms::{can_execute, MemberType};
//!
//! assert!(can_execute(MemberType::OWNER, GroupCommandKind::Hire, Some(MemberType::MEMBER)));
//! assert!(!can_execute(MemberType::MEMBER, GroupCommandKind::Hire, Some(MemberType::MEMBER)));
//! ```

pub mod action;
pub mod error;
pub mod member;
pub mod policy;
pub mod table;

pub use action::GroupAction;
pub use error::{PermsError, Result};
pub use member::{BaseRole, MemberType, RoleModifier};
pub use policy::{can_execute, check_founding, evaluate, Decision, DenyReason, FoundingDecision};
pub use table::Rule;
