//! Group roles.
//!
//! On the wire a role is one byte: a base role pattern in the low six bits
//! and an optional Waiting or Freezing flag in the top two.
//!
//! | Role    | Bits        |
//! |---------|-------------|
//! | Founder | `0010_0000` |
//! | Owner   | `0011_1111` |
//! | Admin   | `0000_1111` |
//! | Member  | `0000_0111` |
//! | Other   | `0000_0000` |
//! | Waiting | `0100_0000` |
//! | Freezing| `1000_0000` |
//!
//! Internally the base role and modifier are separate fields; the combined
//! byte only exists at the serialization boundary.

use std::fmt;
use std::ops::BitAnd;

use serde::{Deserialize, Serialize};

use crate::error::{PermsError, Result};

/// The permission tier of a group participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseRole {
    Other,
    Member,
    Admin,
    Owner,
    Founder,
}

impl BaseRole {
    pub const fn bits(self) -> u8 {
        match self {
            BaseRole::Other => 0b0000_0000,
            BaseRole::Member => 0b0000_0111,
            BaseRole::Admin => 0b0000_1111,
            BaseRole::Owner => 0b0011_1111,
            BaseRole::Founder => 0b0010_0000,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b0000_0000 => Some(BaseRole::Other),
            0b0000_0111 => Some(BaseRole::Member),
            0b0000_1111 => Some(BaseRole::Admin),
            0b0011_1111 => Some(BaseRole::Owner),
            0b0010_0000 => Some(BaseRole::Founder),
            _ => None,
        }
    }

    /// Whether the role takes Waiting/Freezing modifiers.
    pub fn has_states(self) -> bool {
        matches!(self, BaseRole::Owner | BaseRole::Admin | BaseRole::Member)
    }
}

/// Transitional state layered over a base role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleModifier {
    Normal,
    /// Appointed, not yet confirmed.
    Waiting,
    /// Leaving, not yet confirmed.
    Freezing,
}

impl RoleModifier {
    pub const MASK: u8 = 0b1100_0000;

    pub const fn bits(self) -> u8 {
        match self {
            RoleModifier::Normal => 0b0000_0000,
            RoleModifier::Waiting => 0b0100_0000,
            RoleModifier::Freezing => 0b1000_0000,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & Self::MASK {
            0b0000_0000 => Some(RoleModifier::Normal),
            0b0100_0000 => Some(RoleModifier::Waiting),
            0b1000_0000 => Some(RoleModifier::Freezing),
            _ => None,
        }
    }
}

/// A group role: base role plus modifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MemberType {
    base: BaseRole,
    modifier: RoleModifier,
}

impl MemberType {
    pub const FOUNDER: Self = Self::normal(BaseRole::Founder);
    pub const OWNER: Self = Self::normal(BaseRole::Owner);
    pub const OWNER_WAITING: Self = Self::with(BaseRole::Owner, RoleModifier::Waiting);
    pub const OWNER_FREEZING: Self = Self::with(BaseRole::Owner, RoleModifier::Freezing);
    pub const ADMIN: Self = Self::normal(BaseRole::Admin);
    pub const ADMIN_WAITING: Self = Self::with(BaseRole::Admin, RoleModifier::Waiting);
    pub const ADMIN_FREEZING: Self = Self::with(BaseRole::Admin, RoleModifier::Freezing);
    pub const MEMBER: Self = Self::normal(BaseRole::Member);
    pub const MEMBER_WAITING: Self = Self::with(BaseRole::Member, RoleModifier::Waiting);
    pub const MEMBER_FREEZING: Self = Self::with(BaseRole::Member, RoleModifier::Freezing);
    pub const OTHER: Self = Self::normal(BaseRole::Other);

    /// Every valid role.
    pub const ALL: [Self; 11] = [
        Self::FOUNDER,
        Self::OWNER_WAITING,
        Self::OWNER,
        Self::OWNER_FREEZING,
        Self::ADMIN_WAITING,
        Self::ADMIN,
        Self::ADMIN_FREEZING,
        Self::MEMBER_WAITING,
        Self::MEMBER,
        Self::MEMBER_FREEZING,
        Self::OTHER,
    ];

    const fn normal(base: BaseRole) -> Self {
        Self::with(base, RoleModifier::Normal)
    }

    const fn with(base: BaseRole, modifier: RoleModifier) -> Self {
        Self { base, modifier }
    }

    /// Combine a base role and modifier. Founder and Other have no states.
    pub fn new(base: BaseRole, modifier: RoleModifier) -> Result<Self> {
        let role = Self::with(base, modifier);
        if modifier != RoleModifier::Normal && !base.has_states() {
            return Err(PermsError::InvalidMemberType(role.bits()));
        }
        Ok(role)
    }

    /// Decode the wire byte.
    pub fn from_bits(bits: u8) -> Result<Self> {
        let modifier = RoleModifier::from_bits(bits).ok_or(PermsError::InvalidMemberType(bits))?;
        let base = BaseRole::from_bits(bits & !RoleModifier::MASK)
            .ok_or(PermsError::InvalidMemberType(bits))?;
        Self::new(base, modifier)
    }

    /// Encode to the wire byte.
    pub const fn bits(self) -> u8 {
        self.base.bits() | self.modifier.bits()
    }

    pub fn base(self) -> BaseRole {
        self.base
    }

    pub fn modifier(self) -> RoleModifier {
        self.modifier
    }

    /// Containment on base bits, modifiers masked out.
    ///
    /// An Owner is at least an Admin and at least a Member, whatever its state.
    pub fn is_at_least(self, base: BaseRole) -> bool {
        self.base.bits() & base.bits() == base.bits()
    }

    /// Whether moving from this role to `next` is a legal state change.
    ///
    /// Legal edges keep the base role: Waiting to Normal, Normal to Freezing,
    /// Freezing back to Normal. Applying a change is up to whoever owns the
    /// membership state.
    pub fn can_transition_to(self, next: MemberType) -> bool {
        if self.base != next.base {
            return false;
        }
        matches!(
            (self.modifier, next.modifier),
            (RoleModifier::Waiting, RoleModifier::Normal)
                | (RoleModifier::Normal, RoleModifier::Freezing)
                | (RoleModifier::Freezing, RoleModifier::Normal)
        )
    }
}

/// Bitwise AND of the wire bytes.
///
/// Valid role bytes are closed under AND, so the result is always a role.
impl BitAnd for MemberType {
    type Output = MemberType;

    fn bitand(self, rhs: Self) -> Self {
        Self::from_bits(self.bits() & rhs.bits()).unwrap_or(Self::OTHER)
    }
}

impl TryFrom<u8> for MemberType {
    type Error = PermsError;

    fn try_from(bits: u8) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl From<MemberType> for u8 {
    fn from(role: MemberType) -> Self {
        role.bits()
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.base)?;
        match self.modifier {
            RoleModifier::Normal => Ok(()),
            RoleModifier::Waiting => f.write_str("Waiting"),
            RoleModifier::Freezing => f.write_str("Freezing"),
        }
    }
}

impl fmt::Debug for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberType({} {:#010b})", self, self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_roundtrip() {
        for role in MemberType::ALL {
            assert_eq!(MemberType::from_bits(role.bits()).unwrap(), role);
        }
        assert_eq!(MemberType::OWNER_FREEZING.bits(), 0b1011_1111);
        assert_eq!(MemberType::ADMIN_WAITING.bits(), 0b0100_1111);
    }

    #[test]
    fn test_invalid_bits_rejected() {
        // Both modifier bits
        assert!(MemberType::from_bits(0b1100_0111).is_err());
        // Unknown base pattern
        assert!(MemberType::from_bits(0b0000_0011).is_err());
        // Founder and Other take no modifiers
        assert!(MemberType::from_bits(0b0110_0000).is_err());
        assert!(MemberType::from_bits(0b1000_0000).is_err());
    }

    #[test]
    fn test_masking() {
        assert_eq!(MemberType::OWNER_FREEZING & MemberType::MEMBER, MemberType::MEMBER);
        assert!(MemberType::OWNER_FREEZING.is_at_least(BaseRole::Member));
        assert!(MemberType::ADMIN_WAITING.is_at_least(BaseRole::Admin));
        assert!(!MemberType::MEMBER.is_at_least(BaseRole::Admin));
        assert!(!MemberType::FOUNDER.is_at_least(BaseRole::Member));
        assert!(MemberType::OTHER.is_at_least(BaseRole::Other));
    }

    #[test]
    fn test_and_is_closed() {
        for a in MemberType::ALL {
            for b in MemberType::ALL {
                assert!(MemberType::from_bits(a.bits() & b.bits()).is_ok());
            }
        }
    }

    #[test]
    fn test_transitions() {
        assert!(MemberType::ADMIN_WAITING.can_transition_to(MemberType::ADMIN));
        assert!(MemberType::ADMIN.can_transition_to(MemberType::ADMIN_FREEZING));
        assert!(MemberType::ADMIN_FREEZING.can_transition_to(MemberType::ADMIN));

        assert!(!MemberType::ADMIN.can_transition_to(MemberType::ADMIN_WAITING));
        assert!(!MemberType::ADMIN_WAITING.can_transition_to(MemberType::ADMIN_FREEZING));
        assert!(!MemberType::MEMBER.can_transition_to(MemberType::ADMIN));
        assert!(!MemberType::OWNER.can_transition_to(MemberType::OWNER));
    }

    #[test]
    fn test_display() {
        assert_eq!(MemberType::OWNER_FREEZING.to_string(), "OwnerFreezing");
        assert_eq!(MemberType::MEMBER.to_string(), "Member");
    }

    #[test]
    fn test_serde_as_byte() {
        let json = serde_json::to_string(&MemberType::ADMIN_WAITING).unwrap();
        assert_eq!(json, "79");
        let role: MemberType = serde_json::from_str(&json).unwrap();
        assert_eq!(role, MemberType::ADMIN_WAITING);
        assert!(serde_json::from_str::<MemberType>("255").is_err());
    }
}
