//! Test fixtures and helpers.
//!
//! A populated group with one participant per role, deterministic keys for
//! each participant, and a kernel wired to an in-memory directory.

use std::sync::Arc;

use dimp_core::{Ed25519PrivateKey, Id, PrivateKey, Profile, ProfileCommand};
use dimp_kernel::{Kernel, KernelConfig, MemoryDirectory};
use dimp_perms::MemberType;

/// Parse an identifier, panicking on bad input.
pub fn id(s: &str) -> Id {
    Id::parse(s).unwrap_or_else(|e| panic!("bad test identifier {s:?}: {e}"))
}

/// A signing key derived from `name`; the same name always gives the same key.
pub fn seeded_key(name: &str) -> Ed25519PrivateKey {
    let mut seed = [0x5a_u8; 32];
    for (i, byte) in name.bytes().enumerate() {
        seed[i % 32] = seed[i % 32].rotate_left(3) ^ byte;
    }
    Ed25519PrivateKey::from_seed(&seed)
}

/// A group with a participant in each interesting role.
pub struct GroupFixture {
    pub directory: Arc<MemoryDirectory>,
    pub group: Id,
    pub founder: Id,
    pub owner: Id,
    pub admin: Id,
    pub member: Id,
    pub waiting_member: Id,
    pub freezing_member: Id,
    pub stranger: Id,
}

impl GroupFixture {
    /// Create the fixture. Every participant's verify key is registered.
    pub fn new() -> Self {
        let fixture = Self {
            directory: Arc::new(MemoryDirectory::new()),
            group: id("Group-1280719982@7oMeWadRw4qat2sL4mTdcQSDAqZSo7LH5G"),
            founder: id("hulk@4YeVEN3aUnvC1DNUufCq1bs9zoBSJTzVEj"),
            owner: id("moki@4WDfe3zZ4T7opFSi3iDAKiuTnUHjxmXekk"),
            admin: id("ada@anywhere"),
            member: id("mem@anywhere"),
            waiting_member: id("newcomer@anywhere"),
            freezing_member: id("leaving@anywhere"),
            stranger: id("stranger@anywhere"),
        };

        let dir = &fixture.directory;
        let group = &fixture.group;
        dir.set_founder(group, &fixture.founder);
        dir.set_role(group, &fixture.owner, MemberType::OWNER);
        dir.set_role(group, &fixture.admin, MemberType::ADMIN);
        dir.set_role(group, &fixture.member, MemberType::MEMBER);
        dir.set_role(group, &fixture.waiting_member, MemberType::MEMBER_WAITING);
        dir.set_role(group, &fixture.freezing_member, MemberType::MEMBER_FREEZING);

        for who in fixture.everyone() {
            dir.set_verify_key(who, Arc::new(seeded_key(who.as_str()).public_key()));
        }
        fixture
    }

    /// Every participant, the stranger included.
    pub fn everyone(&self) -> [&Id; 7] {
        [
            &self.founder,
            &self.owner,
            &self.admin,
            &self.member,
            &self.waiting_member,
            &self.freezing_member,
            &self.stranger,
        ]
    }

    /// A kernel reading this fixture's directory.
    pub fn kernel(&self, config: KernelConfig) -> Kernel<MemoryDirectory, MemoryDirectory> {
        Kernel::new(self.directory.clone(), self.directory.clone(), config)
    }

    /// A profile response for `who`, signed with their fixture key.
    pub fn signed_profile(&self, who: &Id, data: &str) -> ProfileCommand {
        let profile = Profile::sign(who.clone(), data, &seeded_key(who.as_str()));
        ProfileCommand::response(who.clone(), profile, None)
    }
}

impl Default for GroupFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimp_core::VerifyKey;
    use dimp_core::SignKey;
    use dimp_kernel::RoleDirectory;

    #[test]
    fn test_seeded_key_is_deterministic() {
        let a = seeded_key("moki@anywhere").public_key();
        let b = seeded_key("moki@anywhere").public_key();
        let c = seeded_key("hulk@anywhere").public_key();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_seeded_key_signs() {
        let key = seeded_key("moki@anywhere");
        let signature = key.sign(b"payload");
        assert!(key.public_key().verify(b"payload", &signature));
    }

    #[test]
    fn test_fixture_roles() {
        let f = GroupFixture::new();
        assert_eq!(f.directory.role_of(&f.group, &f.founder), MemberType::FOUNDER);
        assert_eq!(f.directory.role_of(&f.group, &f.admin), MemberType::ADMIN);
        assert_eq!(f.directory.role_of(&f.group, &f.stranger), MemberType::OTHER);
        assert_eq!(f.directory.founder_of(&f.group), Some(f.founder.clone()));
    }
}
