//! Lookups the kernel needs from the rest of the client.
//!
//! Membership and key material live outside this crate: a messenger keeps
//! them in its own database. The kernel only reads through these traits and
//! never writes back; applying an accepted group command is the caller's job.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use dimp_core::{Id, VerifyKey};
use dimp_perms::MemberType;

/// A shared verification key.
pub type SharedVerifyKey = Arc<dyn VerifyKey + Send + Sync>;

/// Current role snapshot for groups.
pub trait RoleDirectory: Send + Sync {
    /// The role `member` holds in `group`. Unknown participants are
    /// [`MemberType::OTHER`].
    fn role_of(&self, group: &Id, member: &Id) -> MemberType;

    /// The identifier recorded as founder of `group`, if any.
    fn founder_of(&self, group: &Id) -> Option<Id>;
}

/// Verification keys by entity.
pub trait KeyDirectory: Send + Sync {
    fn verify_key(&self, id: &Id) -> Option<SharedVerifyKey>;
}

/// In-memory directory implementation.
///
/// Roles are keyed on identifiers without their terminal, so every device of
/// an entity shares one role. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryDirectory {
    inner: RwLock<MemoryDirectoryInner>,
}

#[derive(Default)]
struct MemoryDirectoryInner {
    /// (group, member) -> role.
    roles: HashMap<(Id, Id), MemberType>,

    /// group -> founder.
    founders: HashMap<Id, Id>,

    /// entity -> verification key.
    keys: HashMap<Id, SharedVerifyKey>,
}

impl MemoryDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the role of `member` in `group`.
    pub fn set_role(&self, group: &Id, member: &Id, role: MemberType) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let key = (group.without_terminal(), member.without_terminal());
        if role == MemberType::OTHER {
            inner.roles.remove(&key);
        } else {
            inner.roles.insert(key, role);
        }
    }

    /// Record `founder` as the founder of `group`, and give them the role.
    pub fn set_founder(&self, group: &Id, founder: &Id) {
        self.set_role(group, founder, MemberType::FOUNDER);
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .founders
            .insert(group.without_terminal(), founder.without_terminal());
    }

    /// Register the verification key for `id`.
    pub fn set_verify_key(&self, id: &Id, key: SharedVerifyKey) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.keys.insert(id.without_terminal(), key);
    }
}

impl RoleDirectory for MemoryDirectory {
    fn role_of(&self, group: &Id, member: &Id) -> MemberType {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .roles
            .get(&(group.without_terminal(), member.without_terminal()))
            .copied()
            .unwrap_or(MemberType::OTHER)
    }

    fn founder_of(&self, group: &Id) -> Option<Id> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.founders.get(&group.without_terminal()).cloned()
    }
}

impl KeyDirectory for MemoryDirectory {
    fn verify_key(&self, id: &Id) -> Option<SharedVerifyKey> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.keys.get(&id.without_terminal()).cloned()
    }
}
