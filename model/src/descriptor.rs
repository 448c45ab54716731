use crate::{AccessRule, FileSystemRights, Trustee};
use bitflags::bitflags;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which parts of an object's security to read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessControlSections: u8 {
        /// The discretionary ACL (access rules).
        const ACCESS = 0x1;
        /// The owner identity.
        const OWNER = 0x2;
        /// The primary group identity.
        const GROUP = 0x4;
        /// The system ACL (auditing); reading it needs extra privilege.
        const AUDIT = 0x8;
    }
}

/// In-memory security descriptor: optional owner and group identities plus
/// an ordered list of access rules.
///
/// A descriptor is a detached value. It has no ownership relation to any
/// filesystem object until it is explicitly applied, and reading an object's
/// security always yields a fresh copy.
///
/// # Examples
/// ```rust
/// use win_access_control_model::{FileSystemRights, SecurityDescriptor, Trustee};
///
/// let descriptor = SecurityDescriptor::new()
///     .allow(Trustee::builtin_users(), FileSystemRights::READ)
///     .deny(Trustee::builtin_guests(), FileSystemRights::FULL_CONTROL);
/// assert_eq!(descriptor.rules().len(), 2);
/// assert!(descriptor.contains_explicit_rules(&descriptor));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecurityDescriptor {
    owner: Option<Trustee>,
    group: Option<Trustee>,
    rules: Vec<AccessRule>,
}

impl SecurityDescriptor {
    /// An empty descriptor: no owner, no group, no rules.
    ///
    /// Applied to an object, an empty descriptor yields an empty (not
    /// absent) ACL, which grants access to nobody.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            owner: None,
            group: None,
            rules: Vec::new(),
        }
    }

    /// The owner identity, when one is set.
    #[must_use]
    #[inline]
    pub const fn owner(&self) -> Option<&Trustee> {
        self.owner.as_ref()
    }

    /// The primary group identity, when one is set.
    #[must_use]
    #[inline]
    pub const fn group(&self) -> Option<&Trustee> {
        self.group.as_ref()
    }

    /// Sets the owner identity.
    #[inline]
    pub fn set_owner(&mut self, owner: Trustee) {
        self.owner = Some(owner);
    }

    /// Sets the primary group identity.
    #[inline]
    pub fn set_group(&mut self, group: Trustee) {
        self.group = Some(group);
    }

    /// Returns the descriptor with an explicit allow rule appended.
    #[must_use]
    #[inline]
    pub fn allow(mut self, trustee: Trustee, rights: FileSystemRights) -> Self {
        self.rules.push(AccessRule::allow(trustee, rights));
        self
    }

    /// Returns the descriptor with an explicit deny rule appended.
    #[must_use]
    #[inline]
    pub fn deny(mut self, trustee: Trustee, rights: FileSystemRights) -> Self {
        self.rules.push(AccessRule::deny(trustee, rights));
        self
    }

    /// Appends a rule, keeping insertion order. Duplicates are kept; rules
    /// form a multiset, not a set.
    #[inline]
    pub fn push_rule(&mut self, rule: AccessRule) {
        self.rules.push(rule);
    }

    /// Every rule, in insertion order.
    #[must_use]
    #[inline]
    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// The rules set directly on the object, skipping those inherited from a
    /// parent container.
    #[inline]
    pub fn explicit_rules(&self) -> impl Iterator<Item = &AccessRule> {
        self.rules.iter().filter(|rule| !rule.inherited)
    }

    /// Whether the descriptor carries no identities and no rules.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owner.is_none() && self.group.is_none() && self.rules.is_empty()
    }

    /// Whether every explicit rule of `other` appears among this
    /// descriptor's explicit rules, compared as unordered multisets of
    /// (trustee, rights, decision, inheritance, propagation) tuples.
    ///
    /// Duplicates count: a descriptor holding a rule once does not contain
    /// one holding the same rule twice.
    #[must_use]
    pub fn contains_explicit_rules(&self, other: &Self) -> bool {
        other.explicit_rules().all(|wanted| {
            let needed = other
                .explicit_rules()
                .filter(|rule| rule.matches(wanted))
                .count();
            let present = self
                .explicit_rules()
                .filter(|rule| rule.matches(wanted))
                .count();
            present >= needed
        })
    }
}
