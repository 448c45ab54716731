use crate::{FileSystemRights, Trustee};
use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether a rule grants or denies its rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AccessDecision {
    /// The rule grants its rights.
    Allow,
    /// The rule denies its rights; denials win over grants.
    Deny,
}

bitflags! {
    /// Which kinds of child objects inherit a rule, as the raw ACE flag bits.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct InheritanceFlags: u32 {
        /// Non-container children (files) inherit the rule.
        const OBJECT_INHERIT = 0x1;
        /// Container children (subdirectories) inherit the rule.
        const CONTAINER_INHERIT = 0x2;
    }
}

bitflags! {
    /// How inheritance propagates past direct children, as the raw ACE flag
    /// bits.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct PropagationFlags: u32 {
        /// Children inherit the rule but do not pass it further down.
        const NO_PROPAGATE_INHERIT = 0x4;
        /// The rule only exists to be inherited; it does not apply to the
        /// object it sits on.
        const INHERIT_ONLY = 0x8;
    }
}

/// One entry of a discretionary ACL.
///
/// Rules are plain data: equivalent rules may coexist on the same
/// descriptor, and a rule has no tie to any filesystem object by itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccessRule {
    /// Identity the rule applies to.
    pub trustee: Trustee,
    /// Rights granted or denied.
    pub rights: FileSystemRights,
    /// Grant or deny.
    pub decision: AccessDecision,
    /// Which children inherit the rule.
    pub inheritance: InheritanceFlags,
    /// How far inheritance propagates.
    pub propagation: PropagationFlags,
    /// Whether the rule was inherited from a parent container rather than
    /// set explicitly on the object it was read from.
    pub inherited: bool,
}

impl AccessRule {
    /// An explicit, non-inheritable allow rule.
    #[must_use]
    #[inline]
    pub fn allow(trustee: Trustee, rights: FileSystemRights) -> Self {
        Self::new(trustee, rights, AccessDecision::Allow)
    }

    /// An explicit, non-inheritable deny rule.
    #[must_use]
    #[inline]
    pub fn deny(trustee: Trustee, rights: FileSystemRights) -> Self {
        Self::new(trustee, rights, AccessDecision::Deny)
    }

    fn new(trustee: Trustee, rights: FileSystemRights, decision: AccessDecision) -> Self {
        Self {
            trustee,
            rights,
            decision,
            inheritance: InheritanceFlags::empty(),
            propagation: PropagationFlags::empty(),
            inherited: false,
        }
    }

    /// Returns the rule with the given inheritance and propagation bits.
    #[must_use]
    #[inline]
    pub fn with_inheritance(
        mut self,
        inheritance: InheritanceFlags,
        propagation: PropagationFlags,
    ) -> Self {
        self.inheritance = inheritance;
        self.propagation = propagation;
        self
    }

    /// Whether two rules describe the same grant: same trustee, rights,
    /// decision and inheritance shape. The [`inherited`](Self::inherited)
    /// marker is deliberately ignored, so a rule read back from an object
    /// matches the detached rule it was applied from.
    #[must_use]
    #[inline]
    pub fn matches(&self, other: &Self) -> bool {
        self.trustee == other.trustee
            && self.rights == other.rights
            && self.decision == other.decision
            && self.inheritance == other.inheritance
            && self.propagation == other.propagation
    }
}
