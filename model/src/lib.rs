//! Platform-independent access-control model: trustee identities, rights
//! masks, access rules and in-memory security descriptors.
//!
//! This crate carries no platform interop. It exists so the data model can be
//! built and tested everywhere; the `win-access-control` crate layers the
//! Windows calls on top and re-exports everything here.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod descriptor;
mod rights;
mod rule;
mod trustee;

#[cfg(feature = "serde")]
mod serde_impl;

pub use descriptor::{AccessControlSections, SecurityDescriptor};
pub use rights::FileSystemRights;
pub use rule::{AccessDecision, AccessRule, InheritanceFlags, PropagationFlags};
pub use trustee::{InvalidTrusteeFormat, Trustee, MAX_SUB_AUTHORITIES};

#[cfg(test)]
pub(crate) use rule::test::arb_rule;
#[cfg(test)]
pub(crate) use trustee::test::arb_trustee;
