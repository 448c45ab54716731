//! # Windows access-control primitives for Rust
//!
//! Two small, independent surfaces over the Windows security model:
//! - `RegistryKeyHandle`: an exclusive guard over a native registry key
//!   handle that closes it exactly once and reports the outcome as a typed
//!   result instead of a bare boolean.
//! - The `fs` module: read and write discretionary ACLs on files,
//!   directories and open streams, and create a file or directory with an
//!   initial ACL applied atomically at creation time.
//!
//! The data model ([`Trustee`] identities, [`FileSystemRights`] masks,
//! [`AccessRule`]s and detached [`SecurityDescriptor`]s) is platform
//! independent and lives in the `win-access-control-model` crate,
//! re-exported here in full. Only the operations themselves are gated on
//! `cfg(windows)`.
//!
//! ## Overview
//! - **Validation first**: option bundles ([`CreateFileOptions`]) are
//!   checked before any platform call, with one error variant per offending
//!   parameter.
//! - **Descriptors are values**: reading an object's security yields a
//!   detached copy; nothing is applied until a `set_*` or `create_*`
//!   operation is called with an explicit (target, descriptor) pair.
//! - **Single round-trips**: every operation is one synchronous platform
//!   call plus validation. No retries, no batching, no shared state.
//!
//! ## Examples
//! ### Validate a creation bundle
//! ```rust
//! use win_access_control::{CreateFileOptions, FileMode, FileSystemRights};
//!
//! let options = CreateFileOptions::new(FileMode::Truncate, FileSystemRights::READ);
//! let error = options.validate().unwrap_err();
//! assert_eq!(error.parameter(), "rights");
//! ```
//!
//! ### Build a descriptor
//! ```rust
//! use win_access_control::{FileSystemRights, SecurityDescriptor, Trustee};
//!
//! let descriptor = SecurityDescriptor::new()
//!     .allow(Trustee::builtin_users(), FileSystemRights::FULL_CONTROL);
//! assert_eq!(descriptor.rules().len(), 1);
//! ```
//!
//! ### (Windows) Create a file with an initial ACL
//! ```no_run
//! # #[cfg(windows)]
//! # {
//! use win_access_control::fs::{create_file_with_security, file_access_control};
//! use win_access_control::{
//!     AccessControlSections, CreateFileOptions, FileMode, FileSystemRights,
//!     SecurityDescriptor, Trustee,
//! };
//!
//! let descriptor = SecurityDescriptor::new()
//!     .allow(Trustee::builtin_users(), FileSystemRights::FULL_CONTROL);
//! let options = CreateFileOptions::new(FileMode::Create, FileSystemRights::WRITE_DATA);
//! let file = create_file_with_security("file.txt", &options, &descriptor).unwrap();
//!
//! let applied = file_access_control("file.txt", AccessControlSections::ACCESS).unwrap();
//! assert!(applied.contains_explicit_rules(&descriptor));
//! # let _ = file;
//! # }
//! ```
//!
//! ## Known quirk
//! `fs::create_directory_with_security` does **not** overwrite the
//! security of a directory that already exists; the pre-existing descriptor
//! wins and is what the call returns. See the function documentation.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]

mod create_options;

pub use create_options::{
    CreateFileOptions, FileMode, FileShare, OptionsError, DEFAULT_BUFFER_SIZE,
};

pub use model::{
    AccessControlSections, AccessDecision, AccessRule, FileSystemRights, InheritanceFlags,
    InvalidTrusteeFormat, PropagationFlags, SecurityDescriptor, Trustee, MAX_SUB_AUTHORITIES,
};

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        mod registry;
        pub mod fs;

        pub use fs::SecurityOpError;
        pub use registry::{RegistryKeyHandle, ReleaseError};
    }
}
