//! Discretionary ACL operations on files, directories and open streams.
//!
//! Every operation is a free function over an explicit (target, descriptor)
//! pair: paths name filesystem objects, [`File`] names an open stream, and
//! [`SecurityDescriptor`] is the detached in-memory value that is read from
//! or applied to the target. Each call is a single synchronous platform
//! round-trip plus validation; nothing is retried or batched.
//!
//! An empty target path is rejected with
//! [`SecurityOpError::EmptyPath`] before the platform is involved.

mod windows;

use crate::create_options::{CreateFileOptions, OptionsError};
use model::{AccessControlSections, InvalidTrusteeFormat, SecurityDescriptor};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures surfaced by the ACL operations.
#[derive(Debug, Error)]
pub enum SecurityOpError {
    /// The target path is empty. Carries the parameter name.
    #[error("{parameter} must not be empty")]
    EmptyPath {
        /// Name of the offending parameter.
        parameter: &'static str,
    },
    /// The target path cannot be encoded for the platform (interior NUL).
    #[error("path contains an interior NUL character")]
    InvalidPath,
    /// A rejected [`CreateFileOptions`] bundle.
    #[error(transparent)]
    Options(#[from] OptionsError),
    /// The immediate containing directory of the target does not exist.
    #[error("parent directory of {path:?} does not exist")]
    ParentNotFound {
        /// The target whose parent is missing.
        path: PathBuf,
    },
    /// The platform denied access to the target.
    #[error("access denied to {path:?}")]
    AccessDenied {
        /// The denied target.
        path: PathBuf,
    },
    /// The platform produced an identity the model failed to re-parse.
    #[error(transparent)]
    Trustee(#[from] InvalidTrusteeFormat),
    /// Any other Win32 failure, tagged with the API that reported it.
    #[error("{operation} failed (error {code})")]
    Platform {
        /// Name of the failing platform call.
        operation: &'static str,
        /// Win32 error code.
        code: u32,
    },
}

fn ensure_target(path: &Path) -> Result<(), SecurityOpError> {
    if path.as_os_str().is_empty() {
        return Err(SecurityOpError::EmptyPath { parameter: "path" });
    }
    Ok(())
}

/// Reads the security of the file at `path`, filtered to `sections`.
///
/// # Errors
/// [`SecurityOpError::EmptyPath`] for an empty target, or the mapped
/// platform failure.
#[inline]
pub fn file_access_control(
    path: impl AsRef<Path>,
    sections: AccessControlSections,
) -> Result<SecurityDescriptor, SecurityOpError> {
    let path = path.as_ref();
    ensure_target(path)?;
    windows::named_security(path, sections)
}

/// Reads the security of the directory at `path`, filtered to `sections`.
///
/// # Errors
/// [`SecurityOpError::EmptyPath`] for an empty target, or the mapped
/// platform failure.
#[inline]
pub fn directory_access_control(
    path: impl AsRef<Path>,
    sections: AccessControlSections,
) -> Result<SecurityDescriptor, SecurityOpError> {
    let path = path.as_ref();
    ensure_target(path)?;
    windows::named_security(path, sections)
}

/// Applies `descriptor` to the file at `path`.
///
/// The descriptor's explicit rules replace the object's discretionary ACL;
/// owner and group are applied only when the descriptor carries them.
///
/// # Errors
/// [`SecurityOpError::EmptyPath`] for an empty target, or the mapped
/// platform failure.
#[inline]
pub fn set_file_access_control(
    path: impl AsRef<Path>,
    descriptor: &SecurityDescriptor,
) -> Result<(), SecurityOpError> {
    let path = path.as_ref();
    ensure_target(path)?;
    windows::set_named_security(path, descriptor)
}

/// Applies `descriptor` to the directory at `path`.
///
/// # Errors
/// [`SecurityOpError::EmptyPath`] for an empty target, or the mapped
/// platform failure.
#[inline]
pub fn set_directory_access_control(
    path: impl AsRef<Path>,
    descriptor: &SecurityDescriptor,
) -> Result<(), SecurityOpError> {
    let path = path.as_ref();
    ensure_target(path)?;
    windows::set_named_security(path, descriptor)
}

/// Reads the security of an open stream, filtered to `sections`.
///
/// # Errors
/// The mapped platform failure.
#[inline]
pub fn stream_access_control(
    stream: &File,
    sections: AccessControlSections,
) -> Result<SecurityDescriptor, SecurityOpError> {
    windows::handle_security(stream, sections)
}

/// Applies `descriptor` to an open stream.
///
/// # Errors
/// The mapped platform failure.
#[inline]
pub fn set_stream_access_control(
    stream: &File,
    descriptor: &SecurityDescriptor,
) -> Result<(), SecurityOpError> {
    windows::set_handle_security(stream, descriptor)
}

/// Creates the file at `path` with `descriptor` applied atomically at
/// creation time, returning the open handle.
///
/// `options` is validated first, so a contradictory bundle never reaches the
/// filesystem.
///
/// # Errors
/// - [`SecurityOpError::EmptyPath`] for an empty target.
/// - [`SecurityOpError::Options`] for a rejected option bundle.
/// - [`SecurityOpError::ParentNotFound`] when the immediate containing
///   directory does not exist.
/// - [`SecurityOpError::AccessDenied`] or the mapped platform failure
///   otherwise.
///
/// # Examples
/// ```no_run
/// # #[cfg(windows)]
/// # {
/// use win_access_control::fs::create_file_with_security;
/// use win_access_control::{
///     CreateFileOptions, FileMode, FileSystemRights, SecurityDescriptor, Trustee,
/// };
///
/// let descriptor = SecurityDescriptor::new()
///     .allow(Trustee::builtin_users(), FileSystemRights::FULL_CONTROL);
/// let options = CreateFileOptions::new(FileMode::Create, FileSystemRights::WRITE_DATA);
/// let file = create_file_with_security("file.txt", &options, &descriptor).unwrap();
/// # let _ = file;
/// # }
/// ```
#[inline]
pub fn create_file_with_security(
    path: impl AsRef<Path>,
    options: &CreateFileOptions,
    descriptor: &SecurityDescriptor,
) -> Result<File, SecurityOpError> {
    let path = path.as_ref();
    ensure_target(path)?;
    options.validate()?;
    windows::create_file(path, options, descriptor)
}

/// Creates the directory at `path` with `descriptor` applied atomically at
/// creation time, returning the created object's effective security.
///
/// Compatibility quirk, kept on purpose: when the directory already exists,
/// the supplied descriptor is **not** applied. The pre-existing security is
/// left untouched and is what the returned descriptor reflects. A missing
/// parent surfaces as [`SecurityOpError::AccessDenied`] on this path, unlike
/// the file operation's [`SecurityOpError::ParentNotFound`].
///
/// # Errors
/// [`SecurityOpError::EmptyPath`] for an empty target,
/// [`SecurityOpError::AccessDenied`] for a missing parent or platform
/// denial, or the mapped platform failure.
#[inline]
pub fn create_directory_with_security(
    path: impl AsRef<Path>,
    descriptor: &SecurityDescriptor,
) -> Result<SecurityDescriptor, SecurityOpError> {
    let path = path.as_ref();
    ensure_target(path)?;
    windows::create_directory(path, descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::FileSystemRights;

    #[test]
    fn empty_target_is_rejected_before_the_platform() {
        let sections = AccessControlSections::ACCESS;
        let descriptor = SecurityDescriptor::new();

        assert!(matches!(
            file_access_control("", sections),
            Err(SecurityOpError::EmptyPath { parameter: "path" })
        ));
        assert!(matches!(
            directory_access_control("", sections),
            Err(SecurityOpError::EmptyPath { parameter: "path" })
        ));
        assert!(matches!(
            set_file_access_control("", &descriptor),
            Err(SecurityOpError::EmptyPath { parameter: "path" })
        ));
        assert!(matches!(
            set_directory_access_control("", &descriptor),
            Err(SecurityOpError::EmptyPath { parameter: "path" })
        ));
        assert!(matches!(
            create_directory_with_security("", &descriptor),
            Err(SecurityOpError::EmptyPath { parameter: "path" })
        ));
    }

    #[test]
    fn invalid_options_are_rejected_before_the_platform() {
        let descriptor = SecurityDescriptor::new();
        let options =
            CreateFileOptions::new(crate::FileMode::Truncate, FileSystemRights::READ_DATA);
        let error = create_file_with_security("file.txt", &options, &descriptor).unwrap_err();
        assert!(matches!(
            error,
            SecurityOpError::Options(OptionsError::WriteRightsRequired { .. })
        ));
    }
}
