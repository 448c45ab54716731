//! Validated option bundle for creating a file with an initial ACL.
//!
//! Validation runs before any platform call, so a rejected bundle never
//! touches the filesystem. Raw values coming from configuration or the wire
//! go through [`CreateFileOptions::from_raw`], which range-checks the mode
//! and share values on top of the combination checks in
//! [`CreateFileOptions::validate`].

use bitflags::bitflags;
use model::FileSystemRights;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// Default stream buffer size, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// How the platform should open or create the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum FileMode {
    /// Create the file; fail if it already exists.
    CreateNew = 1,
    /// Create the file, replacing any existing one.
    Create = 2,
    /// Open an existing file; fail if it is absent.
    Open = 3,
    /// Open the file if present, create it otherwise.
    OpenOrCreate = 4,
    /// Open an existing file and truncate it to zero length.
    Truncate = 5,
    /// Open the file if present, create it otherwise; writes go to the end.
    Append = 6,
}

impl FileMode {
    /// Whether the mode alters the target's contents on its own, so the
    /// requested rights must include a write-class right.
    #[must_use]
    #[inline]
    pub const fn implies_write(self) -> bool {
        matches!(
            self,
            Self::Truncate | Self::CreateNew | Self::Create | Self::Append
        )
    }
}

bitflags! {
    /// Which kinds of concurrent access other openers of the same file are
    /// allowed while the returned handle is open.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileShare: u32 {
        /// Others may open the file for reading.
        const READ = 0x1;
        /// Others may open the file for writing.
        const WRITE = 0x2;
        /// Others may delete or rename the file.
        const DELETE = 0x4;
    }
}

/// Options for `fs::create_file_with_security`.
///
/// # Examples
/// ```rust
/// use win_access_control::{CreateFileOptions, FileMode, FileShare, FileSystemRights};
///
/// let options = CreateFileOptions::new(FileMode::Create, FileSystemRights::WRITE_DATA)
///     .share(FileShare::READ)
///     .buffer_size(4096);
/// assert!(options.validate().is_ok());
///
/// // A mode that writes paired with rights that cannot is contradictory.
/// let options = CreateFileOptions::new(FileMode::Truncate, FileSystemRights::READ);
/// assert!(options.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateFileOptions {
    /// Open-or-create behavior.
    pub mode: FileMode,
    /// Access requested on the returned handle, as a rights mask.
    pub rights: FileSystemRights,
    /// Concurrent access left open to others.
    pub share: FileShare,
    /// Stream buffer size in bytes; must be positive. The size is validated
    /// up front and reserved for buffered wrappers; the returned handle
    /// itself is unbuffered.
    pub buffer_size: usize,
}

impl CreateFileOptions {
    /// Options with the given mode and rights, read-sharing and the default
    /// buffer size.
    #[must_use]
    #[inline]
    pub const fn new(mode: FileMode, rights: FileSystemRights) -> Self {
        Self {
            mode,
            rights,
            share: FileShare::READ,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Builds options from raw mode, rights and share values, range-checking
    /// each numeric parameter.
    ///
    /// # Errors
    /// [`OptionsError::ModeOutOfRange`] or [`OptionsError::ShareOutOfRange`]
    /// when the raw value falls outside the respective enumeration; the
    /// combination checks of [`validate`](Self::validate) are not run here.
    #[inline]
    pub fn from_raw(
        mode: u32,
        rights: u32,
        share: u32,
        buffer_size: usize,
    ) -> Result<Self, OptionsError> {
        let mode = FileMode::try_from(mode).map_err(|_| OptionsError::ModeOutOfRange(mode))?;
        let share = FileShare::from_bits(share).ok_or(OptionsError::ShareOutOfRange(share))?;
        Ok(Self {
            mode,
            rights: FileSystemRights::from_bits_retain(rights),
            share,
            buffer_size,
        })
    }

    /// Returns the options with the given share flags.
    #[must_use]
    #[inline]
    pub const fn share(mut self, share: FileShare) -> Self {
        self.share = share;
        self
    }

    /// Returns the options with the given buffer size.
    #[must_use]
    #[inline]
    pub const fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Checks the option combination.
    ///
    /// # Errors
    /// - [`OptionsError::BufferSizeOutOfRange`] when `buffer_size` is zero.
    /// - [`OptionsError::WriteRightsRequired`] when the mode implies write
    ///   access but the rights mask grants no write-class right, e.g.
    ///   truncating a file the caller may only read.
    #[inline]
    pub const fn validate(&self) -> Result<(), OptionsError> {
        if self.buffer_size == 0 {
            return Err(OptionsError::BufferSizeOutOfRange);
        }
        if self.mode.implies_write() && !self.rights.grants_write() {
            return Err(OptionsError::WriteRightsRequired {
                mode: self.mode,
                rights: self.rights,
            });
        }
        Ok(())
    }
}

/// Rejected option bundles, one variant per offending parameter.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OptionsError {
    /// `buffer_size` must be positive.
    #[error("buffer_size must be positive")]
    BufferSizeOutOfRange,
    /// The raw mode value is not a [`FileMode`].
    #[error("mode value {0} is not a valid file mode")]
    ModeOutOfRange(u32),
    /// The raw share value has bits outside [`FileShare`].
    #[error("share value {0:#x} has bits outside the share mask")]
    ShareOutOfRange(u32),
    /// The mode implies write access but the rights grant none.
    #[error("mode {mode:?} implies write access but rights {rights:?} grant none")]
    WriteRightsRequired {
        /// The requested mode.
        mode: FileMode,
        /// The rights that grant no write-class access.
        rights: FileSystemRights,
    },
}

impl OptionsError {
    /// Name of the parameter the error is about.
    #[must_use]
    #[inline]
    pub const fn parameter(&self) -> &'static str {
        match self {
            Self::BufferSizeOutOfRange => "buffer_size",
            Self::ModeOutOfRange(_) => "mode",
            Self::ShareOutOfRange(_) => "share",
            Self::WriteRightsRequired { .. } => "rights",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn write_modes_reject_read_only_rights() {
        for mode in [
            FileMode::Truncate,
            FileMode::CreateNew,
            FileMode::Create,
            FileMode::Append,
        ] {
            for rights in [FileSystemRights::READ, FileSystemRights::READ_DATA] {
                let error = CreateFileOptions::new(mode, rights).validate().unwrap_err();
                assert!(
                    matches!(error, OptionsError::WriteRightsRequired { .. }),
                    "{mode:?} x {rights:?} must be rejected"
                );
                assert_eq!(error.parameter(), "rights");
            }
        }
    }

    #[test]
    fn read_modes_accept_read_only_rights() {
        for mode in [FileMode::Open, FileMode::OpenOrCreate] {
            assert!(CreateFileOptions::new(mode, FileSystemRights::READ)
                .validate()
                .is_ok());
        }
    }

    #[test]
    fn write_modes_accept_writing_rights() {
        for rights in [
            FileSystemRights::WRITE_DATA,
            FileSystemRights::WRITE,
            FileSystemRights::MODIFY,
            FileSystemRights::FULL_CONTROL,
        ] {
            assert!(CreateFileOptions::new(FileMode::Create, rights)
                .validate()
                .is_ok());
        }
    }

    #[test]
    fn zero_buffer_size_is_out_of_range() {
        let error = CreateFileOptions::new(FileMode::Open, FileSystemRights::READ)
            .buffer_size(0)
            .validate()
            .unwrap_err();
        assert_eq!(error, OptionsError::BufferSizeOutOfRange);
        assert_eq!(error.parameter(), "buffer_size");
    }

    #[test]
    fn raw_mode_out_of_range_is_rejected() {
        for raw in [0u32, 7, 99] {
            let error =
                CreateFileOptions::from_raw(raw, FileSystemRights::READ.bits(), 0, 1).unwrap_err();
            assert_eq!(error, OptionsError::ModeOutOfRange(raw));
            assert_eq!(error.parameter(), "mode");
        }
    }

    #[test]
    fn raw_share_out_of_range_is_rejected() {
        for raw in [0x8u32, 0x10, u32::MAX] {
            let error = CreateFileOptions::from_raw(
                FileMode::Open.into(),
                FileSystemRights::READ.bits(),
                raw,
                1,
            )
            .unwrap_err();
            assert_eq!(error, OptionsError::ShareOutOfRange(raw));
            assert_eq!(error.parameter(), "share");
        }
    }

    #[test]
    fn raw_round_trip() {
        let options = CreateFileOptions::from_raw(
            FileMode::Create.into(),
            FileSystemRights::WRITE_DATA.bits(),
            (FileShare::READ | FileShare::WRITE).bits(),
            DEFAULT_BUFFER_SIZE,
        )
        .unwrap();
        assert_eq!(options.mode, FileMode::Create);
        assert_eq!(options.rights, FileSystemRights::WRITE_DATA);
        assert!(options.validate().is_ok());
    }

    proptest! {
        #[test]
        fn read_modes_never_hit_the_combination_check(mask in any::<u32>()) {
            let rights = FileSystemRights::from_bits_truncate(mask);
            for mode in [FileMode::Open, FileMode::OpenOrCreate] {
                let result = CreateFileOptions::new(mode, rights).validate();
                let is_write_rights_required = matches!(result, Err(OptionsError::WriteRightsRequired { .. }));
                prop_assert!(!is_write_rights_required);
            }
        }

        #[test]
        fn writing_rights_always_pass_the_combination_check(mask in any::<u32>()) {
            let rights = FileSystemRights::from_bits_truncate(mask) | FileSystemRights::WRITE_DATA;
            for mode in [
                FileMode::Truncate,
                FileMode::CreateNew,
                FileMode::Create,
                FileMode::Append,
            ] {
                prop_assert!(CreateFileOptions::new(mode, rights).validate().is_ok());
            }
        }
    }
}
