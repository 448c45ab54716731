use bitflags::bitflags;

bitflags! {
    /// Granular file-system permissions, stored as the raw Win32 access mask
    /// so values pass through the platform boundary unchanged.
    ///
    /// Several bits are shared between files and directories and carry both
    /// meanings: `READ_DATA` doubles as list-directory, `WRITE_DATA` as
    /// create-file, `APPEND_DATA` as create-subdirectory and `EXECUTE_FILE`
    /// as traverse.
    ///
    /// # Examples
    /// ```rust
    /// use win_access_control_model::FileSystemRights;
    ///
    /// let rights = FileSystemRights::READ | FileSystemRights::WRITE_DATA;
    /// assert!(rights.contains(FileSystemRights::READ_DATA));
    /// assert!(FileSystemRights::FULL_CONTROL.contains(rights));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileSystemRights: u32 {
        /// Read the contents of a file, or list a directory.
        const READ_DATA = 0x0000_0001;
        /// Write to a file, or create a file inside a directory.
        const WRITE_DATA = 0x0000_0002;
        /// Append to a file, or create a subdirectory.
        const APPEND_DATA = 0x0000_0004;
        /// Read extended attributes.
        const READ_EXTENDED_ATTRIBUTES = 0x0000_0008;
        /// Write extended attributes.
        const WRITE_EXTENDED_ATTRIBUTES = 0x0000_0010;
        /// Run an executable file, or traverse a directory.
        const EXECUTE_FILE = 0x0000_0020;
        /// Delete a directory together with everything it contains.
        const DELETE_SUBDIRECTORIES_AND_FILES = 0x0000_0040;
        /// Read basic attributes (hidden, read-only, ...).
        const READ_ATTRIBUTES = 0x0000_0080;
        /// Write basic attributes.
        const WRITE_ATTRIBUTES = 0x0000_0100;
        /// Delete the object itself.
        const DELETE = 0x0001_0000;
        /// Read the object's security descriptor.
        const READ_PERMISSIONS = 0x0002_0000;
        /// Change the object's discretionary ACL.
        const CHANGE_PERMISSIONS = 0x0004_0000;
        /// Take ownership of the object.
        const TAKE_OWNERSHIP = 0x0008_0000;
        /// Wait on the object's handle.
        const SYNCHRONIZE = 0x0010_0000;

        /// Everything needed to read contents, attributes and permissions.
        const READ = Self::READ_DATA.bits()
            | Self::READ_EXTENDED_ATTRIBUTES.bits()
            | Self::READ_ATTRIBUTES.bits()
            | Self::READ_PERMISSIONS.bits();
        /// Everything needed to write contents and attributes.
        const WRITE = Self::WRITE_DATA.bits()
            | Self::APPEND_DATA.bits()
            | Self::WRITE_EXTENDED_ATTRIBUTES.bits()
            | Self::WRITE_ATTRIBUTES.bits();
        /// [`Self::READ`] plus execute/traverse.
        const READ_AND_EXECUTE = Self::READ.bits() | Self::EXECUTE_FILE.bits();
        /// [`Self::READ_AND_EXECUTE`] and [`Self::WRITE`] plus delete.
        const MODIFY = Self::READ_AND_EXECUTE.bits()
            | Self::WRITE.bits()
            | Self::DELETE.bits();
        /// Every right defined on files and directories.
        const FULL_CONTROL = 0x001F_01FF;
    }
}

impl FileSystemRights {
    /// Whether any write-class right is present, meaning the holder can alter
    /// the object's contents or metadata.
    #[must_use]
    #[inline]
    pub const fn grants_write(self) -> bool {
        self.intersects(Self::WRITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_masks_match_platform_values() {
        assert_eq!(FileSystemRights::READ.bits(), 0x0002_0089);
        assert_eq!(FileSystemRights::WRITE.bits(), 0x0000_0116);
        assert_eq!(FileSystemRights::READ_AND_EXECUTE.bits(), 0x0002_00A9);
        assert_eq!(FileSystemRights::MODIFY.bits(), 0x0003_01BF);
        assert_eq!(FileSystemRights::FULL_CONTROL.bits(), 0x001F_01FF);
    }

    #[test]
    fn full_control_covers_every_named_right() {
        assert_eq!(FileSystemRights::FULL_CONTROL, FileSystemRights::all());
    }

    #[test]
    fn read_grants_no_write() {
        assert!(!FileSystemRights::READ.grants_write());
        assert!(!FileSystemRights::READ_DATA.grants_write());
        assert!(FileSystemRights::WRITE_DATA.grants_write());
        assert!(FileSystemRights::FULL_CONTROL.grants_write());
    }
}
