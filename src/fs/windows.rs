//! Win32 internals of the ACL facade.
//!
//! Conventions: every platform call is checked immediately and a failing
//! call reads `GetLastError` (or the returned status) before anything else
//! runs; system allocations travel in [`LocalBox`] so each is freed exactly
//! once.

use super::SecurityOpError;
use crate::create_options::{CreateFileOptions, FileMode};
use core::ffi::c_void;
use core::mem::{self, MaybeUninit};
use core::ptr;
use model::{
    AccessControlSections, AccessDecision, AccessRule, FileSystemRights, InheritanceFlags,
    PropagationFlags, SecurityDescriptor, Trustee,
};
use smallvec::SmallVec;
use std::fs::File;
use std::os::windows::io::{AsRawHandle, FromRawHandle};
use std::path::Path;
use widestring::{U16CStr, U16CString};
use windows_sys::Win32::Foundation::{
    GetLastError, LocalFree, ERROR_ACCESS_DENIED, ERROR_ALREADY_EXISTS, ERROR_PATH_NOT_FOUND,
    ERROR_SUCCESS, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Security::Authorization::{
    ConvertSidToStringSidW, ConvertStringSidToSidW, GetNamedSecurityInfoW, GetSecurityInfo,
    SetEntriesInAclW, SetNamedSecurityInfoW, SetSecurityInfo, DENY_ACCESS, EXPLICIT_ACCESS_W,
    GRANT_ACCESS, NO_MULTIPLE_TRUSTEE, SE_FILE_OBJECT, TRUSTEE_IS_SID, TRUSTEE_IS_UNKNOWN,
    TRUSTEE_W,
};
use windows_sys::Win32::Security::{
    GetAce, InitializeSecurityDescriptor, SetSecurityDescriptorDacl, SetSecurityDescriptorGroup,
    SetSecurityDescriptorOwner, ACCESS_ALLOWED_ACE, ACCESS_ALLOWED_ACE_TYPE,
    ACCESS_DENIED_ACE_TYPE, ACE_HEADER, ACL, DACL_SECURITY_INFORMATION, GROUP_SECURITY_INFORMATION,
    INHERITED_ACE, OWNER_SECURITY_INFORMATION, PSID, SACL_SECURITY_INFORMATION,
    SECURITY_ATTRIBUTES, SECURITY_DESCRIPTOR, SECURITY_DESCRIPTOR_REVISION,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateDirectoryW, CreateFileW, CREATE_ALWAYS, CREATE_NEW, FILE_ATTRIBUTE_NORMAL, OPEN_ALWAYS,
    OPEN_EXISTING, TRUNCATE_EXISTING,
};

/// Owner of memory the system allocated with `LocalAlloc`.
struct LocalBox<T> {
    ptr: *mut T,
}

impl<T> LocalBox<T> {
    /// # Safety
    /// `ptr` must come from `LocalAlloc` (directly or through an API that
    /// documents it) and be exclusively owned by the new box.
    const unsafe fn from_raw(ptr: *mut T) -> Self {
        Self { ptr }
    }

    const fn as_ptr(&self) -> *mut T {
        self.ptr
    }
}

impl<T> Drop for LocalBox<T> {
    fn drop(&mut self) {
        // SAFETY: the pointer was allocated by the system and this box is
        // its sole owner, so it is freed exactly once.
        unsafe {
            LocalFree(self.ptr.cast());
        }
    }
}

fn last_error(operation: &'static str) -> SecurityOpError {
    // SAFETY: GetLastError can be called immediately after a failing FFI
    // call.
    let code = unsafe { GetLastError() };
    SecurityOpError::Platform { operation, code }
}

fn wide_path(path: &Path) -> Result<U16CString, SecurityOpError> {
    U16CString::from_os_str(path.as_os_str()).map_err(|_| SecurityOpError::InvalidPath)
}

fn security_information(sections: AccessControlSections) -> u32 {
    let mut info = 0;
    if sections.contains(AccessControlSections::ACCESS) {
        info |= DACL_SECURITY_INFORMATION;
    }
    if sections.contains(AccessControlSections::OWNER) {
        info |= OWNER_SECURITY_INFORMATION;
    }
    if sections.contains(AccessControlSections::GROUP) {
        info |= GROUP_SECURITY_INFORMATION;
    }
    if sections.contains(AccessControlSections::AUDIT) {
        info |= SACL_SECURITY_INFORMATION;
    }
    info
}

/// Converts a trustee to a system-allocated SID.
fn trustee_to_sid(trustee: &Trustee) -> Result<LocalBox<c_void>, SecurityOpError> {
    // Trustee text is digits and dashes, so it cannot contain a NUL.
    let text = U16CString::from_str_truncate(trustee.to_string());
    let mut sid = MaybeUninit::<PSID>::uninit();
    // SAFETY: `text` is a valid NUL-terminated UTF-16 string and the
    // out-parameter is written on success.
    let ok = unsafe { ConvertStringSidToSidW(text.as_ptr(), sid.as_mut_ptr()) };
    if ok == 0 {
        return Err(last_error("ConvertStringSidToSidW"));
    }
    // SAFETY: success means the system wrote a LocalAlloc'ed SID pointer.
    let sid = unsafe { sid.assume_init() };
    // SAFETY: the SID was allocated by the system and is exclusively ours.
    Ok(unsafe { LocalBox::from_raw(sid) })
}

/// Converts a SID borrowed from a descriptor blob back into a trustee.
fn trustee_from_sid(sid: PSID) -> Result<Trustee, SecurityOpError> {
    let mut text = MaybeUninit::<*mut u16>::uninit();
    // SAFETY: `sid` points into a live descriptor blob; the out-parameter
    // is written on success.
    let ok = unsafe { ConvertSidToStringSidW(sid, text.as_mut_ptr()) };
    if ok == 0 {
        return Err(last_error("ConvertSidToStringSidW"));
    }
    // SAFETY: success means the system wrote a LocalAlloc'ed string pointer.
    let text = unsafe { text.assume_init() };
    // SAFETY: the buffer was allocated by the system and is exclusively
    // ours; freeing happens when `owned` drops, after the copy below.
    let owned = unsafe { LocalBox::from_raw(text) };
    // SAFETY: success guarantees a NUL-terminated UTF-16 string.
    let text = unsafe { U16CStr::from_ptr_str(owned.as_ptr()) };
    Ok(text.to_string_lossy().parse::<Trustee>()?)
}

/// Walks a discretionary ACL into access rules. A null ACL reads as empty.
fn rules_from_acl(acl: *const ACL) -> Result<Vec<AccessRule>, SecurityOpError> {
    if acl.is_null() {
        return Ok(Vec::new());
    }
    // SAFETY: a non-null ACL from the platform is readable for the lifetime
    // of the descriptor blob it belongs to.
    let count = unsafe { (*acl).AceCount };
    let mut rules = Vec::with_capacity(usize::from(count));
    for index in 0..u32::from(count) {
        let mut ace = MaybeUninit::<*mut c_void>::uninit();
        // SAFETY: `index` is within `AceCount` and the out-pointer is
        // written on success.
        let ok = unsafe { GetAce(acl, index, ace.as_mut_ptr()) };
        if ok == 0 {
            return Err(last_error("GetAce"));
        }
        // SAFETY: GetAce reported success, so the pointer is initialized
        // and points at an ACE inside the ACL.
        let ace = unsafe { ace.assume_init() };
        // SAFETY: every ACE starts with an ACE_HEADER.
        let header = unsafe { ptr::read(ace.cast::<ACE_HEADER>()) };

        let decision = match u32::from(header.AceType) {
            t if t == u32::from(ACCESS_ALLOWED_ACE_TYPE) => AccessDecision::Allow,
            t if t == u32::from(ACCESS_DENIED_ACE_TYPE) => AccessDecision::Deny,
            // Audit and object ACEs have no place in a discretionary view.
            _ => continue,
        };

        // Allowed and denied ACEs share one layout: header, mask, inline SID.
        // SAFETY: the ACE type was checked above.
        let body = unsafe { &*ace.cast::<ACCESS_ALLOWED_ACE>() };
        let sid = ptr::from_ref(&body.SidStart).cast::<c_void>().cast_mut();
        let trustee = trustee_from_sid(sid)?;

        let flags = u32::from(header.AceFlags);
        rules.push(AccessRule {
            trustee,
            rights: FileSystemRights::from_bits_retain(body.Mask),
            decision,
            inheritance: InheritanceFlags::from_bits_truncate(flags),
            propagation: PropagationFlags::from_bits_truncate(flags),
            inherited: flags & u32::from(INHERITED_ACE) != 0,
        });
    }
    Ok(rules)
}

/// Builds a system-allocated ACL from explicit rules. An empty slice yields
/// an empty (not absent) ACL, which grants access to nobody.
fn acl_from_rules(rules: &[AccessRule]) -> Result<LocalBox<ACL>, SecurityOpError> {
    let sids = rules
        .iter()
        .map(|rule| trustee_to_sid(&rule.trustee))
        .collect::<Result<SmallVec<[LocalBox<c_void>; 4]>, SecurityOpError>>()?;

    let entries = rules
        .iter()
        .zip(&sids)
        .map(|(rule, sid)| EXPLICIT_ACCESS_W {
            grfAccessPermissions: rule.rights.bits(),
            grfAccessMode: match rule.decision {
                AccessDecision::Allow => GRANT_ACCESS,
                AccessDecision::Deny => DENY_ACCESS,
            },
            grfInheritance: rule.inheritance.bits() | rule.propagation.bits(),
            Trustee: TRUSTEE_W {
                pMultipleTrustee: ptr::null_mut(),
                MultipleTrusteeOperation: NO_MULTIPLE_TRUSTEE,
                TrusteeForm: TRUSTEE_IS_SID,
                TrusteeType: TRUSTEE_IS_UNKNOWN,
                ptstrName: sid.as_ptr().cast(),
            },
        })
        .collect::<SmallVec<[EXPLICIT_ACCESS_W; 4]>>();

    #[expect(
        clippy::cast_possible_truncation,
        reason = "rule lists are far below u32::MAX entries"
    )]
    let count = entries.len() as u32;
    let mut acl = MaybeUninit::<*mut ACL>::uninit();
    // SAFETY: the entry array is alive and each trustee SID stays alive in
    // `sids` until the call returns; the new ACL carries its own copies.
    let status = unsafe { SetEntriesInAclW(count, entries.as_ptr(), ptr::null(), acl.as_mut_ptr()) };
    if status != ERROR_SUCCESS {
        return Err(SecurityOpError::Platform {
            operation: "SetEntriesInAclW",
            code: status,
        });
    }
    // SAFETY: success means the system wrote a LocalAlloc'ed ACL pointer
    // that is exclusively ours.
    Ok(unsafe { LocalBox::from_raw(acl.assume_init()) })
}

fn descriptor_from_parts(
    owner: PSID,
    group: PSID,
    dacl: *const ACL,
    sections: AccessControlSections,
) -> Result<SecurityDescriptor, SecurityOpError> {
    let mut descriptor = SecurityDescriptor::new();
    if sections.contains(AccessControlSections::OWNER) && !owner.is_null() {
        descriptor.set_owner(trustee_from_sid(owner)?);
    }
    if sections.contains(AccessControlSections::GROUP) && !group.is_null() {
        descriptor.set_group(trustee_from_sid(group)?);
    }
    if sections.contains(AccessControlSections::ACCESS) {
        for rule in rules_from_acl(dacl)? {
            descriptor.push_rule(rule);
        }
    }
    Ok(descriptor)
}

pub(super) fn named_security(
    path: &Path,
    sections: AccessControlSections,
) -> Result<SecurityDescriptor, SecurityOpError> {
    let wide = wide_path(path)?;
    let mut owner: PSID = ptr::null_mut();
    let mut group: PSID = ptr::null_mut();
    let mut dacl: *mut ACL = ptr::null_mut();
    let mut sacl: *mut ACL = ptr::null_mut();
    let mut blob: *mut c_void = ptr::null_mut();
    // SAFETY: the path is a valid NUL-terminated UTF-16 string and every
    // out-pointer is valid; on success the returned pointers alias `blob`.
    let status = unsafe {
        GetNamedSecurityInfoW(
            wide.as_ptr(),
            SE_FILE_OBJECT,
            security_information(sections),
            &raw mut owner,
            &raw mut group,
            &raw mut dacl,
            &raw mut sacl,
            &raw mut blob,
        )
    };
    if status != ERROR_SUCCESS {
        return Err(match status {
            ERROR_ACCESS_DENIED => SecurityOpError::AccessDenied { path: path.into() },
            code => SecurityOpError::Platform {
                operation: "GetNamedSecurityInfoW",
                code,
            },
        });
    }
    // SAFETY: success means `blob` is a LocalAlloc'ed descriptor that is
    // exclusively ours; owner/group/dacl point into it and are read before
    // the box drops.
    let _blob = unsafe { LocalBox::from_raw(blob) };
    descriptor_from_parts(owner, group, dacl, sections)
}

pub(super) fn set_named_security(
    path: &Path,
    descriptor: &SecurityDescriptor,
) -> Result<(), SecurityOpError> {
    let wide = wide_path(path)?;
    let explicit: Vec<AccessRule> = descriptor.explicit_rules().cloned().collect();
    let acl = acl_from_rules(&explicit)?;
    let owner = descriptor.owner().map(trustee_to_sid).transpose()?;
    let group = descriptor.group().map(trustee_to_sid).transpose()?;

    let mut info = DACL_SECURITY_INFORMATION;
    if owner.is_some() {
        info |= OWNER_SECURITY_INFORMATION;
    }
    if group.is_some() {
        info |= GROUP_SECURITY_INFORMATION;
    }
    // SAFETY: the path, SIDs and ACL all outlive the call; unset identities
    // pass null together with an info mask that does not request them.
    let status = unsafe {
        SetNamedSecurityInfoW(
            wide.as_ptr().cast_mut(),
            SE_FILE_OBJECT,
            info,
            owner.as_ref().map_or(ptr::null_mut(), LocalBox::as_ptr),
            group.as_ref().map_or(ptr::null_mut(), LocalBox::as_ptr),
            acl.as_ptr(),
            ptr::null(),
        )
    };
    if status != ERROR_SUCCESS {
        return Err(match status {
            ERROR_ACCESS_DENIED => SecurityOpError::AccessDenied { path: path.into() },
            code => SecurityOpError::Platform {
                operation: "SetNamedSecurityInfoW",
                code,
            },
        });
    }
    Ok(())
}

pub(super) fn handle_security(
    stream: &File,
    sections: AccessControlSections,
) -> Result<SecurityDescriptor, SecurityOpError> {
    let mut owner: PSID = ptr::null_mut();
    let mut group: PSID = ptr::null_mut();
    let mut dacl: *mut ACL = ptr::null_mut();
    let mut sacl: *mut ACL = ptr::null_mut();
    let mut blob: *mut c_void = ptr::null_mut();
    // SAFETY: the handle is open for the duration of the borrow and every
    // out-pointer is valid.
    let status = unsafe {
        GetSecurityInfo(
            stream.as_raw_handle(),
            SE_FILE_OBJECT,
            security_information(sections),
            &raw mut owner,
            &raw mut group,
            &raw mut dacl,
            &raw mut sacl,
            &raw mut blob,
        )
    };
    if status != ERROR_SUCCESS {
        return Err(SecurityOpError::Platform {
            operation: "GetSecurityInfo",
            code: status,
        });
    }
    // SAFETY: success means `blob` is a LocalAlloc'ed descriptor that is
    // exclusively ours.
    let _blob = unsafe { LocalBox::from_raw(blob) };
    descriptor_from_parts(owner, group, dacl, sections)
}

pub(super) fn set_handle_security(
    stream: &File,
    descriptor: &SecurityDescriptor,
) -> Result<(), SecurityOpError> {
    let explicit: Vec<AccessRule> = descriptor.explicit_rules().cloned().collect();
    let acl = acl_from_rules(&explicit)?;
    let owner = descriptor.owner().map(trustee_to_sid).transpose()?;
    let group = descriptor.group().map(trustee_to_sid).transpose()?;

    let mut info = DACL_SECURITY_INFORMATION;
    if owner.is_some() {
        info |= OWNER_SECURITY_INFORMATION;
    }
    if group.is_some() {
        info |= GROUP_SECURITY_INFORMATION;
    }
    // SAFETY: the handle is open for the duration of the borrow; SIDs and
    // ACL outlive the call.
    let status = unsafe {
        SetSecurityInfo(
            stream.as_raw_handle(),
            SE_FILE_OBJECT,
            info,
            owner.as_ref().map_or(ptr::null_mut(), LocalBox::as_ptr),
            group.as_ref().map_or(ptr::null_mut(), LocalBox::as_ptr),
            acl.as_ptr(),
            ptr::null(),
        )
    };
    if status != ERROR_SUCCESS {
        return Err(SecurityOpError::Platform {
            operation: "SetSecurityInfo",
            code: status,
        });
    }
    Ok(())
}

/// Absolute security descriptor assembled for a creation call. The struct
/// keeps every component alive while a `SECURITY_ATTRIBUTES` points at it.
struct CreationDescriptor {
    sd: Box<SECURITY_DESCRIPTOR>,
    _acl: LocalBox<ACL>,
    _owner: Option<LocalBox<c_void>>,
    _group: Option<LocalBox<c_void>>,
}

impl CreationDescriptor {
    fn build(descriptor: &SecurityDescriptor) -> Result<Self, SecurityOpError> {
        let explicit: Vec<AccessRule> = descriptor.explicit_rules().cloned().collect();
        let acl = acl_from_rules(&explicit)?;

        // SAFETY: a zeroed SECURITY_DESCRIPTOR is the documented blank
        // state; InitializeSecurityDescriptor fills in the rest.
        let mut sd = Box::new(unsafe { mem::zeroed::<SECURITY_DESCRIPTOR>() });
        let sd_ptr = ptr::from_mut(&mut *sd).cast::<c_void>();
        // SAFETY: `sd_ptr` points at a writable descriptor-sized buffer.
        let ok = unsafe { InitializeSecurityDescriptor(sd_ptr, SECURITY_DESCRIPTOR_REVISION) };
        if ok == 0 {
            return Err(last_error("InitializeSecurityDescriptor"));
        }
        // SAFETY: the descriptor is initialized and the ACL outlives it
        // inside the returned struct. Present-but-possibly-empty DACL, not
        // an absent one: an absent DACL would grant everyone full access.
        let ok = unsafe { SetSecurityDescriptorDacl(sd_ptr, 1, acl.as_ptr(), 0) };
        if ok == 0 {
            return Err(last_error("SetSecurityDescriptorDacl"));
        }

        let owner = descriptor.owner().map(trustee_to_sid).transpose()?;
        if let Some(sid) = &owner {
            // SAFETY: the SID outlives the descriptor inside the returned
            // struct.
            let ok = unsafe { SetSecurityDescriptorOwner(sd_ptr, sid.as_ptr(), 0) };
            if ok == 0 {
                return Err(last_error("SetSecurityDescriptorOwner"));
            }
        }
        let group = descriptor.group().map(trustee_to_sid).transpose()?;
        if let Some(sid) = &group {
            // SAFETY: as above.
            let ok = unsafe { SetSecurityDescriptorGroup(sd_ptr, sid.as_ptr(), 0) };
            if ok == 0 {
                return Err(last_error("SetSecurityDescriptorGroup"));
            }
        }

        Ok(Self {
            sd,
            _acl: acl,
            _owner: owner,
            _group: group,
        })
    }

    fn attributes(&mut self) -> SECURITY_ATTRIBUTES {
        // SAFETY: zeroed-then-filled is the conventional way to build the
        // attributes struct.
        let mut attributes = unsafe { mem::zeroed::<SECURITY_ATTRIBUTES>() };
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the struct size is a small constant"
        )]
        {
            attributes.nLength = mem::size_of::<SECURITY_ATTRIBUTES>() as u32;
        }
        attributes.lpSecurityDescriptor = ptr::from_mut(&mut *self.sd).cast();
        attributes.bInheritHandle = 0;
        attributes
    }
}

const fn disposition(mode: FileMode) -> u32 {
    match mode {
        FileMode::CreateNew => CREATE_NEW,
        FileMode::Create => CREATE_ALWAYS,
        FileMode::Open => OPEN_EXISTING,
        FileMode::OpenOrCreate | FileMode::Append => OPEN_ALWAYS,
        FileMode::Truncate => TRUNCATE_EXISTING,
    }
}

pub(super) fn create_file(
    path: &Path,
    options: &CreateFileOptions,
    descriptor: &SecurityDescriptor,
) -> Result<File, SecurityOpError> {
    let wide = wide_path(path)?;
    let mut creation = CreationDescriptor::build(descriptor)?;
    let attributes = creation.attributes();
    // SAFETY: the path is a valid NUL-terminated UTF-16 string and
    // `creation` keeps the descriptor behind `attributes` alive across the
    // call.
    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            options.rights.bits(),
            options.share.bits(),
            &raw const attributes,
            disposition(options.mode),
            FILE_ATTRIBUTE_NORMAL,
            ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        // SAFETY: GetLastError can be called immediately after a failing
        // FFI call.
        let code = unsafe { GetLastError() };
        return Err(match code {
            ERROR_PATH_NOT_FOUND => SecurityOpError::ParentNotFound { path: path.into() },
            ERROR_ACCESS_DENIED => SecurityOpError::AccessDenied { path: path.into() },
            code => SecurityOpError::Platform {
                operation: "CreateFileW",
                code,
            },
        });
    }
    drop(creation);
    // SAFETY: the handle is valid and exclusively ours.
    Ok(unsafe { File::from_raw_handle(handle) })
}

pub(super) fn create_directory(
    path: &Path,
    descriptor: &SecurityDescriptor,
) -> Result<SecurityDescriptor, SecurityOpError> {
    let wide = wide_path(path)?;
    let mut creation = CreationDescriptor::build(descriptor)?;
    let attributes = creation.attributes();
    // SAFETY: the path is a valid NUL-terminated UTF-16 string and
    // `creation` keeps the descriptor behind `attributes` alive across the
    // call.
    let ok = unsafe { CreateDirectoryW(wide.as_ptr(), &raw const attributes) };
    if ok == 0 {
        // SAFETY: GetLastError can be called immediately after a failing
        // FFI call.
        let code = unsafe { GetLastError() };
        match code {
            // An existing directory keeps its descriptor: the caller's is
            // not applied, and the read-back below reflects the original.
            ERROR_ALREADY_EXISTS => {}
            // A missing parent surfaces as an access failure on the
            // directory path; the file operation reports ParentNotFound.
            ERROR_PATH_NOT_FOUND | ERROR_ACCESS_DENIED => {
                return Err(SecurityOpError::AccessDenied { path: path.into() });
            }
            code => {
                return Err(SecurityOpError::Platform {
                    operation: "CreateDirectoryW",
                    code,
                });
            }
        }
    }
    drop(creation);
    named_security(
        path,
        AccessControlSections::ACCESS | AccessControlSections::OWNER | AccessControlSections::GROUP,
    )
}
