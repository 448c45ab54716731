//! Exactly-once release guard for native registry key handles.

use thiserror::Error;
use windows_sys::Win32::Foundation::ERROR_SUCCESS;
use windows_sys::Win32::System::Registry::{RegCloseKey, HKEY};

/// `RegCloseKey` reported a failure; carries the Win32 error code so the
/// caller can decide whether to log or ignore it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("RegCloseKey failed (error {0})")]
pub struct ReleaseError(pub u32);

#[cfg(feature = "windows_result")]
impl From<ReleaseError> for windows_result::HRESULT {
    #[inline]
    fn from(value: ReleaseError) -> Self {
        Self::from_win32(value.0)
    }
}

#[cfg(feature = "windows_result")]
impl From<ReleaseError> for windows_result::Error {
    #[inline]
    fn from(value: ReleaseError) -> Self {
        let hresult: windows_result::HRESULT = value.into();
        Self::from_hresult(hresult)
    }
}

/// Exclusive owner of a native registry key handle.
///
/// The guard closes the key through `RegCloseKey` exactly once, either via
/// [`release`](Self::release) or on drop. A null handle is the "no resource"
/// sentinel: releasing it is a no-op that succeeds. The drop path never
/// panics; callers that care about close failures call `release` themselves
/// and inspect the [`ReleaseError`].
///
/// # Examples
/// ```no_run
/// # #[cfg(windows)]
/// # {
/// use win_access_control::RegistryKeyHandle;
///
/// // `raw` obtained from RegOpenKeyExW or RegCreateKeyExW.
/// # let raw = core::ptr::null_mut();
/// let mut key = unsafe { RegistryKeyHandle::from_raw(raw) };
/// if let Err(error) = key.release() {
///     eprintln!("close failed: {error}");
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct RegistryKeyHandle {
    raw: HKEY,
    released: bool,
}

impl RegistryKeyHandle {
    /// Takes ownership of a raw registry key handle.
    ///
    /// # Safety
    /// - `raw` must be an open registry key handle or null.
    /// - The caller transfers exclusive ownership: nothing else may use or
    ///   close the handle after this call.
    #[must_use]
    #[inline]
    pub const unsafe fn from_raw(raw: HKEY) -> Self {
        Self {
            raw,
            released: false,
        }
    }

    /// The wrapped raw handle. Remains owned by the guard.
    #[must_use]
    #[inline]
    pub const fn as_raw(&self) -> HKEY {
        self.raw
    }

    /// Whether the guard holds the "no resource" sentinel rather than an
    /// open key.
    #[must_use]
    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.raw.is_null()
    }

    /// Closes the key.
    ///
    /// The platform is called at most once: repeated calls, and calls on the
    /// null sentinel, return `Ok(())` without touching the platform. `Drop`
    /// runs this and discards the outcome.
    ///
    /// # Errors
    /// [`ReleaseError`] with the Win32 status when `RegCloseKey` reports a
    /// failure. The handle counts as released either way; the platform call
    /// is not retried.
    #[inline]
    pub fn release(&mut self) -> Result<(), ReleaseError> {
        if self.released || self.raw.is_null() {
            return Ok(());
        }
        self.released = true;
        // SAFETY: the guard owns `raw` exclusively and this path runs at
        // most once.
        let status = unsafe { RegCloseKey(self.raw) };
        if status == ERROR_SUCCESS {
            Ok(())
        } else {
            Err(ReleaseError(status))
        }
    }
}

impl Drop for RegistryKeyHandle {
    #[inline]
    fn drop(&mut self) {
        let _ = self.release();
    }
}

// SAFETY: the guard is the sole owner of the handle, so moving it to another
// thread cannot race any other user. No `Sync`: concurrent shared use of a
// registry handle is not part of the contract.
unsafe impl Send for RegistryKeyHandle {}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use core::mem::MaybeUninit;
    use core::ptr;
    use widestring::U16CString;
    use windows_sys::Win32::System::Registry::{RegOpenKeyExW, HKEY_CURRENT_USER, KEY_READ};

    fn open_software_key() -> RegistryKeyHandle {
        let subkey = U16CString::from_str("Software").unwrap();
        let mut raw = MaybeUninit::<HKEY>::uninit();
        // SAFETY: valid subkey string and out-pointer; result checked below.
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                subkey.as_ptr(),
                0,
                KEY_READ,
                raw.as_mut_ptr(),
            )
        };
        assert_eq!(status, ERROR_SUCCESS, "failed to open HKCU\\Software");
        // SAFETY: RegOpenKeyExW reported success, the handle is initialized
        // and exclusively ours.
        unsafe { RegistryKeyHandle::from_raw(raw.assume_init()) }
    }

    #[test]
    fn release_closes_an_open_key() {
        let mut key = open_software_key();
        assert!(!key.is_invalid());
        assert_eq!(key.release(), Ok(()));
    }

    #[test]
    fn release_is_idempotent() {
        let mut key = open_software_key();
        assert_eq!(key.release(), Ok(()));
        // The second call must not reach the platform again; a double
        // RegCloseKey on the same raw value would report an error.
        assert_eq!(key.release(), Ok(()));
    }

    #[test]
    fn drop_after_release_does_not_double_close() {
        let raw;
        {
            let mut key = open_software_key();
            raw = key.as_raw();
            key.release().unwrap();
        }
        // Reopening proves the handle table was left consistent.
        let mut reopened = open_software_key();
        let _ = raw;
        reopened.release().unwrap();
    }

    #[test]
    fn null_sentinel_releases_successfully() {
        // SAFETY: null is the documented "no resource" sentinel.
        let mut key = unsafe { RegistryKeyHandle::from_raw(ptr::null_mut()) };
        assert!(key.is_invalid());
        assert_eq!(key.release(), Ok(()));
        assert_eq!(key.release(), Ok(()));
    }
}
