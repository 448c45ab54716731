use arrayvec::ArrayVec;
use core::fmt::{self, Display};
use core::str::FromStr;
use thiserror::Error;

/// Maximum number of sub-authorities a trustee identity may carry.
pub const MAX_SUB_AUTHORITIES: usize = 15;

const NULL_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 0];
const WORLD_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 1];
const CREATOR_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 3];
const NT_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 5];

/// Identity an access rule grants or denies rights to.
///
/// Held in SID component form: revision, 6-byte identifier authority and
/// 1..=15 sub-authorities stored inline. Parses from and renders to the
/// string form (`S-1-5-32-545`), which round-trips.
///
/// # Examples
/// ```rust
/// use win_access_control_model::Trustee;
///
/// let users: Trustee = "S-1-5-32-545".parse().unwrap();
/// assert_eq!(users, Trustee::builtin_users());
/// assert_eq!(users.to_string(), "S-1-5-32-545");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trustee {
    revision: u8,
    identifier_authority: [u8; 6],
    sub_authorities: ArrayVec<u32, MAX_SUB_AUTHORITIES>,
}

/// Error type returned when a trustee string is malformed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid trustee format")]
pub struct InvalidTrusteeFormat;

impl Trustee {
    /// Revision carried by every trustee produced here.
    pub const REVISION: u8 = 1;

    /// Creates a trustee from parts.
    ///
    /// Returns `None` if `sub_authorities` is empty or holds more than
    /// [`MAX_SUB_AUTHORITIES`] values.
    #[must_use]
    #[inline]
    pub fn try_new(identifier_authority: [u8; 6], sub_authorities: &[u32]) -> Option<Self> {
        (1..=MAX_SUB_AUTHORITIES)
            .contains(&sub_authorities.len())
            .then(|| Self {
                revision: Self::REVISION,
                identifier_authority,
                sub_authorities: sub_authorities.iter().copied().collect(),
            })
    }

    /// The 6-byte identifier authority, big-endian.
    #[must_use]
    #[inline]
    pub const fn identifier_authority(&self) -> [u8; 6] {
        self.identifier_authority
    }

    /// The sub-authority values, in order.
    #[must_use]
    #[inline]
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Everyone (`S-1-1-0`).
    #[must_use]
    #[inline]
    pub fn world() -> Self {
        Self::known(WORLD_AUTHORITY, &[0])
    }

    /// Creator Owner (`S-1-3-0`).
    #[must_use]
    #[inline]
    pub fn creator_owner() -> Self {
        Self::known(CREATOR_AUTHORITY, &[0])
    }

    /// Local System (`S-1-5-18`).
    #[must_use]
    #[inline]
    pub fn local_system() -> Self {
        Self::known(NT_AUTHORITY, &[18])
    }

    /// BUILTIN\Administrators (`S-1-5-32-544`).
    #[must_use]
    #[inline]
    pub fn builtin_administrators() -> Self {
        Self::known(NT_AUTHORITY, &[32, 544])
    }

    /// BUILTIN\Users (`S-1-5-32-545`).
    #[must_use]
    #[inline]
    pub fn builtin_users() -> Self {
        Self::known(NT_AUTHORITY, &[32, 545])
    }

    /// BUILTIN\Guests (`S-1-5-32-546`).
    #[must_use]
    #[inline]
    pub fn builtin_guests() -> Self {
        Self::known(NT_AUTHORITY, &[32, 546])
    }

    /// Nobody (`S-1-0-0`).
    #[must_use]
    #[inline]
    pub fn null() -> Self {
        Self::known(NULL_AUTHORITY, &[0])
    }

    fn known(identifier_authority: [u8; 6], sub_authorities: &[u32]) -> Self {
        Self {
            revision: Self::REVISION,
            identifier_authority,
            sub_authorities: sub_authorities.iter().copied().collect(),
        }
    }
}

impl Display for Trustee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.revision)?;

        // Authority: decimal when it fits in 32 bits, hex otherwise.
        let mut be_bytes = [0u8; 8];
        be_bytes[2..].copy_from_slice(&self.identifier_authority);
        let authority = u64::from_be_bytes(be_bytes);
        if authority <= u64::from(u32::MAX) {
            write!(f, "-{authority}")?;
        } else {
            write!(f, "-0x{authority:X}")?;
        }

        for sub_authority in &self.sub_authorities {
            write!(f, "-{sub_authority}")?;
        }
        Ok(())
    }
}

impl FromStr for Trustee {
    type Err = InvalidTrusteeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = s.split('-');
        if !components
            .next()
            .is_some_and(|head| head.eq_ignore_ascii_case("s"))
        {
            return Err(InvalidTrusteeFormat);
        }
        let revision = components
            .next()
            .ok_or(InvalidTrusteeFormat)?
            .parse::<u8>()
            .map_err(|_| InvalidTrusteeFormat)?;

        let identifier_authority = components
            .next()
            .ok_or(InvalidTrusteeFormat)
            .and_then(|component| component.parse::<u64>().map_err(|_| InvalidTrusteeFormat))
            .and_then(|value| {
                let bytes = value.to_be_bytes();
                bytes[2..].try_into().map_err(|_| InvalidTrusteeFormat)
            })?;

        let mut sub_authorities = ArrayVec::<u32, MAX_SUB_AUTHORITIES>::new();
        for component in components {
            let value = component.parse::<u32>().map_err(|_| InvalidTrusteeFormat)?;
            sub_authorities
                .try_push(value)
                .map_err(|_| InvalidTrusteeFormat)?;
        }
        if sub_authorities.is_empty() {
            return Err(InvalidTrusteeFormat);
        }

        Ok(Self {
            revision,
            identifier_authority,
            sub_authorities,
        })
    }
}
