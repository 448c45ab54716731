use crate::{FileSystemRights, InheritanceFlags, PropagationFlags, Trustee};
use core::fmt;
use core::str::FromStr;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

// Trustees travel in their string form; raw component tuples would leak the
// inline-storage layout into the wire format.
impl Serialize for Trustee {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Trustee {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TrusteeVisitor;

        impl de::Visitor<'_> for TrusteeVisitor {
            type Value = Trustee;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a trustee in string form (e.g., \"S-1-5-32-545\")")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Trustee::from_str(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(TrusteeVisitor)
    }
}

macro_rules! serde_as_bits {
    ($flags:ty, $expecting:literal) => {
        impl Serialize for $flags {
            #[inline]
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_u32(u32::from(self.bits()))
            }
        }

        impl<'de> Deserialize<'de> for $flags {
            #[inline]
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let bits = u32::deserialize(deserializer)?;
                Self::from_bits(bits.try_into().map_err(|_| {
                    de::Error::invalid_value(
                        de::Unexpected::Unsigned(u64::from(bits)),
                        &$expecting,
                    )
                })?)
                .ok_or_else(|| {
                    de::Error::invalid_value(de::Unexpected::Unsigned(u64::from(bits)), &$expecting)
                })
            }
        }
    };
}

serde_as_bits!(FileSystemRights, "a file-system rights mask");
serde_as_bits!(InheritanceFlags, "ACE inheritance bits");
serde_as_bits!(PropagationFlags, "ACE propagation bits");
