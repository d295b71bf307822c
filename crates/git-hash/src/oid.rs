use std::fmt;
use std::str::FromStr;

use crate::hex::{hex_decode, hex_to_string};
use crate::HashError;

/// Number of raw bytes in an [`ObjectId`].
pub const OID_LEN: usize = 20;
/// Number of hex characters in an [`ObjectId`]'s textual form.
pub const OID_HEX_LEN: usize = 40;

/// A content-address: the SHA-1 hash of an object's canonical serialization.
///
/// `ObjectId` has exactly one representation because this system fixes its
/// hash algorithm at 160-bit SHA-1 (see the data model). Equality and
/// ordering are byte-wise on the raw digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OID_LEN]);

impl ObjectId {
    /// The null OID (all zeros), used as a sentinel for "no object".
    pub const NULL: Self = Self([0u8; OID_LEN]);

    /// Wrap a raw 20-byte digest.
    pub const fn from_raw(bytes: [u8; OID_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an ObjectId from a byte slice, which must be exactly 20 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != OID_LEN {
            return Err(HashError::InvalidHashLength {
                expected: OID_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; OID_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Create an ObjectId from a 40-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        if hex.len() != OID_HEX_LEN {
            return Err(HashError::InvalidHexLength {
                expected: OID_HEX_LEN,
                actual: hex.len(),
            });
        }
        let mut bytes = [0u8; OID_LEN];
        hex_decode(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes of the hash.
    pub fn as_bytes(&self) -> &[u8; OID_LEN] {
        &self.0
    }

    /// Check if this is the null (all-zeros) OID.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Get the hex string representation (lowercase).
    pub fn to_hex(&self) -> String {
        hex_to_string(&self.0)
    }

    /// Get the first byte of the hash (for fan-out table indexing).
    pub fn first_byte(&self) -> u8 {
        self.0[0]
    }

    /// Check if this OID's hex representation starts with the given hex prefix.
    pub fn starts_with_hex(&self, prefix: &str) -> bool {
        let hex = self.to_hex();
        hex.starts_with(&prefix.to_ascii_lowercase())
    }

    /// Get the loose object path component: `"xx/xxxx..."`.
    pub fn loose_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], &hex[2..])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
