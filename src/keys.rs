use crate::{codec, error::TagError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Length of a MIFARE Classic sector key
pub const KEY_SIZE: usize = 6;

/// A 6-byte key presented to a sector before its blocks can be read.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthKey([u8; KEY_SIZE]);

impl AuthKey {
    /// Factory key of blank Classic tags
    pub const DEFAULT: AuthKey = AuthKey([0xFF; KEY_SIZE]);
    /// Key A of the MIFARE Application Directory sector
    pub const MIFARE_APPLICATION_DIRECTORY: AuthKey = AuthKey([0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);
    /// Key A of NFC Forum formatted sectors
    pub const NFC_FORUM: AuthKey = AuthKey([0xD3, 0xF7, 0xD3, 0xF7, 0xD3, 0xF7]);

    pub const fn new(bytes: [u8; KEY_SIZE]) -> Self {
        AuthKey(bytes)
    }

    pub fn from_bin(data: &[u8]) -> Result<AuthKey, TagError> {
        let bytes: [u8; KEY_SIZE] = data.try_into().map_err(|_| {
            TagError::InvalidKey(format!("key should be {KEY_SIZE} bytes, was {}", data.len()))
        })?;
        Ok(AuthKey(bytes))
    }

    pub fn from_hex(text: &str) -> Result<AuthKey, TagError> {
        Self::from_bin(&codec::hex_to_bytes(text)?)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Default for AuthKey {
    fn default() -> Self {
        AuthKey::DEFAULT
    }
}

impl fmt::Display for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// keys end up in logs; keep them readable as hex rather than a byte array
impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthKey({self})")
    }
}

impl Serialize for AuthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        AuthKey::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
