use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::REIT_ID_HASH_LEN;
use crate::errors::ReitIdError;

/// Opaque REIT identifier (UUID) shared by the ledger and the chain.
///
/// The raw 16 UUID bytes seed the fundraiser PDA, so a REIT id must never
/// change once its fundraiser exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReitId([u8; REIT_ID_HASH_LEN]);

impl ReitId {
    /// Parse an 8-4-4-4-12 hex UUID, case-insensitive.
    pub fn parse(raw: &str) -> Result<Self, ReitIdError> {
        let lens: Vec<usize> = raw.split('-').map(str::len).collect();
        if lens != [8, 4, 4, 4, 12] {
            return Err(ReitIdError::Malformed(raw.to_string()));
        }
        let compact: String = raw.chars().filter(|c| *c != '-').collect();
        let mut bytes = [0u8; REIT_ID_HASH_LEN];
        hex::decode_to_slice(&compact, &mut bytes)
            .map_err(|_| ReitIdError::Malformed(raw.to_string()))?;
        Ok(Self(bytes))
    }

    /// Rebuild the id from fundraiser seed bytes.
    pub fn from_seed_bytes(bytes: [u8; REIT_ID_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw UUID bytes, passed on-chain as `reit_id_hash`.
    pub fn seed_bytes(&self) -> [u8; REIT_ID_HASH_LEN] {
        self.0
    }
}

impl fmt::Display for ReitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

impl FromStr for ReitId {
    type Err = ReitIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReitId {
    type Error = ReitIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReitId> for String {
    fn from(id: ReitId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "3f2a9c4e-1b7d-4e8a-9c0f-5a6b7c8d9e0f";

    #[test]
    fn test_seed_bytes_are_raw_uuid() {
        let id = ReitId::parse(ID).unwrap();
        let bytes = id.seed_bytes();
        assert_eq!(bytes[0], 0x3f);
        assert_eq!(bytes[15], 0x0f);
        assert_eq!(ReitId::from_seed_bytes(bytes), id);
    }

    #[test]
    fn test_uppercase_is_normalised() {
        let id = ReitId::parse(&ID.to_uppercase()).unwrap();
        assert_eq!(id.to_string(), ID);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(ReitId::parse("REIT-001").is_err());
        assert!(ReitId::parse("3f2a9c4e1b7d4e8a9c0f5a6b7c8d9e0f").is_err());
        assert!(ReitId::parse("3f2a9c4e-1b7d-4e8a-9c0f-5a6b7c8d9e0g").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let ok: ReitId = serde_json::from_str(&format!("\"{ID}\"")).unwrap();
        assert_eq!(ok.to_string(), ID);
        assert!(serde_json::from_str::<ReitId>("\"not-a-uuid\"").is_err());
    }
}
