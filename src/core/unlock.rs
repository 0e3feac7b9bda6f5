//! Unlock conditions and addresses
//!
//! An address (unlock hash) is the merkle root of an m-of-n signature
//! policy. Knowing an address reveals nothing about the policy; anyone
//! holding the same (timelock, m, keys) tuple recomputes the same address.

use super::encoding::{Decoder, Encoder, EncodingError, SiaDecode, SiaEncode};
use crate::crypto::{blake2b, merkle_root, Hash256, PublicKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bytes of checksum appended to a textual address
pub const UNLOCK_HASH_CHECKSUM_SIZE: usize = 6;

/// Errors related to unlock conditions and addresses
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UnlockError {
    #[error("Invalid policy: {required} signatures required but only {keys} keys given")]
    InvalidPolicy { required: u64, keys: usize },
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Address checksum mismatch")]
    ChecksumMismatch,
}

// =============================================================================
// Unlock Hash
// =============================================================================

/// An address: the hash of a set of unlock conditions
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnlockHash(pub Hash256);

impl UnlockHash {
    /// First 6 bytes of the hash of the address
    pub fn checksum(&self) -> [u8; UNLOCK_HASH_CHECKSUM_SIZE] {
        let mut out = [0u8; UNLOCK_HASH_CHECKSUM_SIZE];
        out.copy_from_slice(&blake2b(self.0.as_bytes()).0[..UNLOCK_HASH_CHECKSUM_SIZE]);
        out
    }
}

impl fmt::Display for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, hex::encode(self.checksum()))
    }
}

impl fmt::Debug for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnlockHash({})", self)
    }
}

impl FromStr for UnlockHash {
    type Err = UnlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let expected = 64 + UNLOCK_HASH_CHECKSUM_SIZE * 2;
        if s.len() != expected || !s.is_ascii() {
            return Err(UnlockError::InvalidAddress(format!(
                "expected {} hex characters, got {}",
                expected,
                s.len()
            )));
        }
        let hash: Hash256 = s[..64]
            .parse()
            .map_err(|e| UnlockError::InvalidAddress(format!("{}", e)))?;
        let mut checksum = [0u8; UNLOCK_HASH_CHECKSUM_SIZE];
        hex::decode_to_slice(&s[64..], &mut checksum)
            .map_err(|e| UnlockError::InvalidAddress(e.to_string()))?;

        let uh = UnlockHash(hash);
        if uh.checksum() != checksum {
            return Err(UnlockError::ChecksumMismatch);
        }
        Ok(uh)
    }
}

impl Serialize for UnlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for UnlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl SiaEncode for UnlockHash {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.0);
    }
}

impl SiaDecode for UnlockHash {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(UnlockHash(d.decode()?))
    }
}

// =============================================================================
// Unlock Conditions
// =============================================================================

/// An m-of-n signature policy with an optional timelock
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockConditions {
    /// Height before which the output cannot be spent
    #[serde(default)]
    pub timelock: u64,
    /// Keys allowed to sign, in order
    #[serde(rename = "publickeys", alias = "publicKeys", default)]
    pub public_keys: Vec<PublicKey>,
    /// Number of distinct keys that must sign (m)
    #[serde(rename = "signaturesrequired", alias = "signaturesRequired")]
    pub signatures_required: u64,
}

impl UnlockConditions {
    /// Create unlock conditions, rejecting `m > n`
    pub fn new(
        timelock: u64,
        signatures_required: u64,
        public_keys: Vec<PublicKey>,
    ) -> Result<Self, UnlockError> {
        if signatures_required > public_keys.len() as u64 {
            return Err(UnlockError::InvalidPolicy {
                required: signatures_required,
                keys: public_keys.len(),
            });
        }
        Ok(Self {
            timelock,
            public_keys,
            signatures_required,
        })
    }

    /// Single-key conditions with no timelock
    pub fn standard(public_key: PublicKey) -> Self {
        Self {
            timelock: 0,
            public_keys: vec![public_key],
            signatures_required: 1,
        }
    }

    /// The address of these conditions
    pub fn unlock_hash(&self) -> UnlockHash {
        let mut leaves: Vec<Vec<u8>> = Vec::with_capacity(self.public_keys.len() + 2);
        leaves.push(self.timelock.to_bytes());
        for pk in &self.public_keys {
            leaves.push(pk.to_bytes());
        }
        leaves.push(self.signatures_required.to_bytes());
        UnlockHash(merkle_root(&leaves))
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.signatures_required, self.public_keys.len())
    }
}

impl SiaEncode for UnlockConditions {
    fn encode(&self, e: &mut Encoder) {
        e.write_u64(self.timelock);
        e.encode(&self.public_keys);
        e.write_u64(self.signatures_required);
    }
}

/// Build m-of-n unlock conditions and derive their address
pub fn derive_address(
    timelock: u64,
    signatures_required: u64,
    public_keys: Vec<PublicKey>,
) -> Result<(UnlockConditions, UnlockHash), UnlockError> {
    let uc = UnlockConditions::new(timelock, signatures_required, public_keys)?;
    let address = uc.unlock_hash();
    Ok((uc, address))
}

/// Human-facing JSON form of unlock conditions, printed next to a derived
/// address and accepted back by the transaction wizard
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDescription {
    #[serde(skip_serializing_if = "is_zero")]
    pub timelock: u64,
    pub public_keys: Vec<String>,
    pub signatures_required: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl From<&UnlockConditions> for AddressDescription {
    fn from(uc: &UnlockConditions) -> Self {
        Self {
            timelock: uc.timelock,
            public_keys: uc.public_keys.iter().map(|pk| pk.to_string()).collect(),
            signatures_required: uc.signatures_required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{merkle::leaf_hash, merkle::node_hash, KeyPair, Seed};

    fn keys(n: u8) -> Vec<PublicKey> {
        (1..=n)
            .map(|i| KeyPair::from_secret_seed(&[i; 32]).public_key())
            .collect()
    }

    #[test]
    fn test_policy_validation() {
        assert!(derive_address(0, 2, keys(3)).is_ok());
        assert!(derive_address(0, 0, keys(2)).is_ok());
        assert!(derive_address(0, 0, vec![]).is_ok());
        assert_eq!(
            derive_address(0, 4, keys(3)).unwrap_err(),
            UnlockError::InvalidPolicy { required: 4, keys: 3 }
        );
    }

    #[test]
    fn test_unlock_hash_is_merkle_root_of_fields() {
        let uc = UnlockConditions::new(5, 1, keys(1)).unwrap();
        let left = node_hash(
            &leaf_hash(&5u64.to_bytes()),
            &leaf_hash(&uc.public_keys[0].to_bytes()),
        );
        let expected = node_hash(&left, &leaf_hash(&1u64.to_bytes()));
        assert_eq!(uc.unlock_hash(), UnlockHash(expected));
    }

    #[test]
    fn test_address_determinism() {
        let (_, a) = derive_address(0, 2, keys(3)).unwrap();
        let (_, b) = derive_address(0, 2, keys(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_order_changes_address() {
        let mut reversed = keys(2);
        reversed.reverse();
        let (_, a) = derive_address(0, 2, keys(2)).unwrap();
        let (_, b) = derive_address(0, 2, reversed).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_every_field_changes_address() {
        let (_, base) = derive_address(0, 1, keys(2)).unwrap();
        assert_ne!(base, derive_address(1, 1, keys(2)).unwrap().1);
        assert_ne!(base, derive_address(0, 2, keys(2)).unwrap().1);
        assert_ne!(base, derive_address(0, 1, keys(3)).unwrap().1);
    }

    #[test]
    fn test_address_string_round_trip() {
        let seed = Seed::from_entropy([3u8; 16]);
        let address = UnlockConditions::standard(seed.public_key(0)).unlock_hash();
        let text = address.to_string();
        assert_eq!(text.len(), 76);
        assert_eq!(text.parse::<UnlockHash>().unwrap(), address);
    }

    #[test]
    fn test_address_checksum_is_verified() {
        let address = UnlockConditions::standard(keys(1).remove(0)).unlock_hash();
        let mut text = address.to_string();
        let last = if text.ends_with('0') { "1" } else { "0" };
        text.replace_range(75.., last);
        assert_eq!(text.parse::<UnlockHash>(), Err(UnlockError::ChecksumMismatch));
        assert!(matches!(
            text[..64].parse::<UnlockHash>(),
            Err(UnlockError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_unlock_conditions_json() {
        let uc = UnlockConditions::new(0, 2, keys(2)).unwrap();
        let json = serde_json::to_string(&uc).unwrap();
        assert!(json.contains("\"publickeys\""));
        assert!(json.contains("\"signaturesrequired\":2"));
        assert_eq!(serde_json::from_str::<UnlockConditions>(&json).unwrap(), uc);

        // The address description form is accepted back
        let described = serde_json::to_string(&AddressDescription::from(&uc)).unwrap();
        assert!(!described.contains("timelock"));
        assert!(described.contains("\"publicKeys\""));
        assert_eq!(serde_json::from_str::<UnlockConditions>(&described).unwrap(), uc);
    }

    #[test]
    fn test_known_addresses() {
        let seed = Seed::from_phrase(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        )
        .unwrap();
        let (_, single) = derive_address(0, 1, vec![seed.public_key(0)]).unwrap();
        assert_eq!(
            single.to_string(),
            "a2a3773f76136bdb05a0ff79a0f4fcc2826436794f8db36db6408355c5ca32345002db43c2eb"
        );
        let (_, pair) = derive_address(0, 2, vec![seed.public_key(0), seed.public_key(1)]).unwrap();
        assert_eq!(
            pair.to_string(),
            "3c4222a5a13e4d5edfffcc51d0c3a178b56a82f49996099b3fa8781b93aac5a1c8106f3f1cfd"
        );
    }
}
