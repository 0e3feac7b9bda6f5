//! Foundation subsidy outputs and address updates
//!
//! Every `subsidy_frequency` blocks after the Foundation hardfork the ledger
//! creates a subsidy output whose ID is derived from the block ID. The
//! addresses that receive it are changed by a transaction carrying a
//! tagged update in its arbitrary data.

use super::encoding::{Decoder, Encoder, EncodingError, SiaDecode, SiaEncode};
use super::unlock::UnlockHash;
use crate::crypto::{hash_all, BlockId, OutputId, Specifier};

/// Tag for subsidy output IDs and subsidy address updates
pub const SPECIFIER_FOUNDATION: Specifier = Specifier::new("foundation");

/// ID of the subsidy output created in block `block_id`
pub fn subsidy_output_id(block_id: &BlockId) -> OutputId {
    hash_all(&[block_id.as_bytes(), SPECIFIER_FOUNDATION.as_bytes()])
}

/// A change of the addresses that receive the subsidy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsidyRekeyUpdate {
    pub new_primary: UnlockHash,
    pub new_failsafe: UnlockHash,
}

/// What a piece of arbitrary data turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbitraryData {
    /// A well-formed subsidy address update
    Update(SubsidyRekeyUpdate),
    /// Tagged as an update but too short to decode
    MalformedUpdate(EncodingError),
    /// Anything without the update tag
    Unrecognized,
}

impl SubsidyRekeyUpdate {
    pub fn new(new_primary: UnlockHash, new_failsafe: UnlockHash) -> Self {
        Self {
            new_primary,
            new_failsafe,
        }
    }

    /// Tag followed by the encoded update
    pub fn to_arbitrary_data(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        e.encode(&SPECIFIER_FOUNDATION);
        e.encode(self);
        e.into_bytes()
    }

    /// Classify a piece of arbitrary data
    pub fn classify(data: &[u8]) -> ArbitraryData {
        match data.strip_prefix(SPECIFIER_FOUNDATION.as_bytes().as_slice()) {
            None => ArbitraryData::Unrecognized,
            Some(body) => match SubsidyRekeyUpdate::from_bytes(body) {
                Ok(update) => ArbitraryData::Update(update),
                Err(e) => ArbitraryData::MalformedUpdate(e),
            },
        }
    }
}

impl SiaEncode for SubsidyRekeyUpdate {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.new_primary);
        e.encode(&self.new_failsafe);
    }
}

impl SiaDecode for SubsidyRekeyUpdate {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            new_primary: d.decode()?,
            new_failsafe: d.decode()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::blake2b;

    fn update() -> SubsidyRekeyUpdate {
        SubsidyRekeyUpdate::new(UnlockHash(blake2b(b"primary")), UnlockHash(blake2b(b"failsafe")))
    }

    #[test]
    fn test_arbitrary_data_layout() {
        let data = update().to_arbitrary_data();
        assert_eq!(data.len(), 16 + 32 + 32);
        assert_eq!(&data[..10], b"foundation");
        assert_eq!(&data[10..16], &[0u8; 6]);
        assert_eq!(&data[16..48], blake2b(b"primary").as_bytes());
        assert_eq!(&data[48..], blake2b(b"failsafe").as_bytes());
    }

    #[test]
    fn test_classify() {
        let data = update().to_arbitrary_data();
        assert_eq!(SubsidyRekeyUpdate::classify(&data), ArbitraryData::Update(update()));

        assert!(matches!(
            SubsidyRekeyUpdate::classify(&data[..40]),
            ArbitraryData::MalformedUpdate(_)
        ));
        assert_eq!(SubsidyRekeyUpdate::classify(b"hello"), ArbitraryData::Unrecognized);
        assert_eq!(SubsidyRekeyUpdate::classify(&[]), ArbitraryData::Unrecognized);
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut data = update().to_arbitrary_data();
        data.extend_from_slice(b"extra");
        assert_eq!(SubsidyRekeyUpdate::classify(&data), ArbitraryData::Update(update()));
    }

    #[test]
    fn test_subsidy_output_id() {
        let block = blake2b(b"block");
        let mut preimage = block.0.to_vec();
        preimage.extend_from_slice(SPECIFIER_FOUNDATION.as_bytes());
        assert_eq!(subsidy_output_id(&block), blake2b(&preimage));
        assert_ne!(subsidy_output_id(&block), subsidy_output_id(&blake2b(b"other")));
    }
}
