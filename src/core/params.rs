//! Protocol parameters
//!
//! Heights and limits that feed into signature digests, validity checks,
//! and the subsidy schedule. Defaults are the mainnet values.

/// Height at which the ASIC hardfork activated
pub const ASIC_HARDFORK_HEIGHT: u64 = 179_000;

/// Height at which the Foundation hardfork activated and the subsidy began
pub const FOUNDATION_HARDFORK_HEIGHT: u64 = 298_000;

/// Blocks between subsidy payouts (one month of blocks)
pub const FOUNDATION_SUBSIDY_FREQUENCY: u64 = 144 * 30;

/// Height after which the siafund tax is rounded down to the siafund count
pub const TAX_HARDFORK_HEIGHT: u64 = 21_000;

/// Maximum size of a block in bytes
pub const BLOCK_SIZE_LIMIT: usize = 2_000_000;

/// Room left in a block for the header and other overhead
pub const TRANSACTION_SIZE_OVERHEAD: usize = 5_000;

/// Total number of siafunds
pub const SIAFUND_COUNT: u128 = 10_000;

/// Replay protection prefix used between the ASIC and Foundation hardforks
pub const ASIC_REPLAY_PREFIX: &[u8] = &[0];

/// Replay protection prefix used after the Foundation hardfork
pub const FOUNDATION_REPLAY_PREFIX: &[u8] = &[1];

/// Protocol parameters used by signing, inspection, validation and scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolParams {
    pub asic_hardfork_height: u64,
    pub foundation_hardfork_height: u64,
    pub subsidy_frequency: u64,
    pub tax_hardfork_height: u64,
    pub block_size_limit: usize,
    /// Height used for digests and validity when adding a signature
    pub sign_height: u64,
    /// Height used for digests and validity when inspecting a transaction
    pub check_height: u64,
    /// Height used for validity before broadcasting
    pub broadcast_height: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            asic_hardfork_height: ASIC_HARDFORK_HEIGHT,
            foundation_hardfork_height: FOUNDATION_HARDFORK_HEIGHT,
            subsidy_frequency: FOUNDATION_SUBSIDY_FREQUENCY,
            tax_hardfork_height: TAX_HARDFORK_HEIGHT,
            block_size_limit: BLOCK_SIZE_LIMIT,
            sign_height: FOUNDATION_HARDFORK_HEIGHT + 1,
            check_height: FOUNDATION_HARDFORK_HEIGHT + 1,
            broadcast_height: FOUNDATION_HARDFORK_HEIGHT + 1,
        }
    }
}

impl ProtocolParams {
    /// Prefix written before every input in a signature digest at `height`
    pub fn replay_prefix(&self, height: u64) -> &'static [u8] {
        if height >= self.foundation_hardfork_height {
            FOUNDATION_REPLAY_PREFIX
        } else if height >= self.asic_hardfork_height {
            ASIC_REPLAY_PREFIX
        } else {
            &[]
        }
    }

    /// Heights at which a subsidy is paid, below `current_height`
    pub fn subsidy_heights(&self, current_height: u64) -> impl Iterator<Item = u64> {
        let step = self.subsidy_frequency.max(1) as usize;
        (self.foundation_hardfork_height..current_height).step_by(step)
    }
}
