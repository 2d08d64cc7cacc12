//! Account layouts of the staking program.
//!
//! Both accounts start with an 8-byte discriminator,
//! `sha256("account:<TypeName>")[..8]`, followed by a packed little-endian
//! payload, which is byte-for-byte the Borsh encoding of the structs below.

use {
    crate::{
        constants::{DISCRIMINATOR_LEN, STAKE_MAX_COUNT},
        error::StateError,
        instruction::sighash,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    solana_pubkey::Pubkey,
};

/// Program-wide state; lives at the global authority PDA.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct GlobalPool {
    pub super_admin: Pubkey,
    pub total_staked_count: u64,
}

/// One staked NFT and the box staked alongside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct StakedData {
    pub bear_mint: Pubkey,
    pub bear_id: u64,
    pub box_mint: Pubkey,
    /// 0 when no box was staked.
    pub box_id: u64,
    /// Unix timestamp of the stake.
    pub staked_time: i64,
}

/// Per-owner staking state.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UserPool {
    pub owner: Pubkey,
    pub last_claimed_time: i64,
    pub pending_reward: u64,
    pub staked_count: u64,
    /// Set once the one-time staking bonus has been paid.
    pub mission_completed: bool,
    pub staked_nfts: [StakedData; STAKE_MAX_COUNT],
}

/// Shared decoding for the program's discriminated accounts.
pub trait ProgramAccount: BorshSerialize + BorshDeserialize {
    /// Account type name the discriminator is derived from.
    const NAME: &'static str;

    /// Payload size, discriminator excluded.
    const LEN: usize;

    fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        sighash("account", Self::NAME)
    }

    /// Decode raw account data, ignoring trailing padding.
    fn try_from_account_data(data: &[u8]) -> Result<Self, StateError> {
        let expected = DISCRIMINATOR_LEN.saturating_add(Self::LEN);
        if data.len() < expected {
            return Err(StateError::DataTooShort {
                len: data.len(),
                expected,
            });
        }
        let (discriminator, mut payload) = data.split_at(DISCRIMINATOR_LEN);
        if discriminator != Self::discriminator() {
            return Err(StateError::DiscriminatorMismatch(Self::NAME));
        }
        Ok(Self::deserialize(&mut payload)?)
    }

    /// Write discriminator and payload into `data`.
    fn serialize_into(&self, data: &mut [u8]) -> Result<(), StateError> {
        let expected = DISCRIMINATOR_LEN.saturating_add(Self::LEN);
        if data.len() < expected {
            return Err(StateError::DataTooShort {
                len: data.len(),
                expected,
            });
        }
        let (discriminator, mut payload) = data.split_at_mut(DISCRIMINATOR_LEN);
        discriminator.copy_from_slice(&Self::discriminator());
        Ok(self.serialize(&mut payload)?)
    }
}

impl ProgramAccount for GlobalPool {
    const NAME: &'static str = "GlobalPool";
    const LEN: usize = 32 + 8;
}

impl StakedData {
    pub const LEN: usize = 32 + 8 + 32 + 8 + 8;
}

impl ProgramAccount for UserPool {
    const NAME: &'static str = "UserPool";
    const LEN: usize = 32 + 8 + 8 + 8 + 1 + StakedData::LEN * STAKE_MAX_COUNT;
}

impl UserPool {
    /// The occupied prefix of `staked_nfts`.
    pub fn staked_nfts(&self) -> &[StakedData] {
        let count = usize::try_from(self.staked_count)
            .unwrap_or(STAKE_MAX_COUNT)
            .min(STAKE_MAX_COUNT);
        &self.staked_nfts[..count]
    }

    pub fn is_staked(&self, mint: &Pubkey) -> bool {
        self.staked_nfts()
            .iter()
            .any(|staked| staked.bear_mint == *mint)
    }
}
