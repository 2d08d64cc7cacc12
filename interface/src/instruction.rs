//! Instruction definitions for the staking program.
//!
//! Instruction data is an 8-byte method discriminator,
//! `sha256("global:<method>")[..8]`, followed by the little-endian arguments.

use {
    crate::{
        constants::{DISCRIMINATOR_LEN, TOKEN_METADATA_PROGRAM_ID, USER_POOL_SEED, USER_POOL_SIZE},
        pda::{
            find_global_authority_address, find_metadata_address, get_associated_token_address,
            get_reward_vault_address, get_user_pool_address,
        },
    },
    solana_instruction::{AccountMeta, Instruction},
    solana_pubkey::{Pubkey, PubkeyError},
    solana_sdk_ids::{system_program, sysvar},
};

/// Instructions exposed by the staking program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingInstruction {
    /// Create the global pool and record the admin.
    ///
    /// # Accounts expected
    ///
    /// 0. `[signer, writable]` Admin, pays for the global pool.
    /// 1. `[writable]` Global pool PDA.
    /// 2. `[]` System program.
    /// 3. `[]` Rent sysvar.
    Initialize { global_bump: u8 },

    /// Record the owner of a freshly allocated, zeroed user pool.
    ///
    /// # Accounts expected
    ///
    /// 0. `[writable]` User pool (allocated with `create_account_with_seed`).
    /// 1. `[signer, writable]` Owner.
    InitUserPool,

    /// Move an NFT (and optionally its box) into escrow.
    ///
    /// # Accounts expected
    ///
    /// 0.  `[signer, writable]` Owner.
    /// 1.  `[writable]` Global pool PDA.
    /// 2.  `[writable]` User pool.
    /// 3.  `[]` NFT mint.
    /// 4.  `[]` Box mint.
    /// 5.  `[writable]` Owner's NFT token account.
    /// 6.  `[writable]` Escrow NFT token account.
    /// 7.  `[writable]` Owner's box token account.
    /// 8.  `[writable]` Escrow box token account.
    /// 9.  `[writable]` Reward vault.
    /// 10. `[writable]` Owner's reward token account.
    /// 11. `[writable]` NFT metadata.
    /// 12. `[]` SPL Token program.
    /// 13. `[]` Token Metadata program.
    ///
    /// A `box_id` of 0 stakes the NFT without a box.
    StakeNft { global_bump: u8, box_id: u64 },

    /// Return an NFT (and optionally its box) from escrow.
    ///
    /// # Accounts expected
    ///
    /// 0. `[signer, writable]` Owner.
    /// 1. `[writable]` User pool.
    /// 2. `[writable]` Global pool PDA.
    /// 3. `[]` NFT mint.
    /// 4. `[]` Box mint.
    /// 5. `[writable]` Owner's NFT token account.
    /// 6. `[writable]` Escrow NFT token account.
    /// 7. `[writable]` Owner's box token account.
    /// 8. `[writable]` Escrow box token account.
    /// 9. `[]` SPL Token program.
    UnstakeNft { global_bump: u8, box_id: u64 },

    /// Pay out the accrued reward.
    ///
    /// # Accounts expected
    ///
    /// 0. `[signer, writable]` Owner.
    /// 1. `[writable]` User pool.
    /// 2. `[writable]` Global pool PDA.
    /// 3. `[writable]` Reward vault.
    /// 4. `[writable]` Owner's reward token account.
    /// 5. `[]` SPL Token program.
    ClaimReward { global_bump: u8 },
}

impl StakingInstruction {
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::InitUserPool => "init_user_pool",
            Self::StakeNft { .. } => "stake_nft",
            Self::UnstakeNft { .. } => "unstake_nft",
            Self::ClaimReward { .. } => "claim_reward",
        }
    }

    /// Serialized instruction data.
    pub fn data(&self) -> Vec<u8> {
        let mut data = instruction_discriminator(self.method_name()).to_vec();
        match *self {
            Self::Initialize { global_bump } | Self::ClaimReward { global_bump } => {
                data.push(global_bump);
            }
            Self::InitUserPool => {}
            Self::StakeNft {
                global_bump,
                box_id,
            }
            | Self::UnstakeNft {
                global_bump,
                box_id,
            } => {
                data.push(global_bump);
                data.extend_from_slice(&box_id.to_le_bytes());
            }
        }
        data
    }
}

/// Discriminator the program dispatches `method` on.
pub fn instruction_discriminator(method: &str) -> [u8; DISCRIMINATOR_LEN] {
    sighash("global", method)
}

pub(crate) fn sighash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = solana_sha256_hasher::hashv(&[namespace.as_bytes(), b":", name.as_bytes()]);
    let mut discriminator = [0u8; DISCRIMINATOR_LEN];
    discriminator.copy_from_slice(&hash.as_ref()[..DISCRIMINATOR_LEN]);
    discriminator
}

/// Create the global pool with `admin` as super admin.
pub fn initialize(program_id: &Pubkey, admin: &Pubkey) -> Instruction {
    let (global_authority, global_bump) = find_global_authority_address(program_id);
    Instruction::new_with_bytes(
        *program_id,
        &StakingInstruction::Initialize { global_bump }.data(),
        vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(global_authority, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
    )
}

/// Allocate `owner`'s user pool, owned by the program and funded by `owner`.
///
/// `lamports` must cover rent exemption for [`USER_POOL_SIZE`] bytes.
pub fn create_user_pool_account(
    program_id: &Pubkey,
    owner: &Pubkey,
    lamports: u64,
) -> Result<Instruction, PubkeyError> {
    let user_pool = get_user_pool_address(owner, program_id)?;
    Ok(solana_system_interface::instruction::create_account_with_seed(
        owner,
        &user_pool,
        owner,
        USER_POOL_SEED,
        lamports,
        USER_POOL_SIZE as u64,
        program_id,
    ))
}

/// Record `owner` in its freshly allocated user pool.
pub fn init_user_pool(program_id: &Pubkey, owner: &Pubkey) -> Result<Instruction, PubkeyError> {
    let user_pool = get_user_pool_address(owner, program_id)?;
    Ok(Instruction::new_with_bytes(
        *program_id,
        &StakingInstruction::InitUserPool.data(),
        vec![
            AccountMeta::new(user_pool, false),
            AccountMeta::new(*owner, true),
        ],
    ))
}

/// Stake `nft_mint`, together with `box_mint` unless `box_id` is 0.
pub fn stake_nft(
    program_id: &Pubkey,
    owner: &Pubkey,
    nft_mint: &Pubkey,
    box_mint: &Pubkey,
    reward_mint: &Pubkey,
    box_id: u64,
) -> Result<Instruction, PubkeyError> {
    let (global_authority, global_bump) = find_global_authority_address(program_id);
    let user_pool = get_user_pool_address(owner, program_id)?;
    Ok(Instruction::new_with_bytes(
        *program_id,
        &StakingInstruction::StakeNft {
            global_bump,
            box_id,
        }
        .data(),
        vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(global_authority, false),
            AccountMeta::new(user_pool, false),
            AccountMeta::new_readonly(*nft_mint, false),
            AccountMeta::new_readonly(*box_mint, false),
            AccountMeta::new(get_associated_token_address(owner, nft_mint), false),
            AccountMeta::new(get_associated_token_address(&global_authority, nft_mint), false),
            AccountMeta::new(get_associated_token_address(owner, box_mint), false),
            AccountMeta::new(get_associated_token_address(&global_authority, box_mint), false),
            AccountMeta::new(get_reward_vault_address(program_id, reward_mint), false),
            AccountMeta::new(get_associated_token_address(owner, reward_mint), false),
            AccountMeta::new(find_metadata_address(nft_mint), false),
            AccountMeta::new_readonly(spl_token_interface::id(), false),
            AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
        ],
    ))
}

/// Unstake `nft_mint`, together with `box_mint` unless `box_id` is 0.
pub fn unstake_nft(
    program_id: &Pubkey,
    owner: &Pubkey,
    nft_mint: &Pubkey,
    box_mint: &Pubkey,
    box_id: u64,
) -> Result<Instruction, PubkeyError> {
    let (global_authority, global_bump) = find_global_authority_address(program_id);
    let user_pool = get_user_pool_address(owner, program_id)?;
    Ok(Instruction::new_with_bytes(
        *program_id,
        &StakingInstruction::UnstakeNft {
            global_bump,
            box_id,
        }
        .data(),
        vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(user_pool, false),
            AccountMeta::new(global_authority, false),
            AccountMeta::new_readonly(*nft_mint, false),
            AccountMeta::new_readonly(*box_mint, false),
            AccountMeta::new(get_associated_token_address(owner, nft_mint), false),
            AccountMeta::new(get_associated_token_address(&global_authority, nft_mint), false),
            AccountMeta::new(get_associated_token_address(owner, box_mint), false),
            AccountMeta::new(get_associated_token_address(&global_authority, box_mint), false),
            AccountMeta::new_readonly(spl_token_interface::id(), false),
        ],
    ))
}

/// Claim the reward accrued by `owner`'s staked NFTs.
pub fn claim_reward(
    program_id: &Pubkey,
    owner: &Pubkey,
    reward_mint: &Pubkey,
) -> Result<Instruction, PubkeyError> {
    let (global_authority, global_bump) = find_global_authority_address(program_id);
    let user_pool = get_user_pool_address(owner, program_id)?;
    Ok(Instruction::new_with_bytes(
        *program_id,
        &StakingInstruction::ClaimReward { global_bump }.data(),
        vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(user_pool, false),
            AccountMeta::new(global_authority, false),
            AccountMeta::new(get_reward_vault_address(program_id, reward_mint), false),
            AccountMeta::new(get_associated_token_address(owner, reward_mint), false),
            AccountMeta::new_readonly(spl_token_interface::id(), false),
        ],
    ))
}
